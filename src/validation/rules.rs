use std::sync::LazyLock;

use regex::Regex;
use tracing::instrument;

use crate::{
    config::{Config, ConfigError, DEFAULT_CAMEL_CASE_PATTERN},
    schema::{AttributeKind, SchemaModel, Scope},
    tag_string::{TagGroup, TagPath, TagPathError, TokenTree, tokenize},
    validation::Issue,
};

/// A number at the start of a value, then the rest (the unit).
static NUMERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?)\s*(.*)$")
        .expect("hard-coded regex must be valid")
});

static DEFAULT_CAMEL_CASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(DEFAULT_CAMEL_CASE_PATTERN).expect("default camel case pattern must be valid")
});

/// Splits a value into its numeral and the trimmed text after it.
fn split_numeral(value: &str) -> Option<(&str, &str)> {
    let captures = NUMERAL.captures(value.trim())?;
    let numeral = captures.get(1)?.as_str();
    let rest = captures.get(2).map_or("", |rest| rest.as_str().trim());
    Some((numeral, rest))
}

/// Checks token trees against a schema.
///
/// A validator borrows the schema and can be shared between threads.
#[derive(Debug, Clone)]
pub struct Validator<'a> {
    schema: &'a SchemaModel,
    check_capitalization: bool,
    camel_case: Regex,
}

impl<'a> Validator<'a> {
    /// Creates a validator with the default settings.
    #[must_use]
    pub fn new(schema: &'a SchemaModel) -> Self {
        Self {
            schema,
            check_capitalization: true,
            camel_case: DEFAULT_CAMEL_CASE.clone(),
        }
    }

    /// Creates a validator with the given settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured camel case pattern does not
    /// compile.
    pub fn with_config(schema: &'a SchemaModel, config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            schema,
            check_capitalization: config.check_capitalization,
            camel_case: config.camel_case()?,
        })
    }

    /// Tokenizes and validates a raw tag string.
    ///
    /// Unbalanced parentheses produce a single `parentheses` error and no
    /// other issue.
    #[instrument(level = "trace", skip(self))]
    pub fn validate_str(&self, raw: &str) -> Vec<Issue> {
        match tokenize(raw) {
            Ok(tree) => self.validate(&tree),
            Err(error) => vec![Issue::unbalanced(&error, raw.trim())],
        }
    }

    /// Validates a token tree.
    ///
    /// Issues come in pass order: top-level tilde checks, per-tag checks in
    /// string order, per-group tilde checks in pre-order, then uniqueness and
    /// required checks in schema declaration order.
    #[must_use]
    pub fn validate(&self, tree: &TokenTree) -> Vec<Issue> {
        let mut issues = Vec::new();

        check_tildes(tree.root(), &tree.to_string(), &mut issues);

        for tag in tree.tags() {
            self.check_tag(tag, &mut issues);
        }

        for group in tree.groups() {
            check_tildes(group, &group.to_string(), &mut issues);
        }

        self.check_context(tree, &mut issues);

        issues
    }

    fn check_tag(&self, raw: &str, issues: &mut Vec<Issue>) {
        let path: TagPath = match raw.parse() {
            Ok(path) => path,
            Err(TagPathError::Empty) => {
                issues.push(Issue::empty_tag());
                return;
            }
            Err(TagPathError::EmptySegment(_)) => {
                issues.push(Issue::invalid_tag(raw));
                return;
            }
        };

        let canonical = path.canonical();
        let known = self.schema.contains(&canonical);
        let placeholder = if known {
            None
        } else {
            path.placeholder_form()
                .filter(|placeholder| self.schema.contains(placeholder))
        };
        let extended = || {
            path.ancestors()
                .any(|ancestor| self.schema.has_attribute(&ancestor, AttributeKind::ExtensionAllowed))
        };

        if !known && placeholder.is_none() && !extended() {
            issues.push(Issue::invalid_tag(raw));
            return;
        }

        if self.schema.has_attribute(&canonical, AttributeKind::RequireChild) {
            issues.push(Issue::require_child(raw));
        }

        if let Some(placeholder) = &placeholder {
            self.check_value(raw, path.last(), placeholder, issues);
        }

        if self.check_capitalization {
            let checked = if placeholder.is_some() {
                path.len() - 1
            } else {
                path.len()
            };
            if path
                .segments()
                .iter()
                .take(checked)
                .any(|segment| !self.is_well_cased(segment))
            {
                issues.push(Issue::capitalization(raw));
            }
        }
    }

    fn check_value(&self, raw: &str, value: &str, placeholder: &str, issues: &mut Vec<Issue>) {
        let numeric = self
            .schema
            .has_attribute(placeholder, AttributeKind::IsNumeric);

        if !self
            .schema
            .has_attribute(placeholder, AttributeKind::UnitClass)
        {
            if numeric && !matches!(split_numeral(value), Some((_, ""))) {
                issues.push(Issue::not_numeric(raw));
            }
            return;
        }

        match split_numeral(value) {
            None if numeric => issues.push(Issue::not_numeric(raw)),
            None | Some((_, "")) => {
                if let Some(unit) = self.schema.default_unit_for_tag(placeholder) {
                    issues.push(Issue::default_unit(raw, unit));
                }
            }
            Some((_, unit)) => {
                let units = self.schema.units_for_tag(placeholder);
                if !units.iter().any(|known| known.eq_ignore_ascii_case(unit)) {
                    issues.push(Issue::invalid_unit(raw, &units));
                }
            }
        }
    }

    /// A segment passes when its first letter is upper case or it matches
    /// the camel case pattern.
    fn is_well_cased(&self, segment: &str) -> bool {
        let capitalized = segment
            .chars()
            .next()
            .is_none_or(|first| first.to_uppercase().eq(std::iter::once(first)));
        capitalized || self.camel_case.is_match(segment)
    }

    fn check_context(&self, tree: &TokenTree, issues: &mut Vec<Issue>) {
        let tags: Vec<(&str, TagPath)> = tree
            .top_level_tags()
            .filter_map(|raw| raw.parse::<TagPath>().ok().map(|path| (raw, path)))
            .collect();

        let unique: Vec<Option<&Scope>> = tags
            .iter()
            .map(|(_, path)| self.schema.unique_scope(path))
            .collect();
        for scope in self.schema.unique_scopes() {
            let members: Vec<&str> = tags
                .iter()
                .zip(&unique)
                .filter(|(_, owner)| owner.is_some_and(|owner| owner.owner() == scope.owner()))
                .map(|((raw, _), _)| *raw)
                .collect();
            if members.len() > 1 {
                issues.extend(
                    members
                        .into_iter()
                        .map(|raw| Issue::multiple_unique(scope.display(), raw)),
                );
            }
        }

        for scope in self.schema.required_scopes() {
            let present = tags.iter().any(|(_, path)| {
                self.schema
                    .required_scope(path)
                    .is_some_and(|owner| owner.owner() == scope.owner())
            });
            if !present {
                issues.push(Issue::missing_required(scope.display()));
            }
        }
    }
}

/// Reports more than two tildes, or a tilde with nothing on one side, in a
/// group or at the top level.
fn check_tildes(group: &TagGroup, text: &str, issues: &mut Vec<Issue>) {
    if group.tilde_count() > 2 {
        issues.push(Issue::too_many_tildes(text));
    } else if group.has_empty_branch() {
        issues.push(Issue::empty_tilde_branch(text));
    }
}

/// Validates a token tree with the default settings.
#[must_use]
pub fn validate(schema: &SchemaModel, tree: &TokenTree) -> Vec<Issue> {
    Validator::new(schema).validate(tree)
}

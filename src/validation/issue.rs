use std::fmt;

use serde::Serialize;

use crate::tag_string::TokenizeError;

/// Whether an issue fails the string or is advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The string is invalid.
    Error,
    /// The string is valid but questionable.
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
        })
    }
}

/// The rule an issue was raised by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Rule {
    /// The tag is not in the schema.
    Valid,
    /// A tag that needs a descendant was used bare.
    RequireChild,
    /// A numeric value is not a number.
    IsNumeric,
    /// A value's unit is wrong or missing.
    UnitClass,
    /// A segment is neither capitalized nor camel case.
    Cap,
    /// Too many or misplaced `~` separators.
    Tilde,
    /// More than one tag from a unique subtree.
    Unique,
    /// No tag from a required subtree.
    Required,
    /// An empty tag between delimiters.
    EmptyTag,
    /// Unbalanced parentheses.
    Parentheses,
}

impl Rule {
    /// The rule identifier used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::RequireChild => "requireChild",
            Self::IsNumeric => "isNumeric",
            Self::UnitClass => "unitClass",
            Self::Cap => "cap",
            Self::Tilde => "tilde",
            Self::Unique => "unique",
            Self::Required => "required",
            Self::EmptyTag => "emptyTag",
            Self::Parentheses => "parentheses",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding of the rule engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    severity: Severity,
    rule: Rule,
    message: String,
    offending: String,
}

impl Issue {
    fn error(rule: Rule, message: String, offending: &str) -> Self {
        Self {
            severity: Severity::Error,
            rule,
            message,
            offending: offending.to_string(),
        }
    }

    fn warning(rule: Rule, message: String, offending: &str) -> Self {
        Self {
            severity: Severity::Warning,
            rule,
            message,
            offending: offending.to_string(),
        }
    }

    pub(crate) fn invalid_tag(tag: &str) -> Self {
        Self::error(Rule::Valid, format!("Invalid HED tag - \"{tag}\""), tag)
    }

    pub(crate) fn empty_tag() -> Self {
        Self::error(Rule::EmptyTag, "Empty tag".to_string(), "")
    }

    pub(crate) fn require_child(tag: &str) -> Self {
        Self::error(
            Rule::RequireChild,
            format!("Descendant tag required - \"{tag}\""),
            tag,
        )
    }

    pub(crate) fn not_numeric(tag: &str) -> Self {
        Self::error(
            Rule::IsNumeric,
            format!("Invalid numeric tag - \"{tag}\""),
            tag,
        )
    }

    pub(crate) fn invalid_unit(tag: &str, units: &[&str]) -> Self {
        Self::error(
            Rule::UnitClass,
            format!(
                "Invalid unit - \"{tag}\" (valid units are \"{}\")",
                units.join(",")
            ),
            tag,
        )
    }

    pub(crate) fn default_unit(tag: &str, unit: &str) -> Self {
        Self::warning(
            Rule::UnitClass,
            format!("No unit specified. Using \"{unit}\" as the default - \"{tag}\""),
            tag,
        )
    }

    pub(crate) fn capitalization(tag: &str) -> Self {
        Self::warning(
            Rule::Cap,
            format!("First word not capitalized or camel case - \"{tag}\""),
            tag,
        )
    }

    pub(crate) fn too_many_tildes(group: &str) -> Self {
        Self::error(
            Rule::Tilde,
            format!("Too many tildes - group \"{group}\""),
            group,
        )
    }

    pub(crate) fn empty_tilde_branch(group: &str) -> Self {
        Self::error(
            Rule::Tilde,
            format!("Empty tilde branch - group \"{group}\""),
            group,
        )
    }

    pub(crate) fn multiple_unique(prefix: &str, tag: &str) -> Self {
        Self::error(
            Rule::Unique,
            format!("Multiple unique tags (prefix \"{prefix}\") - \"{tag}\""),
            tag,
        )
    }

    pub(crate) fn missing_required(prefix: &str) -> Self {
        Self::error(
            Rule::Required,
            format!("Tag with prefix \"{prefix}\" is required"),
            prefix,
        )
    }

    pub(crate) fn unbalanced(error: &TokenizeError, raw: &str) -> Self {
        let TokenizeError::UnbalancedParentheses { opening, closing } = error;
        Self::error(
            Rule::Parentheses,
            format!(
                "Number of opening and closing parentheses are unequal. {opening} opening \
                 parentheses. {closing} closing parentheses"
            ),
            raw,
        )
    }

    /// Error or warning.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// The rule that raised the issue.
    #[must_use]
    pub const fn rule(&self) -> Rule {
        self.rule
    }

    /// Human-readable description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The tag, group or prefix the issue is about.
    #[must_use]
    pub fn offending(&self) -> &str {
        &self.offending
    }

    /// Whether the issue is an error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_severity() {
        assert_eq!(
            Issue::invalid_tag("This/Is/A/Tag").to_string(),
            "ERROR: Invalid HED tag - \"This/Is/A/Tag\""
        );
        assert_eq!(
            Issue::default_unit("Attribute/Duration/5", "ms").to_string(),
            "WARNING: No unit specified. Using \"ms\" as the default - \"Attribute/Duration/5\""
        );
    }

    #[test]
    fn serializes_rule_and_severity_names() {
        let json = serde_json::to_value(Issue::multiple_unique("Event/Category", "x")).unwrap();
        assert_eq!(json["severity"], "error");
        assert_eq!(json["rule"], "unique");
        assert_eq!(json["offending"], "x");
    }
}

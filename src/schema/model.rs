//! Read-only schema registry used by the validator.
//!
//! The [`SchemaModel`] is built once from a [`SchemaTree`] and then queried by
//! canonical (lower-cased) tag path. Subtree-scoped attributes are resolved at
//! load time into scope tables, so validation never walks ancestors of the
//! schema again.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::instrument;

use crate::{
    schema::{AttributeKind, Attributes, NodeId, SchemaTree, UnitClass},
    tag_string::TagPath,
};

/// A schema tag as registered in the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEntry {
    path: String,
    attributes: Attributes,
    is_leaf: bool,
    is_placeholder: bool,
}

impl TagEntry {
    /// The tag path in its original casing.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The attributes declared directly on the node.
    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Whether the node has no children.
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        self.is_leaf
    }

    /// Whether the node is a value placeholder (`#`).
    #[must_use]
    pub const fn is_placeholder(&self) -> bool {
        self.is_placeholder
    }
}

/// A subtree-scoped declaration: the node that declared it and every node
/// inside its subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    owner: String,
    display: String,
    members: BTreeSet<String>,
}

impl Scope {
    /// Canonical path of the declaring node.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Path of the declaring node in its original casing.
    #[must_use]
    pub fn display(&self) -> &str {
        &self.display
    }

    /// Canonical paths of every member, the owner included.
    #[must_use]
    pub const fn members(&self) -> &BTreeSet<String> {
        &self.members
    }
}

/// The scopes of one subtree-scoped attribute, in declaration order.
#[derive(Debug, Clone, Default)]
struct ScopeTable {
    scopes: Vec<Scope>,
    member_of: HashMap<String, usize>,
}

impl ScopeTable {
    fn open(&mut self, owner: String, display: String) -> usize {
        let index = self.scopes.len();
        self.scopes.push(Scope {
            owner,
            display,
            members: BTreeSet::new(),
        });
        index
    }

    fn add_member(&mut self, scope: usize, path: &str) {
        self.scopes[scope].members.insert(path.to_string());
        self.member_of.insert(path.to_string(), scope);
    }

    /// Finds the scope containing a tag, trying its exact path, its
    /// placeholder form and then its ancestors (for extended tags).
    fn resolve(&self, path: &TagPath) -> Option<&Scope> {
        std::iter::once(path.canonical())
            .chain(path.placeholder_form())
            .chain(path.ancestors())
            .find_map(|candidate| self.member_of.get(&candidate))
            .map(|&index| &self.scopes[index])
    }
}

/// Tracks the one active scope of a subtree-scoped attribute during the
/// load-time traversal.
#[derive(Debug, Clone, Copy)]
struct ActiveScope {
    owner: NodeId,
    index: usize,
}

/// Errors that make a schema tree unusable.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SchemaError {
    /// Two nodes resolve to the same case-insensitive path.
    #[error("duplicate schema tag '{0}'")]
    DuplicatePath(String),
    /// A placeholder references a unit class that is not defined.
    #[error("tag '{tag}' references undefined unit class '{unit_class}'")]
    UnknownUnitClass {
        /// The referencing tag path.
        tag: String,
        /// The missing unit class name.
        unit_class: String,
    },
    /// Two unit classes share a name.
    #[error("duplicate unit class '{0}'")]
    DuplicateUnitClass(String),
}

/// A loaded, immutable schema.
#[derive(Debug, Clone, Default)]
pub struct SchemaModel {
    tags: HashMap<String, TagEntry>,
    index: HashMap<AttributeKind, HashSet<String>>,
    unique: ScopeTable,
    required: ScopeTable,
    unit_classes: HashMap<String, UnitClass>,
}

impl SchemaModel {
    /// Builds the model from a schema tree.
    ///
    /// # Errors
    ///
    /// Returns an error if two nodes share a canonical path, if two unit
    /// classes share a name, or if a placeholder references a unit class that
    /// is not defined. No partial model is returned.
    #[instrument(level = "debug", skip(tree), fields(nodes = tree.len()))]
    pub fn load(tree: &SchemaTree) -> Result<Self, SchemaError> {
        let mut model = Self::default();

        for unit_class in tree.unit_classes() {
            let key = unit_class.name().to_lowercase();
            if model.unit_classes.contains_key(&key) {
                return Err(SchemaError::DuplicateUnitClass(unit_class.name().to_string()));
            }
            model.unit_classes.insert(key, unit_class.clone());
        }

        let mut open: Vec<NodeId> = Vec::new();
        let mut canonical: Vec<String> = Vec::new();
        let mut active_unique: Option<ActiveScope> = None;
        let mut active_required: Option<ActiveScope> = None;

        for (id, node, _) in tree.depth_first() {
            // Backtrack until the stack holds exactly the node's ancestors.
            while open.last().is_some_and(|&top| Some(top) != node.parent()) {
                open.pop();
                canonical.pop();
            }

            let path = match canonical.last() {
                Some(parent) => format!("{parent}/{}", node.name().to_lowercase()),
                None => node.name().to_lowercase(),
            };
            let display = tree.path(id);

            if model.tags.contains_key(&path) {
                return Err(SchemaError::DuplicatePath(display));
            }

            for unit_class in node.attributes().values(AttributeKind::UnitClass) {
                if !model.unit_classes.contains_key(&unit_class.to_lowercase()) {
                    return Err(SchemaError::UnknownUnitClass {
                        tag: display,
                        unit_class: unit_class.to_string(),
                    });
                }
            }

            // Subtree-scoped kinds are indexed from their scope tables below.
            for (kind, _) in node.attributes().iter() {
                if !kind.is_subtree_scoped() {
                    model.index.entry(kind).or_default().insert(path.clone());
                }
            }

            active_unique = propagate(
                &mut model.unique,
                active_unique,
                &open,
                (id, &path, &display),
                node.attributes().contains(AttributeKind::Unique),
            );
            active_required = propagate(
                &mut model.required,
                active_required,
                &open,
                (id, &path, &display),
                node.attributes().contains(AttributeKind::Required),
            );

            model.tags.insert(
                path.clone(),
                TagEntry {
                    path: display,
                    attributes: node.attributes().clone(),
                    is_leaf: node.children().is_empty(),
                    is_placeholder: node.is_placeholder(),
                },
            );

            open.push(id);
            canonical.push(path);
        }

        for (kind, table) in [
            (AttributeKind::Unique, &model.unique),
            (AttributeKind::Required, &model.required),
        ] {
            let members = model.index.entry(kind).or_default();
            members.extend(table.member_of.keys().cloned());
        }

        tracing::debug!(
            tags = model.tags.len(),
            unit_classes = model.unit_classes.len(),
            unique_scopes = model.unique.scopes.len(),
            required_scopes = model.required.scopes.len(),
            "schema loaded"
        );

        Ok(model)
    }

    /// Whether the canonical path names a schema tag.
    #[must_use]
    pub fn contains(&self, canonical_path: &str) -> bool {
        self.tags.contains_key(canonical_path)
    }

    /// The registered tag for a canonical path.
    #[must_use]
    pub fn tag(&self, canonical_path: &str) -> Option<&TagEntry> {
        self.tags.get(canonical_path)
    }

    /// Number of registered tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether the schema has no tags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Whether the tag has the attribute, directly or (for `Unique` and
    /// `Required`) through an ancestor's scope.
    #[must_use]
    pub fn has_attribute(&self, canonical_path: &str, kind: AttributeKind) -> bool {
        self.index
            .get(&kind)
            .is_some_and(|paths| paths.contains(canonical_path))
    }

    /// The value of an attribute declared directly on the tag.
    #[must_use]
    pub fn attribute_value(&self, canonical_path: &str, kind: AttributeKind) -> Option<&str> {
        self.tags
            .get(canonical_path)
            .and_then(|entry| entry.attributes.value(kind))
    }

    /// The units of a unit class, matched case-insensitively by name.
    #[must_use]
    pub fn units_for(&self, unit_class: &str) -> Option<BTreeSet<String>> {
        self.unit_class(unit_class).map(UnitClass::unit_set)
    }

    /// The default unit of a unit class.
    #[must_use]
    pub fn default_unit_for(&self, unit_class: &str) -> Option<&str> {
        self.unit_class(unit_class).and_then(UnitClass::default_unit)
    }

    /// Looks up a unit class case-insensitively.
    #[must_use]
    pub fn unit_class(&self, name: &str) -> Option<&UnitClass> {
        self.unit_classes.get(&name.trim().to_lowercase())
    }

    /// The units accepted by a placeholder: the union of the units of every
    /// unit class it references, in declaration order.
    #[must_use]
    pub fn units_for_tag(&self, placeholder_path: &str) -> Vec<&str> {
        let mut units: Vec<&str> = Vec::new();
        let Some(entry) = self.tags.get(placeholder_path) else {
            return units;
        };
        for unit_class in entry.attributes.values(AttributeKind::UnitClass) {
            for unit in self.unit_class(unit_class).into_iter().flat_map(UnitClass::units) {
                if !units.contains(&unit.as_str()) {
                    units.push(unit);
                }
            }
        }
        units
    }

    /// The unit assumed for a placeholder value without one: the node's own
    /// `default` attribute, else the default of its first unit class.
    #[must_use]
    pub fn default_unit_for_tag(&self, placeholder_path: &str) -> Option<&str> {
        let entry = self.tags.get(placeholder_path)?;
        entry.attributes.value(AttributeKind::Default).or_else(|| {
            entry
                .attributes
                .values(AttributeKind::UnitClass)
                .find_map(|unit_class| self.default_unit_for(unit_class))
        })
    }

    /// The unique scope whose subtree contains the tag.
    #[must_use]
    pub fn unique_scope(&self, path: &TagPath) -> Option<&Scope> {
        self.unique.resolve(path)
    }

    /// The required scope whose subtree contains the tag.
    #[must_use]
    pub fn required_scope(&self, path: &TagPath) -> Option<&Scope> {
        self.required.resolve(path)
    }

    /// Every unique scope, in schema declaration order.
    #[must_use]
    pub fn unique_scopes(&self) -> &[Scope] {
        &self.unique.scopes
    }

    /// Every required scope, in schema declaration order.
    #[must_use]
    pub fn required_scopes(&self) -> &[Scope] {
        &self.required.scopes
    }

    /// Makes every leaf tag that is not a placeholder accept extensions.
    pub(crate) fn allow_leaf_extension(&mut self) {
        let leaves = self
            .tags
            .iter()
            .filter(|(_, entry)| entry.is_leaf && !entry.is_placeholder)
            .map(|(path, _)| path.clone());
        self.index
            .entry(AttributeKind::ExtensionAllowed)
            .or_default()
            .extend(leaves.collect::<Vec<_>>());
    }
}

/// Advances one subtree-scoped attribute's traversal state for the node being
/// entered and returns the new active scope.
///
/// `open` holds exactly the node's ancestors.
fn propagate(
    table: &mut ScopeTable,
    active: Option<ActiveScope>,
    open: &[NodeId],
    (id, path, display): (NodeId, &str, &str),
    declares: bool,
) -> Option<ActiveScope> {
    let active = active.filter(|scope| open.contains(&scope.owner));

    match active {
        Some(scope) => {
            table.add_member(scope.index, path);
            Some(scope)
        }
        None if declares => {
            let index = table.open(path.to_string(), display.to_string());
            table.add_member(index, path);
            Some(ActiveScope { owner: id, index })
        }
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use non_empty_string::NonEmptyString;

    use super::*;
    use crate::test_support::{REQUIRED_SCHEMA, SCHEMA, schema_tree};

    fn model() -> SchemaModel {
        SchemaModel::load(&schema_tree(SCHEMA)).unwrap()
    }

    #[test]
    fn registers_every_node_by_canonical_path() {
        let model = model();
        assert!(model.contains("event/label/#"));
        assert_eq!(model.tag("event/label").unwrap().path(), "Event/Label");
        assert!(!model.contains("Event/Label"));
    }

    #[test]
    fn indexes_direct_attributes() {
        let model = model();
        assert!(model.has_attribute("event/label/#", AttributeKind::TakesValue));
        assert!(model.has_attribute("event/category", AttributeKind::RequireChild));
        assert!(!model.has_attribute("event/label", AttributeKind::TakesValue));
        assert_eq!(
            model.attribute_value("attribute/temporal rate/#", AttributeKind::UnitClass),
            Some("frequency")
        );
    }

    #[test]
    fn unique_scope_covers_the_subtree() {
        let model = model();
        let scopes = model.unique_scopes();
        let owners: Vec<_> = scopes.iter().map(Scope::display).collect();
        assert_eq!(owners, ["Event/Category", "Sensory presentation"]);

        let category = &scopes[0];
        assert!(category.members().contains("event/category"));
        assert!(category.members().contains("event/category/experimental stimulus"));
        assert!(category.members().contains("event/category/participant response"));
        assert!(!category.members().contains("sensory presentation"));

        // Members are indexed, but carry no attribute of their own.
        assert!(model.has_attribute("event/category/participant response", AttributeKind::Unique));
        assert!(
            !model
                .tag("event/category/participant response")
                .unwrap()
                .attributes()
                .contains(AttributeKind::Unique)
        );
    }

    #[test]
    fn nested_declaration_joins_the_enclosing_scope() {
        // Experimental stimulus declares unique itself, inside Event/Category.
        let model = model();
        assert_eq!(model.unique_scopes().len(), 2);
        let path: TagPath = "Event/Category/Experimental stimulus".parse().unwrap();
        assert_eq!(model.unique_scope(&path).unwrap().display(), "Event/Category");
    }

    #[test]
    fn scope_resolution_handles_values_and_extensions() {
        let model = model();
        let required = SchemaModel::load(&schema_tree(REQUIRED_SCHEMA)).unwrap();
        let value: TagPath = "Event/Label/Anything".parse().unwrap();
        assert_eq!(required.required_scope(&value).unwrap().display(), "Event/Label");

        let extended: TagPath = "Sensory presentation/Visual/Extra".parse().unwrap();
        assert_eq!(
            model.unique_scope(&extended).unwrap().display(),
            "Sensory presentation"
        );

        let outside: TagPath = "Item/Object".parse().unwrap();
        assert!(model.unique_scope(&outside).is_none());
    }

    #[test]
    fn unit_class_queries() {
        let model = model();
        assert!(model.units_for("FREQUENCY").unwrap().contains("Hz"));
        assert_eq!(model.default_unit_for("time"), Some("s"));
        assert_eq!(model.units_for("mass"), None);
        assert_eq!(model.units_for_tag("attribute/temporal rate/#"), ["Hz", "kHz"]);
        assert_eq!(
            model.default_unit_for_tag("attribute/temporal rate/#"),
            Some("Hz")
        );
        assert_eq!(model.default_unit_for_tag("attribute/duration/#"), Some("ms"));
    }

    #[test]
    fn duplicate_paths_are_fatal() {
        let name = |s: &str| NonEmptyString::new(s.to_string()).unwrap();
        let mut tree = SchemaTree::new();
        let event = tree.add_node(None, name("Event"), Attributes::new(), None);
        tree.add_node(Some(event), name("Label"), Attributes::new(), None);
        tree.add_node(Some(event), name("label"), Attributes::new(), None);

        assert_eq!(
            SchemaModel::load(&tree).unwrap_err(),
            SchemaError::DuplicatePath("Event/label".into())
        );
    }

    #[test]
    fn undefined_unit_class_is_fatal() {
        let tree = schema_tree("Attribute\n● Size\n○ # {takesValue, unitClass=length}\n");
        assert_eq!(
            SchemaModel::load(&tree).unwrap_err(),
            SchemaError::UnknownUnitClass {
                tag: "Attribute/Size/#".into(),
                unit_class: "length".into(),
            }
        );
    }

    #[test]
    fn leaf_extension_marks_plain_leaves_only() {
        let mut model = model();
        model.allow_leaf_extension();
        assert!(model.has_attribute("item/object", AttributeKind::ExtensionAllowed));
        assert!(!model.has_attribute("event/label/#", AttributeKind::ExtensionAllowed));
        assert!(!model.has_attribute("event", AttributeKind::ExtensionAllowed));
    }

    #[test]
    fn leaf_named_with_a_trailing_hash_is_extensible() {
        let mut model =
            SchemaModel::load(&schema_tree("Language\n● C#\n● Rust\n○ #\n")).unwrap();
        model.allow_leaf_extension();
        assert!(model.tag("language/c#").is_some_and(|entry| !entry.is_placeholder()));
        assert!(model.has_attribute("language/c#", AttributeKind::ExtensionAllowed));
        assert!(!model.has_attribute("language/rust/#", AttributeKind::ExtensionAllowed));
    }
}

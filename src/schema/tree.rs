//! In-memory schema tree
//!
//! The [`SchemaTree`] is the shape shared by the compiler (which produces it
//! from text), the canonical document format, and the [`SchemaModel`] (which
//! consumes it). Nodes live in an arena and refer to their parent by index.
//!
//! [`SchemaModel`]: crate::schema::SchemaModel

use std::collections::BTreeSet;

use non_empty_string::NonEmptyString;

use crate::schema::Attributes;

/// The name of a placeholder node, which stands in for a user-supplied value.
pub const PLACEHOLDER: &str = "#";

/// Index of a node in a [`SchemaTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

/// A single node of the schema hierarchy.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    name: NonEmptyString,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: Attributes,
    description: Option<String>,
}

impl SchemaNode {
    /// The node's own name (one path segment).
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// The parent node, or `None` for a top-level node.
    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child nodes in declaration order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The attributes declared directly on this node.
    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Free-text description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Whether this node is a value placeholder (`#`).
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.name() == PLACEHOLDER
    }
}

/// A named set of units accepted by placeholder values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitClass {
    name: NonEmptyString,
    units: Vec<String>,
    default_unit: Option<String>,
}

impl UnitClass {
    /// Creates a unit class.
    ///
    /// Units and the default are trimmed. Duplicate and blank units are
    /// dropped; declaration order is kept.
    #[must_use]
    pub fn new(
        name: NonEmptyString,
        units: impl IntoIterator<Item = String>,
        default_unit: Option<String>,
    ) -> Self {
        let mut unit_class = Self {
            name,
            units: Vec::new(),
            default_unit: default_unit
                .map(|unit| unit.trim().to_string())
                .filter(|unit| !unit.is_empty()),
        };
        unit_class.extend(units);
        unit_class
    }

    /// Appends units, skipping blanks and duplicates.
    pub fn extend(&mut self, units: impl IntoIterator<Item = String>) {
        for unit in units {
            let unit = unit.trim();
            if !unit.is_empty() && !self.units.iter().any(|known| known == unit) {
                self.units.push(unit.to_string());
            }
        }
    }

    /// The unit class name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// The units in declaration order.
    #[must_use]
    pub fn units(&self) -> &[String] {
        &self.units
    }

    /// The units as a set.
    #[must_use]
    pub fn unit_set(&self) -> BTreeSet<String> {
        self.units.iter().cloned().collect()
    }

    /// The unit explicitly declared as default, if any.
    #[must_use]
    pub fn declared_default(&self) -> Option<&str> {
        self.default_unit.as_deref()
    }

    /// The effective default unit.
    ///
    /// Falls back to the first listed unit when no default was declared.
    #[must_use]
    pub fn default_unit(&self) -> Option<&str> {
        self.default_unit
            .as_deref()
            .or_else(|| self.units.first().map(String::as_str))
    }
}

/// A schema hierarchy and its unit-class table.
#[derive(Debug, Clone, Default)]
pub struct SchemaTree {
    nodes: Vec<SchemaNode>,
    roots: Vec<NodeId>,
    unit_classes: Vec<UnitClass>,
}

impl SchemaTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node under `parent` (or at the top level) and returns its
    /// id.
    ///
    /// # Panics
    ///
    /// Panics if `parent` does not belong to this tree.
    pub fn add_node(
        &mut self,
        parent: Option<NodeId>,
        name: NonEmptyString,
        attributes: Attributes,
        description: Option<String>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        match parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.roots.push(id),
        }
        self.nodes.push(SchemaNode {
            name,
            parent,
            children: Vec::new(),
            attributes,
            description,
        });
        id
    }

    /// Appends a unit class.
    pub fn add_unit_class(&mut self, unit_class: UnitClass) {
        self.unit_classes.push(unit_class);
    }

    /// Looks up a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.0]
    }

    /// Top-level nodes in declaration order.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// The unit classes in declaration order.
    #[must_use]
    pub fn unit_classes(&self) -> &[UnitClass] {
        &self.unit_classes
    }

    /// Mutable access to the most recently added unit class.
    pub fn last_unit_class_mut(&mut self) -> Option<&mut UnitClass> {
        self.unit_classes.last_mut()
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Walks the tree depth-first in declaration order, yielding each node
    /// together with its depth (0 for top-level nodes).
    pub fn depth_first(&self) -> DepthFirst<'_> {
        DepthFirst {
            tree: self,
            stack: self.roots.iter().rev().map(|&id| (id, 0)).collect(),
        }
    }

    /// The `/`-joined path of a node, in its original casing.
    #[must_use]
    pub fn path(&self, id: NodeId) -> String {
        let mut segments = vec![self.node(id).name()];
        let mut current = self.node(id).parent;
        while let Some(parent) = current {
            segments.push(self.node(parent).name());
            current = self.node(parent).parent;
        }
        segments.reverse();
        segments.join("/")
    }
}

/// Equality is structural: two trees are equal when they describe the same
/// hierarchy and unit classes, whatever order their arenas were filled in.
impl PartialEq for SchemaTree {
    fn eq(&self, other: &Self) -> bool {
        fn same_subtrees(
            left: &SchemaTree,
            left_ids: &[NodeId],
            right: &SchemaTree,
            right_ids: &[NodeId],
        ) -> bool {
            left_ids.len() == right_ids.len()
                && left_ids.iter().zip(right_ids).all(|(&l, &r)| {
                    let (l, r) = (left.node(l), right.node(r));
                    l.name == r.name
                        && l.attributes == r.attributes
                        && l.description == r.description
                        && same_subtrees(left, &l.children, right, &r.children)
                })
        }

        self.unit_classes == other.unit_classes
            && same_subtrees(self, &self.roots, other, &other.roots)
    }
}

impl Eq for SchemaTree {}

/// Pre-order iterator returned by [`SchemaTree::depth_first`].
#[derive(Debug)]
pub struct DepthFirst<'a> {
    tree: &'a SchemaTree,
    stack: Vec<(NodeId, usize)>,
}

impl<'a> Iterator for DepthFirst<'a> {
    type Item = (NodeId, &'a SchemaNode, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (id, depth) = self.stack.pop()?;
        let node = self.tree.node(id);
        self.stack
            .extend(node.children.iter().rev().map(|&child| (child, depth + 1)));
        Some((id, node, depth))
    }
}

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// The closed set of attributes a schema node can carry.
///
/// Variants are ordered the way attribute blocks are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeKind {
    /// Bare use of the tag is invalid; a descendant must be given.
    RequireChild,
    /// The node is a placeholder that accepts a free value.
    TakesValue,
    /// The placeholder value must be numeric.
    IsNumeric,
    /// Every tag string must contain a tag from this node's subtree.
    Required,
    /// A tag from this subtree should be present. Informational only.
    Recommended,
    /// Preferred position of the tag within a string. Informational only.
    Position,
    /// At most one tag from this node's subtree may appear per string.
    Unique,
    /// Comma-separated names of the unit classes accepted by a placeholder.
    UnitClass,
    /// Arbitrary descendants not listed in the schema are accepted.
    ExtensionAllowed,
    /// The unit assumed when a value is given without one.
    Default,
}

impl AttributeKind {
    /// Every attribute kind, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::RequireChild,
        Self::TakesValue,
        Self::IsNumeric,
        Self::Required,
        Self::Recommended,
        Self::Position,
        Self::Unique,
        Self::UnitClass,
        Self::ExtensionAllowed,
        Self::Default,
    ];

    /// The name used in text schemas and canonical documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RequireChild => "requireChild",
            Self::TakesValue => "takesValue",
            Self::IsNumeric => "isNumeric",
            Self::Required => "required",
            Self::Recommended => "recommended",
            Self::Position => "position",
            Self::Unique => "unique",
            Self::UnitClass => "unitClass",
            Self::ExtensionAllowed => "extensionAllowed",
            Self::Default => "default",
        }
    }

    /// Whether a declaration binds the declaring node's whole subtree.
    #[must_use]
    pub const fn is_subtree_scoped(self) -> bool {
        matches!(self, Self::Unique | Self::Required)
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a known attribute.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown attribute '{0}'")]
pub struct UnknownAttributeError(pub String);

impl FromStr for AttributeKind {
    type Err = UnknownAttributeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownAttributeError(s.to_string()))
    }
}

/// The attributes declared on a single schema node.
///
/// A `None` value is a boolean "present" marker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<AttributeKind, Option<String>>);

impl Attributes {
    /// Creates an empty attribute map.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Declares an attribute, accumulating repeated declarations.
    ///
    /// A second value for the same kind is appended to the first as a
    /// comma-separated list. List items are trimmed and blank items dropped,
    /// so a blank value declares a bare marker. A bare marker never erases an
    /// existing value.
    pub fn declare(&mut self, kind: AttributeKind, value: Option<String>) {
        let items: Vec<&str> = value
            .iter()
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .collect();

        let slot = self.0.entry(kind).or_insert(None);
        if items.is_empty() {
            return;
        }
        let value = items.join(",");
        match slot {
            Some(existing) => {
                existing.push(',');
                existing.push_str(&value);
            }
            None => *slot = Some(value),
        }
    }

    /// Whether the attribute is declared.
    #[must_use]
    pub fn contains(&self, kind: AttributeKind) -> bool {
        self.0.contains_key(&kind)
    }

    /// The declared value, if the attribute carries one.
    #[must_use]
    pub fn value(&self, kind: AttributeKind) -> Option<&str> {
        self.0.get(&kind).and_then(Option::as_deref)
    }

    /// The comma-separated items of a list-valued attribute, trimmed.
    pub fn values(&self, kind: AttributeKind) -> impl Iterator<Item = &str> {
        self.value(kind)
            .into_iter()
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .filter(|item| !item.is_empty())
    }

    /// Iterates over the declared attributes in rendering order.
    pub fn iter(&self) -> impl Iterator<Item = (AttributeKind, Option<&str>)> {
        self.0.iter().map(|(kind, value)| (*kind, value.as_deref()))
    }

    /// Whether no attribute is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(AttributeKind, Option<String>)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (AttributeKind, Option<String>)>>(iter: T) -> Self {
        let mut attributes = Self::new();
        for (kind, value) in iter {
            attributes.declare(kind, value);
        }
        attributes
    }
}

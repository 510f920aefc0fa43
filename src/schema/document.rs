//! Canonical serialized form of a schema tree.
//!
//! The arena of a [`SchemaTree`] is flattened into nested nodes for JSON and
//! YAML. The document carries a `_version` tag so the on-disk format can
//! evolve without breaking existing files.

use non_empty_string::NonEmptyString;
use serde::{Deserialize, Serialize};

use crate::schema::{Attributes, NodeId, SchemaTree, UnitClass};

/// A schema node as it appears in a canonical document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct NodeDocument {
    name: String,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    attributes: Attributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<NodeDocument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct UnitClassDocument {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<String>,
    units: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default)]
        nodes: Vec<NodeDocument>,
        #[serde(default, rename = "unitClasses", skip_serializing_if = "Vec::is_empty")]
        unit_classes: Vec<UnitClassDocument>,
    },
}

/// Errors raised while turning a canonical document into a tree.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// The JSON text could not be parsed.
    #[error("failed to parse JSON schema document")]
    Json(#[from] serde_json::Error),
    /// The YAML text could not be parsed.
    #[error("failed to parse YAML schema document")]
    Yaml(#[from] serde_yaml::Error),
    /// A node has an empty name.
    #[error("schema node under '{parent}' has an empty name")]
    EmptyNodeName {
        /// Path of the parent node, empty at the top level.
        parent: String,
    },
    /// A unit class has an empty name.
    #[error("unit class with an empty name")]
    EmptyUnitClassName,
}

impl SchemaTree {
    /// Parses a canonical JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a name is empty.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let document: Versions = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    /// Parses a canonical YAML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or a name is empty.
    pub fn from_yaml(yaml: &str) -> Result<Self, DocumentError> {
        let document: Versions = serde_yaml::from_str(yaml)?;
        Self::from_document(document)
    }

    /// Serializes the tree as a canonical JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.to_document())
    }

    /// Serializes the tree as a canonical YAML document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self.to_document())
    }

    fn to_document(&self) -> Versions {
        fn node_document(tree: &SchemaTree, id: NodeId) -> NodeDocument {
            let node = tree.node(id);
            NodeDocument {
                name: node.name().to_string(),
                attributes: node.attributes().clone(),
                description: node.description().map(str::to_string),
                children: node
                    .children()
                    .iter()
                    .map(|&child| node_document(tree, child))
                    .collect(),
            }
        }

        Versions::V1 {
            nodes: self
                .roots()
                .iter()
                .map(|&root| node_document(self, root))
                .collect(),
            unit_classes: self
                .unit_classes()
                .iter()
                .map(|unit_class| UnitClassDocument {
                    name: unit_class.name().to_string(),
                    default: unit_class.declared_default().map(str::to_string),
                    units: unit_class.units().to_vec(),
                })
                .collect(),
        }
    }

    fn from_document(document: Versions) -> Result<Self, DocumentError> {
        fn insert(
            tree: &mut SchemaTree,
            parent: Option<NodeId>,
            node: NodeDocument,
        ) -> Result<(), DocumentError> {
            let name = NonEmptyString::new(node.name.trim().to_string()).map_err(|_| {
                DocumentError::EmptyNodeName {
                    parent: parent.map(|id| tree.path(id)).unwrap_or_default(),
                }
            })?;
            // Same normal form as the compiler produces.
            let attributes = node
                .attributes
                .iter()
                .map(|(kind, value)| (kind, value.map(str::to_string)))
                .collect();
            let description = node
                .description
                .map(|description| description.trim().to_string())
                .filter(|description| !description.is_empty());
            let id = tree.add_node(parent, name, attributes, description);
            node.children
                .into_iter()
                .try_for_each(|child| insert(tree, Some(id), child))
        }

        let Versions::V1 {
            nodes,
            unit_classes,
        } = document;

        let mut tree = Self::new();
        for node in nodes {
            insert(&mut tree, None, node)?;
        }
        for unit_class in unit_classes {
            let name = NonEmptyString::new(unit_class.name.trim().to_string())
                .map_err(|_| DocumentError::EmptyUnitClassName)?;
            tree.add_unit_class(UnitClass::new(name, unit_class.units, unit_class.default));
        }
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AttributeKind;

    const DOCUMENT: &str = r##"{
        "_version": "1",
        "nodes": [
            {
                "name": "Attribute",
                "children": [
                    {
                        "name": "Temporal rate",
                        "children": [
                            {
                                "name": "#",
                                "attributes": { "takesValue": null, "unitClass": "frequency" }
                            }
                        ]
                    }
                ]
            }
        ],
        "unitClasses": [
            { "name": "frequency", "default": "Hz", "units": ["Hz", "kHz"] }
        ]
    }"##;

    #[test]
    fn reads_json_document() {
        let tree = SchemaTree::from_json(DOCUMENT).unwrap();
        let paths: Vec<_> = tree.depth_first().map(|(id, ..)| tree.path(id)).collect();
        assert_eq!(
            paths,
            ["Attribute", "Attribute/Temporal rate", "Attribute/Temporal rate/#"]
        );

        let (_, placeholder, _) = tree.depth_first().last().unwrap();
        assert!(placeholder.attributes().contains(AttributeKind::TakesValue));
        assert_eq!(
            placeholder.attributes().value(AttributeKind::UnitClass),
            Some("frequency")
        );
        assert_eq!(tree.unit_classes()[0].default_unit(), Some("Hz"));
    }

    #[test]
    fn json_and_yaml_round_trip() {
        let tree = SchemaTree::from_json(DOCUMENT).unwrap();
        assert_eq!(SchemaTree::from_json(&tree.to_json().unwrap()).unwrap(), tree);
        assert_eq!(SchemaTree::from_yaml(&tree.to_yaml().unwrap()).unwrap(), tree);
    }

    #[test]
    fn blank_text_is_normalized() {
        let tree = SchemaTree::from_json(
            r#"{
                "_version": "1",
                "nodes": [
                    {
                        "name": " Event ",
                        "description": "  ",
                        "attributes": { "default": "", "unitClass": " time, ,frequency" }
                    }
                ],
                "unitClasses": [ { "name": " time ", "default": " s ", "units": ["s"] } ]
            }"#,
        )
        .unwrap();

        let (_, event, _) = tree.depth_first().next().unwrap();
        assert_eq!(event.name(), "Event");
        assert_eq!(event.description(), None);
        assert!(event.attributes().contains(AttributeKind::Default));
        assert_eq!(event.attributes().value(AttributeKind::Default), None);
        assert_eq!(
            event.attributes().value(AttributeKind::UnitClass),
            Some("time,frequency")
        );
        assert_eq!(tree.unit_classes()[0].name(), "time");
        assert_eq!(tree.unit_classes()[0].declared_default(), Some("s"));
    }

    #[test]
    fn missing_version_is_rejected() {
        let result = SchemaTree::from_json(r#"{ "nodes": [] }"#);
        assert!(matches!(result, Err(DocumentError::Json(_))));
    }

    #[test]
    fn empty_node_name_is_rejected() {
        let result = SchemaTree::from_json(
            r#"{ "_version": "1", "nodes": [ { "name": "Event", "children": [ { "name": "" } ] } ] }"#,
        );
        assert!(matches!(
            result,
            Err(DocumentError::EmptyNodeName { parent }) if parent == "Event"
        ));
    }
}

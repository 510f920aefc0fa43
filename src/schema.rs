//! HED schemas.
//!
//! A schema is a tree of named nodes carrying attributes, plus a table of
//! unit classes. It reaches this crate as a [`SchemaTree`] (compiled from the
//! text format or read from a canonical document) and is then loaded into a
//! [`SchemaModel`] for validation.

mod attribute;
pub use attribute::{AttributeKind, Attributes, UnknownAttributeError};

mod document;
pub use document::DocumentError;

mod model;
pub use model::{SchemaError, SchemaModel, Scope, TagEntry};

mod source;
pub use source::{SchemaSource, SourceError};

/// The schema tree and its arena.
pub mod tree;
pub use tree::{DepthFirst, NodeId, SchemaNode, SchemaTree, UnitClass};

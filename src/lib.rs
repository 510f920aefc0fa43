//! HED tag validation and schema compilation
//!
//! Tag strings are checked against a HED schema loaded from the bulleted
//! text format or from a canonical JSON/YAML document.

pub mod compiler;
pub use compiler::{CompileError, Compiler, Lint, compile, render, render_xml};

pub mod config;
pub use config::{Config, ConfigError};

pub mod input;
pub use input::{Row, RowReader};

pub mod schema;
pub use schema::{SchemaModel, SchemaSource, SchemaTree, SourceError};

pub mod tag_string;
pub use tag_string::{TagPath, TokenTree, tokenize};

pub mod validation;
pub use validation::{Issue, Report, Rule, Severity, Validator, validate_rows};

#[cfg(test)]
mod test_support;

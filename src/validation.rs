//! The rule engine.
//!
//! A [`Validator`] checks a tokenized tag string against a loaded
//! [`SchemaModel`](crate::schema::SchemaModel) and returns the violations as
//! data. Only unbalanced parentheses stop a string's checks early; every
//! other finding is collected and checking carries on.
//!
//! ```
//! use hed::{SchemaModel, Validator, compile};
//!
//! let tree = compile(["Event", "● Label {requireChild}", "○ # {takesValue}"])?;
//! let schema = SchemaModel::load(&tree)?;
//!
//! let issues = Validator::new(&schema).validate_str("Event/Label/Start, Event/Label");
//! assert_eq!(issues.len(), 1);
//! assert_eq!(issues[0].rule().as_str(), "requireChild");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod issue;
pub use issue::{Issue, Rule, Severity};

mod report;
pub use report::{Report, RowReport, validate_rows};

mod rules;
pub use rules::{Validator, validate};

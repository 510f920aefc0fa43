//! The tag string grammar.
//!
//! A tag string is a comma-separated list of slash-path tags. Parentheses
//! group tags (groups nest), and `~` separates mutually exclusive branches of
//! a group or of the top level:
//!
//! ```text
//! Event/Label/Start, (Item/Object ~ Attribute/Onset), Sensory presentation/Visual
//! ```
//!
//! Tokenizing knows nothing about the schema. The [`TokenTree`] it produces is
//! the input of the rule engine.

mod path;
mod token;
mod tokenizer;

pub use path::{TagPath, TagPathError};
pub use token::{TagGroup, Token, TokenTree};
pub use tokenizer::{TokenizeError, tokenize};

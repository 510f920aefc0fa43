//! Shared fixtures for unit tests.

use crate::{compiler::compile, schema::SchemaTree};

/// A small schema covering every attribute the rule engine looks at.
pub const SCHEMA: &str = "\
Event
● Category {requireChild, unique}
○ Experimental stimulus {unique}
○ Participant response
● Label {requireChild}
○ # {takesValue}
● Description
○ # {takesValue}
Item
● Object
Attribute
● Repetition {requireChild}
○ # {takesValue, isNumeric}
● Temporal rate {requireChild}
○ # {takesValue, isNumeric, unitClass=frequency}
● Duration
○ # {takesValue, unitClass=time, default=ms}
● Onset {extensionAllowed}
Sensory presentation {unique}
● Visual
● Auditory
Custom {extensionAllowed}
Unit Classes
● frequency {default=Hz}
○ Hz, kHz
● time {default=s}
○ s, ms
○ minute
";

/// A schema whose `Event/Label` subtree is required in every string.
pub const REQUIRED_SCHEMA: &str = "\
Event
● Label {requireChild, required}
○ # {takesValue}
● Description
○ # {takesValue}
Item
● Object
";

/// Compiles a fixture.
pub fn schema_tree(text: &str) -> SchemaTree {
    compile(text.lines()).unwrap()
}

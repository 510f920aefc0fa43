//! Grammar of a single line of the text schema format.

use std::sync::LazyLock;

use regex::Regex;

use crate::schema::{AttributeKind, Attributes};

/// Bullet glyphs, in depth order. A line without a glyph is at depth 0; the
/// glyph at index `i` marks depth `i + 1`.
pub const BULLETS: [char; 9] = ['●', '○', '■', '▪', '◊', '▲', '▼', '◄', '►'];

/// The deepest level the text format can express.
pub const MAX_DEPTH: usize = BULLETS.len();

static START_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*!#\s*start\s*hed\s*$").expect("hard-coded regex must be valid")
});

static END_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*!#\s*end\s*hed\s*$").expect("hard-coded regex must be valid")
});

static UNIT_CLASSES_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*unit\s*classes\s*:?\s*$").expect("hard-coded regex must be valid")
});

/// The heading that switches to the unit class grammar.
pub const UNIT_CLASSES_HEADING: &str = "Unit Classes";

pub fn is_start_marker(line: &str) -> bool {
    START_MARKER.is_match(line)
}

pub fn is_end_marker(line: &str) -> bool {
    END_MARKER.is_match(line)
}

pub fn is_unit_classes_marker(line: &str) -> bool {
    UNIT_CLASSES_MARKER.is_match(line)
}

/// The bullet glyph for a depth, `None` at depth 0.
pub fn bullet(depth: usize) -> Option<char> {
    depth.checked_sub(1).and_then(|index| BULLETS.get(index).copied())
}

/// A non-blank line split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line<'a> {
    pub depth: usize,
    pub name: &'a str,
    pub attributes: Option<&'a str>,
    pub description: Option<&'a str>,
}

impl<'a> Line<'a> {
    /// Splits a line into depth, name, `{attribute}` block and
    /// `[description]`. A missing closing bracket runs to the end of the line.
    pub fn parse(text: &'a str) -> Self {
        let text = text.trim();

        let mut chars = text.chars();
        let (depth, rest) = match chars.next().and_then(|c| BULLETS.iter().position(|&b| b == c)) {
            Some(index) => (index + 1, chars.as_str()),
            None => (0, text),
        };

        let (head, description) = match rest.split_once('[') {
            Some((head, tail)) => {
                let body = tail.rsplit_once(']').map_or(tail, |(body, _)| body);
                (head, Some(body.trim()))
            }
            None => (rest, None),
        };

        let (name, attributes) = match head.split_once('{') {
            Some((name, tail)) => {
                let body = tail.split_once('}').map_or(tail, |(body, _)| body);
                (name, Some(body))
            }
            None => (head, None),
        };

        Self {
            depth,
            name: name.trim(),
            attributes,
            description: description.filter(|description| !description.is_empty()),
        }
    }
}

/// A problem found in an attribute block that does not stop compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeProblem {
    /// The name is not a known attribute; the item is dropped.
    Unknown(String),
    /// `name=` with nothing after it; kept as a boolean marker.
    Malformed(String),
}

/// Parses the inside of a `{...}` block.
///
/// Items are comma-separated `name` or `name=value`. Repeated names
/// accumulate their values.
pub fn parse_attributes(block: &str) -> (Attributes, Vec<AttributeProblem>) {
    let mut attributes = Attributes::new();
    let mut problems = Vec::new();

    for item in block.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        let (name, value) = match item.split_once('=') {
            Some((name, value)) => (name.trim(), Some(value.trim())),
            None => (item, None),
        };

        let Ok(kind) = name.parse::<AttributeKind>() else {
            problems.push(AttributeProblem::Unknown(name.to_string()));
            continue;
        };

        match value {
            Some("") => {
                problems.push(AttributeProblem::Malformed(item.to_string()));
                attributes.declare(kind, None);
            }
            value => attributes.declare(kind, value.map(str::to_string)),
        }
    }

    (attributes, problems)
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("Event", 0, "Event")]
    #[test_case("● Label", 1, "Label")]
    #[test_case("  ○ #", 2, "#")]
    #[test_case("► Deep", 9, "Deep")]
    #[test_case("\tItem  ", 0, "Item")]
    fn depth_comes_from_the_bullet(text: &str, depth: usize, name: &str) {
        let line = Line::parse(text);
        assert_eq!(line.depth, depth);
        assert_eq!(line.name, name);
    }

    #[test]
    fn splits_attributes_and_description() {
        let line = Line::parse("● Category {requireChild, unique} [The category [of] an event]");
        assert_eq!(line.name, "Category");
        assert_eq!(line.attributes, Some("requireChild, unique"));
        assert_eq!(line.description, Some("The category [of] an event"));
    }

    #[test]
    fn unterminated_blocks_run_to_the_end() {
        let line = Line::parse("○ # {takesValue [A value");
        assert_eq!(line.name, "#");
        assert_eq!(line.attributes, Some("takesValue "));
        assert_eq!(line.description, Some("A value"));
    }

    #[test]
    fn parses_values_and_markers() {
        let (attributes, problems) = parse_attributes("takesValue, unitClass = time, unitClass=frequency");
        assert!(problems.is_empty());
        assert!(attributes.contains(AttributeKind::TakesValue));
        assert_eq!(
            attributes.value(AttributeKind::UnitClass),
            Some("time,frequency")
        );
    }

    #[test]
    fn reports_unknown_and_malformed_items() {
        let (attributes, problems) = parse_attributes("predicate, default=, unique,,");
        assert_eq!(
            problems,
            [
                AttributeProblem::Unknown("predicate".into()),
                AttributeProblem::Malformed("default=".into()),
            ]
        );
        assert!(attributes.contains(AttributeKind::Default));
        assert_eq!(attributes.value(AttributeKind::Default), None);
        assert!(attributes.contains(AttributeKind::Unique));
    }

    #[test_case("!# start hed", true)]
    #[test_case("  !#START HED  ", true)]
    #[test_case("!# start", false)]
    fn recognises_start_marker(line: &str, expected: bool) {
        assert_eq!(is_start_marker(line), expected);
    }

    #[test_case("Unit Classes", true)]
    #[test_case("unit classes:", true)]
    #[test_case("UnitClasses", true)]
    #[test_case("● Unit Classes", false)]
    fn recognises_unit_classes_marker(line: &str, expected: bool) {
        assert_eq!(is_unit_classes_marker(line), expected);
    }

    #[test]
    fn bullet_for_depth() {
        assert_eq!(bullet(0), None);
        assert_eq!(bullet(1), Some('●'));
        assert_eq!(bullet(9), Some('►'));
        assert_eq!(bullet(10), None);
    }
}

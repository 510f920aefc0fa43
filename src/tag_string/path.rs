use std::{fmt, str::FromStr};

use nonempty::NonEmpty;

use crate::schema::tree::PLACEHOLDER;

/// A slash-separated tag such as `Event/Category/Experimental stimulus`.
///
/// Segments keep their original casing (trimmed of surrounding whitespace);
/// lookups go through [`TagPath::canonical`], which lower-cases them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPath {
    segments: NonEmpty<String>,
}

impl TagPath {
    /// The segments in their original casing.
    #[must_use]
    pub const fn segments(&self) -> &NonEmpty<String> {
        &self.segments
    }

    /// The last segment, which holds the value of a value-taking tag.
    #[must_use]
    pub fn last(&self) -> &str {
        self.segments.last()
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always `false`: a tag path has at least one segment.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// The lower-cased form used for schema lookups.
    #[must_use]
    pub fn canonical(&self) -> String {
        canonical_join(self.segments.iter())
    }

    /// The canonical path with the last segment replaced by `#`.
    ///
    /// `None` for single-segment tags, which cannot be values.
    #[must_use]
    pub fn placeholder_form(&self) -> Option<String> {
        let parents = &self.segments.tail;
        if parents.is_empty() {
            return None;
        }
        let parent = canonical_join(self.segments.iter().take(self.len() - 1));
        Some(format!("{parent}/{PLACEHOLDER}"))
    }

    /// Canonical forms of every strict ancestor, longest first.
    pub fn ancestors(&self) -> impl Iterator<Item = String> + '_ {
        (1..self.len())
            .rev()
            .map(|length| canonical_join(self.segments.iter().take(length)))
    }
}

fn canonical_join<'a>(segments: impl Iterator<Item = &'a String>) -> String {
    segments
        .map(|segment| segment.to_lowercase())
        .collect::<Vec<_>>()
        .join("/")
}

impl fmt::Display for TagPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let segments: Vec<&str> = self.segments.iter().map(String::as_str).collect();
        f.write_str(&segments.join("/"))
    }
}

/// Errors that can occur when parsing a tag path.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TagPathError {
    /// The tag is empty or whitespace.
    #[error("empty tag")]
    Empty,
    /// A segment between two slashes is empty.
    #[error("tag '{0}' has an empty segment")]
    EmptySegment(String),
}

impl FromStr for TagPath {
    type Err = TagPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(TagPathError::Empty);
        }

        // A single leading slash is tolerated (`/Event/Label`).
        let body = trimmed.strip_prefix('/').unwrap_or(trimmed);

        let segments = body
            .split('/')
            .map(|segment| {
                let segment = segment.trim();
                if segment.is_empty() {
                    Err(TagPathError::EmptySegment(trimmed.to_string()))
                } else {
                    Ok(segment.to_string())
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        NonEmpty::from_vec(segments)
            .map(|segments| Self { segments })
            .ok_or(TagPathError::Empty)
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn canonical_form_is_lower_case() {
        let path: TagPath = "Event/Category/Experimental stimulus".parse().unwrap();
        assert_eq!(path.canonical(), "event/category/experimental stimulus");
        assert_eq!(path.to_string(), "Event/Category/Experimental stimulus");
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn segments_are_trimmed() {
        let path: TagPath = " Attribute/Temporal rate/ 5 Hz ".parse().unwrap();
        assert_eq!(path.last(), "5 Hz");
        assert_eq!(path.to_string(), "Attribute/Temporal rate/5 Hz");
    }

    #[test_case("Event/Label/My label", Some("event/label/#"))]
    #[test_case("Attribute/Repetition/20", Some("attribute/repetition/#"))]
    #[test_case("Event", None)]
    fn placeholder_form(tag: &str, expected: Option<&str>) {
        let path: TagPath = tag.parse().unwrap();
        assert_eq!(path.placeholder_form().as_deref(), expected);
    }

    #[test]
    fn ancestors_are_longest_first() {
        let path: TagPath = "A/B/C/D".parse().unwrap();
        assert_eq!(path.ancestors().collect::<Vec<_>>(), ["a/b/c", "a/b", "a"]);

        let single: TagPath = "A".parse().unwrap();
        assert_eq!(single.ancestors().count(), 0);
    }

    #[test_case("", TagPathError::Empty)]
    #[test_case("   ", TagPathError::Empty)]
    #[test_case("Event//Label", TagPathError::EmptySegment("Event//Label".into()))]
    #[test_case("Event/", TagPathError::EmptySegment("Event/".into()))]
    fn malformed_tags_are_rejected(tag: &str, expected: TagPathError) {
        assert_eq!(tag.parse::<TagPath>().unwrap_err(), expected);
    }

    #[test]
    fn leading_slash_is_tolerated() {
        let path: TagPath = "/Event/Label".parse().unwrap();
        assert_eq!(path.canonical(), "event/label");
    }
}

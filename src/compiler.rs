//! Compiles the indentation-marked text schema format into a [`SchemaTree`].
//!
//! Each line holds one node. Its depth is given by an optional bullet glyph
//! ([`BULLETS`]), followed by the node name, an optional `{attribute, ...}`
//! block and an optional `[description]`:
//!
//! ```text
//! Event
//! ● Category {requireChild, unique} [What kind of event]
//! ○ Experimental stimulus
//! Unit Classes
//! ● time {default=s}
//! ○ s, ms
//! ```
//!
//! The line `Unit Classes` switches to the unit class grammar: depth-1 lines
//! name a class, depth-2 lines list its units. When the file contains a
//! `!# start hed` marker, only the lines between it and `!# end hed` are read.
//!
//! Compilation is permissive. Depth jumps, unknown attribute names and
//! malformed attribute items are recorded as [`Lint`]s and logged.

mod line;
pub use line::{BULLETS, MAX_DEPTH};

mod render;
pub use render::{RenderError, render, render_xml};

use std::fmt;

use non_empty_string::NonEmptyString;
use tracing::instrument;

use crate::schema::{AttributeKind, Attributes, NodeId, SchemaTree, UnitClass};
use line::{AttributeProblem, Line};

/// Errors that stop compilation. Line numbers are 1-based.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CompileError {
    /// The first entry is indented.
    #[error(
        "line {line}: the first entry must be a top-level node or the unit class heading, found \
         depth {depth}"
    )]
    NotAtRoot {
        /// Line number.
        line: usize,
        /// Depth of the offending line.
        depth: usize,
    },
    /// A node or unit class has no name.
    #[error("line {line}: missing name")]
    EmptyName {
        /// Line number.
        line: usize,
    },
    /// A unit list appears before any unit class.
    #[error("line {line}: units listed before any unit class")]
    UnitsWithoutClass {
        /// Line number.
        line: usize,
    },
    /// Two siblings share a name (ignoring case).
    #[error("line {line}: duplicate tag '{path}'")]
    DuplicateName {
        /// Line number.
        line: usize,
        /// Path of the duplicate node.
        path: String,
    },
}

/// A problem that does not stop compilation. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lint {
    /// A node is more than one level deeper than its parent. It is attached
    /// to the deepest open shallower node.
    DepthJump {
        /// Line number.
        line: usize,
        /// Depth of the node.
        depth: usize,
        /// Depth of the node it was attached to.
        parent_depth: usize,
    },
    /// An attribute name that is not recognised. The item is dropped.
    UnknownAttribute {
        /// Line number.
        line: usize,
        /// The unrecognised name.
        name: String,
    },
    /// An attribute item with an empty value. It is kept as a marker.
    MalformedAttribute {
        /// Line number.
        line: usize,
        /// The item as written.
        item: String,
    },
    /// A top-level line inside the unit class section.
    IgnoredLine {
        /// Line number.
        line: usize,
    },
}

impl fmt::Display for Lint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::DepthJump {
                line,
                depth,
                parent_depth,
            } => write!(
                f,
                "line {line}: depth {depth} follows depth {parent_depth}; attached to the \
                 shallower node"
            ),
            Self::UnknownAttribute { line, name } => {
                write!(f, "line {line}: unknown attribute '{name}' ignored")
            }
            Self::MalformedAttribute { line, item } => {
                write!(f, "line {line}: malformed attribute '{item}' kept as a marker")
            }
            Self::IgnoredLine { line } => {
                write!(f, "line {line}: top-level line in the unit class section ignored")
            }
        }
    }
}

/// Which grammar applies to the current line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Nodes,
    UnitClasses,
}

/// Compiles text schemas and keeps the lints of the last run.
#[derive(Debug, Default)]
pub struct Compiler {
    lints: Vec<Lint>,
}

impl Compiler {
    /// Creates a compiler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The lints recorded by the last call to [`Compiler::compile`].
    #[must_use]
    pub fn lints(&self) -> &[Lint] {
        &self.lints
    }

    /// Compiles the lines of a text schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the first entry is indented, if a line has no
    /// name, if units appear before a unit class, or if two siblings share a
    /// name.
    #[instrument(level = "debug", skip_all)]
    pub fn compile<I, S>(&mut self, lines: I) -> Result<SchemaTree, CompileError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.lints.clear();

        let lines: Vec<S> = lines.into_iter().collect();
        let texts: Vec<&str> = lines
            .iter()
            .enumerate()
            .map(|(index, line)| {
                let text = line.as_ref();
                if index == 0 {
                    text.strip_prefix('\u{feff}').unwrap_or(text)
                } else {
                    text
                }
            })
            .collect();

        let mut tree = SchemaTree::new();
        let mut open: Vec<(usize, NodeId)> = Vec::new();
        let mut section = Section::Nodes;
        let mut seen_entry = false;

        for (number, text) in active_region(&texts) {
            if text.trim().is_empty() {
                continue;
            }

            if line::is_unit_classes_marker(text) {
                section = Section::UnitClasses;
                seen_entry = true;
                continue;
            }

            let line = Line::parse(text);
            if !seen_entry && line.depth != 0 {
                return Err(CompileError::NotAtRoot {
                    line: number,
                    depth: line.depth,
                });
            }
            seen_entry = true;

            match section {
                Section::Nodes => self.node_line(&mut tree, &mut open, number, &line)?,
                Section::UnitClasses => self.unit_class_line(&mut tree, number, &line)?,
            }
        }

        tracing::debug!(
            nodes = tree.len(),
            unit_classes = tree.unit_classes().len(),
            lints = self.lints.len(),
            "schema compiled"
        );

        Ok(tree)
    }

    fn node_line(
        &mut self,
        tree: &mut SchemaTree,
        open: &mut Vec<(usize, NodeId)>,
        number: usize,
        line: &Line,
    ) -> Result<(), CompileError> {
        while open.last().is_some_and(|&(depth, _)| depth >= line.depth) {
            open.pop();
        }
        let parent = open.last().copied();

        if let Some((parent_depth, _)) = parent {
            if parent_depth + 1 < line.depth {
                self.lint(Lint::DepthJump {
                    line: number,
                    depth: line.depth,
                    parent_depth,
                });
            }
        }

        let name = NonEmptyString::new(line.name.to_string())
            .map_err(|_| CompileError::EmptyName { line: number })?;

        let siblings = parent.map_or(tree.roots(), |(_, id)| tree.node(id).children());
        if siblings
            .iter()
            .any(|&sibling| tree.node(sibling).name().eq_ignore_ascii_case(name.as_str()))
        {
            let path = match parent {
                Some((_, id)) => format!("{}/{name}", tree.path(id)),
                None => name.to_string(),
            };
            return Err(CompileError::DuplicateName { line: number, path });
        }

        let attributes = self.attributes(number, line.attributes);
        let id = tree.add_node(
            parent.map(|(_, id)| id),
            name,
            attributes,
            line.description.map(str::to_string),
        );
        open.push((line.depth, id));
        Ok(())
    }

    fn unit_class_line(
        &mut self,
        tree: &mut SchemaTree,
        number: usize,
        line: &Line,
    ) -> Result<(), CompileError> {
        match line.depth {
            0 => self.lint(Lint::IgnoredLine { line: number }),
            1 => {
                let name = NonEmptyString::new(line.name.to_string())
                    .map_err(|_| CompileError::EmptyName { line: number })?;
                let attributes = self.attributes(number, line.attributes);
                let default = attributes.value(AttributeKind::Default).map(str::to_string);
                tree.add_unit_class(UnitClass::new(name, Vec::new(), default));
            }
            _ => {
                let unit_class = tree
                    .last_unit_class_mut()
                    .ok_or(CompileError::UnitsWithoutClass { line: number })?;
                unit_class.extend(line.name.split(',').map(str::to_string));
            }
        }
        Ok(())
    }

    fn attributes(&mut self, number: usize, block: Option<&str>) -> Attributes {
        let Some(block) = block else {
            return Attributes::new();
        };
        let (attributes, problems) = line::parse_attributes(block);
        for problem in problems {
            self.lint(match problem {
                AttributeProblem::Unknown(name) => Lint::UnknownAttribute { line: number, name },
                AttributeProblem::Malformed(item) => Lint::MalformedAttribute { line: number, item },
            });
        }
        attributes
    }

    fn lint(&mut self, lint: Lint) {
        tracing::warn!("{lint}");
        self.lints.push(lint);
    }
}

/// The numbered lines between the `!# start hed` and `!# end hed` markers,
/// or every line when there is no start marker.
fn active_region<'a>(lines: &'a [&'a str]) -> impl Iterator<Item = (usize, &'a str)> + 'a {
    let numbered = lines.iter().enumerate().map(|(index, &text)| (index + 1, text));

    let start = lines.iter().position(|text| line::is_start_marker(text));
    let skip = start.map_or(0, |index| index + 1);

    numbered
        .skip(skip)
        .take_while(move |&(_, text)| start.is_none() || !line::is_end_marker(text))
}

/// Compiles the lines of a text schema, discarding lints.
///
/// # Errors
///
/// See [`Compiler::compile`].
pub fn compile<I, S>(lines: I) -> Result<SchemaTree, CompileError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Compiler::new().compile(lines)
}

//! Renders a schema tree back to text.

use std::fmt::{self, Write};

use crate::{
    compiler::line::{self, MAX_DEPTH, UNIT_CLASSES_HEADING},
    schema::{Attributes, NodeId, SchemaTree},
};

/// Errors raised while rendering a schema tree.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RenderError {
    /// The node is deeper than the text format has bullets for.
    #[error("'{0}' is nested too deeply for the text format")]
    TooDeep(String),
    /// A name or value holds text that the line grammar would read back
    /// differently.
    #[error("'{text}' in '{path}' cannot be written in the text format")]
    Inexpressible {
        /// The node or unit class holding the text.
        path: String,
        /// The offending text.
        text: String,
    },
    /// Writing to the output buffer failed.
    #[error(transparent)]
    Format(#[from] fmt::Error),
}

/// Renders a tree in the text schema format.
///
/// Compiling the result gives back an equal tree. Multi-valued attributes are
/// written as repeated `name=value` items.
///
/// # Errors
///
/// Returns [`RenderError::TooDeep`] if a node is nested below the deepest
/// bullet, and [`RenderError::Inexpressible`] if a name, value or
/// description would not parse back to itself.
pub fn render(tree: &SchemaTree) -> Result<String, RenderError> {
    let mut out = String::new();

    for (id, node, depth) in tree.depth_first() {
        if depth > MAX_DEPTH {
            return Err(RenderError::TooDeep(tree.path(id)));
        }
        let inexpressible = |text: &str| RenderError::Inexpressible {
            path: tree.path(id),
            text: text.to_string(),
        };

        if !is_expressible_name(node.name(), depth) {
            return Err(inexpressible(node.name()));
        }
        if let Some(bullet) = line::bullet(depth) {
            write!(out, "{bullet} ")?;
        }
        out.push_str(node.name());

        if !node.attributes().is_empty() {
            let items = attribute_items(node.attributes());
            if let Some(item) = items.iter().find(|item| !is_expressible_value(item)) {
                return Err(inexpressible(item));
            }
            write!(out, " {{{}}}", items.join(", "))?;
        }
        if let Some(description) = node.description() {
            if !is_expressible_description(description) {
                return Err(inexpressible(description));
            }
            write!(out, " [{description}]")?;
        }
        out.push('\n');
    }

    if !tree.unit_classes().is_empty() {
        writeln!(out, "{UNIT_CLASSES_HEADING}")?;
        for unit_class in tree.unit_classes() {
            let inexpressible = |text: &str| RenderError::Inexpressible {
                path: format!("{UNIT_CLASSES_HEADING}/{}", unit_class.name()),
                text: text.to_string(),
            };

            if !is_expressible_name(unit_class.name(), 1) {
                return Err(inexpressible(unit_class.name()));
            }
            if let Some(unit) = unit_class
                .units()
                .iter()
                .map(String::as_str)
                .chain(unit_class.declared_default())
                .find(|unit| unit.contains(',') || !is_expressible_value(unit))
            {
                return Err(inexpressible(unit));
            }

            write!(out, "{BULLET_CLASS} {}", unit_class.name())?;
            if let Some(default) = unit_class.declared_default() {
                write!(out, " {{default={default}}}")?;
            }
            out.push('\n');
            if !unit_class.units().is_empty() {
                writeln!(out, "{BULLET_UNITS} {}", unit_class.units().join(", "))?;
            }
        }
    }

    Ok(out)
}

const BULLET_CLASS: char = line::BULLETS[0];
const BULLET_UNITS: char = line::BULLETS[1];

/// Characters that end a name or value on a line.
const DELIMITERS: &[char] = &['{', '}', '[', ']', '\n', '\r'];

const NEWLINES: &[char] = &['\n', '\r'];

/// Whether a name at `depth` compiles back to itself. Only unbulleted
/// lines can be taken for a bullet, a section heading or a region marker.
fn is_expressible_name(name: &str, depth: usize) -> bool {
    name.trim() == name
        && !name.contains(DELIMITERS)
        && !name.starts_with('\u{feff}')
        && (depth > 0
            || !(name.starts_with(&line::BULLETS[..])
                || line::is_unit_classes_marker(name)
                || line::is_start_marker(name)
                || line::is_end_marker(name)))
}

fn is_expressible_value(value: &str) -> bool {
    !value.contains(DELIMITERS)
}

fn is_expressible_description(description: &str) -> bool {
    !description.is_empty()
        && description.trim() == description
        && !description.contains(NEWLINES)
}

fn attribute_items(attributes: &Attributes) -> Vec<String> {
    attributes
        .iter()
        .flat_map(|(kind, value)| match value {
            None => vec![kind.to_string()],
            Some(value) => value
                .split(',')
                .map(|item| format!("{kind}={}", item.trim()))
                .collect(),
        })
        .collect()
}

const INDENT: &str = "   ";

/// Renders a tree in the legacy `<HED>` XML layout.
///
/// Boolean attributes are written as `"true"`; list values are joined with
/// commas.
///
/// # Errors
///
/// Returns an error only if writing to the buffer fails.
pub fn render_xml(tree: &SchemaTree) -> Result<String, RenderError> {
    fn write_node(tree: &SchemaTree, id: NodeId, depth: usize, out: &mut String) -> fmt::Result {
        let node = tree.node(id);
        let indent = INDENT.repeat(depth);

        write!(out, "{indent}<node")?;
        for (kind, value) in node.attributes().iter() {
            write!(out, " {kind}=\"{}\"", escape(value.unwrap_or("true")))?;
        }
        writeln!(out, ">")?;
        writeln!(out, "{indent}{INDENT}<name>{}</name>", escape(node.name()))?;
        if let Some(description) = node.description() {
            writeln!(
                out,
                "{indent}{INDENT}<description>{}</description>",
                escape(description)
            )?;
        }
        for &child in node.children() {
            write_node(tree, child, depth + 1, out)?;
        }
        writeln!(out, "{indent}</node>")
    }

    let mut out = String::new();
    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(out, r#"<HED version="2.0">"#)?;

    for &root in tree.roots() {
        write_node(tree, root, 0, &mut out)?;
    }

    if !tree.unit_classes().is_empty() {
        writeln!(out, "<unitClasses>")?;
        for unit_class in tree.unit_classes() {
            match unit_class.default_unit() {
                Some(default) => writeln!(out, "<unitClass default=\"{}\">", escape(default))?,
                None => writeln!(out, "<unitClass>")?,
            }
            writeln!(out, "{INDENT}<name>{}</name>", escape(unit_class.name()))?;
            writeln!(
                out,
                "{INDENT}<units>{}</units>",
                escape(&unit_class.units().join(","))
            )?;
            writeln!(out, "</unitClass>")?;
        }
        writeln!(out, "</unitClasses>")?;
    }

    writeln!(out, "</HED>")?;
    Ok(out)
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\'' => escaped.push_str("&apos;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use non_empty_string::NonEmptyString;
    use serde_json::json;
    use test_case::test_case;

    use super::*;
    use crate::{compiler::compile, test_support::SCHEMA};

    fn from_json(document: &serde_json::Value) -> SchemaTree {
        SchemaTree::from_json(&document.to_string()).unwrap()
    }

    #[test]
    fn rendering_then_compiling_gives_the_same_tree() {
        let tree = compile(SCHEMA.lines()).unwrap();
        let rendered = render(&tree).unwrap();
        assert_eq!(compile(rendered.lines()).unwrap(), tree, "{rendered}");
    }

    #[test]
    fn documents_render_back_to_the_same_tree() {
        let tree = from_json(&json!({
            "_version": "1",
            "nodes": [
                {
                    "name": " Event ",
                    "description": "",
                    "children": [
                        { "name": "Unit Classes" },
                        {
                            "name": "Position",
                            "attributes": { "default": "", "unitClass": "time, ,frequency" },
                            "description": "  Where [it] is "
                        }
                    ]
                },
                { "name": "Item" }
            ],
            "unitClasses": [
                { "name": "time", "default": " s ", "units": ["s", "ms"] },
                { "name": "frequency", "units": ["Hz"] }
            ]
        }));

        let rendered = render(&tree).unwrap();
        assert_eq!(compile(rendered.lines()).unwrap(), tree, "{rendered}");
    }

    #[test_case("Unit Classes"; "section heading")]
    #[test_case("unit classes:"; "section heading with colon")]
    #[test_case("!# start hed"; "region marker")]
    #[test_case("● Bullet"; "leading bullet")]
    #[test_case("Open {brace"; "brace")]
    #[test_case("Label [x]"; "bracket")]
    fn root_names_the_grammar_cannot_hold_are_rejected(name: &str) {
        let tree = from_json(&json!({
            "_version": "1",
            "nodes": [{ "name": "Event" }, { "name": name }, { "name": "Item" }]
        }));

        assert!(matches!(
            render(&tree),
            Err(RenderError::Inexpressible { text, .. }) if text == name
        ));
    }

    #[test]
    fn multi_line_description_is_rejected() {
        let mut tree = SchemaTree::new();
        tree.add_node(
            None,
            NonEmptyString::new("Event".into()).unwrap(),
            Attributes::new(),
            Some("first\nsecond".into()),
        );
        assert!(matches!(
            render(&tree),
            Err(RenderError::Inexpressible { path, .. }) if path == "Event"
        ));
    }

    #[test]
    fn unit_with_a_comma_is_rejected() {
        let tree = from_json(&json!({
            "_version": "1",
            "unitClasses": [{ "name": "time", "units": ["s", "m,s"] }]
        }));
        assert!(matches!(
            render(&tree),
            Err(RenderError::Inexpressible { text, .. }) if text == "m,s"
        ));
    }

    #[test]
    fn repeated_values_render_as_repeated_items() {
        let tree = compile([
            "Attribute",
            "● Duration",
            "○ # {takesValue, unitClass=time, unitClass=frequency} [A span]",
            "Unit Classes",
            "● time {default=s}",
            "○ s",
            "● frequency",
            "○ Hz",
        ])
        .unwrap();

        assert_eq!(
            render(&tree).unwrap(),
            "Attribute\n\
             ● Duration\n\
             ○ # {takesValue, unitClass=time, unitClass=frequency} [A span]\n\
             Unit Classes\n\
             ● time {default=s}\n\
             ○ s\n\
             ● frequency\n\
             ○ Hz\n"
        );
    }

    #[test]
    fn nodes_deeper_than_the_bullets_cannot_render() {
        let mut lines = vec!["Root".to_string()];
        lines.extend(line::BULLETS.iter().map(|bullet| format!("{bullet} Level")));
        let mut tree = compile(&lines).unwrap();
        assert!(render(&tree).is_ok());

        let deepest = tree.depth_first().last().map(|(id, ..)| id).unwrap();
        tree.add_node(
            Some(deepest),
            NonEmptyString::new("Too deep".into()).unwrap(),
            Attributes::new(),
            None,
        );
        assert!(matches!(render(&tree), Err(RenderError::TooDeep(_))));
    }

    #[test]
    fn renders_legacy_xml() {
        let tree = compile([
            "Event {unique}",
            "● Label <x> [Say \"hi\"]",
            "Unit Classes",
            "● time {default=s}",
            "○ s, ms",
        ])
        .unwrap();

        assert_eq!(
            render_xml(&tree).unwrap(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <HED version=\"2.0\">\n\
             <node unique=\"true\">\n   \
             <name>Event</name>\n   \
             <node>\n      \
             <name>Label &lt;x&gt;</name>\n      \
             <description>Say &quot;hi&quot;</description>\n   \
             </node>\n\
             </node>\n\
             <unitClasses>\n\
             <unitClass default=\"s\">\n   \
             <name>time</name>\n   \
             <units>s,ms</units>\n\
             </unitClass>\n\
             </unitClasses>\n\
             </HED>\n"
        );
    }
}

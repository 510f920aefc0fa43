use tracing::instrument;

use crate::tag_string::{Token, TokenTree};

/// Errors that abort tokenization of a tag string.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenizeError {
    /// The numbers of opening and closing parentheses differ.
    #[error(
        "number of opening and closing parentheses are unequal ({opening} opening, {closing} \
         closing)"
    )]
    UnbalancedParentheses {
        /// Count of `(`.
        opening: usize,
        /// Count of `)`.
        closing: usize,
    },
}

/// What ended the previous token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    Start,
    Comma,
    Tilde,
    End,
}

/// Splits a tag string into tags, tildes and groups.
///
/// The scan keeps a parenthesis depth; only `,` and `~` at depth 0 split
/// tokens. A token that is exactly one parenthesized region becomes a group
/// and its inside is split the same way. A stray `)` at depth 0 is kept as
/// an ordinary character.
///
/// Empty text next to a comma becomes an empty [`Token::Tag`]. Empty text
/// that makes up a whole tilde branch (between two tildes, or between a tilde
/// and either end) is dropped, as the tilde checks report it. A blank string
/// yields an empty tree.
///
/// # Errors
///
/// Returns [`TokenizeError::UnbalancedParentheses`] if the counts of `(` and
/// `)` differ. Nothing else fails.
#[instrument(level = "trace")]
pub fn tokenize(raw: &str) -> Result<TokenTree, TokenizeError> {
    let opening = raw.matches('(').count();
    let closing = raw.matches(')').count();
    if opening != closing {
        return Err(TokenizeError::UnbalancedParentheses { opening, closing });
    }

    Ok(TokenTree::new(split(raw)))
}

fn split(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    if text.trim().is_empty() {
        return tokens;
    }

    let mut depth = 0usize;
    let mut start = 0;
    let mut previous = Boundary::Start;

    for (index, character) in text.char_indices() {
        match character {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' | '~' if depth == 0 => {
                let boundary = if character == ',' {
                    Boundary::Comma
                } else {
                    Boundary::Tilde
                };
                push_token(&mut tokens, &text[start..index], previous, boundary);
                if boundary == Boundary::Tilde {
                    tokens.push(Token::Tilde);
                }
                previous = boundary;
                start = index + character.len_utf8();
            }
            _ => {}
        }
    }
    push_token(&mut tokens, &text[start..], previous, Boundary::End);

    tokens
}

fn push_token(tokens: &mut Vec<Token>, text: &str, before: Boundary, after: Boundary) {
    let text = text.trim();
    if text.is_empty() {
        // An empty tilde branch is left to the tilde checks.
        let empty_branch = matches!(
            (before, after),
            (Boundary::Start, Boundary::End)
                | (Boundary::Tilde, Boundary::Tilde | Boundary::End)
                | (Boundary::Start, Boundary::Tilde)
        );
        if !empty_branch {
            tokens.push(Token::Tag(String::new()));
        }
        return;
    }

    match group_body(text) {
        Some(body) => tokens.push(Token::group(split(body))),
        None => tokens.push(Token::Tag(text.to_string())),
    }
}

/// The inside of `text` if the whole of it is one parenthesized region.
fn group_body(text: &str) -> Option<&str> {
    let inner = text.strip_prefix('(')?.strip_suffix(')')?;

    // The opening parenthesis must not close before the last character.
    let mut depth = 1usize;
    for character in inner.chars() {
        match character {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return None;
                }
            }
            _ => {}
        }
    }
    Some(inner)
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn tags(tokens: &[&str]) -> Vec<Token> {
        tokens.iter().map(|&text| Token::tag(text)).collect()
    }

    #[test]
    fn nested_groups() {
        let tree = tokenize("tag1,(tag2,tag5,(tag1),tag6),tag2,(tag3,tag5,tag6),tag3").unwrap();

        assert_eq!(
            tree.top_level(),
            [
                Token::tag("tag1"),
                Token::group(vec![
                    Token::tag("tag2"),
                    Token::tag("tag5"),
                    Token::group(tags(&["tag1"])),
                    Token::tag("tag6"),
                ]),
                Token::tag("tag2"),
                Token::group(tags(&["tag3", "tag5", "tag6"])),
                Token::tag("tag3"),
            ]
        );
        assert_eq!(tree.top_level().len(), 5);
        assert_eq!(tree.groups().count(), 3);
        assert_eq!(
            tree.tags().collect::<Vec<_>>(),
            ["tag1", "tag2", "tag5", "tag1", "tag6", "tag2", "tag3", "tag5", "tag6", "tag3"]
        );
    }

    #[test]
    fn whitespace_is_trimmed_and_quotes_are_kept() {
        let tree = tokenize("  Event/Label/\"My label\" ,  Item  ").unwrap();
        assert_eq!(tree.top_level(), tags(&["Event/Label/\"My label\"", "Item"]));
    }

    #[test]
    fn tildes_become_markers() {
        let tree = tokenize("A ~ B ~ C").unwrap();
        assert_eq!(
            tree.top_level(),
            [
                Token::tag("A"),
                Token::Tilde,
                Token::tag("B"),
                Token::Tilde,
                Token::tag("C"),
            ]
        );
    }

    #[test]
    fn empty_segments_between_commas_are_kept() {
        let tree = tokenize("A,,B,").unwrap();
        assert_eq!(tree.top_level(), tags(&["A", "", "B", ""]));
    }

    #[test]
    fn empty_tilde_branches_are_dropped() {
        let tree = tokenize("A ~ ~ B").unwrap();
        assert_eq!(
            tree.top_level(),
            [Token::tag("A"), Token::Tilde, Token::Tilde, Token::tag("B")]
        );
        assert!(tree.root().has_empty_branch());
    }

    #[test]
    fn empty_text_between_tilde_and_comma_is_an_empty_tag() {
        let tree = tokenize("A ~ , B").unwrap();
        assert_eq!(
            tree.top_level(),
            [Token::tag("A"), Token::Tilde, Token::tag(""), Token::tag("B")]
        );

        let tree = tokenize("A, ~ B").unwrap();
        assert_eq!(
            tree.top_level(),
            [Token::tag("A"), Token::tag(""), Token::Tilde, Token::tag("B")]
        );
    }

    #[test_case(""; "empty")]
    #[test_case("   \t"; "whitespace")]
    fn blank_string_has_no_tokens(raw: &str) {
        assert!(tokenize(raw).unwrap().is_empty());
    }

    #[test_case("(a", 1, 0)]
    #[test_case("a))", 0, 2)]
    #[test_case("((a),(b)", 3, 2)]
    fn unbalanced_parentheses_are_fatal(raw: &str, opening: usize, closing: usize) {
        assert_eq!(
            tokenize(raw).unwrap_err(),
            TokenizeError::UnbalancedParentheses { opening, closing }
        );
    }

    #[test]
    fn misordered_parentheses_become_a_tag() {
        let tree = tokenize(")a(").unwrap();
        assert_eq!(tree.top_level(), tags(&[")a("]));
    }

    #[test]
    fn adjacent_groups_are_not_one_group() {
        let tree = tokenize("(a)(b)").unwrap();
        assert_eq!(tree.top_level(), tags(&["(a)(b)"]));
    }

    #[test_case("tag1,(tag2,tag5,(tag1),tag6),tag2,(tag3,tag5,tag6),tag3")]
    #[test_case("A ~ (B, C ~ D) ~ E")]
    #[test_case("A,,B, ~ ~C")]
    #[test_case("(), ((x))")]
    #[test_case(")a(, b")]
    fn rendering_then_tokenizing_is_stable(raw: &str) {
        let tree = tokenize(raw).unwrap();
        let rendered = tree.to_string();
        assert_eq!(tokenize(&rendered).unwrap(), tree, "rendered as {rendered:?}");
    }

    #[test_case("tag1,(tag2,tag5,(tag1),tag6),tag2,(tag3,tag5,tag6),tag3")]
    #[test_case("A ~ (B, C ~ D) ~ E")]
    #[test_case("A,,B, ~ ~C")]
    #[test_case(",A ~ , B")]
    #[test_case("(), ((x)), Event/Label/My label")]
    fn flattened_tags_retokenize_to_the_same_tags(raw: &str) {
        let tree = tokenize(raw).unwrap();
        let flat: Vec<&str> = tree.tags().collect();
        let joined = flat.join(",");

        let retokenized = tokenize(&joined).unwrap();
        assert_eq!(retokenized.tags().collect::<Vec<_>>(), flat, "joined as {joined:?}");
        assert_eq!(retokenized.groups().count(), 0);
    }
}

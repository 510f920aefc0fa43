use std::fmt;

/// One element of a tokenized tag string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A single tag, trimmed. May be empty.
    Tag(String),
    /// A `~` exclusivity separator.
    Tilde,
    /// A parenthesized group.
    Group(TagGroup),
}

impl Token {
    /// Shorthand for a tag token.
    pub fn tag(text: impl Into<String>) -> Self {
        Self::Tag(text.into())
    }

    /// Shorthand for a group token.
    #[must_use]
    pub const fn group(children: Vec<Self>) -> Self {
        Self::Group(TagGroup::new(children))
    }
}

/// An ordered sequence of tokens: the contents of a parenthesized group, or
/// the top level of a whole string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagGroup {
    children: Vec<Token>,
}

impl TagGroup {
    /// Creates a group from its children.
    #[must_use]
    pub const fn new(children: Vec<Token>) -> Self {
        Self { children }
    }

    /// The direct children, in string order.
    #[must_use]
    pub fn children(&self) -> &[Token] {
        &self.children
    }

    /// Number of `~` separators directly inside the group.
    #[must_use]
    pub fn tilde_count(&self) -> usize {
        self.children
            .iter()
            .filter(|token| matches!(token, Token::Tilde))
            .count()
    }

    /// The tilde-delimited branches. A group without tildes has one branch.
    pub fn branches(&self) -> impl Iterator<Item = &[Token]> {
        self.children
            .split(|token| matches!(token, Token::Tilde))
    }

    /// Whether a tilde separates nothing: leading, trailing or consecutive
    /// tildes.
    #[must_use]
    pub fn has_empty_branch(&self) -> bool {
        self.tilde_count() > 0 && self.branches().any(|branch| branch.is_empty())
    }
}

/// The tokens of one tag string.
///
/// The top level behaves like an unbracketed group. All views borrow the tree
/// and can be taken any number of times.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenTree {
    root: TagGroup,
}

impl TokenTree {
    /// Wraps the top-level tokens of a string.
    #[must_use]
    pub const fn new(tokens: Vec<Token>) -> Self {
        Self {
            root: TagGroup::new(tokens),
        }
    }

    /// The top level as a group, for tilde checks.
    #[must_use]
    pub const fn root(&self) -> &TagGroup {
        &self.root
    }

    /// Depth-0 tags, tildes and whole groups.
    #[must_use]
    pub fn top_level(&self) -> &[Token] {
        self.root.children()
    }

    /// Depth-0 tags only.
    pub fn top_level_tags(&self) -> impl Iterator<Item = &str> {
        self.top_level().iter().filter_map(|token| match token {
            Token::Tag(text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// Every tag at any depth, in string order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.walk().filter_map(|token| match token {
            Token::Tag(text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// Every parenthesized group, in pre-order.
    pub fn groups(&self) -> impl Iterator<Item = &TagGroup> {
        self.walk().filter_map(|token| match token {
            Token::Group(group) => Some(group),
            _ => None,
        })
    }

    /// Whether the string produced no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }

    fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![self.root.children.iter()],
        }
    }
}

/// Pre-order traversal over every token of a tree.
struct Walk<'a> {
    stack: Vec<std::slice::Iter<'a, Token>>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Token;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let level = self.stack.last_mut()?;
            match level.next() {
                Some(token) => {
                    if let Token::Group(group) = token {
                        self.stack.push(group.children.iter());
                    }
                    return Some(token);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

fn write_sequence(f: &mut fmt::Formatter, tokens: &[Token]) -> fmt::Result {
    let mut previous: Option<&Token> = None;
    for token in tokens {
        match (previous, token) {
            (None, _) => {}
            (Some(Token::Tilde), _) | (Some(_), Token::Tilde) => f.write_str(" ")?,
            (Some(_), _) => f.write_str(", ")?,
        }
        write!(f, "{token}")?;
        previous = Some(token);
    }
    Ok(())
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Tag(text) => f.write_str(text),
            Self::Tilde => f.write_str("~"),
            Self::Group(group) => write!(f, "{group}"),
        }
    }
}

impl fmt::Display for TagGroup {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("(")?;
        write_sequence(f, &self.children)?;
        f.write_str(")")
    }
}

impl fmt::Display for TokenTree {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_sequence(f, &self.root.children)
    }
}

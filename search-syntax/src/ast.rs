use serde::Serialize;
use std::fmt;

/// Value half of a comparison.
///
/// The variant is decided by the first character of the token and never
/// changes afterwards: digits start an [`Literal::Integer`], letters, `_`, `%`
/// and quotes start a [`Literal::String`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Literal {
    Integer(i64),
    String(String),
}

impl Literal {
    /// `true` for string literals that start or end with `%`.
    ///
    /// ```
    /// use search_syntax::Literal;
    /// assert!(Literal::String("%random640%".into()).is_wildcard());
    /// assert!(Literal::String("random%".into()).is_wildcard());
    /// assert!(!Literal::String("ran%dom".into()).is_wildcard());
    /// assert!(!Literal::Integer(10).is_wildcard());
    /// ```
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Literal::String(text) if text.starts_with('%') || text.ends_with('%'))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::String(text) => Some(text),
            Literal::Integer(_) => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Literal::Integer(value) => Some(*value),
            Literal::String(_) => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::Integer(_) => "integer",
            Literal::String(_) => "string",
        }
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Integer(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::String(value.to_string())
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(value) => write!(f, "{value}"),
            Literal::String(text) if is_bare_word(text) => f.write_str(text),
            // A literal can never contain the quote it was captured with, so
            // one of the two quote styles is always free.
            Literal::String(text) if text.contains('"') => write!(f, "'{text}'"),
            Literal::String(text) => write!(f, "\"{text}\""),
        }
    }
}

/// String literals that lex back as a single bare word.
fn is_bare_word(text: &str) -> bool {
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    crate::lexer::is_word_start(first) && chars.all(crate::lexer::is_word_char)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Op {
    Eq,
    Neq,
    Gt,
    Lt,
    Gte,
    Lte,
    /// Inferred from a `%` at either end of a string value.
    Like,
    /// Membership, written `value@attribute`.
    Has,
}

impl Op {
    pub fn symbol(self) -> &'static str {
        match self {
            Op::Eq | Op::Like => "=",
            Op::Neq => "!=",
            Op::Gt => ">",
            Op::Lt => "<",
            Op::Gte => ">=",
            Op::Lte => "<=",
            Op::Has => "@",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Like => f.write_str("like"),
            other => f.write_str(other.symbol()),
        }
    }
}

/// `attribute OP value`, or `value@attribute` for [`Op::Has`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Compare {
    pub attribute: String,
    pub op: Op,
    pub value: Literal,
}

impl Compare {
    pub fn new(attribute: impl Into<String>, op: Op, value: impl Into<Literal>) -> Self {
        Self {
            attribute: attribute.into(),
            op,
            value: value.into(),
        }
    }
}

impl fmt::Display for Compare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.op {
            Op::Has => write!(f, "{}@{}", self.value, self.attribute),
            op => write!(f, "{}{}{}", self.attribute, op.symbol(), self.value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GroupKind {
    And,
    Or,
    /// Always holds exactly one child.
    Not,
}

impl GroupKind {
    pub fn symbol(self) -> char {
        match self {
            GroupKind::And => '&',
            GroupKind::Or => '|',
            GroupKind::Not => '!',
        }
    }
}

/// Boolean combination of child nodes.
///
/// The root returned by [`crate::parse_query`] is always an `And` group
/// holding the top-level clauses in the order they were written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Group {
    pub kind: GroupKind,
    pub children: Vec<Node>,
}

impl Group {
    pub fn new(kind: GroupKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    pub fn and(children: Vec<Node>) -> Self {
        Self {
            kind: GroupKind::And,
            children,
        }
    }

    pub fn or(children: Vec<Node>) -> Self {
        Self {
            kind: GroupKind::Or,
            children,
        }
    }

    pub fn not(child: Node) -> Self {
        Self {
            kind: GroupKind::Not,
            children: vec![child],
        }
    }

    pub fn push(&mut self, child: Node) {
        self.children.push(child);
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Renders this group as the top level of a query: children are written
    /// side by side instead of inside `&(...)`.
    ///
    /// ```
    /// use search_syntax::parse_query;
    /// let root = parse_query("&( (rating = 4) (nsfw=0) )").unwrap();
    /// assert_eq!(root.display_root().to_string(), "&((rating=4)(nsfw=0))");
    /// ```
    pub fn display_root(&self) -> RootDisplay<'_> {
        RootDisplay(self)
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.kind.symbol())?;
        for child in &self.children {
            match child {
                Node::Compare(compare) => write!(f, "({compare})")?,
                Node::Group(group) => write!(f, "{group}")?,
            }
        }
        f.write_str(")")
    }
}

pub struct RootDisplay<'a>(&'a Group);

impl fmt::Display for RootDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, child) in self.0.children.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{child}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Node {
    Compare(Compare),
    Group(Group),
}

impl Node {
    pub fn compare(attribute: impl Into<String>, op: Op, value: impl Into<Literal>) -> Self {
        Node::Compare(Compare::new(attribute, op, value))
    }

    pub fn as_compare(&self) -> Option<&Compare> {
        match self {
            Node::Compare(compare) => Some(compare),
            Node::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Node::Group(group) => Some(group),
            Node::Compare(_) => None,
        }
    }
}

impl From<Compare> for Node {
    fn from(compare: Compare) -> Self {
        Node::Compare(compare)
    }
}

impl From<Group> for Node {
    fn from(group: Group) -> Self {
        Node::Group(group)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Compare(compare) => write!(f, "{compare}"),
            Node::Group(group) => write!(f, "{group}"),
        }
    }
}

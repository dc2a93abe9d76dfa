use crate::{
    Compare, Group, GroupKind, Literal, Node, Op, SyntaxError,
    lexer::{Lexeme, Lexer, Operator, Token},
};

/// Deepest group nesting a query may open. Every `(`, `&(`, `|(`, `!(` and
/// bare `!` counts one level.
pub const MAX_DEPTH: usize = 128;

/// Parses a query into its root group.
///
/// The root is always an `And` group; an empty or whitespace-only query
/// yields a root without children.
pub fn parse_query(input: &str) -> Result<Group, SyntaxError> {
    let mut parser = Parser::new(input.len());
    for lexeme in Lexer::new(input) {
        parser.feed(lexeme?)?;
    }
    parser.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    /// `( ... )` without a combinator; collapses when it holds one child.
    Bare,
    And,
    Or,
    Not,
}

impl FrameKind {
    fn symbol(self) -> char {
        match self {
            FrameKind::Bare => '(',
            FrameKind::And => '&',
            FrameKind::Or => '|',
            FrameKind::Not => '!',
        }
    }
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    children: Vec<Node>,
    offset: usize,
    /// `false` for a `!` written without parentheses, which closes on its
    /// own after a single operand.
    parenthesized: bool,
}

#[derive(Debug)]
enum Operand {
    /// Bare word: may turn out to be an attribute or a value.
    Word(String),
    Literal(Literal),
}

impl Operand {
    fn into_literal(self) -> Literal {
        match self {
            Operand::Word(text) => Literal::String(text),
            Operand::Literal(literal) => literal,
        }
    }
}

/// Comparison under construction.
#[derive(Debug, Default)]
enum Pending {
    #[default]
    Empty,
    Leading {
        operand: Operand,
        offset: usize,
    },
    Operator {
        attribute: String,
        op: Operator,
    },
    Has {
        value: Literal,
    },
}

/// Token-driven parser. Open groups live on an explicit stack; the root
/// frame's children are kept apart so the stack is empty at top level.
struct Parser {
    root: Vec<Node>,
    stack: Vec<Frame>,
    pending: Pending,
    /// Set right after `&`, `|` or `!` so the next `(` is taken by that frame.
    awaiting_paren: bool,
    end: usize,
}

impl Parser {
    fn new(end: usize) -> Self {
        Self {
            root: Vec::new(),
            stack: Vec::new(),
            pending: Pending::Empty,
            awaiting_paren: false,
            end,
        }
    }

    fn feed(&mut self, lexeme: Lexeme) -> Result<(), SyntaxError> {
        let Lexeme { token, offset } = lexeme;

        if self.awaiting_paren {
            self.awaiting_paren = false;
            if token == Token::LParen {
                if let Some(frame) = self.stack.last_mut() {
                    frame.parenthesized = true;
                }
                return Ok(());
            }
            match self.stack.last() {
                Some(frame) if frame.kind != FrameKind::Not => {
                    return Err(SyntaxError::new(
                        format!("expected '(' after '{}'", frame.kind.symbol()),
                        offset,
                    ));
                }
                _ => {}
            }
        }

        match token {
            Token::Word(text) => self.operand(Operand::Word(text), offset),
            Token::Integer(value) => self.operand(Operand::Literal(Literal::Integer(value)), offset),
            Token::Quoted(text) => self.operand(Operand::Literal(Literal::String(text)), offset),
            Token::Op(Operator::Has) => self.membership(offset),
            Token::Op(op) => self.operator(op, offset),
            Token::LParen => {
                self.ensure_idle(offset)?;
                self.open(FrameKind::Bare, offset, true)
            }
            Token::And => self.combinator(FrameKind::And, offset),
            Token::Or => self.combinator(FrameKind::Or, offset),
            Token::Not => self.combinator(FrameKind::Not, offset),
            Token::RParen => self.close(offset),
        }
    }

    fn operand(&mut self, operand: Operand, offset: usize) -> Result<(), SyntaxError> {
        match std::mem::take(&mut self.pending) {
            Pending::Empty => {
                self.pending = Pending::Leading { operand, offset };
                Ok(())
            }
            Pending::Leading { .. } => Err(SyntaxError::new("missing operator", offset)),
            Pending::Operator { attribute, op } => {
                let compare = complete(attribute, op, operand.into_literal(), offset)?;
                self.push_node(Node::Compare(compare));
                Ok(())
            }
            Pending::Has { value } => {
                let Operand::Word(attribute) = operand else {
                    return Err(SyntaxError::new("expected attribute name after '@'", offset));
                };
                check_attribute(&attribute, offset)?;
                self.push_node(Node::Compare(Compare::new(attribute, Op::Has, value)));
                Ok(())
            }
        }
    }

    fn operator(&mut self, op: Operator, offset: usize) -> Result<(), SyntaxError> {
        match std::mem::take(&mut self.pending) {
            Pending::Leading {
                operand: Operand::Word(attribute),
                offset: attribute_offset,
            } => {
                check_attribute(&attribute, attribute_offset)?;
                self.pending = Pending::Operator { attribute, op };
                Ok(())
            }
            Pending::Leading {
                operand: Operand::Literal(_),
                offset: literal_offset,
            } => Err(SyntaxError::new(
                format!("expected attribute name before '{}'", op.symbol()),
                literal_offset,
            )),
            Pending::Empty | Pending::Operator { .. } | Pending::Has { .. } => Err(
                SyntaxError::new(format!("stray '{}'", op.symbol()), offset),
            ),
        }
    }

    fn membership(&mut self, offset: usize) -> Result<(), SyntaxError> {
        match std::mem::take(&mut self.pending) {
            Pending::Leading {
                operand,
                offset: value_offset,
            } => {
                let value = operand.into_literal();
                if value.is_wildcard() {
                    return Err(SyntaxError::new(
                        "wildcard values cannot be used with '@'",
                        value_offset,
                    ));
                }
                self.pending = Pending::Has { value };
                Ok(())
            }
            Pending::Empty | Pending::Operator { .. } | Pending::Has { .. } => {
                Err(SyntaxError::new("stray '@'", offset))
            }
        }
    }

    fn combinator(&mut self, kind: FrameKind, offset: usize) -> Result<(), SyntaxError> {
        self.ensure_idle(offset)?;
        self.open(kind, offset, false)?;
        self.awaiting_paren = true;
        Ok(())
    }

    fn open(
        &mut self,
        kind: FrameKind,
        offset: usize,
        parenthesized: bool,
    ) -> Result<(), SyntaxError> {
        if self.stack.len() >= MAX_DEPTH {
            return Err(SyntaxError::new("query nested too deeply", offset));
        }
        self.stack.push(Frame {
            kind,
            children: Vec::new(),
            offset,
            parenthesized,
        });
        Ok(())
    }

    fn close(&mut self, offset: usize) -> Result<(), SyntaxError> {
        self.ensure_idle(offset)?;
        let Some(frame) = self.stack.pop() else {
            return Err(SyntaxError::new("unmatched ')'", offset));
        };
        if !frame.parenthesized {
            // Only an unparenthesized `!` can be open here, and it has no
            // operand yet.
            return Err(SyntaxError::new("'!' requires an operand", frame.offset));
        }
        let node = close_frame(frame)?;
        self.push_node(node);
        Ok(())
    }

    /// Errors out when a comparison is half written.
    fn ensure_idle(&self, offset: usize) -> Result<(), SyntaxError> {
        match &self.pending {
            Pending::Empty => Ok(()),
            Pending::Leading { .. } => Err(SyntaxError::new("missing operator", offset)),
            Pending::Operator { op, .. } => Err(SyntaxError::new(
                format!("missing value after '{}'", op.symbol()),
                offset,
            )),
            Pending::Has { .. } => Err(SyntaxError::new("missing attribute after '@'", offset)),
        }
    }

    fn push_node(&mut self, mut node: Node) {
        while self
            .stack
            .last()
            .is_some_and(|frame| frame.kind == FrameKind::Not && !frame.parenthesized)
        {
            self.stack.pop();
            node = Node::Group(Group::not(node));
        }
        self.children_mut().push(node);
    }

    fn children_mut(&mut self) -> &mut Vec<Node> {
        match self.stack.last_mut() {
            Some(frame) => &mut frame.children,
            None => &mut self.root,
        }
    }

    fn finish(self) -> Result<Group, SyntaxError> {
        self.ensure_idle(self.end)?;
        if let Some(frame) = self.stack.last() {
            let message = match (frame.kind, frame.parenthesized) {
                (FrameKind::Not, false) => "'!' requires an operand".to_string(),
                (kind, false) => format!("expected '(' after '{}'", kind.symbol()),
                _ => "unclosed '('".to_string(),
            };
            return Err(SyntaxError::new(message, frame.offset));
        }
        Ok(Group::and(self.root))
    }
}

fn check_attribute(attribute: &str, offset: usize) -> Result<(), SyntaxError> {
    if attribute.contains('%') {
        return Err(SyntaxError::new("invalid '%' in attribute name", offset));
    }
    Ok(())
}

fn complete(
    attribute: String,
    op: Operator,
    value: Literal,
    offset: usize,
) -> Result<Compare, SyntaxError> {
    let op = if value.is_wildcard() {
        if op == Operator::Neq {
            return Err(SyntaxError::new(
                "wildcard values cannot be used with '!='",
                offset,
            ));
        }
        Op::Like
    } else {
        match op {
            Operator::Eq => Op::Eq,
            Operator::Neq => Op::Neq,
            Operator::Gt => Op::Gt,
            Operator::Lt => Op::Lt,
            Operator::Gte => Op::Gte,
            Operator::Lte => Op::Lte,
            Operator::Has => Op::Has,
        }
    };
    Ok(Compare::new(attribute, op, value))
}

fn close_frame(frame: Frame) -> Result<Node, SyntaxError> {
    let Frame {
        kind,
        mut children,
        offset,
        ..
    } = frame;
    let group = match kind {
        FrameKind::Bare if children.len() == 1 => return Ok(children.remove(0)),
        FrameKind::Bare | FrameKind::And => Group::and(children),
        FrameKind::Or => Group::or(children),
        FrameKind::Not => match children.len() {
            1 => Group {
                kind: GroupKind::Not,
                children,
            },
            0 => return Err(SyntaxError::new("'!' requires an operand", offset)),
            _ => {
                return Err(SyntaxError::new(
                    "'!' requires exactly one operand",
                    offset,
                ));
            }
        },
    };
    Ok(Node::Group(group))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only_child(input: &str) -> Node {
        let mut root = parse_query(input).unwrap();
        assert_eq!(root.children.len(), 1, "{input}: {root:?}");
        root.children.remove(0)
    }

    #[test]
    fn empty_input_has_no_children() {
        assert!(parse_query("").unwrap().is_empty());
        assert!(parse_query(" \t ").unwrap().is_empty());
    }

    #[test]
    fn root_is_always_and() {
        assert_eq!(parse_query("aspect=10").unwrap().kind, GroupKind::And);
        assert_eq!(parse_query("|((a=1)(b=2))").unwrap().kind, GroupKind::And);
    }

    #[test]
    fn bare_group_with_one_child_collapses() {
        assert_eq!(only_child("(rating>1)"), only_child("rating>1"));
        assert_eq!(only_child("(((rating>1)))"), only_child("rating>1"));
    }

    #[test]
    fn explicit_groups_do_not_collapse() {
        let node = only_child("&((rating=1))");
        let group = node.as_group().unwrap();
        assert_eq!(group.kind, GroupKind::And);
        assert_eq!(group.children.len(), 1);
    }

    #[test]
    fn unparenthesized_not_takes_one_operand() {
        let node = only_child("!width=500");
        assert_eq!(node, Node::Group(Group::not(Node::compare("width", Op::Eq, 500))));

        let root = parse_query("!width=500 height=10").unwrap();
        assert_eq!(root.children.len(), 2);
    }

    #[test]
    fn stacked_negations() {
        let node = only_child("!!(a=1)");
        let inner = Node::Group(Group::not(Node::compare("a", Op::Eq, 1)));
        assert_eq!(node, Node::Group(Group::not(inner)));
    }

    #[test]
    fn combinator_requires_paren() {
        let err = parse_query("& a=1").unwrap_err();
        assert_eq!(err.message, "expected '(' after '&'");
        assert_eq!(err.position, 2);
        assert!(parse_query("|").is_err());
    }

    #[test]
    fn not_frame_with_two_children_is_rejected() {
        let err = parse_query("!((a=1)(b=2))").unwrap_err();
        assert_eq!(err.message, "'!' requires exactly one operand");
        assert_eq!(err.position, 0);
    }

    #[test]
    fn frames_close_in_order() {
        let err = parse_query("((a=1)").unwrap_err();
        assert_eq!(err, SyntaxError::new("unclosed '('", 0));
        let err = parse_query("(a=1))").unwrap_err();
        assert_eq!(err, SyntaxError::new("unmatched ')'", 5));
    }
}

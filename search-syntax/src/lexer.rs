//! Character-level scanner.
//!
//! Lexing is a small state machine driven by [`transition`]: every character
//! either extends the token being built, finishes it, or finishes it and gets
//! fed again from [`LexState::Start`]. [`Lexer`] only owns the cursor.

use crate::SyntaxError;
use std::{mem, str::CharIndices};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Lt,
    Gte,
    Lte,
    Has,
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Neq => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::Has => "@",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(String),
    Integer(i64),
    Quoted(String),
    Op(Operator),
    LParen,
    RParen,
    And,
    Or,
    Not,
}

/// A token and the byte offset of its first character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme {
    pub token: Token,
    pub offset: usize,
}

impl Lexeme {
    fn new(token: Token, offset: usize) -> Self {
        Self { token, offset }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LexState {
    #[default]
    Start,
    Word {
        offset: usize,
        text: String,
    },
    Integer {
        offset: usize,
        value: i64,
    },
    Quoted {
        offset: usize,
        quote: char,
        text: String,
    },
    /// Saw `>` or `<`, waiting to see whether `=` follows.
    Angle {
        offset: usize,
        operator: Operator,
    },
    /// Saw `!`: either `!=` or the negation combinator.
    Bang {
        offset: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Continue(LexState),
    /// The character was consumed and completed a token.
    Emit(Lexeme, LexState),
    /// The character ended the previous token and must be fed again from
    /// [`LexState::Start`].
    EmitThenRetry(Lexeme),
}

pub(crate) fn is_word_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '%'
}

pub(crate) fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '%'
}

fn is_quote(ch: char) -> bool {
    ch == '"' || ch == '\''
}

pub fn transition(state: LexState, ch: char, offset: usize) -> Result<Step, SyntaxError> {
    let step = match state {
        LexState::Start => return from_start(ch, offset),
        LexState::Word { offset: start, mut text } => {
            if is_word_char(ch) {
                text.push(ch);
                Step::Continue(LexState::Word {
                    offset: start,
                    text,
                })
            } else if is_quote(ch) {
                return Err(SyntaxError::new("unexpected quote inside bare word", offset));
            } else {
                Step::EmitThenRetry(Lexeme::new(Token::Word(text), start))
            }
        }
        LexState::Integer {
            offset: start,
            value,
        } => {
            if let Some(digit) = ch.to_digit(10) {
                let value = value
                    .checked_mul(10)
                    .and_then(|value| value.checked_add(i64::from(digit)))
                    .ok_or_else(|| SyntaxError::new("integer literal out of range", start))?;
                Step::Continue(LexState::Integer {
                    offset: start,
                    value,
                })
            } else if ch.is_alphanumeric() || ch == '_' {
                return Err(SyntaxError::new("attempted to add alpha char to int", offset));
            } else if ch == '%' {
                return Err(SyntaxError::new("invalid '%' in integer literal", offset));
            } else if is_quote(ch) {
                return Err(SyntaxError::new("unexpected quote inside integer literal", offset));
            } else {
                Step::EmitThenRetry(Lexeme::new(Token::Integer(value), start))
            }
        }
        LexState::Quoted {
            offset: start,
            quote,
            mut text,
        } => {
            if ch == quote {
                Step::Emit(Lexeme::new(Token::Quoted(text), start), LexState::Start)
            } else {
                text.push(ch);
                Step::Continue(LexState::Quoted {
                    offset: start,
                    quote,
                    text,
                })
            }
        }
        LexState::Angle {
            offset: start,
            operator,
        } => {
            if ch == '=' {
                let widened = match operator {
                    Operator::Gt => Operator::Gte,
                    Operator::Lt => Operator::Lte,
                    other => other,
                };
                Step::Emit(Lexeme::new(Token::Op(widened), start), LexState::Start)
            } else {
                Step::EmitThenRetry(Lexeme::new(Token::Op(operator), start))
            }
        }
        LexState::Bang { offset: start } => {
            if ch == '=' {
                Step::Emit(Lexeme::new(Token::Op(Operator::Neq), start), LexState::Start)
            } else {
                Step::EmitThenRetry(Lexeme::new(Token::Not, start))
            }
        }
    };
    Ok(step)
}

fn from_start(ch: char, offset: usize) -> Result<Step, SyntaxError> {
    let emit = |token| Ok(Step::Emit(Lexeme::new(token, offset), LexState::Start));
    if ch.is_whitespace() {
        return Ok(Step::Continue(LexState::Start));
    }
    if ch.is_ascii_digit() {
        return Ok(Step::Continue(LexState::Integer {
            offset,
            value: i64::from(ch as u8 - b'0'),
        }));
    }
    if is_word_start(ch) {
        return Ok(Step::Continue(LexState::Word {
            offset,
            text: ch.to_string(),
        }));
    }
    match ch {
        '"' | '\'' => Ok(Step::Continue(LexState::Quoted {
            offset,
            quote: ch,
            text: String::new(),
        })),
        '(' => emit(Token::LParen),
        ')' => emit(Token::RParen),
        '&' => emit(Token::And),
        '|' => emit(Token::Or),
        '=' => emit(Token::Op(Operator::Eq)),
        '@' => emit(Token::Op(Operator::Has)),
        '>' => Ok(Step::Continue(LexState::Angle {
            offset,
            operator: Operator::Gt,
        })),
        '<' => Ok(Step::Continue(LexState::Angle {
            offset,
            operator: Operator::Lt,
        })),
        '!' => Ok(Step::Continue(LexState::Bang { offset })),
        other => Err(SyntaxError::new(
            format!("unexpected character {other:?}"),
            offset,
        )),
    }
}

/// Flushes whatever token is still being built when input runs out.
pub fn finish(state: LexState) -> Result<Option<Lexeme>, SyntaxError> {
    let lexeme = match state {
        LexState::Start => return Ok(None),
        LexState::Word { offset, text } => Lexeme::new(Token::Word(text), offset),
        LexState::Integer { offset, value } => Lexeme::new(Token::Integer(value), offset),
        LexState::Quoted { offset, .. } => {
            return Err(SyntaxError::new("missing closing quote", offset));
        }
        LexState::Angle { offset, operator } => Lexeme::new(Token::Op(operator), offset),
        LexState::Bang { offset } => Lexeme::new(Token::Not, offset),
    };
    Ok(Some(lexeme))
}

/// Streams [`Lexeme`]s out of a query string. Stops after the first error.
pub struct Lexer<'a> {
    chars: CharIndices<'a>,
    state: LexState,
    retry: Option<(usize, char)>,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.char_indices(),
            state: LexState::Start,
            retry: None,
            done: false,
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Lexeme, SyntaxError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let Some((offset, ch)) = self.retry.take().or_else(|| self.chars.next()) else {
                self.done = true;
                return finish(mem::take(&mut self.state)).transpose();
            };
            match transition(mem::take(&mut self.state), ch, offset) {
                Ok(Step::Continue(state)) => self.state = state,
                Ok(Step::Emit(lexeme, state)) => {
                    self.state = state;
                    return Some(Ok(lexeme));
                }
                Ok(Step::EmitThenRetry(lexeme)) => {
                    self.retry = Some((offset, ch));
                    return Some(Ok(lexeme));
                }
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

pub fn tokenize(input: &str) -> Result<Vec<Lexeme>, SyntaxError> {
    Lexer::new(input).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|lexeme| lexeme.token)
            .collect()
    }

    fn word(text: &str) -> Token {
        Token::Word(text.to_string())
    }

    #[test]
    fn splits_simple_comparison() {
        assert_eq!(
            tokens("aspect=10"),
            vec![word("aspect"), Token::Op(Operator::Eq), Token::Integer(10)]
        );
    }

    #[test]
    fn widens_angle_operators() {
        assert_eq!(
            tokens("rating>=1 rating<2 rating<= 3 rating>4"),
            vec![
                word("rating"),
                Token::Op(Operator::Gte),
                Token::Integer(1),
                word("rating"),
                Token::Op(Operator::Lt),
                Token::Integer(2),
                word("rating"),
                Token::Op(Operator::Lte),
                Token::Integer(3),
                word("rating"),
                Token::Op(Operator::Gt),
                Token::Integer(4),
            ]
        );
    }

    #[test]
    fn bang_is_negation_unless_followed_by_equals() {
        assert_eq!(
            tokens("!(width!=500)"),
            vec![
                Token::Not,
                Token::LParen,
                word("width"),
                Token::Op(Operator::Neq),
                Token::Integer(500),
                Token::RParen,
            ]
        );
        assert_eq!(tokens("!"), vec![Token::Not]);
    }

    #[test]
    fn quoted_text_is_verbatim() {
        assert_eq!(
            tokens("(\"Sub Test Tag 3\"@tags)"),
            vec![
                Token::LParen,
                Token::Quoted("Sub Test Tag 3".into()),
                Token::Op(Operator::Has),
                word("tags"),
                Token::RParen,
            ]
        );
        assert_eq!(tokens("'a \"b\" (c)'"), vec![Token::Quoted("a \"b\" (c)".into())]);
        assert_eq!(tokens("\"it's\""), vec![Token::Quoted("it's".into())]);
    }

    #[test]
    fn percent_is_a_word_character() {
        assert_eq!(
            tokens("name=%random640%"),
            vec![word("name"), Token::Op(Operator::Eq), word("%random640%")]
        );
    }

    #[test]
    fn records_byte_offsets() {
        let lexemes = tokenize("  rating >= 12").unwrap();
        let offsets: Vec<_> = lexemes.iter().map(|lexeme| lexeme.offset).collect();
        assert_eq!(offsets, vec![2, 9, 12]);
    }

    #[test]
    fn rejects_letters_after_digits() {
        let err = tokenize("width=10px").unwrap_err();
        assert_eq!(err.message, "attempted to add alpha char to int");
        assert_eq!(err.position, 8);
        assert!(tokenize("width=10_0").is_err());
        assert!(tokenize("width=10%").is_err());
    }

    #[test]
    fn rejects_unterminated_quote() {
        let err = tokenize("name=\"foo").unwrap_err();
        assert_eq!(err.message, "missing closing quote");
        assert_eq!(err.position, 5);
    }

    #[test]
    fn rejects_quote_inside_bare_token() {
        assert!(tokenize("na\"me\"").is_err());
        assert!(tokenize("12'3'").is_err());
    }

    #[test]
    fn rejects_unknown_characters() {
        let err = tokenize("width=5;").unwrap_err();
        assert_eq!(err.position, 7);
        assert!(err.message.starts_with("unexpected character"));
    }

    #[test]
    fn rejects_integer_overflow() {
        let err = tokenize("size=99999999999999999999").unwrap_err();
        assert_eq!(err.message, "integer literal out of range");
        assert_eq!(err.position, 5);
    }

    #[test]
    fn transition_is_pure() {
        let state = LexState::Word {
            offset: 0,
            text: "wid".into(),
        };
        let step = transition(state.clone(), ' ', 3).unwrap();
        assert_eq!(step, Step::EmitThenRetry(Lexeme::new(word("wid"), 0)));
        assert_eq!(transition(state, ' ', 3).unwrap(), step);
    }
}

//! # Query syntax for the picture catalog
//!
//! `search-syntax` turns the compact filter language typed into the catalog
//! search box into a structured AST. It knows nothing about attributes or
//! their types; resolving names and literals against a schema is left to the
//! compiler in `search-catalog`.
//!
//! The language in one breath: comparisons are `attribute OP value` (or
//! `value@attribute` for membership), groups are `( ... )`, `&( ... )`,
//! `|( ... )` and `!( ... )`, and clauses written side by side are conjoined.
//!
//! ## Example
//! ```
//! use search_syntax::{parse_query, GroupKind, Literal, Node, Op};
//!
//! let root = parse_query("&((rating=4)(nsfw=0)) name=%random640%").unwrap();
//! assert_eq!(root.kind, GroupKind::And);
//! assert_eq!(root.children.len(), 2);
//!
//! let Node::Group(both) = &root.children[0] else { panic!() };
//! assert_eq!(both.kind, GroupKind::And);
//! assert_eq!(both.children[0], Node::compare("rating", Op::Eq, 4));
//!
//! // a `%` at either end of a string turns the comparison into a pattern
//! let Node::Compare(like) = &root.children[1] else { panic!() };
//! assert_eq!(like.op, Op::Like);
//! assert_eq!(like.value, Literal::String("%random640%".into()));
//! ```

mod ast;
mod error;
pub mod lexer;
mod parser;

pub use ast::{Compare, Group, GroupKind, Literal, Node, Op, RootDisplay};
pub use error::SyntaxError;
pub use parser::{MAX_DEPTH, parse_query};

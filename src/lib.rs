//! Query language front end for the picture catalog.
//!
//! [`compile`] runs the whole pipeline: the query string is parsed into a
//! [`Group`], checked against the catalog's attributes and turned into a query
//! bound to one viewer.
//!
//! ```
//! use cloud_search::{CompileError, compile};
//! use search_catalog::{MemoryCatalog, NewItem, ViewerId};
//!
//! let mut catalog = MemoryCatalog::new();
//! let library = catalog.add_library("Testing Library", "testing", "/srv/testing", false, None);
//! let folder = catalog.add_folder(library, "Foo Files 1").unwrap();
//! catalog.add_item(folder, NewItem::new("random100x100.png", 100, 100)).unwrap();
//!
//! let query = compile("width=100", &catalog, ViewerId(0)).unwrap();
//! assert_eq!(query.count(), 1);
//! assert!(matches!(
//!     compile("width>", &catalog, ViewerId(0)),
//!     Err(CompileError::Syntax(_))
//! ));
//! ```

mod saved;

pub use saved::{SavedSearch, SavedSearches};
pub use search_catalog::{Catalog, ExecutionError, QueryOf, Searcher, ViewerId};
pub use search_syntax::{Group, SyntaxError, parse_query};

use search_catalog::QueryBuilder;
use std::fmt::Debug;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),
    #[error("cannot execute query: {0}")]
    Execution(#[from] ExecutionError),
}

/// Parses `query` and compiles it against `catalog` for `viewer`.
pub fn compile<'c, C>(
    query: &str,
    catalog: &'c C,
    viewer: ViewerId,
) -> Result<QueryOf<'c, C>, CompileError>
where
    C: Catalog,
    <C::Builder<'c> as QueryBuilder>::Predicate: Debug,
{
    let root = parse_query(query)?;
    debug!("Parsed {query:?} as {}", root.display_root());
    Ok(Searcher::new(catalog).compile(&root, viewer)?)
}

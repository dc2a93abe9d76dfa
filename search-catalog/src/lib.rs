//! Attribute schema, the query compiler and an in-memory picture catalog.
//!
//! ```
//! use search_catalog::{MemoryCatalog, NewItem, Searcher, ViewerId};
//!
//! let mut catalog = MemoryCatalog::new();
//! let library = catalog.add_library("Testing Library", "testing", "/srv/testing", false, None);
//! let folder = catalog.add_folder(library, "Foo Files 1").unwrap();
//! catalog.add_item(folder, NewItem::new("random640x400.png", 640, 400)).unwrap();
//! catalog.add_item(folder, NewItem::new("random100x100.png", 100, 100).rating(4)).unwrap();
//!
//! let root = search_syntax::parse_query("aspect=10").unwrap();
//! let query = Searcher::new(&catalog).compile(&root, ViewerId(0)).unwrap();
//! let names: Vec<_> = query.execute().into_iter().map(|view| view.name).collect();
//! assert_eq!(names, ["random640x400.png"]);
//! ```

mod builder;
mod catalog;
mod error;
mod persistent;
mod predicate;
mod query;
mod schema;
mod searcher;
mod snapshot;

pub use builder::*;
pub use catalog::{
    Folder, FolderId, Item, ItemId, Library, LibraryId, MemoryCatalog, NewItem, Tag, TagId,
    filetype,
};
pub use error::*;
pub use persistent::*;
pub use predicate::{MemoryQueryBuilder, Predicate, Value};
pub use query::*;
pub use schema::*;
pub use searcher::*;
pub use snapshot::*;

#![allow(dead_code)]
//! Shared fixture for `search-catalog` integration tests: two public
//! libraries, five pictures and the IFDY tag forest.

use search_catalog::*;
use search_syntax::parse_query;

pub const VIEWER: ViewerId = ViewerId(0);

pub fn fixture() -> MemoryCatalog {
    let mut catalog = MemoryCatalog::new();

    let ifdy = catalog.add_tag("IFDY", None).unwrap();
    let tag1 = catalog.add_tag("Test Tag 1", Some(ifdy)).unwrap();
    let sub3 = catalog.add_tag("Sub Test Tag 3", Some(tag1)).unwrap();
    let tag2 = catalog.add_tag("Test Tag 2", Some(ifdy)).unwrap();
    let nested1 = catalog.add_tag("Test Tag 1", Some(tag2)).unwrap();
    let nsfw_tag = catalog.add_tag("NSFW Test Tag 1", Some(ifdy)).unwrap();

    let testing = catalog.add_library(
        "Testing Library",
        "testing_library",
        "/srv/pictures/testing",
        false,
        None,
    );
    let nsfw = catalog.add_library("NSFW Library", "nsfw_library", "/srv/pictures/nsfw", true, None);

    let foo1 = catalog.add_folder(testing, "Foo Files 1").unwrap();
    let foo2 = catalog.add_folder(testing, "Foo Files 2").unwrap();
    let nsfw_files = catalog.add_folder(nsfw, "NSFW Files").unwrap();

    catalog
        .add_item(
            foo1,
            NewItem::new("random320x240.png", 320, 240).size(1000).tag(nested1),
        )
        .unwrap();
    catalog
        .add_item(
            foo1,
            NewItem::new("random100x100.png", 100, 100)
                .rating(4)
                .size(200)
                .tag(sub3),
        )
        .unwrap();
    catalog
        .add_item(
            foo2,
            NewItem::new("random500x500.png", 500, 500)
                .rating(1)
                .size(5000)
                .comment("a comment"),
        )
        .unwrap();
    catalog
        .add_item(foo2, NewItem::new("random640x400.png", 640, 400).size(3000))
        .unwrap();
    catalog
        .add_item(
            nsfw_files,
            NewItem::new("random640x480.png", 640, 480).size(4000).tag(nsfw_tag),
        )
        .unwrap();

    catalog
}

pub fn compile<'a>(catalog: &'a MemoryCatalog, query: &str) -> Result<ItemQuery<'a>, ExecutionError> {
    compile_for(catalog, query, VIEWER)
}

pub fn compile_for<'a>(
    catalog: &'a MemoryCatalog,
    query: &str,
    viewer: ViewerId,
) -> Result<ItemQuery<'a>, ExecutionError> {
    let root = parse_query(query).unwrap_or_else(|err| panic!("{query:?}: {err}"));
    Searcher::new(catalog).compile(&root, viewer)
}

/// Names matching `query` for [`VIEWER`], in default (name) order.
pub fn names(catalog: &MemoryCatalog, query: &str) -> Vec<String> {
    names_for(catalog, query, VIEWER)
}

pub fn names_for(catalog: &MemoryCatalog, query: &str, viewer: ViewerId) -> Vec<String> {
    compile_for(catalog, query, viewer)
        .unwrap_or_else(|err| panic!("{query:?}: {err}"))
        .execute()
        .into_iter()
        .map(|view| view.name)
        .collect()
}

pub fn count(catalog: &MemoryCatalog, query: &str) -> usize {
    compile(catalog, query)
        .unwrap_or_else(|err| panic!("{query:?}: {err}"))
        .count()
}

#![allow(dead_code)]

use search_catalog::{MemoryCatalog, NewItem, ViewerId};

pub const OWNER: ViewerId = ViewerId(7);

/// One public library and one owned by [`OWNER`].
pub fn catalog() -> MemoryCatalog {
    let mut catalog = MemoryCatalog::new();
    let ifdy = catalog.add_tag("IFDY", None).unwrap();
    let tag1 = catalog.add_tag("Test Tag 1", Some(ifdy)).unwrap();

    let public = catalog.add_library("Testing Library", "testing_library", "/srv/testing", false, None);
    let private = catalog.add_library("Private", "private", "/srv/private", false, Some(OWNER));
    let foo = catalog.add_folder(public, "Foo Files 1").unwrap();
    let mine = catalog.add_folder(private, "Mine").unwrap();

    catalog
        .add_item(foo, NewItem::new("random640x400.png", 640, 400).tag(tag1))
        .unwrap();
    catalog
        .add_item(foo, NewItem::new("random100x100.png", 100, 100).rating(4))
        .unwrap();
    catalog
        .add_item(mine, NewItem::new("secret640x400.png", 640, 400).rating(4))
        .unwrap();
    catalog
}

pub fn names(views: Vec<search_catalog::ItemView>) -> Vec<String> {
    views.into_iter().map(|view| view.name).collect()
}

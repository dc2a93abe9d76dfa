#![allow(dead_code)]
//! Shared helpers for `search-syntax` integration tests.

use search_syntax::*;

pub fn parse_ok(input: &str) -> Group {
    parse_query(input).unwrap_or_else(|err| panic!("{input:?} failed: {err}"))
}

pub fn parse_err(input: &str) -> SyntaxError {
    match parse_query(input) {
        Ok(root) => panic!("{input:?} unexpectedly parsed: {root:?}"),
        Err(err) => err,
    }
}

/// The single top-level clause of `input`.
pub fn single(input: &str) -> Node {
    let mut root = parse_ok(input);
    assert_eq!(root.children.len(), 1, "expected one clause in {input:?}");
    root.children.remove(0)
}

pub fn as_group(node: &Node, kind: GroupKind) -> &Vec<Node> {
    match node {
        Node::Group(group) if group.kind == kind => &group.children,
        other => panic!("expected {kind:?} group, got: {other:?}"),
    }
}

pub fn as_compare(node: &Node) -> &Compare {
    match node {
        Node::Compare(compare) => compare,
        other => panic!("expected Compare, got: {other:?}"),
    }
}

pub fn compare_is(node: &Node, attribute: &str, op: Op, value: impl Into<Literal>) {
    let compare = as_compare(node);
    assert_eq!(compare.attribute, attribute);
    assert_eq!(compare.op, op);
    assert_eq!(compare.value, value.into());
}

/// Re-parses the canonical rendering of `input` and checks nothing changed.
pub fn assert_round_trip(input: &str) {
    let root = parse_ok(input);
    let rendered = root.display_root().to_string();
    let reparsed = parse_query(&rendered)
        .unwrap_or_else(|err| panic!("{input:?} rendered as {rendered:?} which failed: {err}"));
    assert_eq!(reparsed, root, "{input:?} rendered as {rendered:?}");
}

use crate::{Attribute, ExecutionError};
use search_syntax::{Literal, Op};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt};

/// Identity a query runs on behalf of. Decides which libraries are visible.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ViewerId(pub u64);

impl fmt::Display for ViewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "viewer#{}", self.0)
    }
}

/// Turns checked comparisons into a catalog specific query.
///
/// A builder is created already bound to a viewer; [`QueryBuilder::filter`]
/// conjoins that viewer's scope with the compiled predicate, so there is no
/// way to obtain a query that skips it.
pub trait QueryBuilder {
    type Predicate;
    type Query;

    /// Scalar comparison. `op` is never [`Op::Has`].
    fn compare(
        &self,
        attribute: Attribute,
        op: Op,
        value: &Literal,
    ) -> Result<Self::Predicate, ExecutionError>;

    /// Membership of `value` in a multi-valued attribute.
    fn contains(
        &self,
        attribute: Attribute,
        value: &Literal,
    ) -> Result<Self::Predicate, ExecutionError>;

    fn and(&self, parts: Vec<Self::Predicate>) -> Self::Predicate;
    fn or(&self, parts: Vec<Self::Predicate>) -> Self::Predicate;
    fn not(&self, part: Self::Predicate) -> Self::Predicate;

    fn filter(self, predicate: Self::Predicate) -> Self::Query;
}

pub trait Catalog {
    type Builder<'a>: QueryBuilder
    where
        Self: 'a;

    /// Attributes queries may reference, in schema order.
    fn attributes(&self) -> &[Attribute];

    fn attribute_names(&self) -> BTreeSet<&'static str> {
        self.attributes().iter().map(|attribute| attribute.name()).collect()
    }

    fn scoped_query(&self, viewer: ViewerId) -> Self::Builder<'_>;
}

/// Query type produced by compiling against `C`.
pub type QueryOf<'a, C> = <<C as Catalog>::Builder<'a> as QueryBuilder>::Query;

use crate::{Attribute, AttributeKind, Catalog, ExecutionError, QueryBuilder, QueryOf, ViewerId};
use search_syntax::{Compare, Group, GroupKind, Literal, Node, Op};
use std::fmt::Debug;
use tracing::debug;

/// Compiles parsed queries into catalog queries.
///
/// The searcher resolves attribute names and checks literal types; building
/// the actual predicate is delegated to the catalog's [`QueryBuilder`].
pub struct Searcher<'c, C: Catalog> {
    catalog: &'c C,
}

impl<'c, C> Searcher<'c, C>
where
    C: Catalog,
    <C::Builder<'c> as QueryBuilder>::Predicate: Debug,
{
    pub fn new(catalog: &'c C) -> Self {
        Self { catalog }
    }

    pub fn compile(&self, root: &Group, viewer: ViewerId) -> Result<QueryOf<'c, C>, ExecutionError> {
        let builder = self.catalog.scoped_query(viewer);
        let predicate = self.compile_group(&builder, root)?;
        debug!("Compiled predicate for {viewer}: {predicate:?}");
        Ok(builder.filter(predicate))
    }

    fn compile_node(
        &self,
        builder: &C::Builder<'c>,
        node: &Node,
    ) -> Result<<C::Builder<'c> as QueryBuilder>::Predicate, ExecutionError> {
        match node {
            Node::Compare(compare) => self.compile_compare(builder, compare),
            Node::Group(group) => self.compile_group(builder, group),
        }
    }

    fn compile_group(
        &self,
        builder: &C::Builder<'c>,
        group: &Group,
    ) -> Result<<C::Builder<'c> as QueryBuilder>::Predicate, ExecutionError> {
        let mut parts = group
            .children
            .iter()
            .map(|child| self.compile_node(builder, child))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(match group.kind {
            GroupKind::And => builder.and(parts),
            GroupKind::Or => builder.or(parts),
            GroupKind::Not if parts.len() == 1 => builder.not(parts.remove(0)),
            // hand-built groups only
            GroupKind::Not => builder.not(builder.and(parts)),
        })
    }

    fn compile_compare(
        &self,
        builder: &C::Builder<'c>,
        compare: &Compare,
    ) -> Result<<C::Builder<'c> as QueryBuilder>::Predicate, ExecutionError> {
        let attribute = self.resolve(&compare.attribute)?;
        check_operands(attribute, compare.op, &compare.value)?;
        match compare.op {
            Op::Has => builder.contains(attribute, &compare.value),
            op => builder.compare(attribute, op, &compare.value),
        }
    }

    fn resolve(&self, name: &str) -> Result<Attribute, ExecutionError> {
        Attribute::from_name(name)
            .filter(|attribute| self.catalog.attributes().contains(attribute))
            .ok_or_else(|| ExecutionError::UnknownAttribute(name.to_string()))
    }
}

/// Schema level type rules shared by every catalog.
pub fn check_operands(attribute: Attribute, op: Op, value: &Literal) -> Result<(), ExecutionError> {
    let kind = attribute.kind();
    let mismatch = |expected, found| ExecutionError::TypeMismatch {
        attribute: attribute.name().to_string(),
        expected,
        found,
    };
    match (kind, op) {
        (AttributeKind::Set, Op::Has) => Ok(()),
        (AttributeKind::Set, _) => Err(mismatch("a membership test", "a scalar comparison")),
        (_, Op::Has) => Err(ExecutionError::UnsupportedOperator {
            attribute: attribute.name().to_string(),
            op,
            kind,
        }),
        (AttributeKind::Integer, Op::Like) => Err(mismatch(kind.name(), "string pattern")),
        (AttributeKind::Integer, _) => match value.as_integer() {
            Some(_) => Ok(()),
            None => Err(mismatch(kind.name(), value.type_name())),
        },
        (AttributeKind::Text, _) => Ok(()),
    }
}

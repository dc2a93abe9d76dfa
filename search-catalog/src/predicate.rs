use crate::{
    Attribute, AttributeKind, ExecutionError, ItemId, ItemQuery, MemoryCatalog, QueryBuilder,
    ViewerId,
    catalog::{integer_value, text_value},
    check_operands,
};
use hashbrown::HashSet;
use itertools::Itertools;
use regex::{Regex, RegexBuilder};
use search_syntax::{Literal, Op};
use std::{cmp::Ordering, fmt};

/// Right-hand side of a compiled comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Integer(i64),
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(value) => write!(f, "{value}"),
            Value::Text(text) => write!(f, "{text:?}"),
        }
    }
}

/// Predicate evaluated by [`MemoryCatalog`].
#[derive(Debug, Clone)]
pub enum Predicate {
    All,
    /// Items in libraries the viewer may see.
    Visible(ViewerId),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
    Compare {
        attribute: Attribute,
        op: Op,
        value: Value,
    },
    Like {
        attribute: Attribute,
        pattern: String,
        regex: Regex,
    },
    Contains {
        attribute: Attribute,
        value: String,
    },
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::All => f.write_str("true"),
            Predicate::Visible(viewer) => write!(f, "visible_to({viewer})"),
            Predicate::And(parts) => write!(f, "({})", parts.iter().join(" and ")),
            Predicate::Or(parts) => write!(f, "({})", parts.iter().join(" or ")),
            Predicate::Not(inner) => write!(f, "not {inner}"),
            Predicate::Compare {
                attribute,
                op,
                value,
            } => write!(f, "{attribute} {} {value}", op.symbol()),
            Predicate::Like {
                attribute, pattern, ..
            } => write!(f, "{attribute} like {pattern:?}"),
            Predicate::Contains { attribute, value } => write!(f, "{value:?} in {attribute}"),
        }
    }
}

/// `%` matches any run of characters; everything else is literal.
fn like_to_regex(pattern: &str) -> String {
    let mut regex = String::with_capacity(pattern.len() + 3);
    regex.push('^');
    for ch in pattern.chars() {
        match ch {
            '%' => regex.push_str(".*"),
            _ => {
                let mut buf = [0u8; 4];
                let encoded = ch.encode_utf8(&mut buf);
                regex.push_str(&regex::escape(encoded));
            }
        }
    }
    regex.push('$');
    regex
}

fn text_operand(value: &Literal) -> String {
    value
        .as_str()
        .map_or_else(|| value.to_string(), str::to_string)
}

pub struct MemoryQueryBuilder<'a> {
    catalog: &'a MemoryCatalog,
    viewer: ViewerId,
}

impl<'a> MemoryQueryBuilder<'a> {
    pub(crate) fn new(catalog: &'a MemoryCatalog, viewer: ViewerId) -> Self {
        Self { catalog, viewer }
    }
}

impl<'a> QueryBuilder for MemoryQueryBuilder<'a> {
    type Predicate = Predicate;
    type Query = ItemQuery<'a>;

    /// Expects operands that passed [`check_operands`], as [`Searcher`]
    /// guarantees.
    ///
    /// [`Searcher`]: crate::Searcher
    fn compare(
        &self,
        attribute: Attribute,
        op: Op,
        value: &Literal,
    ) -> Result<Predicate, ExecutionError> {
        debug_assert!(check_operands(attribute, op, value).is_ok());
        if op == Op::Like {
            let pattern = text_operand(value);
            let regex = RegexBuilder::new(&like_to_regex(&pattern))
                .case_insensitive(true)
                .build()
                .map_err(|err| ExecutionError::InvalidPattern {
                    pattern: pattern.clone(),
                    message: err.to_string(),
                })?;
            return Ok(Predicate::Like {
                attribute,
                pattern,
                regex,
            });
        }
        let value = match (attribute.kind(), value.as_integer()) {
            (AttributeKind::Integer, Some(number)) => Value::Integer(number),
            _ => Value::Text(text_operand(value)),
        };
        Ok(Predicate::Compare {
            attribute,
            op,
            value,
        })
    }

    fn contains(&self, attribute: Attribute, value: &Literal) -> Result<Predicate, ExecutionError> {
        debug_assert!(check_operands(attribute, Op::Has, value).is_ok());
        Ok(Predicate::Contains {
            attribute,
            value: text_operand(value),
        })
    }

    fn and(&self, parts: Vec<Predicate>) -> Predicate {
        if parts.is_empty() {
            Predicate::All
        } else {
            Predicate::And(parts)
        }
    }

    fn or(&self, parts: Vec<Predicate>) -> Predicate {
        Predicate::Or(parts)
    }

    fn not(&self, part: Predicate) -> Predicate {
        Predicate::Not(Box::new(part))
    }

    fn filter(self, predicate: Predicate) -> ItemQuery<'a> {
        let scoped = Predicate::And(vec![Predicate::Visible(self.viewer), predicate]);
        ItemQuery::new(self.catalog, scoped)
    }
}

impl MemoryCatalog {
    /// Items of `base` satisfying `predicate`, in `base` order.
    pub(crate) fn evaluate(&self, predicate: &Predicate, base: Vec<ItemId>) -> Vec<ItemId> {
        match predicate {
            Predicate::All => base,
            Predicate::And(parts) => self.evaluate_and(parts, base),
            Predicate::Or(parts) => self.evaluate_or(parts, &base),
            Predicate::Not(inner) => self.evaluate_not(inner, base),
            leaf => filter_items(base, |id| self.matches(leaf, id)),
        }
    }

    fn evaluate_and(&self, parts: &[Predicate], base: Vec<ItemId>) -> Vec<ItemId> {
        let mut current = base;
        for part in parts {
            if current.is_empty() {
                break;
            }
            current = self.evaluate(part, current);
        }
        current
    }

    fn evaluate_or(&self, parts: &[Predicate], base: &[ItemId]) -> Vec<ItemId> {
        let mut result = Vec::new();
        for part in parts {
            let nodes = self.evaluate(part, base.to_vec());
            union_in_place(&mut result, &nodes);
        }
        // results follow `base` order
        let matched: HashSet<ItemId> = result.into_iter().collect();
        base.iter().copied().filter(|id| matched.contains(id)).collect()
    }

    fn evaluate_not(&self, inner: &Predicate, base: Vec<ItemId>) -> Vec<ItemId> {
        let negated = self.evaluate(inner, base.clone());
        let mut universe = base;
        difference_in_place(&mut universe, &negated);
        universe
    }

    fn matches(&self, leaf: &Predicate, id: ItemId) -> bool {
        let Some(item) = self.item(id) else {
            return false;
        };
        match leaf {
            Predicate::Visible(viewer) => self.visible_to(item, *viewer),
            Predicate::Compare {
                attribute,
                op,
                value: Value::Integer(expected),
            } => integer_value(self, item, *attribute)
                .is_some_and(|actual| op_holds(*op, actual.cmp(expected))),
            Predicate::Compare {
                attribute,
                op,
                value: Value::Text(expected),
            } => text_value(item, *attribute)
                .is_some_and(|actual| op_holds(*op, actual.as_str().cmp(expected.as_str()))),
            Predicate::Like {
                attribute, regex, ..
            } => text_value(item, *attribute).is_some_and(|actual| regex.is_match(&actual)),
            Predicate::Contains { value, .. } => self.tag_names(item).any(|name| name == value),
            Predicate::All | Predicate::And(_) | Predicate::Or(_) | Predicate::Not(_) => {
                self.evaluate(leaf, vec![id]).len() == 1
            }
        }
    }
}

fn op_holds(op: Op, ordering: Ordering) -> bool {
    match op {
        Op::Eq => ordering == Ordering::Equal,
        Op::Neq => ordering != Ordering::Equal,
        Op::Gt => ordering == Ordering::Greater,
        Op::Lt => ordering == Ordering::Less,
        Op::Gte => ordering != Ordering::Less,
        Op::Lte => ordering != Ordering::Greater,
        Op::Like | Op::Has => false,
    }
}

fn filter_items(nodes: Vec<ItemId>, mut predicate: impl FnMut(ItemId) -> bool) -> Vec<ItemId> {
    let mut filtered = Vec::with_capacity(nodes.len());
    for index in nodes {
        if predicate(index) {
            filtered.push(index);
        }
    }
    filtered
}

fn difference_in_place(values: &mut Vec<ItemId>, rhs: &[ItemId]) {
    if values.is_empty() || rhs.is_empty() {
        return;
    }
    let rhs_set: HashSet<ItemId> = rhs.iter().copied().collect();
    values.retain(|index| !rhs_set.contains(index));
}

fn union_in_place(values: &mut Vec<ItemId>, rhs: &[ItemId]) {
    if rhs.is_empty() {
        return;
    }
    let mut seen: HashSet<ItemId> = values.iter().copied().collect();
    for index in rhs.iter().copied() {
        if seen.insert(index) {
            values.push(index);
        }
    }
}

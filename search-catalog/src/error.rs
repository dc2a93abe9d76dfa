use crate::AttributeKind;
use search_syntax::Op;
use thiserror::Error;

/// A well-formed query that cannot run against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("unknown attribute '{0}'")]
    UnknownAttribute(String),
    #[error("attribute '{attribute}' expects {expected}, found {found}")]
    TypeMismatch {
        attribute: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("operator '{op}' is not supported on {kind} attribute '{attribute}'")]
    UnsupportedOperator {
        attribute: String,
        op: Op,
        kind: AttributeKind,
    },
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

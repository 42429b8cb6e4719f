//! Error taxonomy for the schema subsystem
//!
//! Two families, both returned values and never swallowed:
//! - configuration errors: catalog misuse detectable independent of input
//!   (an enum default outside its own value set, a malformed text pattern);
//!   a programmer or deployment defect, never retried
//! - validation errors: raised per value by the validation engine, subtyped
//!   per cause and always recoverable by the caller

use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Top-level schema error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// Field configuration is unusable regardless of input.
    #[error("configuration error, {0}")]
    Configuration(String),

    /// A value was rejected by a field constraint.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Per-value rejection, one variant per constraint.
///
/// Messages are human-readable and carry the violated bound.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("invalid value, expected non-null")]
    NonNullRequired,

    #[error("invalid value, expected {expected}")]
    TypeMismatch { expected: &'static str },

    /// Numeric or temporal bound violation; `detail` names the direction and
    /// the bound, e.g. "too small, min value is 5".
    #[error("value {detail}")]
    OutOfRange { detail: String },

    #[error("value too long, max length is {max}")]
    TooLong { max: usize },

    #[error("value too short, min length is {min}")]
    TooShort { min: usize },

    #[error("value does not match pattern, pattern is {pattern}")]
    PatternMismatch { pattern: String },

    #[error("invalid value, expected one of [{allowed}]")]
    NotEnumMember { allowed: String },

    #[error("invalid id, {reason}")]
    InvalidIdentifierFormat { reason: String },

    /// Record-level only: the written record carries a field the collection
    /// does not declare.
    #[error("unknown field {field}")]
    UnknownField { field: String },
}

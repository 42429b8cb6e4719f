//! Storage capability errors
//!
//! A storage failure while applying a structural operation aborts the
//! remaining operations of the batch and must prevent the collection's
//! baseline from advancing. Capabilities that are not yet designed fail
//! loudly and distinctly instead of masquerading as success.

use thiserror::Error;

use crate::schema::StructuralOp;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error surfaced by a storage capability.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    /// Backend failure, message passed through verbatim.
    #[error("{0}")]
    Backend(String),

    /// The capability exists in the contract but has no implementation yet.
    #[error("not yet supported: {0}")]
    Unimplemented(&'static str),
}

/// A structural operation failed mid-batch.
///
/// Carries which operation failed and the storage error verbatim.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("failed to apply '{operation}': {source}")]
pub struct ReconcileError {
    pub operation: StructuralOp,
    #[source]
    pub source: StorageError,
}

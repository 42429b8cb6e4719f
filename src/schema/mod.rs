//! Schema subsystem: the declared model, its validation, and its diff
//!
//! Hosts declare [`Collection`]s with typed [`Field`]s; the diff engine
//! compares a collection against the baseline frozen by its last
//! [`Collection::forward`] and derives the ordered [`StructuralOp`] list
//! that converges the database. Independently, the validation engine checks
//! record values against each field's constraints before a write.
//!
//! # Principles
//!
//! - Diffing and validation are pure computations over in-memory graphs
//! - The field type catalog is closed; consumers match it exhaustively
//! - All errors are returned values, subtyped per cause
//! - Baseline history is bounded to depth 1: clones never carry it

mod diff;
mod errors;
mod types;
mod validator;

pub use diff::{ColumnDef, StructuralOp};
pub use errors::{SchemaError, SchemaResult, ValidationError};
pub use types::{
    AccessRule, BoolField, Collection, CollectionSchema, DateTimeField, EnumField, Field,
    FieldSchema, FieldType, FloatField, IdField, IntField, RelationField, TextField, TimeSource,
    View, ViewSchema,
};
pub use validator::FieldValue;

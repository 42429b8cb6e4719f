//! stratadb - a declarative schema layer with diff-based reconciliation
//!
//! Hosts declare collections and typed fields in code; stratadb diffs the
//! declaration against the baseline frozen at the last successful
//! reconciliation, derives the ordered structural operations that converge
//! an embedded SQL database, and validates record values against per-field
//! constraints before writes.

pub mod id;
pub mod migration;
pub mod observability;
pub mod schema;
pub mod storage;

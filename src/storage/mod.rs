//! Storage capability contract and the reconciler driving it
//!
//! The core never talks SQL to a database directly; it drives a
//! [`StorageTransaction`] implementation through typed structural
//! operations and column definitions. The contract also covers the
//! migration-history bookkeeping the migration runner needs.
//!
//! # Principles
//!
//! - One collection's reconciliation is one logical batch inside one
//!   transaction; the caller owns commit and rollback
//! - A capability failure is fatal for the batch, never retried here
//! - Not-yet-designed capabilities default to a loud `Unimplemented` error

mod errors;
mod reconcile;
mod sql;

pub use errors::{ReconcileError, StorageError, StorageResult};
pub use reconcile::{drop_collection, save_collection};
pub use sql::{column_clause, statement, SqlDatabase, SqlExecutor, SqlTransaction};

use crate::schema::{ColumnDef, View};

/// One open transaction against the storage backend.
///
/// Structural methods mirror the operations the diff engine emits. View and
/// migration-history methods have default bodies failing with
/// [`StorageError::Unimplemented`]; adapters override what they support.
pub trait StorageTransaction {
    fn commit(self) -> StorageResult<()>
    where
        Self: Sized;

    fn rollback(self) -> StorageResult<()>
    where
        Self: Sized;

    fn create_table(&mut self, table: &str, columns: &[ColumnDef]) -> StorageResult<()>;

    fn rename_table(&mut self, from: &str, to: &str) -> StorageResult<()>;

    fn add_column(&mut self, table: &str, column: &ColumnDef) -> StorageResult<()>;

    fn rename_column(&mut self, table: &str, from: &str, to: &str) -> StorageResult<()>;

    fn drop_column(&mut self, table: &str, column: &str) -> StorageResult<()>;

    fn drop_table(&mut self, table: &str) -> StorageResult<()>;

    fn create_view(&mut self, view: &View) -> StorageResult<()> {
        let _ = view;
        Err(StorageError::Unimplemented("create view"))
    }

    fn drop_view(&mut self, view: &View) -> StorageResult<()> {
        let _ = view;
        Err(StorageError::Unimplemented("drop view"))
    }

    /// Whether the named migration has already been performed.
    fn migration_exists(&mut self, name: &str) -> StorageResult<bool> {
        let _ = name;
        Err(StorageError::Unimplemented("migration bookkeeping"))
    }

    /// Records the named migration in the migration history.
    fn finish_migration(&mut self, name: &str) -> StorageResult<()> {
        let _ = name;
        Err(StorageError::Unimplemented("migration bookkeeping"))
    }
}

/// A storage backend that can open transactions.
pub trait StorageAdapter {
    type Transaction: StorageTransaction;

    fn begin(&mut self) -> StorageResult<Self::Transaction>;

    fn close(self) -> StorageResult<()>;
}

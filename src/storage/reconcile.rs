//! Batch application of structural operations
//!
//! Applies a collection's diff through an open transaction, in order, and
//! advances the baseline only after every operation succeeded. On failure
//! the remaining operations are abandoned and the baseline stays put, so a
//! later forward can only follow a fully applied batch. Whether the
//! enclosing transaction rolls back is the caller's decision.

use crate::observability::Logger;
use crate::schema::{Collection, StructuralOp};
use crate::storage::errors::{ReconcileError, StorageError, StorageResult};
use crate::storage::StorageTransaction;

fn apply<T: StorageTransaction + ?Sized>(tx: &mut T, op: &StructuralOp) -> StorageResult<()> {
    match op {
        StructuralOp::CreateTable { table, columns } => tx.create_table(table, columns),
        StructuralOp::RenameTable { from, to } => tx.rename_table(from, to),
        StructuralOp::DropColumn { table, column } => tx.drop_column(table, column),
        StructuralOp::RenameColumn { table, from, to } => tx.rename_column(table, from, to),
        StructuralOp::AddColumn { table, column } => tx.add_column(table, column),
        StructuralOp::DropTable { table } => tx.drop_table(table),
    }
}

/// Reconciles one collection: diffs it against its baseline, applies the
/// resulting operations in order, and forwards the baseline on success.
///
/// A no-op diff leaves the collection untouched. The first failing
/// operation aborts the rest of the batch and is returned with its cause;
/// the baseline is not advanced in that case.
pub fn save_collection<T: StorageTransaction + ?Sized>(
    tx: &mut T,
    collection: &mut Collection,
) -> Result<(), ReconcileError> {
    let ops = collection.diff();

    if ops.is_empty() {
        Logger::trace("RECONCILE_NOOP", &[("collection", &collection.name)]);
        return Ok(());
    }

    for op in &ops {
        apply(tx, op).map_err(|source| ReconcileError {
            operation: op.clone(),
            source,
        })?;

        let description = op.to_string();
        Logger::info(
            "RECONCILE_APPLY",
            &[("collection", &collection.name), ("operation", &description)],
        );
    }

    collection.forward();
    Ok(())
}

/// Dropping a collection is not designed yet; fails loudly instead of
/// silently succeeding.
pub fn drop_collection<T: StorageTransaction + ?Sized>(
    tx: &mut T,
    collection: &Collection,
) -> Result<(), ReconcileError> {
    let _ = tx;
    Err(ReconcileError {
        operation: StructuralOp::DropTable {
            table: collection.name.clone(),
        },
        source: StorageError::Unimplemented("drop collection"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDef, Field, FieldType, View};

    /// Records applied operations; optionally fails on a chosen one.
    struct ScriptedTx {
        applied: Vec<String>,
        fail_on: Option<&'static str>,
    }

    impl ScriptedTx {
        fn new() -> Self {
            Self {
                applied: Vec::new(),
                fail_on: None,
            }
        }

        fn failing_on(kind: &'static str) -> Self {
            Self {
                applied: Vec::new(),
                fail_on: Some(kind),
            }
        }

        fn record(&mut self, kind: &'static str, detail: String) -> StorageResult<()> {
            if self.fail_on == Some(kind) {
                return Err(StorageError::Backend(format!("injected failure: {}", kind)));
            }
            self.applied.push(detail);
            Ok(())
        }
    }

    impl StorageTransaction for ScriptedTx {
        fn commit(self) -> StorageResult<()> {
            Ok(())
        }

        fn rollback(self) -> StorageResult<()> {
            Ok(())
        }

        fn create_table(&mut self, table: &str, columns: &[ColumnDef]) -> StorageResult<()> {
            self.record("create_table", format!("create {} ({})", table, columns.len()))
        }

        fn rename_table(&mut self, from: &str, to: &str) -> StorageResult<()> {
            self.record("rename_table", format!("rename {} -> {}", from, to))
        }

        fn add_column(&mut self, table: &str, column: &ColumnDef) -> StorageResult<()> {
            self.record("add_column", format!("add {}.{}", table, column.name))
        }

        fn rename_column(&mut self, table: &str, from: &str, to: &str) -> StorageResult<()> {
            self.record("rename_column", format!("rename {}.{} -> {}", table, from, to))
        }

        fn drop_column(&mut self, table: &str, column: &str) -> StorageResult<()> {
            self.record("drop_column", format!("drop {}.{}", table, column))
        }

        fn drop_table(&mut self, table: &str) -> StorageResult<()> {
            self.record("drop_table", format!("drop {}", table))
        }
    }

    fn users() -> Collection {
        Collection::with_fields(
            "users",
            vec![
                Field::new("id", FieldType::primary_id()),
                Field::new("email", FieldType::text()),
            ],
        )
    }

    #[test]
    fn test_successful_batch_advances_baseline() {
        let mut tx = ScriptedTx::new();
        let mut collection = users();

        save_collection(&mut tx, &mut collection).unwrap();

        assert_eq!(tx.applied, vec!["create users (2)"]);
        assert!(collection.original().is_some());
        assert!(collection.diff().is_empty());
    }

    #[test]
    fn test_noop_batch_leaves_everything_alone() {
        let mut tx = ScriptedTx::new();
        let mut collection = users();
        collection.forward();

        save_collection(&mut tx, &mut collection).unwrap();
        assert!(tx.applied.is_empty());
    }

    #[test]
    fn test_failure_aborts_batch_and_keeps_baseline() {
        let mut collection = users();
        save_collection(&mut ScriptedTx::new(), &mut collection).unwrap();

        // Rename one field and add another; make the add fail.
        collection.schema.field_mut("email").unwrap().name = "contact".into();
        collection
            .schema
            .fields
            .push(Field::new("active", FieldType::boolean()));

        let mut tx = ScriptedTx::failing_on("add_column");
        let err = save_collection(&mut tx, &mut collection).unwrap_err();

        // The rename before the failing add was applied, nothing after.
        assert_eq!(tx.applied, vec!["rename users.email -> contact"]);
        assert!(err.to_string().contains("add column active on users"));
        assert!(err.to_string().contains("injected failure"));

        // Baseline still describes the pre-rename state, so the next diff
        // re-derives the remaining work.
        let ops = collection.diff();
        assert_eq!(ops.len(), 2);
    }

    #[test]
    fn test_drop_collection_fails_loudly() {
        let mut tx = ScriptedTx::new();
        let err = drop_collection(&mut tx, &users()).unwrap_err();
        assert!(err.to_string().contains("not yet supported"));
        assert!(tx.applied.is_empty());
    }

    #[test]
    fn test_view_capabilities_default_to_unimplemented() {
        let mut tx = ScriptedTx::new();
        let view = View {
            name: "recent_users".into(),
            original_name: "recent_users".into(),
            schema: Default::default(),
        };

        assert_eq!(
            tx.create_view(&view).unwrap_err(),
            StorageError::Unimplemented("create view")
        );
        assert_eq!(
            tx.drop_view(&view).unwrap_err(),
            StorageError::Unimplemented("drop view")
        );
    }
}

//! SQL rendering over the storage capability
//!
//! Renders column definitions and structural operations into DDL statement
//! strings and drives them through any [`SqlExecutor`]. The executor is the
//! only engine-specific piece; everything here is pure string generation,
//! testable without a database.

use crate::schema::{ColumnDef, StructuralOp};
use crate::storage::errors::StorageResult;
use crate::storage::StorageTransaction;

/// Minimal surface a SQL engine binding has to provide.
pub trait SqlExecutor {
    fn execute(&mut self, statement: &str) -> StorageResult<()>;
}

/// Renders one column definition as a column clause.
pub fn column_clause(def: &ColumnDef) -> String {
    let mut sql = format!("{} {}", def.name, def.native_type);

    if def.nullable {
        sql.push_str(" NULL");
    } else {
        sql.push_str(" NOT NULL");
    }

    for extra in &def.extras {
        sql.push(' ');
        sql.push_str(extra);
    }

    sql
}

/// Renders one structural operation as a DDL statement.
pub fn statement(op: &StructuralOp) -> String {
    match op {
        StructuralOp::CreateTable { table, columns } => {
            let columns: Vec<String> = columns.iter().map(column_clause).collect();
            format!("CREATE TABLE {} ({})", table, columns.join(", "))
        }
        StructuralOp::RenameTable { from, to } => {
            format!("ALTER TABLE {} RENAME TO {}", from, to)
        }
        StructuralOp::DropColumn { table, column } => {
            format!("ALTER TABLE {} DROP COLUMN {}", table, column)
        }
        StructuralOp::RenameColumn { table, from, to } => {
            format!("ALTER TABLE {} RENAME COLUMN {} TO {}", table, from, to)
        }
        StructuralOp::AddColumn { table, column } => {
            format!("ALTER TABLE {} ADD COLUMN {}", table, column_clause(column))
        }
        StructuralOp::DropTable { table } => format!("DROP TABLE {}", table),
    }
}

/// A SQL engine connection wrapped as a storage backend.
pub struct SqlDatabase<E: SqlExecutor> {
    executor: E,
}

impl<E: SqlExecutor> SqlDatabase<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Opens a transaction. One reconciliation batch belongs inside one
    /// transaction so the engine can make it atomic.
    pub fn begin(&mut self) -> StorageResult<SqlTransaction<'_, E>> {
        self.executor.execute("BEGIN")?;
        Ok(SqlTransaction {
            executor: &mut self.executor,
        })
    }

    pub fn close(self) -> StorageResult<()> {
        Ok(())
    }
}

/// An open transaction rendering structural operations to DDL.
///
/// View and migration-history capabilities keep their `Unimplemented`
/// defaults; this binding has no design for them yet.
pub struct SqlTransaction<'a, E: SqlExecutor> {
    executor: &'a mut E,
}

impl<E: SqlExecutor> SqlTransaction<'_, E> {
    fn execute_op(&mut self, op: &StructuralOp) -> StorageResult<()> {
        self.executor.execute(&statement(op))
    }
}

impl<E: SqlExecutor> StorageTransaction for SqlTransaction<'_, E> {
    fn commit(self) -> StorageResult<()> {
        self.executor.execute("COMMIT")
    }

    fn rollback(self) -> StorageResult<()> {
        self.executor.execute("ROLLBACK")
    }

    fn create_table(&mut self, table: &str, columns: &[ColumnDef]) -> StorageResult<()> {
        self.execute_op(&StructuralOp::CreateTable {
            table: table.to_string(),
            columns: columns.to_vec(),
        })
    }

    fn rename_table(&mut self, from: &str, to: &str) -> StorageResult<()> {
        self.execute_op(&StructuralOp::RenameTable {
            from: from.to_string(),
            to: to.to_string(),
        })
    }

    fn add_column(&mut self, table: &str, column: &ColumnDef) -> StorageResult<()> {
        self.execute_op(&StructuralOp::AddColumn {
            table: table.to_string(),
            column: column.clone(),
        })
    }

    fn rename_column(&mut self, table: &str, from: &str, to: &str) -> StorageResult<()> {
        self.execute_op(&StructuralOp::RenameColumn {
            table: table.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        })
    }

    fn drop_column(&mut self, table: &str, column: &str) -> StorageResult<()> {
        self.execute_op(&StructuralOp::DropColumn {
            table: table.to_string(),
            column: column.to_string(),
        })
    }

    fn drop_table(&mut self, table: &str) -> StorageResult<()> {
        self.execute_op(&StructuralOp::DropTable {
            table: table.to_string(),
        })
    }
}

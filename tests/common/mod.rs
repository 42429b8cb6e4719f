//! In-memory recording storage backend shared by the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use stratadb::schema::{ColumnDef, View};
use stratadb::storage::{column_clause, StorageAdapter, StorageError, StorageResult, StorageTransaction};

#[derive(Default)]
pub struct MemoryState {
    /// Every applied operation, rendered as DDL for exact assertions.
    pub applied: Vec<String>,
    pub history: HashSet<String>,
    /// Any operation whose rendering contains this substring fails.
    pub fail_on: Option<String>,
}

/// Storage backend keeping everything in memory.
#[derive(Default)]
pub struct MemoryAdapter {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn applied(&self) -> Vec<String> {
        self.state.borrow().applied.clone()
    }

    pub fn history(&self) -> HashSet<String> {
        self.state.borrow().history.clone()
    }

    pub fn fail_on(&self, fragment: &str) {
        self.state.borrow_mut().fail_on = Some(fragment.to_string());
    }

    pub fn heal(&self) {
        self.state.borrow_mut().fail_on = None;
    }
}

impl StorageAdapter for MemoryAdapter {
    type Transaction = MemoryTransaction;

    fn begin(&mut self) -> StorageResult<Self::Transaction> {
        Ok(MemoryTransaction {
            state: Rc::clone(&self.state),
        })
    }

    fn close(self) -> StorageResult<()> {
        Ok(())
    }
}

pub struct MemoryTransaction {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryTransaction {
    fn exec(&mut self, rendered: String) -> StorageResult<()> {
        let mut state = self.state.borrow_mut();

        if let Some(fragment) = &state.fail_on {
            if rendered.contains(fragment.as_str()) {
                return Err(StorageError::Backend(format!("refused: {}", rendered)));
            }
        }

        state.applied.push(rendered);
        Ok(())
    }
}

impl StorageTransaction for MemoryTransaction {
    fn commit(self) -> StorageResult<()> {
        Ok(())
    }

    fn rollback(self) -> StorageResult<()> {
        Ok(())
    }

    fn create_table(&mut self, table: &str, columns: &[ColumnDef]) -> StorageResult<()> {
        let columns: Vec<String> = columns.iter().map(column_clause).collect();
        self.exec(format!("CREATE TABLE {} ({})", table, columns.join(", ")))
    }

    fn rename_table(&mut self, from: &str, to: &str) -> StorageResult<()> {
        self.exec(format!("ALTER TABLE {} RENAME TO {}", from, to))
    }

    fn add_column(&mut self, table: &str, column: &ColumnDef) -> StorageResult<()> {
        self.exec(format!(
            "ALTER TABLE {} ADD COLUMN {}",
            table,
            column_clause(column)
        ))
    }

    fn rename_column(&mut self, table: &str, from: &str, to: &str) -> StorageResult<()> {
        self.exec(format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            table, from, to
        ))
    }

    fn drop_column(&mut self, table: &str, column: &str) -> StorageResult<()> {
        self.exec(format!("ALTER TABLE {} DROP COLUMN {}", table, column))
    }

    fn drop_table(&mut self, table: &str) -> StorageResult<()> {
        self.exec(format!("DROP TABLE {}", table))
    }

    fn create_view(&mut self, view: &View) -> StorageResult<()> {
        let _ = view;
        Err(StorageError::Unimplemented("create view"))
    }

    fn drop_view(&mut self, view: &View) -> StorageResult<()> {
        let _ = view;
        Err(StorageError::Unimplemented("drop view"))
    }

    fn migration_exists(&mut self, name: &str) -> StorageResult<bool> {
        Ok(self.state.borrow().history.contains(name))
    }

    fn finish_migration(&mut self, name: &str) -> StorageResult<()> {
        self.state.borrow_mut().history.insert(name.to_string());
        Ok(())
    }
}

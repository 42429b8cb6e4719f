//! Named migration registry
//!
//! The host registers migrations by name; the runner applies the ones the
//! migration history does not know yet, in registration order, recording
//! each through the storage capability's bookkeeping methods. A failed
//! migration aborts the run and is not recorded.

use thiserror::Error;

use crate::observability::Logger;
use crate::storage::{StorageError, StorageTransaction};

/// Outcome of one migration hook.
pub type MigrationResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// One migration hook, driven against the open transaction.
pub type MigrationHook = Box<dyn Fn(&mut dyn StorageTransaction) -> MigrationResult + Send + Sync>;

/// A named, reversible schema migration.
pub struct Migration {
    pub up: MigrationHook,
    pub down: MigrationHook,
}

impl Migration {
    pub fn new<U, D>(up: U, down: D) -> Self
    where
        U: Fn(&mut dyn StorageTransaction) -> MigrationResult + Send + Sync + 'static,
        D: Fn(&mut dyn StorageTransaction) -> MigrationResult + Send + Sync + 'static,
    {
        Self {
            up: Box::new(up),
            down: Box::new(down),
        }
    }
}

/// Migration runner errors.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("migration {name} failed: {source}")]
    Failed {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("unknown migration {0}")]
    Unknown(String),

    #[error("migration {0} has not been applied")]
    NotApplied(String),
}

/// Application facade holding the migration registry.
#[derive(Default)]
pub struct App {
    migrations: Vec<(String, Migration)>,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a migration under a name. Registering the same name again
    /// replaces the previous entry; order is registration order.
    pub fn register_migration(&mut self, name: impl Into<String>, migration: Migration) {
        let name = name.into();

        if let Some(slot) = self.migrations.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = migration;
        } else {
            self.migrations.push((name, migration));
        }
    }

    /// Applies every migration the history does not record yet, in
    /// registration order. Returns how many were applied.
    pub fn run_migrations(
        &self,
        tx: &mut dyn StorageTransaction,
    ) -> Result<usize, MigrationError> {
        let mut applied = 0;

        for (name, migration) in &self.migrations {
            if tx.migration_exists(name)? {
                Logger::trace("MIGRATION_SKIP", &[("migration", name)]);
                continue;
            }

            (migration.up)(tx).map_err(|source| MigrationError::Failed {
                name: name.clone(),
                source,
            })?;

            tx.finish_migration(name)?;
            Logger::info("MIGRATION_APPLY", &[("migration", name)]);
            applied += 1;
        }

        Ok(applied)
    }

    /// Runs the named migration's down hook, if the history records it as
    /// applied. The history record itself is retained: the bookkeeping
    /// capability has no delete operation.
    pub fn revert_migration(
        &self,
        tx: &mut dyn StorageTransaction,
        name: &str,
    ) -> Result<(), MigrationError> {
        let (name, migration) = self
            .migrations
            .iter()
            .find(|(n, _)| n == name)
            .ok_or_else(|| MigrationError::Unknown(name.to_string()))?;

        if !tx.migration_exists(name)? {
            return Err(MigrationError::NotApplied(name.clone()));
        }

        (migration.down)(tx).map_err(|source| MigrationError::Failed {
            name: name.clone(),
            source,
        })?;

        Logger::warn(
            "MIGRATION_REVERT",
            &[("migration", name), ("history", "record retained")],
        );
        Ok(())
    }
}

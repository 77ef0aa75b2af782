use std::path::PathBuf;

use crate::persistence::{
    storage::StorageEngine,
    transaction::{TransactionFileWriteMode, TransactionWriteMode},
};

#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    pub restore: bool,
    pub storage_engine: StorageEngine,
    pub write_mode: TransactionWriteMode,
}

// Implements: https://rust-unofficial.github.io/patterns/patterns/creational/builder.html
impl DatabaseOptions {
    /// Defines whether we should attempt to restore the database from a snapshot on startup
    pub fn set_restore(mut self, restore: bool) -> Self {
        self.restore = restore;
        self
    }

    pub fn set_storage_engine(mut self, storage_engine: StorageEngine) -> Self {
        self.storage_engine = storage_engine;
        self
    }

    pub fn set_write_mode(mut self, write_mode: TransactionWriteMode) -> Self {
        self.write_mode = write_mode;
        self
    }

    /// In-memory storage, nothing is restored or kept after the database is dropped
    pub fn new_test() -> Self {
        DatabaseOptions::default()
            .set_storage_engine(StorageEngine::Memory)
            .set_restore(false)
            .set_write_mode(TransactionWriteMode::Off)
    }
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        // Defaults to $CWD/data
        Self {
            storage_engine: StorageEngine::File(PathBuf::from("data")),
            restore: true,
            write_mode: TransactionWriteMode::File(TransactionFileWriteMode::Sync),
        }
    }
}

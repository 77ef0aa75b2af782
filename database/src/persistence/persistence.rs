use crate::database::options::DatabaseOptions;

use super::{
    snapshot::SnapshotManager,
    storage::{SharedStorage, StorageError, StorageResult},
    transaction::TransactionWAL,
};

/// Owns the storage engine, shared between database snapshots, the
/// transaction log and photo blobs
pub struct Persistence {
    pub snapshot_manager: SnapshotManager,
    pub transaction_wal: TransactionWAL,
    storage: SharedStorage,
}

impl Persistence {
    pub fn new(options: &DatabaseOptions) -> Self {
        let storage = options.storage_engine.get_engine();

        Self {
            snapshot_manager: SnapshotManager::new(storage.clone()),
            transaction_wal: TransactionWAL::new(options.write_mode.clone(), storage.clone()),
            storage,
        }
    }

    pub fn init(&self) -> StorageResult<()> {
        self.storage
            .lock()
            .map_err(|_| StorageError::LockPoisoned)?
            .init()
    }

    pub fn reset(&self) -> StorageResult<()> {
        self.storage
            .lock()
            .map_err(|_| StorageError::LockPoisoned)?
            .reset_database()
    }

    pub fn storage(&self) -> SharedStorage {
        self.storage.clone()
    }
}

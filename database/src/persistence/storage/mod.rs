use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use strum::Display;
use thiserror::Error;

use self::{file::FileStorage, memory::MemoryStorage};

pub mod file;
pub mod memory;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Unable to initialize persistence: {0}")]
    UnableToInitializePersistence(String),

    #[error("Unable to write blob: {0}")]
    UnableToWriteBlob(String),

    #[error("Unable to read blob: {0}")]
    UnableToReadBlob(String),

    #[error("Unable to delete blob: {0}")]
    UnableToDeleteBlob(String),

    #[error("Unable to write transaction: {0}")]
    UnableToWriteTransaction(String),

    #[error("Unable to sync transaction log to persistent storage: {0}")]
    UnableToSyncTransactionLog(String),

    #[error("Unable to flush transaction log: {0}")]
    UnableToFlushTransactionLog(String),

    #[error("Unable to load previous transactions: {0}")]
    UnableToLoadPreviousTransactions(String),

    #[error("Unable to serialize blob contents: {0}")]
    UnableToSerialize(String),

    #[error("Unable to deserialize blob contents: {0}")]
    UnableToDeserialize(String),

    #[error("Storage lock was poisoned by a panicking thread")]
    LockPoisoned,
}

pub type StorageResult<T> = Result<T, StorageError>;

pub fn io_to_generic_error(error: std::io::Error) -> String {
    format!("[{}] {}", error.kind(), error)
}

pub enum ReadBlobState {
    Found(Vec<u8>),
    NotFound,
}

/// Blob storage keyed by a flat path. Backs both database snapshots and photos.
pub trait Storage {
    /// Called on start-up, should be idempotent
    fn init(&self) -> StorageResult<()>;
    /// Removes every blob
    fn reset_database(&mut self) -> StorageResult<()>;

    fn write_blob(&mut self, path: String, bytes: Vec<u8>) -> StorageResult<()>;
    fn read_blob(&self, path: String) -> StorageResult<ReadBlobState>;
    /// Deleting a blob that does not exist succeeds
    fn delete_blob(&mut self, path: String) -> StorageResult<()>;

    /// Appends to the transaction log, not durable until `transaction_sync`
    fn transaction_write(&mut self, transaction: &[u8]) -> StorageResult<()>;
    fn transaction_sync(&mut self) -> StorageResult<()>;
    /// Empties the transaction log, called once a snapshot holds its contents
    fn transaction_flush(&mut self) -> StorageResult<()>;
    /// A missing log loads as empty
    fn transaction_load(&mut self) -> StorageResult<String>;
}

pub type SharedStorage = Arc<Mutex<dyn Storage + Sync + Send>>;

#[derive(Clone, Debug, Display)]
pub enum StorageEngine {
    /// Nothing survives a restart, used for tests
    Memory,
    File(PathBuf),
}

impl StorageEngine {
    pub fn get_engine(&self) -> SharedStorage {
        match self {
            StorageEngine::Memory => Arc::new(Mutex::new(MemoryStorage::new())),
            StorageEngine::File(path) => Arc::new(Mutex::new(FileStorage::new(path.clone()))),
        }
    }

    pub fn get_engine_info_stats(&self) -> Vec<(String, String)> {
        let mut stats = vec![("StorageEngine".to_string(), self.to_string())];

        if let StorageEngine::File(path) = self {
            stats.push(("DataDirectory".to_string(), path.display().to_string()));
        }

        stats
    }
}

use std::collections::HashMap;

use super::{ReadBlobState, Storage, StorageResult};

#[derive(Default)]
pub struct MemoryStorage {
    blobs: HashMap<String, Vec<u8>>,
    transaction_log: String,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn init(&self) -> StorageResult<()> {
        Ok(())
    }

    fn reset_database(&mut self) -> StorageResult<()> {
        self.blobs.clear();
        self.transaction_log.clear();
        Ok(())
    }

    fn write_blob(&mut self, path: String, bytes: Vec<u8>) -> StorageResult<()> {
        self.blobs.insert(path, bytes);
        Ok(())
    }

    fn read_blob(&self, path: String) -> StorageResult<ReadBlobState> {
        match self.blobs.get(&path) {
            Some(bytes) => Ok(ReadBlobState::Found(bytes.clone())),
            None => Ok(ReadBlobState::NotFound),
        }
    }

    fn delete_blob(&mut self, path: String) -> StorageResult<()> {
        self.blobs.remove(&path);
        Ok(())
    }

    fn transaction_write(&mut self, transaction: &[u8]) -> StorageResult<()> {
        self.transaction_log
            .push_str(&String::from_utf8_lossy(transaction));
        Ok(())
    }

    fn transaction_sync(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn transaction_flush(&mut self) -> StorageResult<()> {
        self.transaction_log.clear();
        Ok(())
    }

    fn transaction_load(&mut self) -> StorageResult<String> {
        Ok(self.transaction_log.clone())
    }
}

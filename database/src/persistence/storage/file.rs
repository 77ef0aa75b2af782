use std::{
    fs::{self, File, OpenOptions},
    io::{Read, Write},
    path::PathBuf,
};

use super::{io_to_generic_error, ReadBlobState, Storage, StorageError, StorageResult};

const TRANSACTION_LOG_FILE: &str = "transaction_log.json";

/// One file per blob under the base directory, plus an append-only transaction log
pub struct FileStorage {
    base_path: PathBuf,
    transaction_file_path: PathBuf,
    // Opened on first write, closed whenever the log is flushed or reset
    log_file: Option<File>,
}

impl FileStorage {
    pub fn new(base_path: PathBuf) -> Self {
        let transaction_file_path = base_path.join(TRANSACTION_LOG_FILE);

        Self {
            base_path,
            transaction_file_path,
            log_file: None,
        }
    }

    fn get_path(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }

    fn log_file(&mut self) -> StorageResult<&mut File> {
        if self.log_file.is_none() {
            let file = OpenOptions::new()
                .append(true)
                .create(true)
                .open(&self.transaction_file_path)
                .map_err(|e| StorageError::UnableToWriteTransaction(io_to_generic_error(e)))?;

            self.log_file = Some(file);
        }

        self.log_file
            .as_mut()
            .ok_or_else(|| StorageError::UnableToWriteTransaction("log file not open".to_string()))
    }
}

impl Storage for FileStorage {
    // Called on DB Start-up, should be idempotent
    fn init(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.base_path)
            .map_err(|e| StorageError::UnableToInitializePersistence(io_to_generic_error(e)))?;

        Ok(())
    }

    // Called when the database gets cleared (via user)
    fn reset_database(&mut self) -> StorageResult<()> {
        self.log_file = None;

        if self.base_path.exists() {
            fs::remove_dir_all(&self.base_path).map_err(|e| {
                StorageError::UnableToInitializePersistence(io_to_generic_error(e))
            })?;
        }

        self.init()
    }

    fn write_blob(&mut self, path: String, bytes: Vec<u8>) -> StorageResult<()> {
        fs::write(self.get_path(&path), bytes)
            .map_err(|e| StorageError::UnableToWriteBlob(io_to_generic_error(e)))
    }

    fn read_blob(&self, path: String) -> StorageResult<ReadBlobState> {
        let mut file = match File::open(self.get_path(&path)) {
            Ok(file) => file,
            Err(err) => match err.kind() {
                std::io::ErrorKind::NotFound => return Ok(ReadBlobState::NotFound),
                _ => return Err(StorageError::UnableToReadBlob(io_to_generic_error(err))),
            },
        };

        let mut buf = Vec::new();

        file.read_to_end(&mut buf)
            .map_err(|e| StorageError::UnableToReadBlob(io_to_generic_error(e)))?;

        Ok(ReadBlobState::Found(buf))
    }

    fn delete_blob(&mut self, path: String) -> StorageResult<()> {
        match fs::remove_file(self.get_path(&path)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::UnableToDeleteBlob(io_to_generic_error(err))),
        }
    }

    fn transaction_write(&mut self, transaction: &[u8]) -> StorageResult<()> {
        // Buffered OS write, is not 'durable' without the fsync
        self.log_file()?
            .write_all(transaction)
            .map_err(|e| StorageError::UnableToWriteTransaction(io_to_generic_error(e)))
    }

    fn transaction_sync(&mut self) -> StorageResult<()> {
        match &self.log_file {
            Some(file) => file
                .sync_data()
                .map_err(|e| StorageError::UnableToSyncTransactionLog(io_to_generic_error(e))),
            None => Ok(()),
        }
    }

    fn transaction_flush(&mut self) -> StorageResult<()> {
        self.log_file = None;

        match fs::remove_file(&self.transaction_file_path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::UnableToFlushTransactionLog(
                io_to_generic_error(err),
            )),
        }
    }

    fn transaction_load(&mut self) -> StorageResult<String> {
        let mut contents = String::new();

        let mut file = match File::open(&self.transaction_file_path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(contents),
            Err(err) => {
                return Err(StorageError::UnableToLoadPreviousTransactions(
                    io_to_generic_error(err),
                ))
            }
        };

        file.read_to_string(&mut contents)
            .map_err(|e| StorageError::UnableToLoadPreviousTransactions(io_to_generic_error(e)))?;

        Ok(contents)
    }
}

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

use crate::{
    consts::consts::EntityId,
    model::{document::Document, statement::Statement},
};

use super::storage::{SharedStorage, StorageError, StorageResult};

#[derive(Debug, Clone, PartialEq)]
pub enum TransactionFileWriteMode {
    /// Writes the log entry and fsyncs before the mutation is acknowledged
    Sync,
    /// Writes the log entry, lets the OS buffer the writes
    OSBuffered,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransactionWriteMode {
    File(TransactionFileWriteMode),
    /// Used for testing purposes. Skips the log entirely
    Off,
}

/// Mutations that reach the log, reads are never logged
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum LoggedStatement {
    /// Always carries its `_id`, generated keys included
    Insert(Document),
    Remove(EntityId),
}

impl From<LoggedStatement> for Statement {
    fn from(statement: LoggedStatement) -> Self {
        match statement {
            LoggedStatement::Insert(document) => Statement::Insert(document),
            LoggedStatement::Remove(id) => Statement::Remove(id),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Transaction {
    pub collection: String,
    pub statement: LoggedStatement,
}

/// Append-only log of the mutations applied since the last snapshot, one JSON
/// line per transaction. Replayed on top of the snapshot on restore.
pub struct TransactionWAL {
    write_mode: TransactionWriteMode,
    size: AtomicUsize,
    storage: SharedStorage,
}

impl TransactionWAL {
    pub fn new(write_mode: TransactionWriteMode, storage: SharedStorage) -> Self {
        Self {
            write_mode,
            size: AtomicUsize::new(0),
            storage,
        }
    }

    pub fn commit(&self, collection: &str, statement: LoggedStatement) -> StorageResult<()> {
        let TransactionWriteMode::File(file_mode) = &self.write_mode else {
            return Ok(());
        };

        let transaction = Transaction {
            collection: collection.to_string(),
            statement,
        };

        let transaction_json_line = format!(
            "{}\n",
            serde_json::to_string(&transaction)
                .map_err(|e| StorageError::UnableToSerialize(e.to_string()))?
        );

        let mut storage = self
            .storage
            .lock()
            .map_err(|_| StorageError::LockPoisoned)?;

        storage.transaction_write(transaction_json_line.as_bytes())?;

        // Performs an fsync on the transaction log, ensuring that the transaction is durable
        // https://www.postgresql.org/docs/current/wal-reliability.html
        if file_mode == &TransactionFileWriteMode::Sync {
            storage.transaction_sync()?;
        }

        self.size.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }

    /// We have persisted the current state, the log can be emptied.
    /// Returns the number of transactions dropped.
    pub fn flush_transactions(&self) -> StorageResult<usize> {
        self.storage
            .lock()
            .map_err(|_| StorageError::LockPoisoned)?
            .transaction_flush()?;

        Ok(self.size.swap(0, Ordering::SeqCst))
    }

    /// A torn final line, from a crash part way through a write, is skipped.
    /// Any other unreadable line is an error.
    pub fn restore(&self) -> StorageResult<Vec<Transaction>> {
        let transactions_data = self
            .storage
            .lock()
            .map_err(|_| StorageError::LockPoisoned)?
            .transaction_load()?;

        let lines: Vec<&str> = transactions_data
            .split('\n')
            .filter(|line| !line.is_empty())
            .collect();

        let mut transactions = Vec::with_capacity(lines.len());

        for (position, line) in lines.iter().enumerate() {
            match serde_json::from_str(line) {
                Ok(transaction) => transactions.push(transaction),
                Err(e) if position + 1 == lines.len() => {
                    log::warn!("Skipping torn transaction log entry: {}", e);
                }
                Err(e) => return Err(StorageError::UnableToDeserialize(e.to_string())),
            }
        }

        self.size.store(transactions.len(), Ordering::SeqCst);

        Ok(transactions)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::persistence::storage::StorageEngine;

    fn wal() -> TransactionWAL {
        TransactionWAL::new(
            TransactionWriteMode::File(TransactionFileWriteMode::Sync),
            StorageEngine::Memory.get_engine(),
        )
    }

    #[test]
    fn committed_transactions_restore_in_order() {
        let wal = wal();

        wal.commit("person", LoggedStatement::Insert(json!({ "_id": "1" })))
            .unwrap();
        wal.commit("person", LoggedStatement::Remove(EntityId::from("1")))
            .unwrap();

        assert_eq!(
            wal.restore().unwrap(),
            vec![
                Transaction {
                    collection: "person".to_string(),
                    statement: LoggedStatement::Insert(json!({ "_id": "1" })),
                },
                Transaction {
                    collection: "person".to_string(),
                    statement: LoggedStatement::Remove(EntityId::from("1")),
                },
            ]
        );
    }

    #[test]
    fn flush_reports_and_drops_transactions() {
        let wal = wal();

        wal.commit("person", LoggedStatement::Insert(json!({ "_id": "1" })))
            .unwrap();

        assert_eq!(wal.flush_transactions().unwrap(), 1);
        assert!(wal.restore().unwrap().is_empty());
    }

    #[test]
    fn write_mode_off_logs_nothing() {
        let wal = TransactionWAL::new(TransactionWriteMode::Off, StorageEngine::Memory.get_engine());

        wal.commit("person", LoggedStatement::Insert(json!({ "_id": "1" })))
            .unwrap();

        assert!(wal.restore().unwrap().is_empty());
    }

    #[test]
    fn torn_last_line_is_skipped_but_earlier_corruption_is_not() {
        let storage = StorageEngine::Memory.get_engine();
        let wal = TransactionWAL::new(TransactionWriteMode::Off, storage.clone());

        storage
            .lock()
            .unwrap()
            .transaction_write(b"{\"collection\":\"person\",\"statement\":{\"Remove\":\"1\"}}\n{\"coll")
            .unwrap();

        assert_eq!(wal.restore().unwrap().len(), 1);

        storage
            .lock()
            .unwrap()
            .transaction_write(b"\n{\"collection\":\"person\",\"statement\":{\"Remove\":\"2\"}}\n")
            .unwrap();

        assert!(matches!(
            wal.restore(),
            Err(StorageError::UnableToDeserialize(_))
        ));
    }
}

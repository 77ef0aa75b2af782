use std::{
    collections::HashMap,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Instant,
};

use num_format::{Locale, ToFormattedString};
use serde_json::Value;
use thiserror::Error;

use crate::{
    consts::consts::ID_FIELD,
    model::{
        document::set_path,
        statement::{Statement, StatementResult},
    },
    persistence::{
        persistence::Persistence,
        storage::{SharedStorage, StorageError},
        transaction::{LoggedStatement, Transaction},
    },
};

use super::{
    collection::collection::{ApplyErrors, DocumentCollection},
    options::DatabaseOptions,
};

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error(transparent)]
    Apply(#[from] ApplyErrors),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Database lock was poisoned by a panicking thread")]
    LockPoisoned,

    #[error("Unexpected statement result, expected {expected} got {actual}")]
    UnexpectedResult {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Schemaless document database holding named collections in memory.
///
/// Queries share a read lock and mutations take the write lock, so every
/// statement sees a consistent view of its collection. Mutations are written
/// to the transaction log before they are acknowledged. On start-up the last
/// snapshot is restored and the log replayed on top of it.
pub struct Database {
    collections: RwLock<HashMap<String, DocumentCollection>>,
    pub persistence: Persistence,
    pub database_options: DatabaseOptions,
}

impl Database {
    pub fn new(options: DatabaseOptions) -> Result<Self, DatabaseError> {
        let persistence = Persistence::new(&options);

        persistence.init()?;

        let database = Self {
            collections: RwLock::new(HashMap::new()),
            persistence,
            database_options: options,
        };

        if database.database_options.restore {
            database.restore()?;
        }

        Ok(database)
    }

    pub fn new_test() -> Self {
        Self::new(DatabaseOptions::new_test()).expect("memory storage should always initialize")
    }

    fn restore(&self) -> Result<(), DatabaseError> {
        let now = Instant::now();

        let snapshots = self.persistence.snapshot_manager.restore_snapshot()?;
        let transactions = self.persistence.transaction_wal.restore()?;

        let mut collections = self.write_collections()?;
        let mut restored_rows: usize = 0;

        for (name, documents) in snapshots {
            let mut collection = DocumentCollection::new();
            restored_rows += collection.restore_collection(documents)?;
            collections.insert(name, collection);
        }

        let transaction_count = transactions.len();

        for Transaction {
            collection,
            statement,
        } in transactions
        {
            let target = collections.entry(collection).or_default();

            match target.apply(statement.into()) {
                Ok(_) => {}
                // A crash between writing a snapshot and flushing the log leaves
                // inserts the snapshot already holds
                Err(ApplyErrors::DuplicateKey(id)) => {
                    log::debug!("Skipping replayed insert already in snapshot: {}", id)
                }
                Err(e) => return Err(e.into()),
            }
        }

        log::info!(
            "✅ Successful Restore [Duration: {}ms]",
            now.elapsed().as_millis(),
        );

        log::info!(
            "📀 Data               [Collections: {}, RowsFromSnapshot: {}, TransactionsFromLog: {}]",
            collections.len(),
            restored_rows.to_formatted_string(&Locale::en),
            transaction_count.to_formatted_string(&Locale::en)
        );

        Ok(())
    }

    /// Routes a statement to its collection. Reading a collection that does
    /// not exist behaves like reading an empty one, the first insert creates it.
    #[tracing::instrument(skip(self, statement))]
    pub fn process_statement(
        &self,
        collection: &str,
        statement: Statement,
    ) -> Result<StatementResult, DatabaseError> {
        log::debug!(
            "Received statement: [{}] {}",
            collection,
            statement.log_format()
        );

        if statement.is_mutation() {
            let mut collections = self.write_collections()?;

            let target = collections.entry(collection.to_string()).or_default();

            return self.apply_and_log(collection, target, statement);
        }

        let collections = self.read_collections()?;

        let statement_result = match collections.get(collection) {
            Some(target) => target.query_statement(statement)?,
            None => DocumentCollection::new().query_statement(statement)?,
        };

        Ok(statement_result)
    }

    // A mutation is only acknowledged once it is in the transaction log
    fn apply_and_log(
        &self,
        collection: &str,
        target: &mut DocumentCollection,
        statement: Statement,
    ) -> Result<StatementResult, DatabaseError> {
        let wal = &self.persistence.transaction_wal;

        match statement {
            // Removing is idempotent, logging it first is safe even if it removes nothing
            Statement::Remove(id) => {
                wal.commit(collection, LoggedStatement::Remove(id.clone()))?;

                Ok(target.apply(Statement::Remove(id))?)
            }
            Statement::Insert(document) => {
                let mut logged_document = document.clone();

                let statement_result = target.apply(Statement::Insert(document))?;

                if let StatementResult::Inserted(id) = &statement_result {
                    // Generated keys must replay as the same key
                    set_path(&mut logged_document, ID_FIELD, Value::String(id.to_string()));

                    if let Err(e) = wal.commit(collection, LoggedStatement::Insert(logged_document))
                    {
                        log::warn!("Rolling back insert of {}, log write failed: {}", id, e);
                        target.apply(Statement::Remove(id.clone()))?;

                        return Err(e.into());
                    }
                }

                Ok(statement_result)
            }
            other => Ok(target.apply(other)?),
        }
    }

    /// Persists the current state of every collection, returns the number of rows written
    pub fn snapshot(&self) -> Result<usize, DatabaseError> {
        let now = Instant::now();

        // Holding the read lock keeps the snapshot consistent across collections
        let collections = self.read_collections()?;

        let snapshots: Vec<(String, Vec<_>)> = collections
            .iter()
            .map(|(name, collection)| (name.clone(), collection.documents()))
            .collect();

        let row_count: usize = snapshots.iter().map(|(_, documents)| documents.len()).sum();

        self.persistence.snapshot_manager.create_snapshot(snapshots)?;

        // Still under the read lock, no mutation can land between the two
        let flushed_transactions = self.persistence.transaction_wal.flush_transactions()?;

        log::info!(
            "📀 Snapshot written [Duration: {}ms, Rows: {}, FlushedTransactions: {}]",
            now.elapsed().as_millis(),
            row_count.to_formatted_string(&Locale::en),
            flushed_transactions
        );

        Ok(row_count)
    }

    /// Removes all data from the database and its storage, returns the number of dropped rows
    pub fn reset_database_state(&self) -> Result<usize, DatabaseError> {
        let mut collections = self.write_collections()?;

        let dropped_row_count: usize = collections.values().map(DocumentCollection::len).sum();

        collections.clear();
        self.persistence.reset()?;
        self.persistence.transaction_wal.flush_transactions()?;

        log::info!("Successfully reset database, dropped: {} rows", dropped_row_count);

        Ok(dropped_row_count)
    }

    pub fn database_stats(&self) -> Result<Vec<(String, String)>, DatabaseError> {
        let collections = self.read_collections()?;

        let mut names: Vec<&String> = collections.keys().collect();
        names.sort();

        let row_counts = names.into_iter().map(|name| {
            (
                format!("RowCount[{}]", name),
                collections[name].len().to_string(),
            )
        });

        Ok(row_counts
            .chain(self.database_options.storage_engine.get_engine_info_stats())
            .collect())
    }

    /// Storage engine backing the database, blob collections such as photos live here
    pub fn blob_storage(&self) -> SharedStorage {
        self.persistence.storage()
    }

    fn read_collections(
        &self,
    ) -> Result<RwLockReadGuard<'_, HashMap<String, DocumentCollection>>, DatabaseError> {
        self.collections.read().map_err(|_| DatabaseError::LockPoisoned)
    }

    fn write_collections(
        &self,
    ) -> Result<RwLockWriteGuard<'_, HashMap<String, DocumentCollection>>, DatabaseError> {
        self.collections
            .write()
            .map_err(|_| DatabaseError::LockPoisoned)
    }
}

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::model::document::Document;

use super::storage::{ReadBlobState, SharedStorage, StorageError, StorageResult};

#[derive(Debug)]
enum FileType<'a> {
    Metadata,
    Collection(&'a str),
}

impl FileType<'_> {
    fn path(&self) -> String {
        match self {
            FileType::Metadata => "metadata".to_string(),
            FileType::Collection(name) => format!("collection-{}", name),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Metadata {
    /// Collections present at the time of the snapshot
    pub collections: Vec<String>,
}

/// A collection's documents, in collection order
pub type CollectionSnapshot = (String, Vec<Document>);

pub struct SnapshotManager {
    storage: SharedStorage,
}

impl SnapshotManager {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    /// Missing snapshot files restore as an empty database
    #[tracing::instrument(skip(self))]
    pub fn restore_snapshot(&self) -> StorageResult<Vec<CollectionSnapshot>> {
        let metadata: Metadata = self.read_file(FileType::Metadata)?;

        metadata
            .collections
            .into_iter()
            .map(|name| -> StorageResult<CollectionSnapshot> {
                let documents: Vec<Document> = self.read_file(FileType::Collection(&name))?;

                Ok((name, documents))
            })
            .collect()
    }

    #[tracing::instrument(skip(self, collections))]
    pub fn create_snapshot(&self, collections: Vec<CollectionSnapshot>) -> StorageResult<()> {
        let previous: Metadata = self.read_file(FileType::Metadata)?;
        let mut names = Vec::with_capacity(collections.len());

        for (name, documents) in collections {
            self.write_file(FileType::Collection(&name), &documents)?;
            names.push(name);
        }

        // Metadata is written last, a partially written snapshot is never referenced
        self.write_file(
            FileType::Metadata,
            &Metadata {
                collections: names.clone(),
            },
        )?;

        for stale in previous
            .collections
            .iter()
            .filter(|name| !names.contains(name))
        {
            self.storage
                .lock()
                .map_err(|_| StorageError::LockPoisoned)?
                .delete_blob(FileType::Collection(stale).path())?;
        }

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    fn read_file<T: DeserializeOwned + Default>(&self, file_type: FileType) -> StorageResult<T> {
        let result = self
            .storage
            .lock()
            .map_err(|_| StorageError::LockPoisoned)?
            .read_blob(file_type.path())?;

        match result {
            ReadBlobState::Found(file_contents) => serde_json::from_slice(&file_contents)
                .map_err(|e| StorageError::UnableToDeserialize(e.to_string())),
            ReadBlobState::NotFound => Ok(T::default()),
        }
    }

    #[tracing::instrument(skip(self, data))]
    fn write_file<T: Serialize>(&self, file_type: FileType, data: &T) -> StorageResult<()> {
        let serialized_bytes =
            serde_json::to_vec(data).map_err(|e| StorageError::UnableToSerialize(e.to_string()))?;

        self.storage
            .lock()
            .map_err(|_| StorageError::LockPoisoned)?
            .write_blob(file_type.path(), serialized_bytes)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::persistence::storage::StorageEngine;

    #[test]
    fn empty_storage_restores_nothing() {
        let manager = SnapshotManager::new(StorageEngine::Memory.get_engine());

        assert!(manager.restore_snapshot().unwrap().is_empty());
    }

    #[test]
    fn snapshot_round_trip_keeps_collection_order() {
        let manager = SnapshotManager::new(StorageEngine::Memory.get_engine());

        let person = (
            "person".to_string(),
            vec![json!({ "_id": "b" }), json!({ "_id": "a" })],
        );

        manager.create_snapshot(vec![person.clone()]).unwrap();

        assert_eq!(manager.restore_snapshot().unwrap(), vec![person]);
    }

    #[test]
    fn corrupt_snapshot_is_an_error() {
        let storage = StorageEngine::Memory.get_engine();

        storage
            .lock()
            .unwrap()
            .write_blob("metadata".to_string(), b"not json".to_vec())
            .unwrap();

        let result = SnapshotManager::new(storage).restore_snapshot();

        assert!(matches!(result, Err(StorageError::UnableToDeserialize(_))));
    }

    #[test]
    fn dropped_collections_are_removed_from_storage() {
        let storage = StorageEngine::Memory.get_engine();
        let manager = SnapshotManager::new(storage.clone());

        // Given a snapshot with two collections
        manager
            .create_snapshot(vec![
                ("person".to_string(), vec![json!({ "_id": "1" })]),
                ("old".to_string(), vec![json!({ "_id": "2" })]),
            ])
            .unwrap();

        // When the next snapshot no longer has one of them
        manager
            .create_snapshot(vec![("person".to_string(), vec![])])
            .unwrap();

        // Then its blob is gone
        let old_blob = storage
            .lock()
            .unwrap()
            .read_blob("collection-old".to_string())
            .unwrap();

        assert!(matches!(old_blob, ReadBlobState::NotFound));
        assert_eq!(
            manager.restore_snapshot().unwrap(),
            vec![("person".to_string(), vec![])]
        );
    }
}

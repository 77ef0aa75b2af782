use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    consts::consts::{EntityId, PHOTO_BLOB_PREFIX, PHOTO_DATA_SUFFIX},
    model::photo::Photo,
    persistence::storage::{ReadBlobState, SharedStorage, StorageError},
};

use super::error::{ServiceError, ServiceResult};

/// Stored as JSON beside the raw bytes blob
#[derive(Serialize, Deserialize)]
struct PhotoMetadata {
    id: EntityId,
    title: String,
}

/// Binary photos stored as blobs next to the database snapshot, outside of
/// any document collection
pub struct PhotoService {
    storage: SharedStorage,
}

impl PhotoService {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    #[tracing::instrument(skip(self, data))]
    pub fn store(&self, title: &str, data: Vec<u8>) -> ServiceResult<EntityId> {
        let id = EntityId::new();
        let size = data.len();

        let metadata = serde_json::to_vec(&PhotoMetadata {
            id: id.clone(),
            title: title.to_string(),
        })
        .map_err(|e| StorageError::UnableToSerialize(e.to_string()))?;

        let mut storage = self.storage.lock().map_err(|_| StorageError::LockPoisoned)?;

        // Metadata last, a photo without it is never visible
        storage.write_blob(data_path(&id), data)?;
        storage.write_blob(metadata_path(&id), metadata)?;

        log::debug!("Stored photo [Id: {}, Bytes: {}]", id, size);

        Ok(id)
    }

    pub fn retrieve(&self, id: &EntityId) -> ServiceResult<Photo> {
        // Ids are generated uuids, anything else cannot name a photo blob
        if Uuid::parse_str(id.as_str()).is_err() {
            return Err(ServiceError::NotFound(id.clone()));
        }

        let storage = self.storage.lock().map_err(|_| StorageError::LockPoisoned)?;

        let metadata = match storage.read_blob(metadata_path(id))? {
            ReadBlobState::Found(bytes) => serde_json::from_slice::<PhotoMetadata>(&bytes)
                .map_err(|e| ServiceError::Decode(e.to_string()))?,
            ReadBlobState::NotFound => return Err(ServiceError::NotFound(id.clone())),
        };

        let data = match storage.read_blob(data_path(id))? {
            ReadBlobState::Found(bytes) => bytes,
            ReadBlobState::NotFound => {
                return Err(ServiceError::Decode(format!("photo {} has no data blob", id)))
            }
        };

        Ok(Photo {
            id: metadata.id,
            title: metadata.title,
            data,
        })
    }
}

fn metadata_path(id: &EntityId) -> String {
    format!("{}{}", PHOTO_BLOB_PREFIX, id)
}

fn data_path(id: &EntityId) -> String {
    format!("{}{}{}", PHOTO_BLOB_PREFIX, id, PHOTO_DATA_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::storage::StorageEngine;

    #[test]
    fn stored_photo_can_be_retrieved() {
        let service = PhotoService::new(StorageEngine::Memory.get_engine());

        let id = service.store("cat.png", vec![0x89, 0x50, 0x4e, 0x47]).unwrap();
        let photo = service.retrieve(&id).unwrap();

        assert_eq!(photo.id, id);
        assert_eq!(photo.title, "cat.png");
        assert_eq!(photo.data, vec![0x89, 0x50, 0x4e, 0x47]);
    }

    #[test]
    fn unknown_photo_is_not_found() {
        let service = PhotoService::new(StorageEngine::Memory.get_engine());
        let id = EntityId::new();

        assert!(matches!(
            service.retrieve(&id),
            Err(ServiceError::NotFound(missing)) if missing == id
        ));
    }

    #[test]
    fn non_uuid_ids_are_not_found() {
        let service = PhotoService::new(StorageEngine::Memory.get_engine());

        assert!(matches!(
            service.retrieve(&EntityId::from("../metadata")),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn bytes_are_stored_raw_beside_json_metadata() {
        let storage = StorageEngine::Memory.get_engine();
        let service = PhotoService::new(storage.clone());

        let id = service.store("cat.png", vec![0x89, 0x50, 0x4e, 0x47]).unwrap();

        let storage = storage.lock().unwrap();
        assert!(matches!(
            storage.read_blob(data_path(&id)).unwrap(),
            ReadBlobState::Found(bytes) if bytes == vec![0x89, 0x50, 0x4e, 0x47]
        ));

        let metadata = match storage.read_blob(metadata_path(&id)).unwrap() {
            ReadBlobState::Found(bytes) => {
                serde_json::from_slice::<serde_json::Value>(&bytes).unwrap()
            }
            ReadBlobState::NotFound => panic!("metadata should be stored"),
        };
        assert_eq!(
            metadata,
            serde_json::json!({ "id": id.to_string(), "title": "cat.png" })
        );
    }
}

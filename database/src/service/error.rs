use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::{
    consts::consts::EntityId,
    database::database::DatabaseError,
    model::document::Document,
    persistence::storage::StorageError,
};

#[derive(Error, Debug)]
pub enum ServiceError {
    /// Conflict, the existing document is left untouched
    #[error("Already exists: {0}")]
    AlreadyExists(EntityId),

    #[error("Not found: {0}")]
    NotFound(EntityId),

    #[error("Invalid request: {0}")]
    Validation(String),

    /// A document could not be mapped to or from its type
    #[error("Unable to map document: {0}")]
    Decode(String),

    #[error(transparent)]
    Store(#[from] DatabaseError),
}

impl From<StorageError> for ServiceError {
    fn from(error: StorageError) -> Self {
        ServiceError::Store(DatabaseError::Storage(error))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

pub fn decode<T: DeserializeOwned>(document: Document) -> ServiceResult<T> {
    serde_json::from_value(document).map_err(|e| ServiceError::Decode(e.to_string()))
}

pub fn decode_all<T: DeserializeOwned>(documents: Vec<Document>) -> ServiceResult<Vec<T>> {
    documents.into_iter().map(decode).collect()
}

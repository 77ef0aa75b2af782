use serde::{Deserialize, Serialize};
use uuid::Uuid;

// New Type Pattern -- https://doc.rust-lang.org/rust-by-example/generics/new_types.html
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new() -> EntityId {
        EntityId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        EntityId(value.to_string())
    }
}

/// Position of a document in its collection. Scans return documents in
/// ascending sequence order, which is the insertion order.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub struct DocumentSequence(pub usize);

impl DocumentSequence {
    pub fn new_first_sequence() -> DocumentSequence {
        DocumentSequence(0)
    }

    pub fn increment(&self) -> DocumentSequence {
        DocumentSequence(self.0 + 1)
    }
}

impl std::fmt::Display for DocumentSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Values

/// Key every document is stored under
pub const ID_FIELD: &str = "_id";

pub const PERSON_COLLECTION: &str = "person";

pub const DEFAULT_PAGE_SIZE: usize = 20;

pub const FIRST_NAME_FIELD: &str = "firstName";

pub const AGE_FIELD: &str = "age";

pub const ADDRESSES_FIELD: &str = "addresses";

/// City of any of a person's addresses
pub const CITY_PATH: &str = "addresses.city";

/// Photos are stored as blobs under `photo-<id>`
pub const PHOTO_BLOB_PREFIX: &str = "photo-";
/// Raw photo bytes live under `photo-<id>.bin`
pub const PHOTO_DATA_SUFFIX: &str = ".bin";

use serde::{Deserialize, Serialize};

use crate::consts::consts::EntityId;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Photo {
    pub id: EntityId,
    /// Original file name of the upload
    pub title: String,
    pub data: Vec<u8>,
}

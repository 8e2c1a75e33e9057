use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::rooms::{RoomDescriptor, RoomType, RoomVisibility};

/// A room as the backend registry stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRecord {
    pub id: String,
    pub name: String,
    pub visibility: RoomVisibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    pub capacity: u8,
    pub room_type: RoomType,
    pub owner_id: String,
}

impl RoomRecord {
    pub fn to_descriptor(&self) -> RoomDescriptor {
        RoomDescriptor {
            name: self.name.clone(),
            visibility: self.visibility,
            password_hash: self.password_hash.clone(),
            capacity: self.capacity,
            room_type: self.room_type,
            backend_id: Some(self.id.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRoomRecord {
    pub name: String,
    pub visibility: RoomVisibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    pub capacity: u8,
    pub room_type: RoomType,
}

impl NewRoomRecord {
    pub fn from_descriptor(descriptor: &RoomDescriptor) -> NewRoomRecord {
        NewRoomRecord {
            name: descriptor.name.clone(),
            visibility: descriptor.visibility,
            password_hash: descriptor.password_hash.clone(),
            capacity: descriptor.capacity,
            room_type: descriptor.room_type,
        }
    }
}

/// A placed world object. The instance id is minted client-side so a
/// retried create lands on the same record instead of duplicating it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedObject {
    pub instance_id: Uuid,
    pub kind: String,
    pub data: Value,
}

impl PlacedObject {
    pub fn new(kind: impl Into<String>, data: Value) -> PlacedObject {
        PlacedObject {
            instance_id: Uuid::now_v7(),
            kind: kind.into(),
            data,
        }
    }
}

pub mod orchestrator;
pub mod pending;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Result, RoomError};

pub const MAX_CAPACITY: u8 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomVisibility {
    Private,
    Public,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    Casual,
    Work,
    Classroom,
}

impl RoomType {
    /// Casual rooms are the only ones open to unauthenticated sessions.
    pub fn guest_joinable(self) -> bool {
        matches!(self, RoomType::Casual)
    }
}

/// What a room looks like before the relay session exists. Built from user
/// input, optionally round-tripped through the backend (picking up
/// `backend_id`), handed to the relay, then discarded once the room is
/// entered — from that point the relay room properties are authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomDescriptor {
    pub name: String,
    pub visibility: RoomVisibility,
    pub password_hash: Option<String>,
    pub capacity: u8,
    pub room_type: RoomType,
    pub backend_id: Option<String>,
}

impl RoomDescriptor {
    /// Minimal descriptor for join flows where only the name is known.
    pub fn named(name: impl Into<String>) -> RoomDescriptor {
        RoomDescriptor {
            name: name.into(),
            visibility: RoomVisibility::Public,
            password_hash: None,
            capacity: 8,
            room_type: RoomType::Casual,
            backend_id: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(RoomError::Validation("room name can't be empty".into()));
        }
        if self.capacity == 0 || self.capacity > MAX_CAPACITY {
            return Err(RoomError::Validation(format!(
                "capacity must be between 1 and {MAX_CAPACITY}"
            )));
        }
        if self.visibility == RoomVisibility::Private
            && self.password_hash.as_deref().unwrap_or("").is_empty()
        {
            return Err(RoomError::Validation(
                "private rooms need a password".into(),
            ));
        }
        Ok(())
    }

    pub fn scene_key<'a>(&self, config: &'a Config) -> &'a str {
        config.scene_for(self.room_type)
    }
}

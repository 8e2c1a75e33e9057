use serde_json::{Map, Value};

// Error codes surfaced by the relay's create/join failure callbacks.
pub const CODE_ROOM_ALREADY_EXISTS: i32 = 32766;
pub const CODE_ROOM_NOT_FOUND: i32 = 32758;

/// Properties of a relay room as reported by the joined callback. Once a
/// room is entered these are authoritative; the descriptor that produced
/// them is discarded.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoomProps {
    pub name: String,
    pub properties: Map<String, Value>,
}

impl RoomProps {
    pub fn named(name: impl Into<String>) -> RoomProps {
        RoomProps {
            name: name.into(),
            properties: Map::new(),
        }
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectCause {
    /// We asked for it; never treated as a failure.
    ClientDisconnect,
    ClientTimeout,
    ServerTimeout,
    ServerShutdown,
    Kicked,
    VersionMismatch,
    Unknown,
}

impl DisconnectCause {
    pub fn is_intentional(self) -> bool {
        matches!(self, DisconnectCause::ClientDisconnect)
    }

    /// Timeout-class causes can be fixed by reconnecting at the transport
    /// level; a kick or version mismatch cannot.
    pub fn is_recoverable(self) -> bool {
        matches!(
            self,
            DisconnectCause::ClientTimeout | DisconnectCause::ServerTimeout
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    ConnectedToMaster,
    JoinedLobby,
    JoinedRoom(RoomProps),
    CreateRoomFailed { code: i32, message: String },
    JoinRoomFailed { code: i32, message: String },
    Disconnected(DisconnectCause),
}

/// Where the relay session currently stands, folded from its callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RelayStatus {
    #[default]
    Disconnected,
    Connecting,
    ConnectedToMaster,
    InLobby,
    InRoom(String),
}

impl RelayStatus {
    pub fn apply(&mut self, event: &RelayEvent) {
        match event {
            RelayEvent::ConnectedToMaster => *self = RelayStatus::ConnectedToMaster,
            RelayEvent::JoinedLobby => *self = RelayStatus::InLobby,
            RelayEvent::JoinedRoom(props) => *self = RelayStatus::InRoom(props.name.clone()),
            RelayEvent::Disconnected(_) => *self = RelayStatus::Disconnected,
            RelayEvent::CreateRoomFailed { .. } | RelayEvent::JoinRoomFailed { .. } => {}
        }
    }

    pub fn in_room(&self) -> Option<&str> {
        match self {
            RelayStatus::InRoom(name) => Some(name),
            _ => None,
        }
    }
}

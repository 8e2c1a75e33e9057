pub mod client;
pub mod event;
pub mod mock;

pub use client::{RelayClient, RoomOptions, PROP_ROOM_TYPE, PROP_SCENE, PROP_VISIBILITY};
pub use event::{
    DisconnectCause, RelayEvent, RelayStatus, RoomProps, CODE_ROOM_ALREADY_EXISTS,
    CODE_ROOM_NOT_FOUND,
};

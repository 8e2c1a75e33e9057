use serde_json::{json, Map, Value};

use crate::rooms::RoomDescriptor;

// Custom-property keys mirrored onto every relay room.
pub const PROP_VISIBILITY: &str = "vis";
pub const PROP_ROOM_TYPE: &str = "type";
pub const PROP_SCENE: &str = "scene";

/// Room options handed to the relay on create. The lobby-visible subset is
/// what room listings can filter on without joining.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomOptions {
    pub max_players: u8,
    pub custom_properties: Map<String, Value>,
    pub lobby_visible_keys: Vec<String>,
}

impl RoomOptions {
    pub fn from_descriptor(descriptor: &RoomDescriptor, scene_key: &str) -> RoomOptions {
        let mut custom_properties = Map::new();
        custom_properties.insert(PROP_VISIBILITY.to_owned(), json!(descriptor.visibility));
        custom_properties.insert(PROP_ROOM_TYPE.to_owned(), json!(descriptor.room_type));
        custom_properties.insert(
            PROP_SCENE.to_owned(),
            Value::String(scene_key.to_owned()),
        );
        RoomOptions {
            max_players: descriptor.capacity,
            custom_properties,
            lobby_visible_keys: vec![PROP_VISIBILITY.to_owned(), PROP_ROOM_TYPE.to_owned()],
        }
    }
}

/// The realtime relay service, treated as an opaque collaborator. Commands
/// are fire-and-forget enqueues; every outcome arrives later as a
/// [`RelayEvent`](crate::relay::RelayEvent) callback. A dead transport
/// surfaces as a `Disconnected` event, not as a command error.
pub trait RelayClient {
    fn connect(&self);
    fn join_lobby(&self);
    fn create_room(&self, name: &str, options: &RoomOptions);
    fn join_room(&self, name: &str);
    fn leave_room(&self);
    fn disconnect(&self);
}

pub mod http;
pub mod records;
pub mod store;

pub use http::{ApiRequest, ApiResponse, RetryingHttpClient};
pub use records::{NewRoomRecord, PlacedObject, RoomRecord};
pub use store::{PersistenceStore, RoomRegistry};

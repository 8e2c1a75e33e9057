pub mod monitor;
pub mod reconnect;

pub use monitor::{ConnectionState, ConnectivityMonitor};
pub use reconnect::ReconnectCoordinator;

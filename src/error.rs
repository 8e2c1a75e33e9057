use thiserror::Error;

pub type Result<T> = std::result::Result<T, RoomError>;

/// Failure taxonomy for the whole crate. Only `Transport` is retried;
/// everything else is settled the moment it is produced.
#[derive(Debug, Error)]
pub enum RoomError {
    #[error("{0}")]
    Validation(String),
    #[error("not signed in")]
    AuthRequired,
    #[error("a room with that name already exists")]
    Conflict,
    #[error("room not found")]
    NotFound,
    #[error("not allowed")]
    Forbidden,
    /// Raw 401 from the transport layer. `PersistenceStore` always converts
    /// this into `WrongPassword` or `SessionExpired` depending on the call,
    /// so the orchestrator never sees it.
    #[error("unauthorized")]
    Unauthorized,
    #[error("wrong password")]
    WrongPassword,
    #[error("session expired, please sign in again")]
    SessionExpired,
    #[error("could not reach server: {0}")]
    Transport(String),
    #[error("server returned {status}: {message}")]
    Backend { status: u16, message: String },
    #[error("bad payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl RoomError {
    pub fn is_transient(&self) -> bool {
        matches!(self, RoomError::Transport(_))
    }
}

use tokio::sync::mpsc;

/// Everything the presentation layer ever hears from this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiSignal {
    Status(String),
    Loading(bool),
    /// Blocking connectivity overlay while a grace-period countdown runs.
    Overlay(bool),
    EnterScene(String),
    SessionExpired,
    ReturnToEntry,
}

pub type UiSender = mpsc::UnboundedSender<UiSignal>;
pub type UiReceiver = mpsc::UnboundedReceiver<UiSignal>;

pub fn channel() -> (UiSender, UiReceiver) {
    mpsc::unbounded_channel()
}

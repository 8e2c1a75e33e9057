use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::ReconnectPolicy;
use crate::relay::{DisconnectCause, RelayClient, RelayEvent};
use crate::ui::{UiSender, UiSignal};

/// Transport-level recovery while inside a room, independent of whether the
/// platform thinks it is offline. Recoverable disconnect causes get a
/// bounded number of reconnect-and-rejoin cycles with a fixed inter-attempt
/// delay; unrecoverable causes go straight to the terminal path.
pub struct ReconnectCoordinator<R> {
    relay: Arc<R>,
    ui: UiSender,
    policy: ReconnectPolicy,
    current_room: Option<String>,
    target: Option<String>,
    attempts: u32,
    next_attempt_at: Option<Instant>,
    awaiting_master: bool,
}

impl<R: RelayClient> ReconnectCoordinator<R> {
    pub fn new(relay: Arc<R>, ui: UiSender, policy: ReconnectPolicy) -> ReconnectCoordinator<R> {
        ReconnectCoordinator {
            relay,
            ui,
            policy,
            current_room: None,
            target: None,
            attempts: 0,
            next_attempt_at: None,
            awaiting_master: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.target.is_some()
    }

    pub fn note_room_entered(&mut self, name: &str) {
        self.current_room = Some(name.to_owned());
    }

    pub fn note_room_left(&mut self) {
        self.current_room = None;
    }

    pub fn on_relay_event(&mut self, event: &RelayEvent, now: Instant) {
        match event {
            RelayEvent::Disconnected(cause) => self.on_disconnected(*cause, now),
            RelayEvent::ConnectedToMaster => {
                if self.awaiting_master {
                    if let Some(room) = self.target.clone() {
                        self.awaiting_master = false;
                        debug!(room = %room, "relay reconnected, rejoining");
                        self.relay.join_room(&room);
                    }
                }
            }
            RelayEvent::JoinedRoom(props) => {
                if self.target.is_some() {
                    info!(room = %props.name, "room membership restored");
                }
                self.current_room = Some(props.name.clone());
                self.reset();
            }
            _ => {}
        }
    }

    pub fn tick(&mut self, now: Instant) {
        let Some(at) = self.next_attempt_at else {
            return;
        };
        if now < at {
            return;
        }
        if self.attempts >= self.policy.max_attempts {
            warn!(attempts = self.attempts, "reconnect attempts exhausted");
            self.reset();
            let _ = self.ui.send(UiSignal::Status("could not reconnect".into()));
            let _ = self.ui.send(UiSignal::ReturnToEntry);
            return;
        }
        self.attempts += 1;
        debug!(attempt = self.attempts, "reconnect cycle");
        self.awaiting_master = true;
        self.next_attempt_at = Some(now + self.policy.delay);
        self.relay.connect();
    }

    fn on_disconnected(&mut self, cause: DisconnectCause, now: Instant) {
        if cause.is_intentional() {
            self.reset();
            self.current_room = None;
            return;
        }
        if self.target.is_some() {
            // an attempt's connect fell over; the already-scheduled next
            // cycle will pick it up
            self.awaiting_master = false;
            return;
        }
        let Some(room) = self.current_room.take() else {
            return;
        };
        if !cause.is_recoverable() {
            // a kick or version mismatch can never be reconnected through;
            // anything else is the connectivity monitor's grace period to
            // handle
            if matches!(cause, DisconnectCause::Kicked | DisconnectCause::VersionMismatch) {
                warn!(?cause, "unrecoverable relay disconnect");
                let _ = self
                    .ui
                    .send(UiSignal::Status("disconnected from the room".into()));
                let _ = self.ui.send(UiSignal::ReturnToEntry);
            }
            return;
        }
        info!(?cause, room = %room, "recoverable relay disconnect, scheduling reconnect");
        self.target = Some(room);
        self.attempts = 0;
        // first cycle fires on the next tick
        self.next_attempt_at = Some(now);
    }

    fn reset(&mut self) {
        self.target = None;
        self.attempts = 0;
        self.next_attempt_at = None;
        self.awaiting_master = false;
    }
}

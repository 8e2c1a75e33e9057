use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::relay::{RelayClient, RelayEvent};
use crate::session::store::SessionStore;
use crate::ui::{UiSender, UiSignal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Online,
    OfflineGracePeriod,
    OfflineFailed,
}

/// Tracks relay connectivity plus the platform's own reachability signal
/// and drives the Online → OfflineGracePeriod → {Online, OfflineFailed}
/// state machine. Deadline-valued countdowns: re-arming replaces the old
/// one, so a terminal transition can never fire twice.
pub struct ConnectivityMonitor<R> {
    relay: Arc<R>,
    ui: UiSender,
    store: SessionStore,
    grace_period: Duration,
    state: ConnectionState,
    deadline: Option<Instant>,
    current_room: Option<String>,
    last_known_room: Option<String>,
    attempt_auto_rejoin: bool,
}

impl<R: RelayClient> ConnectivityMonitor<R> {
    pub fn new(
        relay: Arc<R>,
        ui: UiSender,
        store: SessionStore,
        grace_period: Duration,
    ) -> ConnectivityMonitor<R> {
        ConnectivityMonitor {
            relay,
            ui,
            store,
            grace_period,
            state: ConnectionState::Online,
            deadline: None,
            current_room: None,
            last_known_room: None,
            attempt_auto_rejoin: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn attempt_auto_rejoin(&self) -> bool {
        self.attempt_auto_rejoin
    }

    pub fn last_known_room(&self) -> Option<&str> {
        self.last_known_room.as_deref()
    }

    pub fn note_room_entered(&mut self, name: &str) {
        self.current_room = Some(name.to_owned());
    }

    pub fn note_room_left(&mut self) {
        self.current_room = None;
    }

    pub fn on_network_lost(&mut self, now: Instant) {
        self.enter_grace(now, "network connection lost");
    }

    pub fn on_network_restored(&mut self, now: Instant) {
        self.recovered(now);
    }

    pub fn on_relay_event(&mut self, event: &RelayEvent, now: Instant) {
        match event {
            RelayEvent::Disconnected(cause) if !cause.is_intentional() => {
                self.enter_grace(now, "connection to the room service lost");
            }
            RelayEvent::ConnectedToMaster | RelayEvent::JoinedRoom(_) => self.recovered(now),
            _ => {}
        }
    }

    /// Advances the countdown. Cheap; call it on every frame/poll tick.
    pub fn tick(&mut self, now: Instant) {
        if self.state != ConnectionState::OfflineGracePeriod {
            return;
        }
        let Some(deadline) = self.deadline else {
            return;
        };
        if now < deadline {
            return;
        }
        warn!("grace period elapsed without recovery");
        self.state = ConnectionState::OfflineFailed;
        self.deadline = None;
        self.attempt_auto_rejoin = false;
        self.current_room = None;
        let _ = self.ui.send(UiSignal::Overlay(false));
        let _ = self.ui.send(UiSignal::Status("connection lost".into()));
        let _ = self.ui.send(UiSignal::ReturnToEntry);
    }

    /// Hands out the rejoin target exactly once, for the driver to run
    /// through the orchestrator's normal join flow after the entry point
    /// has loaded.
    pub fn take_auto_rejoin(&mut self) -> Option<String> {
        if !self.attempt_auto_rejoin {
            return None;
        }
        self.attempt_auto_rejoin = false;
        self.last_known_room.take()
    }

    fn enter_grace(&mut self, now: Instant, reason: &str) {
        match self.state {
            // terminal until a full restart
            ConnectionState::OfflineFailed => return,
            // countdown already running; a second trigger must not extend it
            ConnectionState::OfflineGracePeriod => return,
            ConnectionState::Online => {}
        }
        if let Some(room) = self.current_room.clone() {
            self.last_known_room = Some(room.clone());
            let mut state = self.store.load();
            state.last_known_room = Some(room);
            if let Err(err) = self.store.save(&state) {
                warn!(%err, "failed to persist last room name");
            }
        }
        warn!(reason, grace_secs = self.grace_period.as_secs(), "connectivity lost, starting grace period");
        self.state = ConnectionState::OfflineGracePeriod;
        self.deadline = Some(now + self.grace_period);
        let _ = self.ui.send(UiSignal::Overlay(true));
        let _ = self.ui.send(UiSignal::Status(reason.to_owned()));
    }

    fn recovered(&mut self, now: Instant) {
        if self.state != ConnectionState::OfflineGracePeriod {
            return;
        }
        let Some(deadline) = self.deadline else {
            return;
        };
        if now >= deadline {
            // the countdown had already elapsed when recovery arrived; the
            // terminal path wins and no auto-rejoin happens. Policy choice
            // carried over from the original system, not an oversight.
            self.tick(now);
            return;
        }
        info!("connectivity restored within the grace period");
        self.attempt_auto_rejoin = self.last_known_room.is_some();
        self.state = ConnectionState::Online;
        self.deadline = None;
        let _ = self.ui.send(UiSignal::Overlay(false));
        let _ = self.ui.send(UiSignal::Status("connection restored".into()));
        // tear the relay session down and come back up from a clean slate
        self.relay.disconnect();
        self.relay.connect();
    }
}

//! Room session lifecycle and network-resilience layer for shared
//! multiplayer rooms. Reconciles a durable backend registry with an
//! ephemeral realtime relay, queues user intents across connection-state
//! transitions, and recovers from connectivity loss with a bounded grace
//! period. Rendering, chat, and call wiring live above this crate; it only
//! emits [`UiSignal`]s and consumes user intents.

pub mod backend;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod relay;
pub mod rooms;
pub mod session;
pub mod ui;

use std::sync::Arc;
use std::time::Instant;

pub use backend::{PersistenceStore, RetryingHttpClient, RoomRegistry};
pub use config::Config;
pub use connectivity::{ConnectionState, ConnectivityMonitor, ReconnectCoordinator};
pub use error::{Result, RoomError};
pub use relay::{RelayClient, RelayEvent};
pub use rooms::orchestrator::{Phase, RoomOrchestrator};
pub use rooms::{RoomDescriptor, RoomType, RoomVisibility};
pub use session::{Credential, SessionContext, SessionIdentity, SessionMode, SessionStore};
pub use ui::UiSignal;

/// One fully wired session: the orchestrator plus both resilience
/// components sharing a relay handle and a UI channel. All relay callbacks
/// and ticks are funneled through here on a single logical thread, which is
/// what keeps the state machines single-writer.
pub struct RoomSession<B, R> {
    pub orchestrator: RoomOrchestrator<B, R>,
    pub monitor: ConnectivityMonitor<R>,
    pub reconnect: ReconnectCoordinator<R>,
}

impl<B: RoomRegistry, R: RelayClient> RoomSession<B, R> {
    pub fn new(
        registry: B,
        relay: Arc<R>,
        config: Config,
        ctx: SessionContext,
        ui: ui::UiSender,
    ) -> RoomSession<B, R> {
        let monitor = ConnectivityMonitor::new(
            relay.clone(),
            ui.clone(),
            ctx.store.clone(),
            config.grace_period,
        );
        let reconnect =
            ReconnectCoordinator::new(relay.clone(), ui.clone(), config.reconnect.clone());
        let orchestrator = RoomOrchestrator::new(registry, relay, config, ctx, ui);
        RoomSession {
            orchestrator,
            monitor,
            reconnect,
        }
    }

    /// Single entry point for every relay callback.
    pub fn on_relay_event(&mut self, event: &RelayEvent, now: Instant) {
        self.orchestrator.on_relay_event(event);
        if let RelayEvent::JoinedRoom(props) = event {
            self.monitor.note_room_entered(&props.name);
        }
        self.reconnect.on_relay_event(event, now);
        self.monitor.on_relay_event(event, now);
    }

    pub fn tick(&mut self, now: Instant) {
        self.orchestrator.tick(now);
        self.monitor.tick(now);
        self.reconnect.tick(now);
    }

    /// Call once the entry point has loaded after a recovered drop; feeds
    /// the remembered room back through the orchestrator's normal join flow.
    pub fn resume_after_entry(&mut self) {
        if let Some(room) = self.monitor.take_auto_rejoin() {
            self.orchestrator.auto_rejoin(&room);
        }
    }
}

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::backend::records::NewRoomRecord;
use crate::backend::store::RoomRegistry;
use crate::config::Config;
use crate::error::RoomError;
use crate::relay::{
    RelayClient, RelayEvent, RelayStatus, RoomOptions, RoomProps, CODE_ROOM_ALREADY_EXISTS,
    CODE_ROOM_NOT_FOUND, PROP_ROOM_TYPE, PROP_SCENE,
};
use crate::rooms::pending::{PendingAction, PendingActionQueue, PendingKind};
use crate::rooms::{RoomDescriptor, RoomType, RoomVisibility};
use crate::session::SessionContext;
use crate::ui::{UiSender, UiSignal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    AwaitingBackend,
    AwaitingRelayLobby,
    AwaitingRelayRoom,
    InRoom,
}

#[derive(Debug, Clone)]
struct Attempt {
    descriptor: RoomDescriptor,
    password: Option<String>,
    /// One backend→relay reconciliation per attempt, so a create/join race
    /// can never ping-pong forever.
    healed: bool,
}

/// The room creation/join state machine. Decides whether a request needs
/// backend registration first (authenticated) or goes straight to the
/// relay (guest), bridges the relay's leave-before-join gap through the
/// pending-action queue, and reconciles a vanished relay session from the
/// backend record.
pub struct RoomOrchestrator<B, R> {
    registry: B,
    relay: Arc<R>,
    config: Config,
    ctx: SessionContext,
    pending: PendingActionQueue,
    ui: UiSender,
    phase: Phase,
    relay_status: RelayStatus,
    attempt: Option<Attempt>,
    lobby_deadline: Option<Instant>,
    current_room: Option<String>,
    current_backend_id: Option<String>,
}

impl<B: RoomRegistry, R: RelayClient> RoomOrchestrator<B, R> {
    pub fn new(
        registry: B,
        relay: Arc<R>,
        config: Config,
        ctx: SessionContext,
        ui: UiSender,
    ) -> RoomOrchestrator<B, R> {
        let pending = PendingActionQueue::load(ctx.store.clone());
        RoomOrchestrator {
            registry,
            relay,
            config,
            ctx,
            pending,
            ui,
            phase: Phase::Idle,
            relay_status: RelayStatus::Disconnected,
            attempt: None,
            lobby_deadline: None,
            current_room: None,
            current_backend_id: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_room(&self) -> Option<&str> {
        self.current_room.as_deref()
    }

    /// Backend id of the room we are in, if it has a backend record. Needed
    /// for object persistence calls.
    pub fn current_backend_id(&self) -> Option<&str> {
        self.current_backend_id.as_deref()
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut SessionContext {
        &mut self.ctx
    }

    pub async fn submit_create(&mut self, descriptor: RoomDescriptor, password: Option<String>) {
        if self.phase != Phase::Idle {
            self.status("another room request is already in progress");
            return;
        }
        if let Err(err) = descriptor.validate() {
            self.status(err.to_string());
            return;
        }

        if !self.ctx.identity.is_authenticated() {
            // rejected before any network traffic
            if descriptor.visibility == RoomVisibility::Private
                || !descriptor.room_type.guest_joinable()
            {
                self.status("sign in to create private or non-casual rooms");
                return;
            }
            self.ctx.regenerate_guest();
            self.start_attempt(PendingKind::CreateRoom, descriptor, password);
            return;
        }

        // authenticated: the backend record comes first
        self.phase = Phase::AwaitingBackend;
        self.signal(UiSignal::Loading(true));
        let record = NewRoomRecord::from_descriptor(&descriptor);
        match self
            .registry
            .create_room(&record, self.ctx.credential.as_ref())
            .await
        {
            Ok(created) => {
                let descriptor = created.to_descriptor();
                info!(room = %descriptor.name, backend_id = %created.id, "room registered with backend");
                self.start_attempt(PendingKind::CreateRoom, descriptor, password);
            }
            Err(RoomError::Conflict) => self.fail("a room with that name already exists"),
            Err(RoomError::SessionExpired) => self.expire_session(),
            Err(err) => self.fail(err.to_string()),
        }
    }

    pub async fn submit_join(&mut self, name: &str, password: Option<String>) {
        if self.phase != Phase::Idle {
            self.status("another room request is already in progress");
            return;
        }
        if name.trim().is_empty() {
            self.status("room name can't be empty");
            return;
        }

        if !self.ctx.identity.is_authenticated() {
            self.ctx.regenerate_guest();
            self.start_attempt(PendingKind::JoinRoom, RoomDescriptor::named(name), password);
            return;
        }

        self.phase = Phase::AwaitingBackend;
        self.signal(UiSignal::Loading(true));
        let record = match self.registry.find_room(name).await {
            Ok(record) => record,
            Err(RoomError::NotFound) => {
                self.fail("no room with that name");
                return;
            }
            Err(err) => {
                self.fail(err.to_string());
                return;
            }
        };

        let descriptor = record.to_descriptor();
        if descriptor.visibility == RoomVisibility::Private {
            // wrong passwords are rejected here, cheaply, before any relay
            // session exists
            match self
                .registry
                .join_room(&record.id, password.as_deref(), self.ctx.credential.as_ref())
                .await
            {
                Ok(()) => {}
                Err(RoomError::WrongPassword) => {
                    self.fail("wrong password");
                    return;
                }
                Err(RoomError::Forbidden) => {
                    self.fail("you're not allowed in that room");
                    return;
                }
                Err(err) => {
                    self.fail(err.to_string());
                    return;
                }
            }
        }
        self.start_attempt(PendingKind::JoinRoom, descriptor, password);
    }

    /// Synthesized join used by the auto-rejoin path after a recovered
    /// connectivity drop. Runs through the exact same pending-action and
    /// lobby-bridge machinery as a user-submitted join.
    pub fn auto_rejoin(&mut self, room_name: &str) {
        if self.phase != Phase::Idle {
            return;
        }
        info!(room = room_name, "attempting automatic rejoin");
        self.status("reconnecting to your room");
        self.ctx.regenerate_guest();
        self.start_attempt(PendingKind::JoinRoom, RoomDescriptor::named(room_name), None);
    }

    /// User cancel. Clears pending intents and timers; if the relay is
    /// connected but not in a room yet, drops the connection so nothing is
    /// left half-open.
    pub fn cancel(&mut self) {
        if self.phase == Phase::InRoom || self.phase == Phase::Idle {
            return;
        }
        debug!("room request cancelled");
        self.pending.clear_all();
        self.lobby_deadline = None;
        if matches!(
            self.relay_status,
            RelayStatus::Connecting | RelayStatus::ConnectedToMaster | RelayStatus::InLobby
        ) {
            self.relay.disconnect();
            self.relay_status = RelayStatus::Disconnected;
        }
        self.attempt = None;
        self.reset_to_idle();
    }

    pub fn on_relay_event(&mut self, event: &RelayEvent) {
        self.relay_status.apply(event);
        match event {
            RelayEvent::ConnectedToMaster => {
                if !self.pending.is_empty() {
                    self.relay.join_lobby();
                }
            }
            RelayEvent::JoinedLobby => {
                // Idle with something queued happens after a reload: the
                // persisted intent resumes the moment the lobby confirms
                if self.phase == Phase::AwaitingRelayLobby
                    || (self.phase == Phase::Idle && !self.pending.is_empty())
                {
                    self.consume_pending();
                }
            }
            RelayEvent::JoinedRoom(props) => self.enter_room(props),
            RelayEvent::CreateRoomFailed { code, message } => {
                self.handle_create_failed(*code, message);
            }
            RelayEvent::JoinRoomFailed { code, message } => {
                self.handle_join_failed(*code, message);
            }
            RelayEvent::Disconnected(_) => {
                if self.phase == Phase::InRoom {
                    // resilience is the monitor's and the reconnect
                    // coordinator's business; we just stop claiming the room
                    self.phase = Phase::Idle;
                    self.current_room = None;
                    self.current_backend_id = None;
                }
            }
        }
    }

    /// Expires the bounded wait for lobby membership so a stuck bridge
    /// never hangs the UI.
    pub fn tick(&mut self, now: Instant) {
        let Some(deadline) = self.lobby_deadline else {
            return;
        };
        if now < deadline {
            return;
        }
        if matches!(
            self.phase,
            Phase::AwaitingRelayLobby | Phase::AwaitingRelayRoom
        ) {
            warn!("timed out waiting for the relay lobby");
            self.pending.clear_all();
            self.lobby_deadline = None;
            self.attempt = None;
            self.fail("could not reach the room service, try again");
        }
    }

    fn start_attempt(
        &mut self,
        kind: PendingKind,
        descriptor: RoomDescriptor,
        password: Option<String>,
    ) {
        self.signal(UiSignal::Loading(true));
        self.attempt = Some(Attempt {
            descriptor: descriptor.clone(),
            password: password.clone(),
            healed: false,
        });
        self.pending.enqueue(PendingAction {
            kind,
            descriptor,
            password,
        });
        self.phase = Phase::AwaitingRelayLobby;
        self.lobby_deadline = Some(Instant::now() + self.config.lobby_wait);
        self.bridge_to_lobby();
    }

    /// The relay requires "not currently in a room" before creating or
    /// joining another; walk it toward lobby membership from wherever it is.
    fn bridge_to_lobby(&mut self) {
        match &self.relay_status {
            RelayStatus::InRoom(_) => {
                debug!("leaving current relay room first");
                self.relay.leave_room();
            }
            RelayStatus::Disconnected => {
                self.relay.connect();
                self.relay_status = RelayStatus::Connecting;
            }
            RelayStatus::Connecting => {}
            RelayStatus::ConnectedToMaster => self.relay.join_lobby(),
            RelayStatus::InLobby => self.consume_pending(),
        }
    }

    fn consume_pending(&mut self) {
        let action = self
            .pending
            .try_consume(PendingKind::CreateRoom)
            .or_else(|| self.pending.try_consume(PendingKind::JoinRoom));
        let Some(action) = action else {
            return;
        };
        self.phase = Phase::AwaitingRelayRoom;
        match action.kind {
            PendingKind::CreateRoom => {
                let scene = action.descriptor.scene_key(&self.config).to_owned();
                let options = RoomOptions::from_descriptor(&action.descriptor, &scene);
                debug!(room = %action.descriptor.name, "creating relay room");
                self.relay.create_room(&action.descriptor.name, &options);
            }
            PendingKind::JoinRoom => {
                debug!(room = %action.descriptor.name, "joining relay room");
                self.relay.join_room(&action.descriptor.name);
            }
        }
    }

    fn enter_room(&mut self, props: &RoomProps) {
        // casual rooms are the only ones open to guests; a guest landing
        // anywhere else is backed straight out
        if !self.ctx.identity.is_authenticated() {
            let room_type = props
                .properties
                .get(PROP_ROOM_TYPE)
                .and_then(|v| serde_json::from_value::<RoomType>(v.clone()).ok());
            if room_type.is_some_and(|t| !t.guest_joinable()) {
                warn!(room = %props.name, "guest joined a non-casual room, leaving");
                self.relay.leave_room();
                self.pending.clear_all();
                self.attempt = None;
                self.lobby_deadline = None;
                self.fail("sign in to enter this room");
                return;
            }
        }

        let scene = props
            .property(PROP_SCENE)
            .map(str::to_owned)
            .or_else(|| {
                self.attempt
                    .as_ref()
                    .map(|a| a.descriptor.scene_key(&self.config).to_owned())
            })
            .unwrap_or_else(|| self.config.default_scene.clone());

        self.current_backend_id = self
            .attempt
            .take()
            .and_then(|a| a.descriptor.backend_id);
        self.phase = Phase::InRoom;
        self.current_room = Some(props.name.clone());
        self.lobby_deadline = None;
        self.pending.clear_all();
        self.remember_room(&props.name);
        info!(room = %props.name, %scene, "entered room");
        self.signal(UiSignal::Loading(false));
        self.signal(UiSignal::EnterScene(scene));
    }

    fn handle_create_failed(&mut self, code: i32, message: &str) {
        if code == CODE_ROOM_ALREADY_EXISTS {
            // another client won the creation race; join their room rather
            // than failing the user
            let name = self.attempt.as_ref().map(|a| a.descriptor.name.clone());
            if let Some(name) = name {
                info!(room = %name, "relay room already exists, joining instead");
                self.phase = Phase::AwaitingRelayRoom;
                self.relay.join_room(&name);
                return;
            }
        }
        warn!(code, message = %message, "relay room creation failed");
        self.pending.clear_all();
        self.attempt = None;
        self.lobby_deadline = None;
        self.fail("could not create the room right now");
    }

    fn handle_join_failed(&mut self, code: i32, message: &str) {
        if code == CODE_ROOM_NOT_FOUND && self.ctx.identity.is_authenticated() {
            // the backend registry is authoritative over room existence; the
            // relay session is a disposable projection of it, so recreate it
            // from the stored record
            let heal = match self.attempt.as_mut() {
                Some(a) if a.descriptor.backend_id.is_some() && !a.healed => {
                    a.healed = true;
                    Some((a.descriptor.clone(), a.password.clone()))
                }
                _ => None,
            };
            if let Some((descriptor, password)) = heal {
                info!(room = %descriptor.name, "relay room missing, recreating from backend record");
                self.pending.enqueue(PendingAction {
                    kind: PendingKind::CreateRoom,
                    descriptor,
                    password,
                });
                self.phase = Phase::AwaitingRelayLobby;
                self.lobby_deadline = Some(Instant::now() + self.config.lobby_wait);
                self.bridge_to_lobby();
                return;
            }
        }
        warn!(code, message = %message, "relay join failed");
        self.pending.clear_all();
        self.attempt = None;
        self.lobby_deadline = None;
        self.fail("could not join the room");
    }

    fn remember_room(&self, name: &str) {
        let mut state = self.ctx.store.load();
        state.last_known_room = Some(name.to_owned());
        if let Err(err) = self.ctx.store.save(&state) {
            warn!(%err, "failed to persist last room name");
        }
    }

    fn expire_session(&mut self) {
        self.signal(UiSignal::SessionExpired);
        self.fail("session expired, please sign in again");
    }

    fn fail(&mut self, message: impl Into<String>) {
        self.status(message);
        self.reset_to_idle();
    }

    fn reset_to_idle(&mut self) {
        self.phase = Phase::Idle;
        self.attempt = None;
        self.lobby_deadline = None;
        self.signal(UiSignal::Loading(false));
    }

    fn status(&self, message: impl Into<String>) {
        self.signal(UiSignal::Status(message.into()));
    }

    fn signal(&self, signal: UiSignal) {
        let _ = self.ui.send(signal);
    }
}

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::rooms::RoomDescriptor;
use crate::session::store::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingKind {
    CreateRoom,
    JoinRoom,
}

/// A durable record of "the user wants to create/join room R". Bridges the
/// relay's mandatory leave-before-join transition and, on the presentation
/// side, a full scene reload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAction {
    pub kind: PendingKind,
    pub descriptor: RoomDescriptor,
    pub password: Option<String>,
}

/// At most one pending action per kind; a newly queued action of the same
/// kind replaces the old one. Write-through persisted so the queue survives
/// a reload.
pub struct PendingActionQueue {
    create: Option<PendingAction>,
    join: Option<PendingAction>,
    store: SessionStore,
}

impl PendingActionQueue {
    pub fn load(store: SessionStore) -> PendingActionQueue {
        let state = store.load();
        PendingActionQueue {
            create: state.pending_create,
            join: state.pending_join,
            store,
        }
    }

    pub fn enqueue(&mut self, action: PendingAction) {
        match action.kind {
            PendingKind::CreateRoom => self.create = Some(action),
            PendingKind::JoinRoom => self.join = Some(action),
        }
        self.persist();
    }

    /// Atomically returns and clears the action of the given kind.
    pub fn try_consume(&mut self, kind: PendingKind) -> Option<PendingAction> {
        let action = match kind {
            PendingKind::CreateRoom => self.create.take(),
            PendingKind::JoinRoom => self.join.take(),
        };
        if action.is_some() {
            self.persist();
        }
        action
    }

    /// Called the instant a room is entered, so nothing stale replays later.
    pub fn clear_all(&mut self) {
        if self.create.is_none() && self.join.is_none() {
            return;
        }
        self.create = None;
        self.join = None;
        self.persist();
    }

    pub fn is_empty(&self) -> bool {
        self.create.is_none() && self.join.is_none()
    }

    fn persist(&self) {
        let mut state = self.store.load();
        state.pending_create = self.create.clone();
        state.pending_join = self.join.clone();
        if let Err(err) = self.store.save(&state) {
            warn!(%err, "failed to persist pending actions");
        }
    }
}

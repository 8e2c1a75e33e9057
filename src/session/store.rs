use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::rooms::pending::PendingAction;
use crate::session::Credential;

pub const LOCAL_STATE_VERSION: u32 = 1;

/// Everything that must survive a scene or process reload: the user's
/// queued create/join intent, the room to rejoin after a recovery, and the
/// cached credential.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalState {
    #[serde(default)]
    pub version: u32,
    pub pending_create: Option<PendingAction>,
    pub pending_join: Option<PendingAction>,
    pub last_known_room: Option<String>,
    pub credential: Option<Credential>,
}

/// JSON-file-backed store for [`LocalState`]. Loading never fails: a
/// missing, unreadable, or stale-layout file yields a default state.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> SessionStore {
        SessionStore { path: path.into() }
    }

    pub fn load(&self) -> LocalState {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return LocalState::default();
        };
        match serde_json::from_str::<LocalState>(&raw) {
            Ok(state) if state.version == LOCAL_STATE_VERSION => state,
            Ok(_) => LocalState::default(),
            Err(err) => {
                warn!(path = %self.path.display(), %err, "corrupt local state, starting fresh");
                LocalState::default()
            }
        }
    }

    pub fn save(&self, state: &LocalState) -> anyhow::Result<()> {
        let mut state = state.clone();
        state.version = LOCAL_STATE_VERSION;
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        let raw = serde_json::to_string_pretty(&state)?;
        fs::write(&self.path, raw)
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }
}

pub mod store;

use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use store::{LocalState, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    Guest,
    Authenticated,
}

/// Locally cached bearer token + backend user id, attached to every
/// authenticated backend call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub bearer: String,
    pub backend_user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub mode: SessionMode,
    pub handle: String,
    pub display_name: String,
    pub backend_user_id: Option<String>,
    pub avatar_index: u8,
}

pub const AVATAR_COUNT: u8 = 8;

const ADJECTIVES: [&str; 25] = [
    "Quick", "Lazy", "Mysterious", "Jolly", "Brave", "Silent", "Witty", "Fierce",
    "Clever", "Gentle", "Wild", "Calm", "Bold", "Shy", "Proud", "Happy", "Sad",
    "Eager", "Fancy", "Rusty", "Golden", "Silver", "Bright", "Dark", "Lucky",
];

const NOUNS: [&str; 24] = [
    "Fox", "Bear", "Eagle", "Wolf", "Dragon", "Tiger", "Lion", "Owl", "Rabbit",
    "Falcon", "Hawk", "Shark", "Panda", "Kitten", "Puppy", "Phoenix", "Griffin",
    "Unicorn", "Turtle", "Dolphin", "Whale", "Elephant", "Giraffe", "Zebra",
];

impl SessionIdentity {
    /// A disposable guest identity. Minted fresh for every create/join
    /// attempt so a stale relay-level identity from a previous attempt can
    /// never collide with the new session.
    pub fn fresh_guest() -> SessionIdentity {
        let uuid = Uuid::now_v7();
        let handle = "guest".to_owned() + &uuid.simple().to_string();
        let display_name = format!(
            "{} {}",
            ADJECTIVES.choose(&mut rand::rng()).unwrap(),
            NOUNS.choose(&mut rand::rng()).unwrap()
        );
        SessionIdentity {
            mode: SessionMode::Guest,
            handle,
            display_name,
            backend_user_id: None,
            avatar_index: rand::random_range(0..AVATAR_COUNT),
        }
    }

    pub fn authenticated(
        display_name: impl Into<String>,
        backend_user_id: impl Into<String>,
        avatar_index: u8,
    ) -> SessionIdentity {
        let backend_user_id = backend_user_id.into();
        SessionIdentity {
            mode: SessionMode::Authenticated,
            handle: "user".to_owned() + &backend_user_id,
            display_name: display_name.into(),
            backend_user_id: Some(backend_user_id),
            avatar_index: avatar_index % AVATAR_COUNT,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.mode == SessionMode::Authenticated
    }
}

/// Explicitly injected session state. Replaces what the original system kept
/// in ambient globals: who the user is, their cached credential, and the
/// on-disk store for everything that must survive a reload.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub identity: SessionIdentity,
    pub credential: Option<Credential>,
    pub store: SessionStore,
}

impl SessionContext {
    pub fn guest(store: SessionStore) -> SessionContext {
        SessionContext {
            identity: SessionIdentity::fresh_guest(),
            credential: None,
            store,
        }
    }

    pub fn signed_in(
        identity: SessionIdentity,
        credential: Credential,
        store: SessionStore,
    ) -> SessionContext {
        let mut state = store.load();
        state.credential = Some(credential.clone());
        if let Err(err) = store.save(&state) {
            tracing::warn!(%err, "failed to cache credential");
        }
        SessionContext {
            identity,
            credential: Some(credential),
            store,
        }
    }

    /// Rebuild a context from whatever the local store remembers. With a
    /// cached credential the session resumes authenticated (display name
    /// refreshed by the embedder on its next profile fetch); otherwise it
    /// starts as a fresh guest.
    pub fn restore(store: SessionStore) -> SessionContext {
        let state = store.load();
        match state.credential {
            Some(credential) => {
                let identity = SessionIdentity::authenticated(
                    credential.backend_user_id.clone(),
                    credential.backend_user_id.clone(),
                    0,
                );
                SessionContext {
                    identity,
                    credential: Some(credential),
                    store,
                }
            }
            None => SessionContext::guest(store),
        }
    }

    pub fn sign_out(&mut self) {
        self.credential = None;
        self.identity = SessionIdentity::fresh_guest();
        let mut state = self.store.load();
        state.credential = None;
        if let Err(err) = self.store.save(&state) {
            tracing::warn!(%err, "failed to clear cached credential");
        }
    }

    /// Replaces the original's "query the live network-object handle" check:
    /// persisted object mutations are a capability of authenticated sessions.
    pub fn can_mutate_objects(&self) -> bool {
        self.identity.is_authenticated() && self.credential.is_some()
    }

    pub fn regenerate_guest(&mut self) {
        if self.identity.mode == SessionMode::Guest {
            self.identity = SessionIdentity::fresh_guest();
        }
    }
}

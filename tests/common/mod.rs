#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use roombridge::backend::records::{NewRoomRecord, RoomRecord};
use roombridge::backend::store::RoomRegistry;
use roombridge::error::{Result, RoomError};
use roombridge::rooms::{RoomDescriptor, RoomType, RoomVisibility};
use roombridge::session::{Credential, SessionContext, SessionIdentity, SessionStore};
use roombridge::ui::{UiReceiver, UiSignal};

pub const EXPIRED_BEARER: &str = "expired-token";

#[derive(Default)]
struct RegistryInner {
    rooms: Mutex<HashMap<String, RoomRecord>>,
    calls: Mutex<Vec<String>>,
}

/// In-memory stand-in for the backend registry, mirroring its REST
/// semantics: unique names, password gate, bearer requirement. Clones share
/// state so a test can keep a handle after moving one into the orchestrator.
#[derive(Default, Clone)]
pub struct FakeRegistry {
    inner: Arc<RegistryInner>,
}

impl FakeRegistry {
    pub fn new() -> FakeRegistry {
        FakeRegistry::default()
    }

    pub fn with_room(self, record: RoomRecord) -> FakeRegistry {
        self.inner
            .rooms
            .lock()
            .unwrap()
            .insert(record.name.clone(), record);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.calls.lock().unwrap().clone()
    }

    pub fn room(&self, name: &str) -> Option<RoomRecord> {
        self.inner.rooms.lock().unwrap().get(name).cloned()
    }

    fn log(&self, call: String) {
        self.inner.calls.lock().unwrap().push(call);
    }
}

impl RoomRegistry for FakeRegistry {
    async fn create_room(
        &self,
        room: &NewRoomRecord,
        credential: Option<&Credential>,
    ) -> Result<RoomRecord> {
        self.log(format!("create:{}", room.name));
        let Some(credential) = credential else {
            return Err(RoomError::AuthRequired);
        };
        if credential.bearer == EXPIRED_BEARER {
            return Err(RoomError::SessionExpired);
        }
        let mut rooms = self.inner.rooms.lock().unwrap();
        if rooms.contains_key(&room.name) {
            return Err(RoomError::Conflict);
        }
        let record = RoomRecord {
            id: format!("r-{}", rooms.len() + 1),
            name: room.name.clone(),
            visibility: room.visibility,
            password_hash: room.password_hash.clone(),
            capacity: room.capacity,
            room_type: room.room_type,
            owner_id: credential.backend_user_id.clone(),
        };
        rooms.insert(room.name.clone(), record.clone());
        Ok(record)
    }

    async fn find_room(&self, name: &str) -> Result<RoomRecord> {
        self.log(format!("find:{name}"));
        self.inner
            .rooms
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or(RoomError::NotFound)
    }

    async fn join_room(
        &self,
        backend_id: &str,
        password: Option<&str>,
        _credential: Option<&Credential>,
    ) -> Result<()> {
        self.log(format!("join:{backend_id}"));
        let rooms = self.inner.rooms.lock().unwrap();
        let Some(record) = rooms.values().find(|r| r.id == backend_id) else {
            return Err(RoomError::NotFound);
        };
        match record.password_hash.as_deref() {
            Some(hash) if Some(hash) != password => Err(RoomError::WrongPassword),
            _ => Ok(()),
        }
    }
}

pub fn room_record(name: &str) -> RoomRecord {
    RoomRecord {
        id: format!("r-{name}"),
        name: name.to_owned(),
        visibility: RoomVisibility::Public,
        password_hash: None,
        capacity: 4,
        room_type: RoomType::Casual,
        owner_id: "u-1".to_owned(),
    }
}

pub fn descriptor(name: &str) -> RoomDescriptor {
    RoomDescriptor {
        name: name.to_owned(),
        visibility: RoomVisibility::Public,
        password_hash: None,
        capacity: 4,
        room_type: RoomType::Casual,
        backend_id: None,
    }
}

pub fn credential() -> Credential {
    Credential {
        bearer: "good-token".to_owned(),
        backend_user_id: "u-1".to_owned(),
    }
}

pub fn signed_in_ctx(dir: &tempfile::TempDir) -> SessionContext {
    let store = SessionStore::new(dir.path().join("state.json"));
    SessionContext::signed_in(
        SessionIdentity::authenticated("Ada", "u-1", 1),
        credential(),
        store,
    )
}

pub fn guest_ctx(dir: &tempfile::TempDir) -> SessionContext {
    SessionContext::guest(SessionStore::new(dir.path().join("state.json")))
}

pub fn drain(rx: &mut UiReceiver) -> Vec<UiSignal> {
    let mut signals = Vec::new();
    while let Ok(signal) = rx.try_recv() {
        signals.push(signal);
    }
    signals
}

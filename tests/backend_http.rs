mod common;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use common::credential;
use roombridge::backend::records::{NewRoomRecord, PlacedObject};
use roombridge::backend::store::RoomRegistry;
use roombridge::backend::{PersistenceStore, RetryingHttpClient};
use roombridge::config::RetryPolicy;
use roombridge::error::RoomError;
use roombridge::rooms::{RoomType, RoomVisibility};

#[derive(Default)]
struct BackendState {
    rooms: Mutex<HashMap<String, Value>>,
    objects: Mutex<HashMap<String, Value>>,
    create_bodies: Mutex<Vec<Value>>,
    fail_next: Mutex<u32>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "Bearer good-token")
}

async fn create_room(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.create_bodies.lock().unwrap().push(body.clone());
    {
        let mut fail = state.fail_next.lock().unwrap();
        if *fail > 0 {
            *fail -= 1;
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "boom"})),
            );
        }
    }
    if !authorized(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "bad token"})),
        );
    }
    let name = body["name"].as_str().unwrap_or_default().to_owned();
    let mut rooms = state.rooms.lock().unwrap();
    if rooms.contains_key(&name) {
        return (StatusCode::CONFLICT, Json(json!({"error": "name taken"})));
    }
    let mut record = body;
    record["id"] = json!(format!("r-{}", rooms.len() + 1));
    record["ownerId"] = json!("u-1");
    rooms.insert(name, record.clone());
    (StatusCode::CREATED, Json(record))
}

async fn find_room(
    State(state): State<Arc<BackendState>>,
    Path(name): Path<String>,
) -> (StatusCode, Json<Value>) {
    match state.rooms.lock().unwrap().get(&name) {
        Some(record) => (StatusCode::OK, Json(record.clone())),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "no such room"})),
        ),
    }
}

async fn join_room(
    State(state): State<Arc<BackendState>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let rooms = state.rooms.lock().unwrap();
    let Some(record) = rooms.values().find(|r| r["id"] == json!(id)) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "no such room"})),
        );
    };
    match record.get("passwordHash") {
        None | Some(Value::Null) => (StatusCode::OK, Json(json!({}))),
        Some(hash) if *hash == body["password"] => (StatusCode::OK, Json(json!({}))),
        Some(_) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "wrong password"})),
        ),
    }
}

async fn create_object(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let instance_id = body["instanceId"].as_str().unwrap_or_default().to_owned();
    state.objects.lock().unwrap().insert(instance_id, body.clone());
    (StatusCode::CREATED, Json(body))
}

async fn delete_object(
    State(state): State<Arc<BackendState>>,
    Path((_room, instance_id)): Path<(String, String)>,
) -> (StatusCode, Json<Value>) {
    match state.objects.lock().unwrap().remove(&instance_id) {
        Some(_) => (StatusCode::OK, Json(json!({}))),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "no such object"})),
        ),
    }
}

async fn start_backend() -> (SocketAddr, Arc<BackendState>) {
    let state = Arc::new(BackendState::default());
    let app = Router::new()
        .route("/rooms", post(create_room))
        .route("/rooms/find/{name}", get(find_room))
        .route("/rooms/{id}/join", post(join_room))
        .route("/rooms/{id}/objects", post(create_object))
        .route("/rooms/{id}/objects/{instance_id}", delete(delete_object))
        .with_state(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_delay: Duration::from_millis(5),
        backoff_multiplier: 2,
    }
}

fn store_for(addr: SocketAddr) -> PersistenceStore {
    PersistenceStore::new(RetryingHttpClient::new(format!("http://{addr}"), fast_policy()))
}

fn new_room(name: &str) -> NewRoomRecord {
    NewRoomRecord {
        name: name.to_owned(),
        visibility: RoomVisibility::Public,
        password_hash: None,
        capacity: 4,
        room_type: RoomType::Casual,
    }
}

#[tokio::test]
async fn retry_replays_the_identical_body_until_success() {
    let (addr, state) = start_backend().await;
    *state.fail_next.lock().unwrap() = 2;
    let store = store_for(addr);

    let record = store
        .create_room(&new_room("Alpha"), Some(&credential()))
        .await
        .unwrap();
    assert_eq!(record.name, "Alpha");

    // two transient failures, success on the third: exactly three network
    // calls, every body byte-identical
    let bodies = state.create_bodies.lock().unwrap().clone();
    assert_eq!(bodies.len(), 3);
    assert!(bodies.iter().all(|b| *b == bodies[0]));
}

#[tokio::test]
async fn exhausted_retries_surface_as_transport_failure() {
    let (addr, state) = start_backend().await;
    *state.fail_next.lock().unwrap() = 10;
    let store = store_for(addr);

    let err = store
        .create_room(&new_room("Alpha"), Some(&credential()))
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::Transport(_)), "got {err:?}");
    assert_eq!(state.create_bodies.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn create_then_find_round_trips_every_field() {
    let (addr, _state) = start_backend().await;
    let store = store_for(addr);

    let mut room = new_room("Alpha");
    room.visibility = RoomVisibility::Private;
    room.password_hash = Some("h4sh".to_owned());
    room.capacity = 12;
    room.room_type = RoomType::Work;
    let created = store.create_room(&room, Some(&credential())).await.unwrap();

    let found = store.find_room("Alpha").await.unwrap();
    assert_eq!(found, created);
    assert_eq!(found.name, "Alpha");
    assert_eq!(found.visibility, RoomVisibility::Private);
    assert_eq!(found.password_hash.as_deref(), Some("h4sh"));
    assert_eq!(found.capacity, 12);
    assert_eq!(found.room_type, RoomType::Work);
}

#[tokio::test]
async fn duplicate_name_is_a_conflict_and_never_retried() {
    let (addr, state) = start_backend().await;
    let store = store_for(addr);

    store
        .create_room(&new_room("Alpha"), Some(&credential()))
        .await
        .unwrap();
    let before = state.create_bodies.lock().unwrap().len();
    let err = store
        .create_room(&new_room("Alpha"), Some(&credential()))
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::Conflict));
    // a 409 is an application failure: exactly one extra call, no retries
    assert_eq!(state.create_bodies.lock().unwrap().len(), before + 1);
}

#[tokio::test]
async fn missing_room_is_not_found() {
    let (addr, _state) = start_backend().await;
    let store = store_for(addr);
    let err = store.find_room("Ghost").await.unwrap_err();
    assert!(matches!(err, RoomError::NotFound));
}

#[tokio::test]
async fn private_room_accepts_exactly_its_password() {
    let (addr, _state) = start_backend().await;
    let store = store_for(addr);

    let mut room = new_room("Vault");
    room.visibility = RoomVisibility::Private;
    room.password_hash = Some("pw".to_owned());
    let created = store.create_room(&room, Some(&credential())).await.unwrap();

    let err = store
        .join_room(&created.id, Some("nope"), Some(&credential()))
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::WrongPassword));

    store
        .join_room(&created.id, Some("pw"), Some(&credential()))
        .await
        .unwrap();
}

#[tokio::test]
async fn stale_bearer_reads_as_session_expired() {
    let (addr, _state) = start_backend().await;
    let store = store_for(addr);

    let mut stale = credential();
    stale.bearer = "stale".to_owned();
    let err = store
        .create_room(&new_room("Alpha"), Some(&stale))
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::SessionExpired));
}

#[tokio::test]
async fn authenticated_calls_fail_fast_without_a_credential() {
    // unroutable base url: if this ever touched the network it would hang
    // through the whole retry schedule instead of returning instantly
    let store = PersistenceStore::new(RetryingHttpClient::new(
        "http://127.0.0.1:1",
        fast_policy(),
    ));
    let err = store.create_room(&new_room("Alpha"), None).await.unwrap_err();
    assert!(matches!(err, RoomError::AuthRequired));
}

#[tokio::test]
async fn deleting_an_object_twice_is_not_an_error() {
    let (addr, _state) = start_backend().await;
    let store = store_for(addr);

    let object = PlacedObject::new("chair", json!({"x": 1.0, "y": 2.0}));
    store
        .create_object("r-1", &object, Some(&credential()))
        .await
        .unwrap();

    store
        .delete_object("r-1", object.instance_id, Some(&credential()))
        .await
        .unwrap();
    // a retried delete lands after the first already succeeded
    store
        .delete_object("r-1", object.instance_id, Some(&credential()))
        .await
        .unwrap();
}

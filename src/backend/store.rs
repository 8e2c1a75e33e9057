use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::backend::http::{ApiRequest, RetryingHttpClient};
use crate::backend::records::{NewRoomRecord, PlacedObject, RoomRecord};
use crate::config::RetryPolicy;
use crate::error::{Result, RoomError};
use crate::session::Credential;

/// The seam the orchestrator depends on, so its state machine can run
/// against a fake registry in tests.
#[allow(async_fn_in_trait)]
pub trait RoomRegistry {
    async fn create_room(
        &self,
        room: &NewRoomRecord,
        credential: Option<&Credential>,
    ) -> Result<RoomRecord>;

    async fn find_room(&self, name: &str) -> Result<RoomRecord>;

    async fn join_room(
        &self,
        backend_id: &str,
        password: Option<&str>,
        credential: Option<&Credential>,
    ) -> Result<()>;
}

/// Typed façade over the backend registry REST surface. Calls that need
/// authentication fail fast with `AuthRequired` before any network traffic;
/// a 401 on them surfaces as `SessionExpired` (reacting is the
/// orchestrator's job, not ours).
pub struct PersistenceStore {
    client: RetryingHttpClient,
}

impl PersistenceStore {
    pub fn new(client: RetryingHttpClient) -> PersistenceStore {
        PersistenceStore { client }
    }

    pub fn with_base_url(base_url: impl Into<String>, policy: RetryPolicy) -> PersistenceStore {
        PersistenceStore::new(RetryingHttpClient::new(base_url, policy))
    }

    pub async fn list_user_rooms(&self, credential: Option<&Credential>) -> Result<Vec<RoomRecord>> {
        let Some(credential) = credential else {
            return Err(RoomError::AuthRequired);
        };
        let request = ApiRequest::get("/rooms/user").with_bearer(&credential.bearer);
        let response = self.client.execute(&request).await.map_err(expired)?;
        Ok(serde_json::from_value(response.body)?)
    }

    pub async fn list_objects(&self, room_backend_id: &str) -> Result<Vec<PlacedObject>> {
        let request = ApiRequest::get(format!("/rooms/{room_backend_id}/objects"));
        let response = self.client.execute(&request).await?;
        Ok(serde_json::from_value(response.body)?)
    }

    pub async fn create_object(
        &self,
        room_backend_id: &str,
        object: &PlacedObject,
        credential: Option<&Credential>,
    ) -> Result<()> {
        let Some(credential) = credential else {
            return Err(RoomError::AuthRequired);
        };
        let request = ApiRequest::post(
            format!("/rooms/{room_backend_id}/objects"),
            serde_json::to_value(object)?,
        )
        .with_bearer(&credential.bearer);
        self.client.execute(&request).await.map_err(expired)?;
        Ok(())
    }

    pub async fn update_object(
        &self,
        room_backend_id: &str,
        object: &PlacedObject,
        credential: Option<&Credential>,
    ) -> Result<()> {
        let Some(credential) = credential else {
            return Err(RoomError::AuthRequired);
        };
        let request = ApiRequest::put(
            format!("/rooms/{room_backend_id}/objects/{}", object.instance_id),
            serde_json::to_value(object)?,
        )
        .with_bearer(&credential.bearer);
        self.client.execute(&request).await.map_err(expired)?;
        Ok(())
    }

    /// Idempotent with respect to "already absent": a delete that raced a
    /// retry of itself must not block the user.
    pub async fn delete_object(
        &self,
        room_backend_id: &str,
        instance_id: Uuid,
        credential: Option<&Credential>,
    ) -> Result<()> {
        let Some(credential) = credential else {
            return Err(RoomError::AuthRequired);
        };
        let request = ApiRequest::delete(format!(
            "/rooms/{room_backend_id}/objects/{instance_id}"
        ))
        .with_bearer(&credential.bearer);
        match self.client.execute(&request).await {
            Ok(_) => Ok(()),
            Err(RoomError::NotFound) => {
                debug!(%instance_id, "object already gone");
                Ok(())
            }
            Err(err) => Err(expired(err)),
        }
    }
}

impl RoomRegistry for PersistenceStore {
    async fn create_room(
        &self,
        room: &NewRoomRecord,
        credential: Option<&Credential>,
    ) -> Result<RoomRecord> {
        let Some(credential) = credential else {
            return Err(RoomError::AuthRequired);
        };
        let request =
            ApiRequest::post("/rooms", serde_json::to_value(room)?).with_bearer(&credential.bearer);
        let response = self.client.execute(&request).await.map_err(expired)?;
        Ok(serde_json::from_value(response.body)?)
    }

    async fn find_room(&self, name: &str) -> Result<RoomRecord> {
        let request = ApiRequest::get(format!("/rooms/find/{name}"));
        let response = self.client.execute(&request).await?;
        Ok(serde_json::from_value(response.body)?)
    }

    async fn join_room(
        &self,
        backend_id: &str,
        password: Option<&str>,
        credential: Option<&Credential>,
    ) -> Result<()> {
        let mut request = ApiRequest::post(
            format!("/rooms/{backend_id}/join"),
            json!({ "password": password }),
        );
        if let Some(credential) = credential {
            request = request.with_bearer(&credential.bearer);
        }
        match self.client.execute(&request).await {
            Ok(_) => Ok(()),
            // on this one call a 401 means the password was wrong, not that
            // the session died
            Err(RoomError::Unauthorized) => Err(RoomError::WrongPassword),
            Err(err) => Err(err),
        }
    }
}

fn expired(err: RoomError) -> RoomError {
    match err {
        RoomError::Unauthorized => RoomError::SessionExpired,
        other => other,
    }
}

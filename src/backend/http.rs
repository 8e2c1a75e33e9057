use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use tracing::warn;

use crate::config::RetryPolicy;
use crate::error::{Result, RoomError};

/// One logical backend operation. Retries reissue exactly this — same
/// method, same path, same body — so the backend must treat the operation
/// as idempotent (object creates carry a client-minted instance id).
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> ApiRequest {
        ApiRequest {
            method: Method::GET,
            path: path.into(),
            body: None,
            bearer: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> ApiRequest {
        ApiRequest {
            method: Method::POST,
            path: path.into(),
            body: Some(body),
            bearer: None,
        }
    }

    pub fn put(path: impl Into<String>, body: Value) -> ApiRequest {
        ApiRequest {
            method: Method::PUT,
            path: path.into(),
            body: Some(body),
            bearer: None,
        }
    }

    pub fn delete(path: impl Into<String>) -> ApiRequest {
        ApiRequest {
            method: Method::DELETE,
            path: path.into(),
            body: None,
            bearer: None,
        }
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> ApiRequest {
        self.bearer = Some(token.into());
        self
    }
}

#[derive(Debug)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

/// Wraps a single REST call with bounded exponential-backoff retry.
/// Connection-class and 5xx failures retry; 4xx returns immediately mapped
/// into the error taxonomy. Nothing is mutated locally on failure.
pub struct RetryingHttpClient {
    http: Client,
    base_url: String,
    policy: RetryPolicy,
}

impl RetryingHttpClient {
    pub fn new(base_url: impl Into<String>, policy: RetryPolicy) -> RetryingHttpClient {
        RetryingHttpClient {
            http: Client::new(),
            base_url: base_url.into(),
            policy,
        }
    }

    pub async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let delay = self.policy.delay_before(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            match self.attempt(request).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_transient() && attempt < self.policy.max_attempts => {
                    warn!(path = %request.path, attempt, %err, "transient backend failure, retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn attempt(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), request.path);
        let mut builder = self.http.request(request.method.clone(), &url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(bearer) = &request.bearer {
            builder = builder.bearer_auth(bearer);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| RoomError::Transport(err.to_string()))?;
        let status = response.status();
        if status.is_server_error() {
            return Err(RoomError::Transport(format!("server error {status}")));
        }

        let body = if status == StatusCode::NO_CONTENT {
            Value::Null
        } else {
            match response.json::<Value>().await {
                Ok(body) => body,
                Err(_) if !status.is_success() => Value::Null,
                Err(err) => {
                    return Err(RoomError::Transport(format!("bad response body: {err}")));
                }
            }
        };

        if status.is_success() {
            return Ok(ApiResponse {
                status: status.as_u16(),
                body,
            });
        }
        Err(match status {
            StatusCode::UNAUTHORIZED => RoomError::Unauthorized,
            StatusCode::FORBIDDEN => RoomError::Forbidden,
            StatusCode::NOT_FOUND => RoomError::NotFound,
            StatusCode::CONFLICT => RoomError::Conflict,
            _ => RoomError::Backend {
                status: status.as_u16(),
                message: body
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .to_owned(),
            },
        })
    }
}

//! HTTP route handlers
//!
//! Handlers return `Result<Response, HubError>`; the server boundary
//! converts every failure into a JSON error response, so nothing below
//! it needs to think about HTTP status codes.

pub mod applications;
pub mod health;
pub mod payments;
pub mod tuitions;
pub mod users;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{header, Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::error;

use crate::auth::{extract_bearer, IdentityVerifier, Role};
use crate::server::AppState;
use crate::types::{HubError, Result};

pub type FullBody = Full<Bytes>;

/// Serialize a JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<FullBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(json)))
        .unwrap()
}

/// JSON `{"message": …}` response
pub fn message_response(status: StatusCode, message: &str) -> Response<FullBody> {
    json_response(status, &serde_json::json!({ "message": message }))
}

/// Convert a handler failure into a JSON error response.
/// Internals are logged here and never echoed to the client.
pub fn error_response(err: HubError) -> Response<FullBody> {
    let status = err.status_code();
    if status.is_server_error() {
        error!("Request failed: {}", err);
    }
    json_response(status, &serde_json::json!({ "error": err.public_message() }))
}

/// Collect and deserialize a JSON request body
pub async fn read_json_body<T: DeserializeOwned>(req: Request<Incoming>) -> Result<T> {
    let body = req
        .into_body()
        .collect()
        .await
        .map_err(|e| HubError::BadRequest(format!("Failed to read request body: {}", e)))?
        .to_bytes();

    serde_json::from_slice(&body)
        .map_err(|e| HubError::BadRequest(format!("Invalid JSON body: {}", e)))
}

/// Deserialize query-string parameters, defaulting when absent
pub fn query_params<T: DeserializeOwned + Default>(req: &Request<Incoming>) -> Result<T> {
    match req.uri().query() {
        Some(query) => serde_urlencoded::from_str(query)
            .map_err(|e| HubError::BadRequest(format!("Invalid query string: {}", e))),
        None => Ok(T::default()),
    }
}

/// Verify the bearer credential and return the caller's email
pub fn authenticate(state: &AppState, req: &Request<Incoming>) -> Result<String> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());
    let token = extract_bearer(header)
        .ok_or_else(|| HubError::Unauthorized("Missing bearer credential".into()))?;

    Ok(state.verifier.verify(token)?.email)
}

/// Fail unless the caller's user record carries the admin role
pub async fn ensure_admin(state: &AppState, email: &str) -> Result<()> {
    let role = state.users.role_of(email).await?;
    if Role::parse(role.as_deref()).is_admin() {
        Ok(())
    } else {
        Err(HubError::Forbidden("Admin role required".into()))
    }
}

/// Authenticate and require the admin role in one step
pub async fn require_admin(state: &AppState, req: &Request<Incoming>) -> Result<String> {
    let email = authenticate(state, req)?;
    ensure_admin(state, &email).await?;
    Ok(email)
}

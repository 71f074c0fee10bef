//! User account endpoints

use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};

use crate::db::repo::UserPatch;
use crate::routes::{
    authenticate, json_response, message_response, read_json_body, require_admin, FullBody,
};
use crate::server::AppState;
use crate::services::{UpsertOutcome, UserProfile};
use crate::types::{HubError, Result};

/// GET /users - admin management list, caller's own record omitted
pub async fn list(state: &AppState, req: Request<Incoming>) -> Result<Response<FullBody>> {
    let caller = require_admin(state, &req).await?;
    let users = state.users.list_all_except(&caller).await?;
    Ok(json_response(StatusCode::OK, &users))
}

/// PUT /users - upsert the caller's own record at login
pub async fn upsert(state: &AppState, req: Request<Incoming>) -> Result<Response<FullBody>> {
    // The record is keyed by the verified email, never a body-supplied one
    let caller = authenticate(state, &req)?;
    let profile: UserProfile = read_json_body(req).await?;

    let outcome = state.accounts.upsert(&caller, profile).await?;
    let response = match outcome {
        UpsertOutcome::Created(id) => json_response(
            StatusCode::CREATED,
            &serde_json::json!({ "insertedId": id.to_hex() }),
        ),
        UpsertOutcome::Touched => message_response(StatusCode::OK, "Login time updated"),
    };
    Ok(response)
}

/// PATCH /users/{id} - admin overwrite of profile and role fields
pub async fn patch(
    state: &AppState,
    req: Request<Incoming>,
    id: &str,
) -> Result<Response<FullBody>> {
    require_admin(state, &req).await?;
    let fields: UserPatch = read_json_body(req).await?;

    let matched = state.users.patch(id, &fields).await?;
    if matched == 0 {
        return Err(HubError::NotFound("User not found".into()));
    }
    Ok(message_response(StatusCode::OK, "User updated"))
}

/// DELETE /users/{id}
pub async fn delete(
    state: &AppState,
    req: Request<Incoming>,
    id: &str,
) -> Result<Response<FullBody>> {
    require_admin(state, &req).await?;

    let deleted = state.users.delete(id).await?;
    if deleted == 0 {
        return Err(HubError::NotFound("User not found".into()));
    }
    Ok(message_response(StatusCode::OK, "User deleted"))
}

/// GET /user/role - the verified caller's role
pub async fn role(state: &AppState, req: Request<Incoming>) -> Result<Response<FullBody>> {
    let caller = authenticate(state, &req)?;
    let role = state.users.role_of(&caller).await?;
    Ok(json_response(StatusCode::OK, &serde_json::json!({ "role": role })))
}

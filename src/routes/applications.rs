//! Tutor application endpoints

use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;

use crate::db::repo::ApplicationUpdate;
use crate::db::schemas::{ApplicationDoc, ApplicationStatus};
use crate::routes::{
    authenticate, ensure_admin, json_response, message_response, read_json_body, require_admin,
    FullBody,
};
use crate::server::AppState;
use crate::types::{HubError, Result};

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: ApplicationStatus,
}

/// GET /applications - admin listing
pub async fn list_all(state: &AppState, req: Request<Incoming>) -> Result<Response<FullBody>> {
    require_admin(state, &req).await?;
    let applications = state.applications.list_all().await?;
    Ok(json_response(StatusCode::OK, &applications))
}

/// GET /applications/{email} - caller's own applications, or any for admin
pub async fn list_by_email(
    state: &AppState,
    req: Request<Incoming>,
    email: &str,
) -> Result<Response<FullBody>> {
    let caller = authenticate(state, &req)?;
    if caller != email {
        ensure_admin(state, &caller).await?;
    }

    let applications = state.applications.list_by_tutor_email(email).await?;
    Ok(json_response(StatusCode::OK, &applications))
}

/// GET /my-ongoing-tuitions - applications scoped to the verified caller
pub async fn my_ongoing(state: &AppState, req: Request<Incoming>) -> Result<Response<FullBody>> {
    let caller = authenticate(state, &req)?;
    let applications = state.applications.list_by_tutor_email(&caller).await?;
    Ok(json_response(StatusCode::OK, &applications))
}

/// POST /applications
pub async fn create(state: &AppState, req: Request<Incoming>) -> Result<Response<FullBody>> {
    let caller = authenticate(state, &req)?;
    let mut application: ApplicationDoc = read_json_body(req).await?;
    // Applications are always filed under the verified caller, whatever
    // the body claims.
    application.tutor_email = caller;

    let id = state.applications.create(application).await?;
    Ok(json_response(
        StatusCode::CREATED,
        &serde_json::json!({ "insertedId": id.to_hex() }),
    ))
}

/// PUT /applications/{id} - edit, permitted only while Pending
pub async fn update(
    state: &AppState,
    req: Request<Incoming>,
    id: &str,
) -> Result<Response<FullBody>> {
    let caller = authenticate(state, &req)?;

    let application = state
        .applications
        .find_by_id(id)
        .await?
        .ok_or_else(|| HubError::NotFound("Application not found".into()))?;
    if application.tutor_email != caller {
        ensure_admin(state, &caller).await?;
    }

    let fields: ApplicationUpdate = read_json_body(req).await?;
    let matched = state.applications.update_if_pending(id, &fields).await?;

    // Zero matched with an existing document means the status moved past
    // Pending; that is an explicit no-op, not an error.
    if matched == 0 {
        return Ok(json_response(
            StatusCode::OK,
            &serde_json::json!({
                "modified": false,
                "message": "Only pending applications can be edited"
            }),
        ));
    }

    Ok(json_response(
        StatusCode::OK,
        &serde_json::json!({ "modified": true, "message": "Application updated" }),
    ))
}

/// PATCH /applications/status/{id} - admin approve/reject
pub async fn set_status(
    state: &AppState,
    req: Request<Incoming>,
    id: &str,
) -> Result<Response<FullBody>> {
    require_admin(state, &req).await?;
    let body: StatusBody = read_json_body(req).await?;

    let matched = state.applications.update_status(id, body.status).await?;
    if matched == 0 {
        return Err(HubError::NotFound("Application not found".into()));
    }
    Ok(message_response(StatusCode::OK, "Application status updated"))
}

/// DELETE /applications/{id}
pub async fn delete(
    state: &AppState,
    req: Request<Incoming>,
    id: &str,
) -> Result<Response<FullBody>> {
    let caller = authenticate(state, &req)?;

    let application = state
        .applications
        .find_by_id(id)
        .await?
        .ok_or_else(|| HubError::NotFound("Application not found".into()))?;
    if application.tutor_email != caller {
        ensure_admin(state, &caller).await?;
    }

    let deleted = state.applications.delete(id).await?;
    if deleted == 0 {
        return Err(HubError::NotFound("Application not found".into()));
    }
    Ok(message_response(StatusCode::OK, "Application deleted"))
}

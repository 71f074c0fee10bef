//! Tuition posting endpoints

use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;

use crate::db::repo::{PageWindow, SearchParams, SortMode, TuitionUpdate};
use crate::db::schemas::{TuitionDoc, TuitionStatus};
use crate::routes::{
    authenticate, json_response, message_response, query_params, read_json_body, require_admin,
    FullBody,
};
use crate::server::AppState;
use crate::types::{HubError, Result};

#[derive(Debug, Default, Deserialize)]
struct SearchQuery {
    search: Option<String>,
    #[serde(rename = "filterClass")]
    filter_class: Option<String>,
    location: Option<String>,
    sort: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PageQuery {
    page: Option<String>,
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: TuitionStatus,
}

/// POST /tuitions
pub async fn create(state: &AppState, req: Request<Incoming>) -> Result<Response<FullBody>> {
    authenticate(state, &req)?;
    let posting: TuitionDoc = read_json_body(req).await?;

    let id = state.tuitions.create(posting).await?;
    Ok(json_response(
        StatusCode::CREATED,
        &serde_json::json!({ "insertedId": id.to_hex() }),
    ))
}

/// GET /tuitions - public board, approved postings only
pub async fn board(state: &AppState) -> Result<Response<FullBody>> {
    let postings = state.tuitions.list_approved().await?;
    Ok(json_response(StatusCode::OK, &postings))
}

/// GET /all-tuitions?search&filterClass&location&sort
pub async fn search(state: &AppState, req: Request<Incoming>) -> Result<Response<FullBody>> {
    let query: SearchQuery = query_params(&req)?;
    let params = SearchParams {
        subject: query.search,
        class_level: query.filter_class,
        location: query.location,
        sort: SortMode::parse(query.sort.as_deref()),
    };

    let postings = state.tuitions.search(&params).await?;
    Ok(json_response(StatusCode::OK, &postings))
}

/// GET /latest-tuitions - 3 most recent for the homepage
pub async fn latest(state: &AppState) -> Result<Response<FullBody>> {
    let postings = state.tuitions.list_latest(3).await?;
    Ok(json_response(StatusCode::OK, &postings))
}

/// GET /tuitions-listing?page&size
pub async fn listing(state: &AppState, req: Request<Incoming>) -> Result<Response<FullBody>> {
    let query: PageQuery = query_params(&req)?;
    let window = PageWindow::resolve(query.page.as_deref(), query.size.as_deref());

    let (items, total_count) = state.tuitions.list_page(window).await?;
    Ok(json_response(
        StatusCode::OK,
        &serde_json::json!({ "result": items, "totalCount": total_count }),
    ))
}

/// PUT /tuitions/{id}
pub async fn update(
    state: &AppState,
    req: Request<Incoming>,
    id: &str,
) -> Result<Response<FullBody>> {
    authenticate(state, &req)?;
    let fields: TuitionUpdate = read_json_body(req).await?;

    let matched = state.tuitions.update(id, &fields).await?;
    if matched == 0 {
        return Err(HubError::NotFound("Tuition not found".into()));
    }
    Ok(message_response(StatusCode::OK, "Tuition updated"))
}

/// PATCH /tuition/status/{id} - admin approve/reject
pub async fn set_status(
    state: &AppState,
    req: Request<Incoming>,
    id: &str,
) -> Result<Response<FullBody>> {
    require_admin(state, &req).await?;
    let body: StatusBody = read_json_body(req).await?;

    let matched = state.tuitions.update_status(id, body.status).await?;
    if matched == 0 {
        return Err(HubError::NotFound("Tuition not found".into()));
    }
    Ok(message_response(StatusCode::OK, "Tuition status updated"))
}

/// DELETE /tuitions/{id}
pub async fn delete(
    state: &AppState,
    req: Request<Incoming>,
    id: &str,
) -> Result<Response<FullBody>> {
    authenticate(state, &req)?;

    let deleted = state.tuitions.delete(id).await?;
    if deleted == 0 {
        return Err(HubError::NotFound("Tuition not found".into()));
    }
    Ok(message_response(StatusCode::OK, "Tuition deleted"))
}

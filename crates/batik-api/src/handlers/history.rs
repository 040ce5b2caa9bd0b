//! Scan history handlers. All routes are owner-scoped by the bearer token.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use batik_core::PageRequest;

use super::{parse_record_id, ApiQuery};
use crate::auth::RequireAuth;
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryListQuery {
    /// Page number, from 1
    pub page: Option<u32>,
    /// Items per page, 1..=50
    pub limit: Option<u32>,
    /// Case-insensitive province substring
    pub provinsi: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistorySearchQuery {
    /// Search text, at least 2 characters
    pub q: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// List the caller's scans, newest first.
#[utoipa::path(get, path = "/api/history", tag = "History",
    params(HistoryListQuery),
    responses(
        (status = 200, description = "Scan history retrieved successfully"),
        (status = 400, description = "Invalid pagination"),
        (status = 401, description = "Missing or invalid bearer token"),
    ),
    security(("bearer_auth" = [])))]
pub async fn list_history(
    State(state): State<AppState>,
    auth: RequireAuth,
    ApiQuery(query): ApiQuery<HistoryListQuery>,
) -> Result<Json<Value>, ApiError> {
    let page = PageRequest::from_query(query.page, query.limit)?;
    let result = state
        .history
        .list(auth.user.id, page, query.provinsi.as_deref())
        .await?;

    Ok(Json(json!({
        "status": true,
        "message": "Scan history retrieved successfully",
        "data": result.data,
        "pagination": result.pagination,
    })))
}

/// Fetch one of the caller's scans.
#[utoipa::path(get, path = "/api/history/{id}", tag = "History",
    params(("id" = String, Path, description = "Scan record id")),
    responses(
        (status = 200, description = "History retrieved successfully", body = batik_core::ScanRecord),
        (status = 404, description = "History not found"),
    ),
    security(("bearer_auth" = [])))]
pub async fn get_history(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_record_id(&id)?;
    let record = state.history.get(auth.user.id, id).await?;

    Ok(Json(json!({
        "status": true,
        "message": "History retrieved successfully",
        "data": record,
    })))
}

/// Delete one scan and its stored image.
#[utoipa::path(delete, path = "/api/history/{id}", tag = "History",
    params(("id" = String, Path, description = "Scan record id")),
    responses(
        (status = 200, description = "History deleted successfully"),
        (status = 404, description = "History not found"),
    ),
    security(("bearer_auth" = [])))]
pub async fn delete_history(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_record_id(&id)?;
    state.history.delete(auth.user.id, id).await?;

    Ok(Json(json!({
        "status": true,
        "message": "History deleted successfully",
    })))
}

/// Delete the caller's entire history.
#[utoipa::path(delete, path = "/api/history", tag = "History",
    responses((status = 200, description = "All history deleted successfully")),
    security(("bearer_auth" = [])))]
pub async fn delete_all_history(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<Json<Value>, ApiError> {
    let deleted = state.history.delete_all(auth.user.id).await?;

    Ok(Json(json!({
        "status": true,
        "message": "All history deleted successfully",
        "deletedCount": deleted,
    })))
}

/// Totals and per-province counts over the caller's history.
#[utoipa::path(get, path = "/api/history/stats", tag = "History",
    responses((status = 200, description = "History statistics retrieved successfully", body = batik_core::HistoryStats)),
    security(("bearer_auth" = [])))]
pub async fn history_stats(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<Json<Value>, ApiError> {
    let stats = state.history.stats(auth.user.id).await?;

    Ok(Json(json!({
        "status": true,
        "message": "History statistics retrieved successfully",
        "data": stats,
    })))
}

/// Substring search over the caller's scans.
#[utoipa::path(get, path = "/api/history/search", tag = "History",
    params(HistorySearchQuery),
    responses(
        (status = 200, description = "History search completed successfully"),
        (status = 400, description = "Search query must be at least 2 characters"),
    ),
    security(("bearer_auth" = [])))]
pub async fn search_history(
    State(state): State<AppState>,
    auth: RequireAuth,
    ApiQuery(query): ApiQuery<HistorySearchQuery>,
) -> Result<Json<Value>, ApiError> {
    let page = PageRequest::from_query(query.page, query.limit)?;
    let text = query.q.unwrap_or_default();
    let result = state.history.search(auth.user.id, &text, page).await?;

    Ok(Json(json!({
        "status": true,
        "message": "History search completed successfully",
        "data": result.data,
        "query": text,
        "pagination": result.pagination,
    })))
}

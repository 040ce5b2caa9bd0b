//! Public catalog handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use batik_core::{defaults, PageRequest};

use super::ApiQuery;
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MotifListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Case-insensitive province substring
    pub provinsi: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MotifSearchQuery {
    /// Search text, at least 2 characters after trimming
    pub q: Option<String>,
    /// Maximum results, 1..=50
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CountQuery {
    pub count: Option<u32>,
}

/// Bounded count parameter shared by search, popular and random.
fn bounded(value: Option<u32>, default: usize, name: &str) -> Result<usize, ApiError> {
    match value {
        None => Ok(default),
        Some(v) if (1..=defaults::PAGE_LIMIT_MAX).contains(&v) => Ok(v as usize),
        Some(_) => Err(ApiError::BadRequest(format!(
            "{name} must be between 1 and {}",
            defaults::PAGE_LIMIT_MAX
        ))),
    }
}

/// Paginated catalog listing.
#[utoipa::path(get, path = "/api/motif", tag = "Motifs",
    params(MotifListQuery),
    responses(
        (status = 200, description = "Motifs retrieved successfully"),
        (status = 400, description = "Invalid pagination"),
    ))]
pub async fn list_motifs(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<MotifListQuery>,
) -> Result<Json<Value>, ApiError> {
    let page = PageRequest::from_query(query.page, query.limit)?;
    let result = state.catalog.list(page, query.provinsi.as_deref());

    Ok(Json(json!({
        "status": true,
        "message": "Motifs retrieved successfully",
        "data": result.data,
        "pagination": result.pagination,
    })))
}

/// Look up one motif by key.
#[utoipa::path(get, path = "/api/motif/{id}", tag = "Motifs",
    params(("id" = String, Path, description = "Motif key, e.g. batik-parang")),
    responses(
        (status = 200, description = "Motif retrieved successfully", body = batik_core::CatalogEntry),
        (status = 404, description = "Motif not found"),
    ))]
pub async fn get_motif(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let entry = state.catalog.get(id.trim())?;

    Ok(Json(json!({
        "status": true,
        "message": "Motif retrieved successfully",
        "data": entry,
    })))
}

/// Fuzzy search over name, province and description.
#[utoipa::path(get, path = "/api/motif/search", tag = "Motifs",
    params(MotifSearchQuery),
    responses(
        (status = 200, description = "Search completed successfully"),
        (status = 400, description = "Search query must be at least 2 characters"),
    ))]
pub async fn search_motifs(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<MotifSearchQuery>,
) -> Result<Json<Value>, ApiError> {
    let text = query.q.as_deref().map(str::trim).unwrap_or_default();
    if text.chars().count() < defaults::SEARCH_MIN_QUERY_LEN {
        return Err(ApiError::BadRequest(
            "Search query must be at least 2 characters".to_string(),
        ));
    }
    let limit = bounded(query.limit, defaults::PAGE_LIMIT as usize, "limit")?;
    let results = state.catalog.search(text, limit);

    Ok(Json(json!({
        "status": true,
        "message": "Search completed successfully",
        "totalResults": results.len(),
        "query": text,
        "data": results,
    })))
}

/// Motifs that can be bought online.
#[utoipa::path(get, path = "/api/motif/popular", tag = "Motifs",
    params(LimitQuery),
    responses((status = 200, description = "Popular motifs retrieved successfully")))]
pub async fn popular_motifs(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> Result<Json<Value>, ApiError> {
    let limit = bounded(query.limit, defaults::PAGE_LIMIT as usize, "limit")?;
    let data = state.catalog.popular(limit);

    Ok(Json(json!({
        "status": true,
        "message": "Popular motifs retrieved successfully",
        "data": data,
    })))
}

/// Random sample of distinct motifs.
#[utoipa::path(get, path = "/api/motif/random", tag = "Motifs",
    params(CountQuery),
    responses((status = 200, description = "Random motifs retrieved successfully")))]
pub async fn random_motifs(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CountQuery>,
) -> Result<Json<Value>, ApiError> {
    let count = bounded(query.count, defaults::RANDOM_MOTIF_COUNT, "count")?;
    let data = state.catalog.random(count);

    Ok(Json(json!({
        "status": true,
        "message": "Random motifs retrieved successfully",
        "data": data,
    })))
}

/// Catalog grouped by province, largest groups first.
#[utoipa::path(get, path = "/api/motif/group/provinsi", tag = "Motifs",
    responses((status = 200, description = "Motifs by provinsi retrieved successfully", body = [batik_core::ProvinceGroup])))]
pub async fn motifs_by_province(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": true,
        "message": "Motifs by provinsi retrieved successfully",
        "data": state.catalog.group_by_province(),
    }))
}

/// Alphabetical province directory.
#[utoipa::path(get, path = "/api/provinsi", tag = "Motifs",
    responses((status = 200, description = "Provinsi list retrieved successfully", body = [batik_core::ProvinceSummary])))]
pub async fn list_provinces(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": true,
        "message": "Provinsi list retrieved successfully",
        "data": state.catalog.provinces(),
    }))
}

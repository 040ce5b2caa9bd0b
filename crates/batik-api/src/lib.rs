//! # batik-api
//!
//! HTTP surface of the batik-scan service: prediction, per-user scan history
//! and the public motif catalog.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod services;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use handlers::{history, motifs, predict, system};
use middleware::{rate_limit_middleware, MakeRequestUuidV7};
use openapi::ApiDoc;

/// Headroom over the decoded upload limit for base64 expansion and the JSON wrapper.
const BODY_OVERHEAD_BYTES: usize = 64 * 1024;

/// Request body limit for a given decoded upload limit.
pub fn body_limit(max_upload_bytes: usize) -> usize {
    max_upload_bytes / 3 * 4 + BODY_OVERHEAD_BYTES
}

/// Parse CORS origins, skipping invalid ones.
pub fn parse_allowed_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|origin| {
            let trimmed = origin.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}

/// Build the application router with all routes and middleware.
pub fn router(state: AppState, allowed_origins: &[String]) -> Router {
    let body_limit = body_limit(state.max_upload_bytes);

    Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health_check))
        // OpenAPI / Swagger UI
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Prediction
        .route("/api/predict", post(predict::predict))
        // Scan history
        .route(
            "/api/history",
            get(history::list_history).delete(history::delete_all_history),
        )
        .route("/api/history/search", get(history::search_history))
        .route("/api/history/stats", get(history::history_stats))
        .route(
            "/api/history/:id",
            get(history::get_history).delete(history::delete_history),
        )
        // Motif catalog
        .route("/api/motif", get(motifs::list_motifs))
        .route("/api/motif/search", get(motifs::search_motifs))
        .route("/api/motif/popular", get(motifs::popular_motifs))
        .route("/api/motif/random", get(motifs::random_motifs))
        .route("/api/motif/group/provinsi", get(motifs::motifs_by_province))
        .route("/api/motif/:id", get(motifs::get_motif))
        .route("/api/provinsi", get(motifs::list_provinces))
        // Middleware
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(parse_allowed_origins(allowed_origins)))
                .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                .max_age(std::time::Duration::from_secs(3600)),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(CatchPanicLayer::new())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_allowed_origins_skips_blank_and_invalid() {
        let origins = vec![
            "http://localhost:3000".to_string(),
            "  ".to_string(),
            "bad\norigin".to_string(),
            " https://batik.example.com ".to_string(),
        ];
        let parsed = parse_allowed_origins(&origins);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1], "https://batik.example.com");
    }

    #[test]
    fn test_body_limit_covers_base64_upload() {
        let max = 10 * 1024 * 1024;
        assert!(body_limit(max) > max / 3 * 4);
    }
}

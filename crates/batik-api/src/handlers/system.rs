//! Banner and liveness.

use axum::response::IntoResponse;
use axum::Json;

/// Service banner with the endpoint map.
#[utoipa::path(get, path = "/", tag = "System",
    responses((status = 200, description = "Service banner")))]
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": true,
        "message": "Batik Prediction API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "motif": "/api/motif",
            "history": "/api/history",
            "prediction": "/api/predict",
            "docs": "/docs",
        }
    }))
}

#[utoipa::path(get, path = "/health", tag = "System",
    responses((status = 200, description = "Server is running")))]
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": true,
        "message": "Server is running",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

//! Prediction handler.

use std::sync::OnceLock;

use axum::{extract::State, Json};
use base64::Engine;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};

use batik_core::PredictionOutcome;

use super::ApiJson;
use crate::auth::RequireAuth;
use crate::{ApiError, AppState};

const IMAGE_REQUIRED: &str = "Image file is required";
const IMAGE_INVALID: &str = "Failed to process image";

/// Request body for a prediction.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct PredictRequest {
    /// Base64 image, optionally as a `data:image/...;base64,` URL.
    pub image: Option<String>,
    /// Client-side file name, used for the artifact content type.
    #[serde(rename = "originalName")]
    pub original_name: Option<String>,
}

fn data_url_prefix() -> Option<&'static Regex> {
    static PREFIX: OnceLock<Option<Regex>> = OnceLock::new();
    PREFIX
        .get_or_init(|| Regex::new(r"^data:image/\w+;base64,").ok())
        .as_ref()
}

/// Decode a base64 image, accepting and stripping a data-URL prefix.
pub fn decode_image(raw: &str) -> Result<Vec<u8>, ApiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest(IMAGE_REQUIRED.to_string()));
    }
    let payload = match data_url_prefix() {
        Some(prefix) => prefix.replace(trimmed, ""),
        None => trimmed.into(),
    };
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.as_bytes())
        .map_err(|_| ApiError::BadRequest(IMAGE_INVALID.to_string()))?;
    if bytes.is_empty() {
        return Err(ApiError::BadRequest(IMAGE_INVALID.to_string()));
    }
    Ok(bytes)
}

/// Classify an uploaded batik image.
///
/// A confident prediction is stored in the caller's history. A low-confidence
/// one is answered with `status:false` and nothing is stored.
#[utoipa::path(post, path = "/api/predict", tag = "Prediction",
    request_body = PredictRequest,
    responses(
        (status = 200, description = "Prediction accepted and recorded, or rejected for low confidence"),
        (status = 400, description = "Missing or undecodable image"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 413, description = "Image exceeds maximum upload size"),
        (status = 503, description = "Model is not available"),
    ),
    security(("bearer_auth" = [])))]
pub async fn predict(
    State(state): State<AppState>,
    auth: RequireAuth,
    ApiJson(req): ApiJson<PredictRequest>,
) -> Result<Json<Value>, ApiError> {
    let raw = req
        .image
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest(IMAGE_REQUIRED.to_string()))?;
    let image = decode_image(raw)?;
    if image.len() > state.max_upload_bytes {
        return Err(ApiError::PayloadTooLarge(
            "Image exceeds maximum upload size".to_string(),
        ));
    }

    let outcome = state
        .predictions
        .predict(auth.user.id, image, req.original_name.as_deref())
        .await?;

    Ok(Json(match outcome {
        PredictionOutcome::Rejected(rejection) => json!({
            "status": false,
            "message": rejection.message,
            "data": {
                "confidence": rejection.confidence,
                "threshold": rejection.threshold,
            }
        }),
        PredictionOutcome::Accepted(acceptance) => json!({
            "status": true,
            "message": "Prediction successful",
            "data": acceptance,
        }),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_base64() {
        assert_eq!(decode_image("aGVsbG8=").unwrap(), b"hello");
    }

    #[test]
    fn test_decode_strips_data_url() {
        assert_eq!(
            decode_image("data:image/png;base64,aGVsbG8=").unwrap(),
            b"hello"
        );
    }

    #[test]
    fn test_decode_rejects_blank_and_garbage() {
        assert!(matches!(
            decode_image("   "),
            Err(ApiError::BadRequest(ref m)) if m == IMAGE_REQUIRED
        ));
        assert!(matches!(
            decode_image("%%%not base64%%%"),
            Err(ApiError::BadRequest(ref m)) if m == IMAGE_INVALID
        ));
    }
}

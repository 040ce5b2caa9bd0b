//! Centralized default constants for batik-scan.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic numbers.

// =============================================================================
// PREDICTION
// =============================================================================

/// Minimum top-class probability for a prediction to be accepted.
pub const CONFIDENCE_THRESHOLD: f32 = 0.70;

/// Message returned with a rejected (low-confidence) prediction.
pub const LOW_CONFIDENCE_MESSAGE: &str = "Gambar yang diupload kemungkinan bukan batik atau tingkat kepercayaan prediksi terlalu rendah";

/// Filename assumed when the caller supplies none.
pub const DEFAULT_IMAGE_NAME: &str = "image.jpg";

// =============================================================================
// IMAGE NORMALIZATION
// =============================================================================

/// Square edge length of the classifier input tensor.
pub const IMAGE_SIZE: u32 = 224;

/// Color channels of the classifier input tensor (RGB).
pub const IMAGE_CHANNELS: usize = 3;

/// Largest accepted upload body, in bytes (10 MiB).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

// =============================================================================
// CLASSIFIER SERVING
// =============================================================================

/// Default TensorFlow-Serving base URL.
pub const MODEL_URL: &str = "http://localhost:8501";

/// Default served model name.
pub const MODEL_NAME: &str = "batik";

/// Timeout for a single scoring request, in seconds.
pub const MODEL_TIMEOUT_SECS: u64 = 30;

/// Timeout for the readiness probe performed on first load, in seconds.
pub const MODEL_LOAD_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// ARTIFACT STORAGE
// =============================================================================

/// Key prefix for uploaded prediction images.
pub const ARTIFACT_PREFIX: &str = "predictions";

/// Attempts made for an artifact write before giving up.
pub const ARTIFACT_PUT_ATTEMPTS: u32 = 3;

/// Initial backoff between artifact write attempts, in milliseconds.
pub const ARTIFACT_RETRY_BACKOFF_MS: u64 = 100;

/// Default filesystem artifact directory.
pub const ARTIFACT_PATH: &str = "/var/lib/batik/artifacts";

/// Default public base URL for filesystem artifacts.
pub const ARTIFACT_PUBLIC_URL: &str = "http://localhost:3000/artifacts";

/// Default AWS region for the S3 backend.
pub const AWS_REGION: &str = "ap-southeast-2";

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page number (1-based).
pub const PAGE: u32 = 1;

/// Default page size for list and search endpoints.
pub const PAGE_LIMIT: u32 = 10;

/// Largest page size a caller may request.
pub const PAGE_LIMIT_MAX: u32 = 50;

/// Default number of random motifs.
pub const RANDOM_MOTIF_COUNT: usize = 5;

// =============================================================================
// SEARCH
// =============================================================================

/// Minimum query length (characters, after trimming) for search endpoints.
pub const SEARCH_MIN_QUERY_LEN: usize = 2;

/// Catalog entries scoring below this relevance are not returned.
pub const SEARCH_MIN_RELEVANCE: u8 = 50;

/// Relevance weight of the motif name field.
pub const SEARCH_WEIGHT_NAME: f64 = 1.0;

/// Relevance weight of the province field.
pub const SEARCH_WEIGHT_PROVINCE: f64 = 0.9;

/// Relevance weight of the description field.
pub const SEARCH_WEIGHT_DESCRIPTION: f64 = 0.8;

// =============================================================================
// SERVER
// =============================================================================

/// Default bind host.
pub const HOST: &str = "0.0.0.0";

/// Default bind port.
pub const PORT: u16 = 3000;

/// Default database URL.
pub const DATABASE_URL: &str = "postgres://localhost/batik";

/// Default requests allowed per rate-limit period.
pub const RATE_LIMIT_REQUESTS: u32 = 100;

/// Default rate-limit period in seconds.
pub const RATE_LIMIT_PERIOD_SECS: u64 = 60;

// =============================================================================
// METADATA STORE
// =============================================================================

/// Connections held by the scan history pool.
pub const DB_MAX_CONNECTIONS: u32 = 10;

/// Seconds a request waits for a pooled connection.
pub const DB_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Seconds an idle connection is kept before closing.
pub const DB_IDLE_TIMEOUT_SECS: u64 = 600;

// =============================================================================
// ENVIRONMENT VARIABLE NAMES
// =============================================================================

pub const ENV_CONFIDENCE_THRESHOLD: &str = "CONFIDENCE_THRESHOLD";
pub const ENV_MODEL_URL: &str = "MODEL_URL";
pub const ENV_MODEL_NAME: &str = "MODEL_NAME";
pub const ENV_MODEL_TIMEOUT_SECS: &str = "MODEL_TIMEOUT_SECS";
pub const ENV_ARTIFACT_BACKEND: &str = "ARTIFACT_BACKEND";
pub const ENV_ARTIFACT_PATH: &str = "ARTIFACT_PATH";
pub const ENV_ARTIFACT_PUBLIC_URL: &str = "ARTIFACT_PUBLIC_URL";
pub const ENV_ARTIFACT_PUT_ATTEMPTS: &str = "ARTIFACT_PUT_ATTEMPTS";
pub const ENV_S3_BUCKET: &str = "S3_BUCKET";
pub const ENV_S3_ENDPOINT: &str = "S3_ENDPOINT";
pub const ENV_AWS_REGION: &str = "AWS_REGION";
pub const ENV_AUTH_URL: &str = "AUTH_URL";
pub const ENV_AUTH_API_KEY: &str = "AUTH_API_KEY";
pub const ENV_MAX_UPLOAD_BYTES: &str = "MAX_UPLOAD_BYTES";
pub const ENV_DB_MAX_CONNECTIONS: &str = "DB_MAX_CONNECTIONS";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_in_unit_range() {
        assert!(CONFIDENCE_THRESHOLD > 0.0 && CONFIDENCE_THRESHOLD <= 1.0);
    }

    #[test]
    fn test_page_limits_consistent() {
        assert!(PAGE_LIMIT <= PAGE_LIMIT_MAX);
        assert!(PAGE >= 1);
    }

    #[test]
    fn test_search_weights_ordered() {
        assert!(SEARCH_WEIGHT_NAME >= SEARCH_WEIGHT_PROVINCE);
        assert!(SEARCH_WEIGHT_PROVINCE >= SEARCH_WEIGHT_DESCRIPTION);
        assert!(SEARCH_MIN_RELEVANCE <= 100);
    }
}

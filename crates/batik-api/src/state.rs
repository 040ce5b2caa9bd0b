//! Application state shared across handlers.

use std::sync::Arc;

use batik_core::defaults;
use batik_search::CatalogIndex;

use crate::auth::IdentityVerifier;
use crate::middleware::GlobalRateLimiter;
use crate::services::{HistoryService, PredictionService};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogIndex>,
    pub predictions: PredictionService,
    pub history: HistoryService,
    pub verifier: Arc<dyn IdentityVerifier>,
    /// None when rate limiting is disabled.
    pub rate_limiter: Option<Arc<GlobalRateLimiter>>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        catalog: Arc<CatalogIndex>,
        predictions: PredictionService,
        history: HistoryService,
        verifier: Arc<dyn IdentityVerifier>,
    ) -> Self {
        Self {
            catalog,
            predictions,
            history,
            verifier,
            rate_limiter: None,
            max_upload_bytes: defaults::MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_rate_limiter(mut self, limiter: Option<Arc<GlobalRateLimiter>>) -> Self {
        self.rate_limiter = limiter;
        self
    }

    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }
}

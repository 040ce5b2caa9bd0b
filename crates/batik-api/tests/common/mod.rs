//! Shared harness: the full router over in-memory stores and a mock classifier.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::Engine;
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use batik_api::auth::StaticIdentityVerifier;
use batik_api::config::RateLimitConfig;
use batik_api::middleware::build_rate_limiter;
use batik_api::services::{HistoryService, PredictionService, ProvenanceRecorder};
use batik_api::{router, AppState};
use batik_db::{ArtifactStore, MemoryBackend, MemoryScanRepository, StoreEventLog};
use batik_inference::{ClassifierGateway, ConfidenceGate, MockClassifier, MockLoader};
use batik_search::CatalogIndex;

pub const TOKEN_A: &str = "token-owner-a";
pub const TOKEN_B: &str = "token-owner-b";

/// Class ordinate of `yogya_parang`.
pub const PARANG: usize = 4;

pub struct TestApp {
    pub router: Router,
    pub log: StoreEventLog,
    pub scans: Arc<MemoryScanRepository>,
    pub blobs: Arc<MemoryBackend>,
    pub loader: MockLoader,
    pub owner_a: Uuid,
    pub owner_b: Uuid,
}

pub struct TestAppBuilder {
    loader: MockLoader,
    rate_limit: Option<RateLimitConfig>,
    max_upload_bytes: Option<usize>,
}

impl TestAppBuilder {
    pub fn new() -> Self {
        let catalog_classes = CatalogIndex::builtin().unwrap().class_count();
        Self {
            loader: MockLoader::new(MockClassifier::peaked(catalog_classes, PARANG, 0.92)),
            rate_limit: None,
            max_upload_bytes: None,
        }
    }

    pub fn loader(mut self, loader: MockLoader) -> Self {
        self.loader = loader;
        self
    }

    pub fn rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit = Some(config);
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = Some(bytes);
        self
    }

    pub fn build(self) -> TestApp {
        let log = StoreEventLog::new();
        let scans = Arc::new(MemoryScanRepository::new().with_log(log.clone()));
        let blobs = Arc::new(MemoryBackend::new().with_log(log.clone()));
        let catalog = Arc::new(CatalogIndex::builtin().unwrap());

        let recorder = ProvenanceRecorder::new(scans.clone(), ArtifactStore::new(blobs.clone()))
            .with_retry_backoff(Duration::from_millis(1));
        let gateway = Arc::new(ClassifierGateway::new(
            Arc::new(self.loader.clone()),
            catalog.class_count(),
        ));
        let predictions = PredictionService::new(
            gateway,
            ConfidenceGate::default(),
            catalog.clone(),
            recorder.clone(),
        );
        let history = HistoryService::new(recorder);

        let owner_a = Uuid::now_v7();
        let owner_b = Uuid::now_v7();
        let verifier = Arc::new(
            StaticIdentityVerifier::new()
                .with_token(TOKEN_A, owner_a)
                .with_token(TOKEN_B, owner_b),
        );

        let mut state = AppState::new(catalog, predictions, history, verifier);
        if let Some(config) = self.rate_limit {
            state = state.with_rate_limiter(build_rate_limiter(&config));
        }
        if let Some(bytes) = self.max_upload_bytes {
            state = state.with_max_upload_bytes(bytes);
        }

        TestApp {
            router: router(state, &["http://localhost:3000".to_string()]),
            log,
            scans,
            blobs,
            loader: self.loader,
            owner_a,
            owner_b,
        }
    }
}

impl TestApp {
    pub fn new() -> Self {
        TestAppBuilder::new().build()
    }

    /// Send a request and decode the JSON body (`Null` when empty or not JSON).
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        let body = match body {
            Some(v) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(serde_json::to_vec(&v).unwrap())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request("GET", uri, None, token).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request("DELETE", uri, None, token).await
    }

    pub async fn predict(&self, token: &str) -> (StatusCode, Value) {
        self.request(
            "POST",
            "/api/predict",
            Some(json!({ "image": png_data_url(), "originalName": "kain.png" })),
            Some(token),
        )
        .await
    }

    /// Set the top-class probability of every following prediction.
    pub fn set_top_probability(&self, probability: f32) {
        let classes = CatalogIndex::builtin().unwrap().class_count();
        let rest = (1.0 - probability) / (classes - 1) as f32;
        let scores = (0..classes)
            .map(|i| if i == PARANG { probability } else { rest })
            .collect();
        self.loader.classifier().set_scores(scores);
    }
}

/// A small PNG, base64 encoded as a data URL.
pub fn png_data_url() -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png_bytes(32, 32))
    )
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    // Hash noise so the PNG does not compress away
    let img = RgbImage::from_fn(width, height, |x, y| {
        let h = (x.wrapping_mul(2_654_435_761) ^ y.wrapping_mul(40_503)).wrapping_mul(2_246_822_519);
        Rgb([(h >> 24) as u8, (h >> 16) as u8, (h >> 8) as u8])
    });
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageOutputFormat::Png)
        .unwrap();
    buf.into_inner()
}

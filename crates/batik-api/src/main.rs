//! batik-api binary: configuration, logging and server startup.

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::services::ServeDir;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use batik_api::auth::SupabaseIdentityVerifier;
use batik_api::config::{AppConfig, ArtifactBackendConfig};
use batik_api::middleware::build_rate_limiter;
use batik_api::services::{HistoryService, PredictionService, ProvenanceRecorder};
use batik_api::{router, AppState};
use batik_core::{ScanRepository, StorageBackend};
use batik_db::{log_pool_metrics, ArtifactStore, Database, FilesystemBackend, S3Backend};
use batik_inference::{ClassifierGateway, ConfidenceGate, TfServingLoader};
use batik_search::CatalogIndex;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "batik_api=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "batik_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    // Optionally create a file appender with daily rotation
    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("batik-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        // Console-only output
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let config = AppConfig::from_env()?;

    info!(
        "Rate limiting: {} ({} requests per {} seconds)",
        if config.rate_limit.enabled {
            "enabled"
        } else {
            "disabled"
        },
        config.rate_limit.requests,
        config.rate_limit.period_secs
    );

    // Metadata store
    info!("Connecting to database...");
    let db =
        Database::connect_with_max_connections(&config.database_url, config.db_max_connections)
            .await?;
    db.migrate().await?;
    log_pool_metrics(&db.pool);
    info!("Database connected");

    // Blob store
    let (backend, artifact_dir): (Arc<dyn StorageBackend>, Option<String>) = match &config.artifacts
    {
        ArtifactBackendConfig::Filesystem { path, public_url } => {
            let backend = FilesystemBackend::new(path.clone(), public_url.clone());
            backend
                .validate()
                .await
                .map_err(|e| anyhow::anyhow!("Artifact directory unusable: {e}"))?;
            info!(path = %path, "Using filesystem artifact storage");
            (Arc::new(backend), Some(path.clone()))
        }
        ArtifactBackendConfig::S3 {
            bucket,
            region,
            endpoint,
        } => {
            let backend = S3Backend::new(bucket, region, endpoint.clone()).await?;
            info!(bucket = %bucket, region = %region, "Using S3 artifact storage");
            (Arc::new(backend), None)
        }
    };

    // Catalog
    let catalog = Arc::new(CatalogIndex::builtin()?);
    let unclassified = catalog.unclassified_keys();
    if !unclassified.is_empty() {
        warn!(
            subsystem = "search",
            keys = ?unclassified,
            "Catalog entries without a classifier class"
        );
    }
    info!(
        motifs = catalog.len(),
        classes = catalog.class_count(),
        "Motif catalog loaded"
    );

    // Classifier, loaded lazily on the first prediction
    info!(
        model_url = %config.model.base_url,
        model_name = %config.model.model_name,
        "Classifier configured"
    );
    let gateway = Arc::new(ClassifierGateway::new(
        Arc::new(TfServingLoader::new(config.model.clone())),
        catalog.class_count(),
    ));
    let gate = ConfidenceGate::new(config.confidence_threshold)?;

    let scans: Arc<dyn ScanRepository> = Arc::new(db.scans);
    let recorder = ProvenanceRecorder::new(scans, ArtifactStore::new(backend))
        .with_put_attempts(config.artifact_put_attempts);
    let predictions = PredictionService::new(gateway, gate, catalog.clone(), recorder.clone());
    let history = HistoryService::new(recorder);

    let verifier = Arc::new(SupabaseIdentityVerifier::new(
        config.auth_url.clone(),
        config.auth_api_key.clone(),
    ));

    let state = AppState::new(catalog, predictions, history, verifier)
        .with_rate_limiter(build_rate_limiter(&config.rate_limit))
        .with_max_upload_bytes(config.max_upload_bytes);

    let mut app = router(state, &config.allowed_origins);
    if let Some(dir) = artifact_dir {
        app = app.nest_service("/artifacts", ServeDir::new(dir));
    }

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

//! Server configuration from environment variables.

use batik_core::{defaults, Error, Result};
use batik_inference::TfServingConfig;

/// Where prediction artifacts are written.
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactBackendConfig {
    Filesystem {
        path: String,
        public_url: String,
    },
    S3 {
        bucket: String,
        region: String,
        endpoint: Option<String>,
    },
}

/// Global request quota.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub requests: u32,
    pub period_secs: u64,
}

/// Everything the server needs at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub confidence_threshold: f32,
    pub model: TfServingConfig,
    pub artifacts: ArtifactBackendConfig,
    pub artifact_put_attempts: u32,
    pub auth_url: String,
    pub auth_api_key: String,
    pub allowed_origins: Vec<String>,
    pub rate_limit: RateLimitConfig,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through `lookup`; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let confidence_threshold: f32 = parse_or(
            &get,
            defaults::ENV_CONFIDENCE_THRESHOLD,
            defaults::CONFIDENCE_THRESHOLD,
        )?;
        if !(0.0..=1.0).contains(&confidence_threshold) {
            return Err(Error::Config(format!(
                "{} must be within [0, 1], got {}",
                defaults::ENV_CONFIDENCE_THRESHOLD,
                confidence_threshold
            )));
        }

        let artifacts = match get(defaults::ENV_ARTIFACT_BACKEND).as_deref() {
            None | Some("filesystem") => ArtifactBackendConfig::Filesystem {
                path: get(defaults::ENV_ARTIFACT_PATH)
                    .unwrap_or_else(|| defaults::ARTIFACT_PATH.to_string()),
                public_url: get(defaults::ENV_ARTIFACT_PUBLIC_URL)
                    .unwrap_or_else(|| defaults::ARTIFACT_PUBLIC_URL.to_string()),
            },
            Some("s3") => ArtifactBackendConfig::S3 {
                bucket: get(defaults::ENV_S3_BUCKET).ok_or_else(|| {
                    Error::Config(format!(
                        "{} is required when {}=s3",
                        defaults::ENV_S3_BUCKET,
                        defaults::ENV_ARTIFACT_BACKEND
                    ))
                })?,
                region: get(defaults::ENV_AWS_REGION)
                    .unwrap_or_else(|| defaults::AWS_REGION.to_string()),
                endpoint: get(defaults::ENV_S3_ENDPOINT),
            },
            Some(other) => {
                return Err(Error::Config(format!(
                    "{} must be 'filesystem' or 's3', got '{}'",
                    defaults::ENV_ARTIFACT_BACKEND,
                    other
                )))
            }
        };

        let artifact_put_attempts: u32 = parse_or(
            &get,
            defaults::ENV_ARTIFACT_PUT_ATTEMPTS,
            defaults::ARTIFACT_PUT_ATTEMPTS,
        )?;
        if artifact_put_attempts == 0 {
            return Err(Error::Config(format!(
                "{} must be at least 1",
                defaults::ENV_ARTIFACT_PUT_ATTEMPTS
            )));
        }

        let rate_limit = RateLimitConfig {
            enabled: parse_or(&get, "RATE_LIMIT_ENABLED", true)?,
            requests: parse_or(&get, "RATE_LIMIT_REQUESTS", defaults::RATE_LIMIT_REQUESTS)?,
            period_secs: parse_or(
                &get,
                "RATE_LIMIT_PERIOD_SECS",
                defaults::RATE_LIMIT_PERIOD_SECS,
            )?,
        };
        if rate_limit.enabled && (rate_limit.requests == 0 || rate_limit.period_secs == 0) {
            return Err(Error::Config(
                "RATE_LIMIT_REQUESTS and RATE_LIMIT_PERIOD_SECS must be non-zero".to_string(),
            ));
        }

        let db_max_connections: u32 = parse_or(
            &get,
            defaults::ENV_DB_MAX_CONNECTIONS,
            defaults::DB_MAX_CONNECTIONS,
        )?;
        if db_max_connections == 0 {
            return Err(Error::Config(format!(
                "{} must be at least 1",
                defaults::ENV_DB_MAX_CONNECTIONS
            )));
        }

        let auth_url = get(defaults::ENV_AUTH_URL)
            .ok_or_else(|| Error::Config(format!("{} is required", defaults::ENV_AUTH_URL)))?;
        let auth_api_key = get(defaults::ENV_AUTH_API_KEY)
            .ok_or_else(|| Error::Config(format!("{} is required", defaults::ENV_AUTH_API_KEY)))?;

        let allowed_origins = get("ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_else(|| vec!["http://localhost:3000".to_string()]);

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| defaults::DATABASE_URL.to_string()),
            host: get("HOST").unwrap_or_else(|| defaults::HOST.to_string()),
            port: parse_or(&get, "PORT", defaults::PORT)?,
            db_max_connections,
            confidence_threshold,
            model: TfServingConfig {
                base_url: get(defaults::ENV_MODEL_URL)
                    .unwrap_or_else(|| defaults::MODEL_URL.to_string()),
                model_name: get(defaults::ENV_MODEL_NAME)
                    .unwrap_or_else(|| defaults::MODEL_NAME.to_string()),
                timeout_secs: parse_or(
                    &get,
                    defaults::ENV_MODEL_TIMEOUT_SECS,
                    defaults::MODEL_TIMEOUT_SECS,
                )?,
            },
            artifacts,
            artifact_put_attempts,
            auth_url,
            auth_api_key,
            allowed_origins,
            rate_limit,
            max_upload_bytes: parse_or(
                &get,
                defaults::ENV_MAX_UPLOAD_BYTES,
                defaults::MAX_UPLOAD_BYTES,
            )?,
        })
    }
}

fn parse_opt<T, G>(get: &G, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| Error::Config(format!("invalid {}='{}': {}", key, raw, e)))
        })
        .transpose()
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    Ok(parse_opt(get, key)?.unwrap_or(default))
}

//! Bearer-token authentication against an external identity service.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use batik_core::{Error, Result};

use crate::{ApiError, AppState};

/// Authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Resolves a bearer token to the user it was issued for.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// `Unauthorized` for unknown, expired, or revoked tokens.
    async fn verify(&self, token: &str) -> Result<AuthUser>;
}

// =============================================================================
// SUPABASE
// =============================================================================

/// Verifies tokens with a Supabase-compatible `/auth/v1/user` endpoint.
pub struct SupabaseIdentityVerifier {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl SupabaseIdentityVerifier {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl IdentityVerifier for SupabaseIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<AuthUser> {
        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .timeout(Duration::from_secs(10))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::Unauthorized("Invalid or expired token".to_string()));
        }
        if !status.is_success() {
            return Err(Error::Request(format!(
                "identity service returned {}",
                status
            )));
        }

        response
            .json::<AuthUser>()
            .await
            .map_err(|e| Error::Serialization(format!("Failed to parse identity: {}", e)))
    }
}

// =============================================================================
// STATIC
// =============================================================================

/// Fixed token table, for tests and local development.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityVerifier {
    tokens: HashMap<String, AuthUser>,
}

impl StaticIdentityVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, user_id: Uuid) -> Self {
        self.tokens.insert(
            token.into(),
            AuthUser {
                id: user_id,
                email: None,
            },
        );
        self
    }
}

#[async_trait]
impl IdentityVerifier for StaticIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<AuthUser> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| Error::Unauthorized("Invalid or expired token".to_string()))
    }
}

// =============================================================================
// EXTRACTOR
// =============================================================================

/// Extractor that requires a verified bearer token.
#[derive(Debug, Clone)]
pub struct RequireAuth {
    pub user: AuthUser,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

        let token = bearer_token(header)
            .ok_or_else(|| ApiError::Unauthorized("Invalid authorization format".to_string()))?;

        match state.verifier.verify(token).await {
            Ok(user) => {
                debug!(subsystem = "auth", owner_id = %user.id, "Request authenticated");
                Ok(RequireAuth { user })
            }
            Err(Error::Unauthorized(msg)) => Err(ApiError::Unauthorized(msg)),
            Err(e) => {
                warn!(subsystem = "auth", error = %e, "Identity verification failed");
                Err(ApiError::Unauthorized("Authentication failed".to_string()))
            }
        }
    }
}

/// Token of a `Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("Bearer   "), None);
        assert_eq!(bearer_token("Basic dXNlcg=="), None);
        assert_eq!(bearer_token("abc"), None);
    }

    #[tokio::test]
    async fn test_static_verifier() {
        let user = Uuid::new_v4();
        let verifier = StaticIdentityVerifier::new().with_token("t1", user);
        assert_eq!(verifier.verify("t1").await.unwrap().id, user);
        assert!(matches!(
            verifier.verify("t2").await,
            Err(Error::Unauthorized(_))
        ));
    }
}

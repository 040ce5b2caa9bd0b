//! TensorFlow Serving REST classifier.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use batik_core::{defaults, Classifier, ClassifierLoader, Error, ImageTensor, Result};

/// Connection settings for a TensorFlow Serving model.
#[derive(Debug, Clone)]
pub struct TfServingConfig {
    pub base_url: String,
    pub model_name: String,
    pub timeout_secs: u64,
}

impl Default for TfServingConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::MODEL_URL.to_string(),
            model_name: defaults::MODEL_NAME.to_string(),
            timeout_secs: defaults::MODEL_TIMEOUT_SECS,
        }
    }
}

impl TfServingConfig {
    fn status_url(&self) -> String {
        format!(
            "{}/v1/models/{}",
            self.base_url.trim_end_matches('/'),
            self.model_name
        )
    }

    fn predict_url(&self) -> String {
        format!("{}:predict", self.status_url())
    }
}

#[derive(Serialize)]
struct PredictRequest {
    instances: Vec<Vec<Vec<Vec<f32>>>>,
}

#[derive(Deserialize)]
struct PredictResponse {
    predictions: Vec<Vec<f32>>,
}

#[derive(Deserialize)]
struct ModelStatusResponse {
    #[serde(default)]
    model_version_status: Vec<ModelVersionStatus>,
}

#[derive(Deserialize)]
struct ModelVersionStatus {
    #[serde(default)]
    version: String,
    state: String,
}

/// Checks that the model is being served, then hands out a classifier.
pub struct TfServingLoader {
    config: TfServingConfig,
    client: reqwest::Client,
}

impl TfServingLoader {
    pub fn new(config: TfServingConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ClassifierLoader for TfServingLoader {
    async fn load(&self) -> Result<Arc<dyn Classifier>> {
        let url = self.config.status_url();
        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(defaults::MODEL_LOAD_TIMEOUT_SECS))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::ServiceUnavailable(format!(
                "model status returned {}",
                response.status()
            )));
        }

        let status: ModelStatusResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("Failed to parse model status: {}", e)))?;

        let available = status
            .model_version_status
            .iter()
            .find(|v| v.state.eq_ignore_ascii_case("AVAILABLE"))
            .ok_or_else(|| {
                Error::ServiceUnavailable(format!(
                    "model {} has no available version",
                    self.config.model_name
                ))
            })?;

        debug!(
            subsystem = "inference",
            component = "tf_serving",
            model = %self.config.model_name,
            version = %available.version,
            "Model version available"
        );

        Ok(Arc::new(TfServingClassifier {
            config: self.config.clone(),
            client: self.client.clone(),
        }))
    }
}

/// Scores images through the `:predict` endpoint.
pub struct TfServingClassifier {
    config: TfServingConfig,
    client: reqwest::Client,
}

#[async_trait]
impl Classifier for TfServingClassifier {
    async fn score(&self, tensor: &ImageTensor) -> Result<Vec<f32>> {
        let request = PredictRequest {
            instances: vec![tensor.to_nested()],
        };

        let response = self
            .client
            .post(self.config.predict_url())
            .json(&request)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .send()
            .await
            .map_err(|e| Error::ServiceUnavailable(format!("Model server unreachable: {}", e)))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(Error::ServiceUnavailable(format!(
                "Model server returned {}",
                status
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "Model server returned {}: {}",
                status, body
            )));
        }

        let result: PredictResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Failed to parse prediction: {}", e)))?;

        result
            .predictions
            .into_iter()
            .next()
            .ok_or_else(|| Error::Inference("Model server returned no predictions".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.config.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_trim_trailing_slash() {
        let config = TfServingConfig {
            base_url: "http://serving:8501/".to_string(),
            model_name: "batik".to_string(),
            timeout_secs: 5,
        };
        assert_eq!(config.status_url(), "http://serving:8501/v1/models/batik");
        assert_eq!(
            config.predict_url(),
            "http://serving:8501/v1/models/batik:predict"
        );
    }

    #[test]
    fn test_default_config() {
        let config = TfServingConfig::default();
        assert_eq!(config.base_url, defaults::MODEL_URL);
        assert_eq!(config.model_name, defaults::MODEL_NAME);
    }

    #[test]
    fn test_predict_response_deserialization() {
        let json = r#"{"predictions": [[0.1, 0.9]]}"#;
        let response: PredictResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.predictions[0], vec![0.1, 0.9]);
    }

    #[test]
    fn test_model_status_deserialization() {
        let json = r#"{"model_version_status":[{"version":"3","state":"AVAILABLE","status":{"error_code":"OK"}}]}"#;
        let status: ModelStatusResponse = serde_json::from_str(json).unwrap();
        assert_eq!(status.model_version_status[0].version, "3");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unavailable() {
        let classifier = TfServingClassifier {
            config: TfServingConfig {
                base_url: "http://127.0.0.1:1".to_string(),
                model_name: "batik".to_string(),
                timeout_secs: 2,
            },
            client: reqwest::Client::new(),
        };
        let tensor = ImageTensor {
            width: 1,
            height: 1,
            channels: 3,
            data: vec![0.0; 3],
        };

        let err = classifier.score(&tensor).await.unwrap_err();
        assert!(matches!(err, Error::ServiceUnavailable(_)));
    }
}

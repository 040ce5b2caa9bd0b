//! Prediction pipeline: normalize, score, gate, commit.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};
use uuid::Uuid;

use batik_core::{
    defaults, Acceptance, Error, PredictionOutcome, PredictionSummary, Rejection, Result,
};
use batik_inference::{normalize, ClassifierGateway, ConfidenceGate, GateDecision};
use batik_search::CatalogIndex;

use super::provenance::ProvenanceRecorder;

/// Runs one uploaded image through the classifier and records accepted results.
#[derive(Clone)]
pub struct PredictionService {
    gateway: Arc<ClassifierGateway>,
    gate: ConfidenceGate,
    catalog: Arc<CatalogIndex>,
    recorder: ProvenanceRecorder,
}

impl PredictionService {
    pub fn new(
        gateway: Arc<ClassifierGateway>,
        gate: ConfidenceGate,
        catalog: Arc<CatalogIndex>,
        recorder: ProvenanceRecorder,
    ) -> Self {
        Self {
            gateway,
            gate,
            catalog,
            recorder,
        }
    }

    /// Classify `image` for `owner_id`.
    ///
    /// Low confidence is a [`PredictionOutcome::Rejected`] with no side
    /// effects; anything else commits an artifact and a scan record.
    pub async fn predict(
        &self,
        owner_id: Uuid,
        image: Vec<u8>,
        file_name: Option<&str>,
    ) -> Result<PredictionOutcome> {
        let start = Instant::now();
        let file_name = file_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(defaults::DEFAULT_IMAGE_NAME)
            .to_string();

        let tensor = normalize(image.clone()).await?;
        let scores = self.gateway.score(&tensor).await?;

        let (ordinate, confidence) = match self.gate.decide(&scores)? {
            GateDecision::Reject {
                confidence,
                threshold,
            } => {
                info!(
                    subsystem = "prediction",
                    op = "gate",
                    owner_id = %owner_id,
                    confidence,
                    threshold,
                    "Prediction rejected below confidence threshold"
                );
                return Ok(PredictionOutcome::Rejected(Rejection {
                    message: defaults::LOW_CONFIDENCE_MESSAGE.to_string(),
                    confidence,
                    threshold,
                }));
            }
            GateDecision::Accept {
                ordinate,
                confidence,
                ..
            } => (ordinate, confidence),
        };

        let predicted_class = self
            .catalog
            .class_key(ordinate)
            .ok_or_else(|| Error::Inference(format!("no catalog key for class {}", ordinate)))?
            .to_string();
        let entry = self
            .catalog
            .class_entry(ordinate)
            .ok_or_else(|| {
                Error::Internal("Motif data not found for predicted class".to_string())
            })?
            .clone();

        let record = self
            .recorder
            .commit(owner_id, &image, &file_name, &entry, confidence)
            .await?;

        debug!(
            subsystem = "prediction",
            op = "predict",
            owner_id = %owner_id,
            scan_id = %record.id,
            motif_id = %entry.key,
            confidence,
            duration_ms = start.elapsed().as_millis() as u64,
            "Prediction accepted"
        );

        Ok(PredictionOutcome::Accepted(Box::new(Acceptance {
            prediction: PredictionSummary {
                motif_id: entry.key.clone(),
                motif_name: entry.name.clone(),
                provinsi: entry.province.clone(),
                confidence,
                predicted_class,
            },
            image_url: record.image_url,
            history_id: record.id,
            motif_data: entry,
        })))
    }
}

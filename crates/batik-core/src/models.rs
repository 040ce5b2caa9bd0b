//! Core data models for batik-scan.
//!
//! JSON field names follow the public API (`provinsi`, `link_shop`,
//! `confidence_score`, ...), so the same types serve storage and responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// CATALOG
// =============================================================================

/// Immutable reference record for one batik motif.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CatalogEntry {
    /// Stable catalog key, e.g. `yogya_parang`.
    #[serde(rename = "id")]
    pub key: String,
    pub name: String,
    #[serde(rename = "provinsi")]
    pub province: String,
    pub description: String,
    pub occasion: String,
    #[serde(rename = "link_shop")]
    pub shop_link: String,
    #[serde(rename = "link_image")]
    pub image_link: String,
}

/// Catalog entry annotated with a fuzzy-search relevance score in `[0, 100]`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ScoredEntry {
    #[serde(flatten)]
    pub entry: CatalogEntry,
    #[serde(rename = "relevanceScore")]
    pub relevance_score: u8,
}

/// Catalog entries sharing one province.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ProvinceGroup {
    pub provinsi: String,
    pub count: usize,
    pub motifs: Vec<CatalogEntry>,
}

/// One row of the province directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ProvinceSummary {
    pub name: String,
    pub count: usize,
}

// =============================================================================
// SCAN HISTORY
// =============================================================================

/// Durable outcome of an accepted prediction.
///
/// Display fields are copied from the catalog at commit time and never
/// updated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct ScanRecord {
    pub id: Uuid,
    #[sqlx(rename = "user_id")]
    #[serde(rename = "user_id")]
    pub owner_id: Uuid,
    pub motif_id: String,
    pub motif_name: String,
    #[sqlx(rename = "provinsi")]
    #[serde(rename = "provinsi")]
    pub province: String,
    pub description: String,
    pub occasion: String,
    #[sqlx(rename = "confidence_score")]
    #[serde(rename = "confidence_score")]
    pub confidence: i16,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

/// Scan record ready for insertion; the store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewScanRecord {
    pub owner_id: Uuid,
    pub motif_id: String,
    pub motif_name: String,
    pub province: String,
    pub description: String,
    pub occasion: String,
    pub confidence: u8,
    pub image_url: String,
}

impl NewScanRecord {
    /// Build a record denormalizing the display fields of `entry`.
    pub fn from_entry(
        owner_id: Uuid,
        entry: &CatalogEntry,
        confidence: u8,
        image_url: impl Into<String>,
    ) -> Self {
        Self {
            owner_id,
            motif_id: entry.key.clone(),
            motif_name: entry.name.clone(),
            province: entry.province.clone(),
            description: entry.description.clone(),
            occasion: entry.occasion.clone(),
            confidence: confidence.min(100),
            image_url: image_url.into(),
        }
    }
}

/// Scan count for one province.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ProvinceCount {
    pub provinsi: String,
    pub count: i64,
}

/// Aggregate statistics over one owner's scan history.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStats {
    pub total_scans: i64,
    pub provinsi_stats: Vec<ProvinceCount>,
    pub most_scanned_provinsi: Option<String>,
    pub recent_scan: Option<ScanRecord>,
}

// =============================================================================
// PREDICTION
// =============================================================================

/// Fixed-shape normalized image, row-major HWC, values in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    pub width: u32,
    pub height: u32,
    pub channels: usize,
    pub data: Vec<f32>,
}

impl ImageTensor {
    /// Nested `[height][width][channels]` rows, the layout served models expect.
    pub fn to_nested(&self) -> Vec<Vec<Vec<f32>>> {
        let row_len = self.width as usize * self.channels;
        if row_len == 0 {
            return Vec::new();
        }
        self.data
            .chunks(row_len)
            .map(|row| row.chunks(self.channels).map(<[f32]>::to_vec).collect())
            .collect()
    }
}

/// Low-confidence outcome. Nothing was persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Rejection {
    pub message: String,
    /// Top-class probability as an integer percentage.
    pub confidence: u8,
    /// Configured threshold as an integer percentage.
    pub threshold: u8,
}

/// Headline fields of an accepted prediction.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PredictionSummary {
    pub motif_id: String,
    pub motif_name: String,
    pub provinsi: String,
    pub confidence: u8,
    pub predicted_class: String,
}

/// Accepted and committed prediction.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Acceptance {
    pub prediction: PredictionSummary,
    pub motif_data: CatalogEntry,
    pub image_url: String,
    pub history_id: Uuid,
}

/// Result of running the prediction pipeline.
#[derive(Debug, Clone)]
pub enum PredictionOutcome {
    Rejected(Rejection),
    Accepted(Box<Acceptance>),
}

impl PredictionOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, PredictionOutcome::Accepted(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> CatalogEntry {
        CatalogEntry {
            key: "yogya_parang".into(),
            name: "Batik Parang Yogyakarta".into(),
            province: "Yogyakarta".into(),
            description: "Motif parang".into(),
            occasion: "Acara resmi".into(),
            shop_link: "https://shop.example/parang".into(),
            image_link: "https://img.example/parang.jpg".into(),
        }
    }

    #[test]
    fn test_catalog_entry_json_field_names() {
        let json = serde_json::to_value(entry()).unwrap();
        assert_eq!(json["id"], "yogya_parang");
        assert_eq!(json["provinsi"], "Yogyakarta");
        assert_eq!(json["link_shop"], "https://shop.example/parang");
        assert_eq!(json["link_image"], "https://img.example/parang.jpg");
        assert!(json.get("key").is_none());
    }

    #[test]
    fn test_scored_entry_flattens() {
        let scored = ScoredEntry {
            entry: entry(),
            relevance_score: 87,
        };
        let json = serde_json::to_value(scored).unwrap();
        assert_eq!(json["name"], "Batik Parang Yogyakarta");
        assert_eq!(json["relevanceScore"], 87);
    }

    #[test]
    fn test_new_scan_record_denormalizes_entry() {
        let owner = Uuid::new_v4();
        let record = NewScanRecord::from_entry(owner, &entry(), 92, "https://cdn/x.jpg");
        assert_eq!(record.owner_id, owner);
        assert_eq!(record.motif_id, "yogya_parang");
        assert_eq!(record.motif_name, "Batik Parang Yogyakarta");
        assert_eq!(record.province, "Yogyakarta");
        assert_eq!(record.confidence, 92);
        assert_eq!(record.image_url, "https://cdn/x.jpg");
    }

    #[test]
    fn test_new_scan_record_clamps_confidence() {
        let record = NewScanRecord::from_entry(Uuid::new_v4(), &entry(), 140, "u");
        assert_eq!(record.confidence, 100);
    }

    #[test]
    fn test_history_stats_camel_case() {
        let stats = HistoryStats {
            total_scans: 2,
            provinsi_stats: vec![ProvinceCount {
                provinsi: "Bali".into(),
                count: 2,
            }],
            most_scanned_provinsi: Some("Bali".into()),
            recent_scan: None,
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["totalScans"], 2);
        assert_eq!(json["mostScannedProvinsi"], "Bali");
        assert_eq!(json["provinsiStats"][0]["count"], 2);
        assert!(json["recentScan"].is_null());
    }

    #[test]
    fn test_tensor_to_nested_shape() {
        let tensor = ImageTensor {
            width: 2,
            height: 3,
            channels: 3,
            data: (0..18).map(|v| v as f32).collect(),
        };
        let nested = tensor.to_nested();
        assert_eq!(nested.len(), 3);
        assert_eq!(nested[0].len(), 2);
        assert_eq!(nested[0][1], vec![3.0, 4.0, 5.0]);
        assert_eq!(nested[2][1], vec![15.0, 16.0, 17.0]);
    }

    #[test]
    fn test_outcome_is_accepted() {
        let rejected = PredictionOutcome::Rejected(Rejection {
            message: "low".into(),
            confidence: 65,
            threshold: 70,
        });
        assert!(!rejected.is_accepted());
    }
}

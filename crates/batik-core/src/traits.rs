//! Core traits for batik-scan abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// SCAN REPOSITORY
// =============================================================================

/// Sort direction on `created_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Owner-scoped query over scan records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanQuery {
    pub owner_id: Uuid,
    /// Case-insensitive substring filter on province.
    pub province: Option<String>,
    /// Case-insensitive substring matched against motif name, province, or description.
    pub search: Option<String>,
    pub order: ScanOrder,
    pub offset: u64,
    /// `None` returns every matching row.
    pub limit: Option<u64>,
}

impl ScanQuery {
    /// Every record of `owner_id`, newest first.
    pub fn for_owner(owner_id: Uuid) -> Self {
        Self {
            owner_id,
            province: None,
            search: None,
            order: ScanOrder::NewestFirst,
            offset: 0,
            limit: None,
        }
    }

    pub fn province(mut self, province: impl Into<String>) -> Self {
        self.province = Some(province.into());
        self
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn order(mut self, order: ScanOrder) -> Self {
        self.order = order;
        self
    }

    pub fn page(mut self, offset: u64, limit: u64) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }

    /// True if `record` satisfies the owner and text filters.
    pub fn matches(&self, record: &ScanRecord) -> bool {
        if record.owner_id != self.owner_id {
            return false;
        }
        if let Some(province) = &self.province {
            if !contains_ignore_case(&record.province, province) {
                return false;
            }
        }
        if let Some(text) = &self.search {
            return contains_ignore_case(&record.motif_name, text)
                || contains_ignore_case(&record.province, text)
                || contains_ignore_case(&record.description, text);
        }
        true
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Metadata store for scan records.
///
/// Every operation is scoped to an owner: a record belonging to someone else
/// behaves exactly like an absent one.
#[async_trait]
pub trait ScanRepository: Send + Sync {
    /// Insert a record and return it with its store-assigned id and timestamp.
    async fn insert(&self, record: NewScanRecord) -> Result<ScanRecord>;

    /// Return one page of matching records plus the total match count.
    async fn query(&self, query: &ScanQuery) -> Result<(Vec<ScanRecord>, u64)>;

    /// Fetch one record. Absent or foreign-owned records are `NotFound`.
    async fn fetch(&self, owner_id: Uuid, id: Uuid) -> Result<ScanRecord>;

    /// Delete one record and return it. Absent or foreign-owned records are `NotFound`.
    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<ScanRecord>;

    /// Delete every record of `owner_id` and return the removed rows.
    async fn delete_all(&self, owner_id: Uuid) -> Result<Vec<ScanRecord>>;
}

// =============================================================================
// BLOB STORAGE
// =============================================================================

/// Blob storage backend for image artifacts.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Write data under `key`, replacing nothing: keys are generated unique.
    async fn write(&self, key: &str, data: &[u8], content_type: &str) -> Result<()>;

    /// Delete data at `key`.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if data exists at `key`.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Publicly retrievable URL of `key`.
    fn public_url(&self, key: &str) -> String;

    /// Inverse of [`StorageBackend::public_url`]; `None` for foreign URLs.
    fn key_from_url(&self, url: &str) -> Option<String>;

    /// Backend identifier for logging.
    fn backend_type(&self) -> &'static str;
}

// =============================================================================
// CLASSIFIER
// =============================================================================

/// A loaded scoring function: normalized image in, class probabilities out.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Score one image. The result has one probability per class ordinate.
    async fn score(&self, tensor: &ImageTensor) -> Result<Vec<f32>>;

    /// Name of the loaded model.
    fn model_name(&self) -> &str;
}

/// Source of a [`Classifier`], invoked once per successful initialization.
#[async_trait]
pub trait ClassifierLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn Classifier>>;
}

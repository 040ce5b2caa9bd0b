//! Two-store commit of prediction artifacts and scan records.
//!
//! Create: artifact first, then the record that references it; a failed record
//! insert deletes the artifact again. Delete: record first, then a best-effort
//! artifact delete. A record therefore never points at a missing artifact,
//! while an orphaned artifact is possible and tolerated.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tracing::{debug, error, warn};
use uuid::Uuid;

use batik_core::{
    defaults, CatalogEntry, Error, NewScanRecord, Result, ScanRecord, ScanRepository,
};
use batik_db::{ArtifactStore, StoredArtifact};

pub const SAVE_FAILED: &str = "Failed to save prediction history";
pub const UPLOAD_FAILED: &str = "Failed to upload image";
pub const DELETE_FAILED: &str = "Failed to delete history";
pub const DELETE_ALL_FAILED: &str = "Failed to delete all history";

/// Coordinates writes across the artifact store and the scan repository.
#[derive(Clone)]
pub struct ProvenanceRecorder {
    scans: Arc<dyn ScanRepository>,
    artifacts: ArtifactStore,
    put_attempts: u32,
    retry_backoff: Duration,
}

impl ProvenanceRecorder {
    pub fn new(scans: Arc<dyn ScanRepository>, artifacts: ArtifactStore) -> Self {
        Self {
            scans,
            artifacts,
            put_attempts: defaults::ARTIFACT_PUT_ATTEMPTS,
            retry_backoff: Duration::from_millis(defaults::ARTIFACT_RETRY_BACKOFF_MS),
        }
    }

    /// Attempts per artifact put, at least one.
    pub fn with_put_attempts(mut self, attempts: u32) -> Self {
        self.put_attempts = attempts.max(1);
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn scans(&self) -> &Arc<dyn ScanRepository> {
        &self.scans
    }

    // =========================================================================
    // CREATE
    // =========================================================================

    /// Store the image, then record the scan that references it.
    pub async fn commit(
        &self,
        owner_id: Uuid,
        image: &[u8],
        file_name: &str,
        entry: &CatalogEntry,
        confidence: u8,
    ) -> Result<ScanRecord> {
        let start = Instant::now();

        let artifact = self.put_with_retry(owner_id, image, file_name).await?;
        debug!(
            subsystem = "provenance",
            op = "commit",
            step = "artifact",
            owner_id = %owner_id,
            artifact_key = %artifact.key,
            "Artifact committed"
        );

        let record = NewScanRecord::from_entry(owner_id, entry, confidence, artifact.url.clone());
        match self.scans.insert(record).await {
            Ok(stored) => {
                debug!(
                    subsystem = "provenance",
                    op = "commit",
                    step = "record",
                    owner_id = %owner_id,
                    scan_id = %stored.id,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Scan recorded"
                );
                Ok(stored)
            }
            Err(insert_err) => {
                warn!(
                    subsystem = "provenance",
                    op = "commit",
                    owner_id = %owner_id,
                    artifact_key = %artifact.key,
                    error = %insert_err,
                    "Scan insert failed, removing artifact"
                );
                self.compensate(&artifact).await;
                Err(Error::Internal(SAVE_FAILED.to_string()))
            }
        }
    }

    async fn put_with_retry(
        &self,
        owner_id: Uuid,
        image: &[u8],
        file_name: &str,
    ) -> Result<StoredArtifact> {
        let mut attempt = 1;
        loop {
            match self.artifacts.put(owner_id, image, file_name).await {
                Ok(artifact) => return Ok(artifact),
                Err(e) if e.is_transient() && attempt < self.put_attempts => {
                    warn!(
                        subsystem = "provenance",
                        op = "put",
                        owner_id = %owner_id,
                        attempt,
                        error = %e,
                        "Artifact put failed, retrying with a new key"
                    );
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(
                        subsystem = "provenance",
                        op = "put",
                        owner_id = %owner_id,
                        attempt,
                        error = %e,
                        "Artifact put failed"
                    );
                    return Err(Error::Internal(UPLOAD_FAILED.to_string()));
                }
            }
        }
    }

    async fn compensate(&self, artifact: &StoredArtifact) {
        if let Err(e) = self.artifacts.delete(&artifact.key).await {
            error!(
                subsystem = "provenance",
                op = "compensate",
                artifact_key = %artifact.key,
                error = %e,
                "Compensating artifact delete failed, artifact orphaned"
            );
        }
    }

    // =========================================================================
    // DELETE
    // =========================================================================

    /// Delete one record, then its artifact. `NotFound` if the record is
    /// absent or owned by someone else.
    pub async fn delete_one(&self, owner_id: Uuid, id: Uuid) -> Result<ScanRecord> {
        let removed = self.scans.delete(owner_id, id).await.map_err(|e| match e {
            Error::NotFound(_) => e,
            other => {
                error!(subsystem = "provenance", op = "delete", owner_id = %owner_id, scan_id = %id, error = %other, "Scan delete failed");
                Error::Internal(DELETE_FAILED.to_string())
            }
        })?;

        self.delete_artifact_of(&removed).await;
        Ok(removed)
    }

    /// Delete every record of `owner_id`, then their artifacts concurrently.
    /// Returns the number of records removed.
    pub async fn delete_all(&self, owner_id: Uuid) -> Result<usize> {
        let removed = self.scans.delete_all(owner_id).await.map_err(|e| {
            error!(subsystem = "provenance", op = "delete_all", owner_id = %owner_id, error = %e, "Bulk scan delete failed");
            Error::Internal(DELETE_ALL_FAILED.to_string())
        })?;

        join_all(removed.iter().map(|record| self.delete_artifact_of(record))).await;

        debug!(
            subsystem = "provenance",
            op = "delete_all",
            owner_id = %owner_id,
            result_count = removed.len(),
            "Scan history cleared"
        );
        Ok(removed.len())
    }

    async fn delete_artifact_of(&self, record: &ScanRecord) {
        let Some(key) = self.artifacts.key_from_url(&record.image_url) else {
            warn!(
                subsystem = "provenance",
                op = "delete",
                scan_id = %record.id,
                "Artifact URL not owned by this store, skipping delete"
            );
            return;
        };

        if let Err(e) = self.artifacts.delete(&key).await {
            warn!(
                subsystem = "provenance",
                op = "delete",
                scan_id = %record.id,
                artifact_key = %key,
                error = %e,
                "Artifact delete failed, artifact orphaned"
            );
        }
    }
}

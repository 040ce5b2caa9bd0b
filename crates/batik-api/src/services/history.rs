//! Owner-scoped scan history queries.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error};
use uuid::Uuid;

use batik_core::{
    defaults, Error, HistoryStats, PageRequest, Paginated, ProvinceCount, Result, ScanOrder,
    ScanQuery, ScanRecord, ScanRepository,
};

use super::provenance::ProvenanceRecorder;

pub const QUERY_TOO_SHORT: &str = "Search query must be at least 2 characters";

/// Reads and deletes scan history on behalf of one owner at a time.
#[derive(Clone)]
pub struct HistoryService {
    scans: Arc<dyn ScanRepository>,
    recorder: ProvenanceRecorder,
}

/// Read failures surface as `Internal` with a fixed message; `NotFound` passes through.
fn read_failure(op: &'static str, message: &'static str) -> impl Fn(Error) -> Error {
    move |e| match e {
        Error::NotFound(_) => e,
        other => {
            error!(subsystem = "history", op, error = %other, "History read failed");
            Error::Internal(message.to_string())
        }
    }
}

impl HistoryService {
    pub fn new(recorder: ProvenanceRecorder) -> Self {
        Self {
            scans: Arc::clone(recorder.scans()),
            recorder,
        }
    }

    /// Newest-first page, optionally filtered by province substring.
    pub async fn list(
        &self,
        owner_id: Uuid,
        page: PageRequest,
        province: Option<&str>,
    ) -> Result<Paginated<ScanRecord>> {
        let mut query = ScanQuery::for_owner(owner_id).page(page.offset(), page.limit() as u64);
        if let Some(province) = province.map(str::trim).filter(|p| !p.is_empty()) {
            query = query.province(province);
        }

        let (records, total) = self
            .scans
            .query(&query)
            .await
            .map_err(read_failure("list", "Failed to get scan history"))?;

        debug!(
            subsystem = "history",
            op = "list",
            owner_id = %owner_id,
            result_count = records.len(),
            total,
            "History page loaded"
        );
        Ok(Paginated::new(records, page, total))
    }

    /// One record; foreign and missing records are both `NotFound`.
    pub async fn get(&self, owner_id: Uuid, id: Uuid) -> Result<ScanRecord> {
        self.scans
            .fetch(owner_id, id)
            .await
            .map_err(read_failure("get", "Failed to get history"))
    }

    /// Case-insensitive substring search over motif name, province, and description.
    pub async fn search(
        &self,
        owner_id: Uuid,
        text: &str,
        page: PageRequest,
    ) -> Result<Paginated<ScanRecord>> {
        let text = text.trim();
        if text.chars().count() < defaults::SEARCH_MIN_QUERY_LEN {
            return Err(Error::InvalidInput(QUERY_TOO_SHORT.to_string()));
        }

        let query = ScanQuery::for_owner(owner_id)
            .search(text)
            .page(page.offset(), page.limit() as u64);
        let (records, total) = self
            .scans
            .query(&query)
            .await
            .map_err(read_failure("search", "Failed to search history"))?;

        debug!(
            subsystem = "history",
            op = "search",
            owner_id = %owner_id,
            query = %text,
            result_count = records.len(),
            "History search completed"
        );
        Ok(Paginated::new(records, page, total))
    }

    pub async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<()> {
        self.recorder.delete_one(owner_id, id).await.map(|_| ())
    }

    /// Remove the owner's whole history; returns how many records it had.
    pub async fn delete_all(&self, owner_id: Uuid) -> Result<usize> {
        self.recorder.delete_all(owner_id).await
    }

    /// Totals and per-province counts derived from a single read.
    pub async fn stats(&self, owner_id: Uuid) -> Result<HistoryStats> {
        let (records, _) = self
            .scans
            .query(&ScanQuery::for_owner(owner_id).order(ScanOrder::OldestFirst))
            .await
            .map_err(read_failure("stats", "Failed to get history stats"))?;

        Ok(summarize(records))
    }
}

/// Aggregate records given oldest first.
pub fn summarize(records: Vec<ScanRecord>) -> HistoryStats {
    let mut provinsi_stats: Vec<ProvinceCount> = Vec::new();
    let mut slot: HashMap<String, usize> = HashMap::new();

    for record in &records {
        match slot.get(&record.province) {
            Some(&idx) => provinsi_stats[idx].count += 1,
            None => {
                slot.insert(record.province.clone(), provinsi_stats.len());
                provinsi_stats.push(ProvinceCount {
                    provinsi: record.province.clone(),
                    count: 1,
                });
            }
        }
    }

    // Strictly greater keeps the first-seen province on ties
    let most_scanned_provinsi = provinsi_stats
        .iter()
        .fold(None::<&ProvinceCount>, |best, candidate| match best {
            Some(top) if candidate.count <= top.count => Some(top),
            _ => Some(candidate),
        })
        .map(|p| p.provinsi.clone());

    provinsi_stats.sort_by(|a, b| b.count.cmp(&a.count));

    HistoryStats {
        total_scans: records.len() as i64,
        provinsi_stats,
        most_scanned_provinsi,
        recent_scan: records.into_iter().last(),
    }
}

//! In-memory metadata and blob stores.
//!
//! Used by tests and local development. Both stores can share a
//! [`StoreEventLog`] so tests can assert cross-store ordering, and both support
//! failure injection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use batik_core::{
    Error, NewScanRecord, Result, ScanOrder, ScanQuery, ScanRecord, ScanRepository,
    StorageBackend,
};

/// One observable mutation of a backing store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    BlobWrite(String),
    BlobDelete(String),
    RecordInsert(Uuid),
    RecordDelete(Uuid),
    RecordDeleteAll(Uuid),
}

/// Ordered log of store events shared between stores.
#[derive(Debug, Clone, Default)]
pub struct StoreEventLog {
    events: Arc<Mutex<Vec<StoreEvent>>>,
}

impl StoreEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: StoreEvent) {
        lock(&self.events).push(event);
    }

    /// Snapshot of all recorded events, oldest first.
    pub fn events(&self) -> Vec<StoreEvent> {
        lock(&self.events).clone()
    }

    pub fn clear(&self) {
        lock(&self.events).clear();
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

// =============================================================================
// SCAN REPOSITORY
// =============================================================================

#[derive(Default)]
struct ScanState {
    records: Vec<ScanRecord>,
    last_created_at: Option<DateTime<Utc>>,
}

/// In-memory [`ScanRepository`].
#[derive(Default)]
pub struct MemoryScanRepository {
    state: Mutex<ScanState>,
    log: StoreEventLog,
    fail_insert: AtomicBool,
    fail_reads: AtomicBool,
    fail_delete: AtomicBool,
}

impl MemoryScanRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record mutations into a shared log.
    pub fn with_log(mut self, log: StoreEventLog) -> Self {
        self.log = log;
        self
    }

    /// Make every insert fail with a database error.
    pub fn fail_inserts(&self, fail: bool) {
        self.fail_insert.store(fail, Ordering::SeqCst);
    }

    /// Make every query and fetch fail with a database error.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every delete fail with a database error.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    /// Number of stored records across all owners.
    pub fn len(&self) -> usize {
        lock(&self.state).records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn injected(flag: &AtomicBool, op: &str) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            Err(Error::Database(sqlx::Error::Protocol(format!(
                "injected {} failure",
                op
            ))))
        } else {
            Ok(())
        }
    }
}

fn newest_first(a: &ScanRecord, b: &ScanRecord) -> std::cmp::Ordering {
    b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
}

#[async_trait]
impl ScanRepository for MemoryScanRepository {
    async fn insert(&self, record: NewScanRecord) -> Result<ScanRecord> {
        Self::injected(&self.fail_insert, "insert")?;

        let mut state = lock(&self.state);
        // Strictly increasing timestamps keep newest-first ordering total.
        let mut created_at = Utc::now();
        if let Some(last) = state.last_created_at {
            if created_at <= last {
                created_at = last + Duration::microseconds(1);
            }
        }
        state.last_created_at = Some(created_at);

        let stored = ScanRecord {
            id: Uuid::now_v7(),
            owner_id: record.owner_id,
            motif_id: record.motif_id,
            motif_name: record.motif_name,
            province: record.province,
            description: record.description,
            occasion: record.occasion,
            confidence: i16::from(record.confidence),
            image_url: record.image_url,
            created_at,
        };
        state.records.push(stored.clone());
        self.log.push(StoreEvent::RecordInsert(stored.id));
        Ok(stored)
    }

    async fn query(&self, query: &ScanQuery) -> Result<(Vec<ScanRecord>, u64)> {
        Self::injected(&self.fail_reads, "query")?;

        let mut matching: Vec<ScanRecord> = lock(&self.state)
            .records
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        matching.sort_by(newest_first);
        if query.order == ScanOrder::OldestFirst {
            matching.reverse();
        }

        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit.map(|l| l as usize).unwrap_or(usize::MAX))
            .collect();
        Ok((page, total))
    }

    async fn fetch(&self, owner_id: Uuid, id: Uuid) -> Result<ScanRecord> {
        Self::injected(&self.fail_reads, "fetch")?;

        lock(&self.state)
            .records
            .iter()
            .find(|r| r.id == id && r.owner_id == owner_id)
            .cloned()
            .ok_or_else(|| Error::NotFound("History not found".to_string()))
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<ScanRecord> {
        Self::injected(&self.fail_delete, "delete")?;

        let mut state = lock(&self.state);
        let pos = state
            .records
            .iter()
            .position(|r| r.id == id && r.owner_id == owner_id)
            .ok_or_else(|| Error::NotFound("History not found".to_string()))?;
        let removed = state.records.remove(pos);
        self.log.push(StoreEvent::RecordDelete(removed.id));
        Ok(removed)
    }

    async fn delete_all(&self, owner_id: Uuid) -> Result<Vec<ScanRecord>> {
        Self::injected(&self.fail_delete, "delete_all")?;

        let mut state = lock(&self.state);
        let (removed, kept): (Vec<_>, Vec<_>) = state
            .records
            .drain(..)
            .partition(|r| r.owner_id == owner_id);
        state.records = kept;
        self.log.push(StoreEvent::RecordDeleteAll(owner_id));
        Ok(removed)
    }
}

// =============================================================================
// BLOB STORE
// =============================================================================

/// Public URL prefix of [`MemoryBackend`] artifacts.
pub const MEMORY_URL_PREFIX: &str = "memory://artifacts/";

/// In-memory [`StorageBackend`].
#[derive(Default)]
pub struct MemoryBackend {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    log: StoreEventLog,
    failing_writes: AtomicU32,
    fail_delete: AtomicBool,
    write_attempts: AtomicU32,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(mut self, log: StoreEventLog) -> Self {
        self.log = log;
        self
    }

    /// Fail the next `count` writes with a transient storage error.
    pub fn fail_next_writes(&self, count: u32) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    /// Make every delete fail with a storage error.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    /// Writes attempted so far, failed ones included.
    pub fn write_attempts(&self) -> u32 {
        self.write_attempts.load(Ordering::SeqCst)
    }

    /// Keys currently stored.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = lock(&self.objects).keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Stored content type of `key`.
    pub fn content_type(&self, key: &str) -> Option<String> {
        lock(&self.objects).get(key).map(|(_, ct)| ct.clone())
    }

    pub fn len(&self) -> usize {
        lock(&self.objects).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn write(&self, key: &str, data: &[u8], content_type: &str) -> Result<()> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(Error::Storage("injected write failure".to_string()));
        }

        lock(&self.objects).insert(key.to_string(), (data.to_vec(), content_type.to_string()));
        self.log.push(StoreEvent::BlobWrite(key.to_string()));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(Error::Storage("injected delete failure".to_string()));
        }
        lock(&self.objects).remove(key);
        self.log.push(StoreEvent::BlobDelete(key.to_string()));
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(lock(&self.objects).contains_key(key))
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}{}", MEMORY_URL_PREFIX, key)
    }

    fn key_from_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(MEMORY_URL_PREFIX)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }
}

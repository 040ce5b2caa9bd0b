//! In-memory index over the static motif catalog.

use std::collections::{HashMap, HashSet};

use rand::seq::SliceRandom;
use tracing::debug;

use batik_core::{
    CatalogEntry, Error, PageRequest, Paginated, ProvinceGroup, ProvinceSummary, Result,
    ScoredEntry,
};

use crate::dictionary;
use crate::fuzzy::{self, FuzzyConfig, IndexedEntry};

/// Read-only catalog built once at startup.
///
/// Entries keep their original insertion order, which every listing and
/// tie-break relies on.
pub struct CatalogIndex {
    entries: Vec<CatalogEntry>,
    by_key: HashMap<String, usize>,
    class_keys: Vec<String>,
    indexed: Vec<IndexedEntry>,
    fuzzy: FuzzyConfig,
}

impl std::fmt::Debug for CatalogIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogIndex")
            .field("entries", &self.entries.len())
            .field("classes", &self.class_keys.len())
            .finish_non_exhaustive()
    }
}

impl CatalogIndex {
    /// Build an index, validating that keys are unique and that every class
    /// ordinate resolves to exactly one entry.
    pub fn new(entries: Vec<CatalogEntry>, class_keys: Vec<String>) -> Result<Self> {
        let mut by_key = HashMap::with_capacity(entries.len());
        for (pos, entry) in entries.iter().enumerate() {
            if entry.key.trim().is_empty() {
                return Err(Error::Config(format!("catalog entry {} has an empty key", pos)));
            }
            if by_key.insert(entry.key.clone(), pos).is_some() {
                return Err(Error::Config(format!("duplicate catalog key: {}", entry.key)));
            }
        }

        if class_keys.is_empty() {
            return Err(Error::Config("class mapping is empty".to_string()));
        }
        for (ordinate, key) in class_keys.iter().enumerate() {
            if !by_key.contains_key(key) {
                return Err(Error::Config(format!(
                    "class ordinate {} maps to unknown catalog key: {}",
                    ordinate, key
                )));
            }
        }

        let indexed = entries.iter().map(IndexedEntry::new).collect();

        debug!(
            subsystem = "search",
            component = "catalog",
            op = "build",
            entries = entries.len(),
            classes = class_keys.len(),
            "Catalog index built"
        );

        Ok(Self {
            entries,
            by_key,
            class_keys,
            indexed,
            fuzzy: FuzzyConfig::default(),
        })
    }

    /// Index over the built-in motif dictionary.
    pub fn builtin() -> Result<Self> {
        Self::new(dictionary::builtin_entries(), dictionary::builtin_class_keys())
    }

    pub fn with_fuzzy_config(mut self, config: FuzzyConfig) -> Self {
        self.fuzzy = config;
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of classifier output ordinates.
    pub fn class_count(&self) -> usize {
        self.class_keys.len()
    }

    /// Catalog key for a classifier ordinate.
    pub fn class_key(&self, ordinate: usize) -> Option<&str> {
        self.class_keys.get(ordinate).map(String::as_str)
    }

    /// Catalog entry for a classifier ordinate.
    pub fn class_entry(&self, ordinate: usize) -> Option<&CatalogEntry> {
        self.class_key(ordinate).and_then(|key| self.lookup(key))
    }

    pub fn lookup(&self, key: &str) -> Option<&CatalogEntry> {
        self.by_key.get(key).map(|&pos| &self.entries[pos])
    }

    /// Exact lookup by key.
    pub fn get(&self, key: &str) -> Result<&CatalogEntry> {
        self.lookup(key)
            .ok_or_else(|| Error::NotFound("Motif not found".to_string()))
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Paginated listing in insertion order, optionally filtered by a
    /// case-insensitive province substring.
    pub fn list(&self, page: PageRequest, province: Option<&str>) -> Paginated<CatalogEntry> {
        match province.map(str::trim).filter(|p| !p.is_empty()) {
            Some(filter) => {
                let needle = filter.to_lowercase();
                let matching: Vec<CatalogEntry> = self
                    .entries
                    .iter()
                    .filter(|e| e.province.to_lowercase().contains(&needle))
                    .cloned()
                    .collect();
                Paginated::from_slice(&matching, page)
            }
            None => Paginated::from_slice(&self.entries, page),
        }
    }

    /// Entries grouped by province: groups by descending size, ties by first
    /// appearance; insertion order within each group.
    pub fn group_by_province(&self) -> Vec<ProvinceGroup> {
        let mut groups: Vec<ProvinceGroup> = Vec::new();
        let mut slot: HashMap<&str, usize> = HashMap::new();

        for entry in &self.entries {
            let idx = *slot.entry(entry.province.as_str()).or_insert_with(|| {
                groups.push(ProvinceGroup {
                    provinsi: entry.province.clone(),
                    count: 0,
                    motifs: Vec::new(),
                });
                groups.len() - 1
            });
            groups[idx].count += 1;
            groups[idx].motifs.push(entry.clone());
        }

        groups.sort_by(|a, b| b.count.cmp(&a.count));
        groups
    }

    /// Distinct provinces, alphabetical, with entry counts.
    pub fn provinces(&self) -> Vec<ProvinceSummary> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for entry in &self.entries {
            *counts.entry(entry.province.as_str()).or_default() += 1;
        }

        let mut summaries: Vec<ProvinceSummary> = counts
            .into_iter()
            .map(|(name, count)| ProvinceSummary {
                name: name.to_string(),
                count,
            })
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        summaries
    }

    /// Fuzzy search across name, province, and description.
    ///
    /// Callers enforce the minimum query length.
    pub fn search(&self, query: &str, limit: usize) -> Vec<ScoredEntry> {
        let results: Vec<ScoredEntry> = fuzzy::rank(&self.indexed, query, limit, &self.fuzzy)
            .into_iter()
            .map(|(pos, relevance_score)| ScoredEntry {
                entry: self.entries[pos].clone(),
                relevance_score,
            })
            .collect();

        debug!(
            subsystem = "search",
            component = "catalog",
            op = "search",
            query = %query,
            limit,
            result_count = results.len(),
            "Catalog search completed"
        );
        results
    }

    /// Entries with a shop link, insertion order, at most `limit`.
    pub fn popular(&self, limit: usize) -> Vec<CatalogEntry> {
        self.entries
            .iter()
            .filter(|e| !e.shop_link.trim().is_empty())
            .take(limit)
            .cloned()
            .collect()
    }

    /// Up to `count` distinct entries sampled uniformly.
    pub fn random(&self, count: usize) -> Vec<CatalogEntry> {
        let mut rng = rand::thread_rng();
        self.entries
            .choose_multiple(&mut rng, count)
            .cloned()
            .collect()
    }

    /// Keys present in the catalog but absent from the class mapping.
    pub fn unclassified_keys(&self) -> Vec<&str> {
        let mapped: HashSet<&str> = self.class_keys.iter().map(String::as_str).collect();
        self.entries
            .iter()
            .map(|e| e.key.as_str())
            .filter(|k| !mapped.contains(k))
            .collect()
    }
}

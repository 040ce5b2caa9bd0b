//! Approximate text relevance for catalog search.
//!
//! Each query token takes its best match among a field's tokens: 1.0 when the
//! field contains it verbatim, otherwise normalized Levenshtein similarity.
//! A field scores the mean over query tokens; an entry scores the best
//! weighted field. Scores map to integer relevance in `[0, 100]`.

use tracing::trace;

use batik_core::{defaults, CatalogEntry};

/// Field weights and cutoff for fuzzy scoring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyConfig {
    pub name_weight: f64,
    pub province_weight: f64,
    pub description_weight: f64,
    /// Entries scoring below this relevance are dropped.
    pub min_relevance: u8,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        Self {
            name_weight: defaults::SEARCH_WEIGHT_NAME,
            province_weight: defaults::SEARCH_WEIGHT_PROVINCE,
            description_weight: defaults::SEARCH_WEIGHT_DESCRIPTION,
            min_relevance: defaults::SEARCH_MIN_RELEVANCE,
        }
    }
}

/// Lowercased alphanumeric tokens of `text`.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Pre-tokenized searchable text of one field.
struct FieldText {
    lower: String,
    tokens: Vec<String>,
}

impl FieldText {
    fn new(text: &str) -> Self {
        Self {
            lower: text.to_lowercase(),
            tokens: tokenize(text),
        }
    }

    fn token_similarity(&self, query_token: &str) -> f64 {
        if self.lower.contains(query_token) {
            return 1.0;
        }
        self.tokens
            .iter()
            .map(|t| strsim::normalized_levenshtein(query_token, t))
            .fold(0.0, f64::max)
    }

    fn score(&self, query_tokens: &[String]) -> f64 {
        if query_tokens.is_empty() {
            return 0.0;
        }
        let sum: f64 = query_tokens.iter().map(|q| self.token_similarity(q)).sum();
        sum / query_tokens.len() as f64
    }
}

/// Pre-tokenized entry, built once per catalog.
pub(crate) struct IndexedEntry {
    name: FieldText,
    province: FieldText,
    description: FieldText,
}

impl IndexedEntry {
    pub(crate) fn new(entry: &CatalogEntry) -> Self {
        Self {
            name: FieldText::new(&entry.name),
            province: FieldText::new(&entry.province),
            description: FieldText::new(&entry.description),
        }
    }

    /// Relevance of this entry for `query_tokens`, in `[0, 100]`.
    pub(crate) fn relevance(&self, query_tokens: &[String], config: &FuzzyConfig) -> u8 {
        let score = [
            self.name.score(query_tokens) * config.name_weight,
            self.province.score(query_tokens) * config.province_weight,
            self.description.score(query_tokens) * config.description_weight,
        ]
        .into_iter()
        .fold(0.0, f64::max);
        to_relevance(score)
    }
}

/// Map a raw score to an integer percentage, clamped to `[0, 100]`.
pub fn to_relevance(score: f64) -> u8 {
    if score.is_nan() {
        return 0;
    }
    (score * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Rank `indexed` for `query`: at most `limit` `(position, relevance)` pairs,
/// relevance descending, ties in catalog order.
pub(crate) fn rank(
    indexed: &[IndexedEntry],
    query: &str,
    limit: usize,
    config: &FuzzyConfig,
) -> Vec<(usize, u8)> {
    let query_tokens = tokenize(query);
    if query_tokens.is_empty() || limit == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(usize, u8)> = indexed
        .iter()
        .enumerate()
        .map(|(pos, entry)| {
            let relevance = entry.relevance(&query_tokens, config);
            trace!(subsystem = "search", component = "fuzzy", pos, relevance, "Scored entry");
            (pos, relevance)
        })
        .filter(|(_, relevance)| *relevance >= config.min_relevance)
        .collect();

    // Stable sort keeps catalog order among equal relevance.
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.truncate(limit);
    scored
}

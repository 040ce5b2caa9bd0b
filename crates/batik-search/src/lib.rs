//! # batik-search
//!
//! Static motif catalog for batik-scan.
//!
//! This crate provides:
//! - The built-in motif dictionary and classifier class mapping
//! - An in-memory catalog index (lookup, listing, province grouping)
//! - Fuzzy relevance search over name, province, and description
//!
//! ## Example
//!
//! ```ignore
//! use batik_search::CatalogIndex;
//!
//! let catalog = CatalogIndex::builtin()?;
//! let hits = catalog.search("parang", 10);
//! assert_eq!(hits[0].entry.key, "yogya_parang");
//! ```

pub mod catalog;
pub mod dictionary;
pub mod fuzzy;

pub use catalog::CatalogIndex;
pub use dictionary::{builtin_class_keys, builtin_entries, CLASS_KEYS};
pub use fuzzy::{to_relevance, tokenize, FuzzyConfig};

//! Service layer for business logic.

pub mod history;
pub mod prediction;
pub mod provenance;

pub use history::HistoryService;
pub use prediction::PredictionService;
pub use provenance::ProvenanceRecorder;

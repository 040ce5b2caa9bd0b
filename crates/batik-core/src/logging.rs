//! Structured logging field name constants for batik-scan.
//!
//! All crates use these names for consistent structured logging fields so log
//! aggregation can query by the same keys across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service or orphaned data, requires operator attention |
//! | WARN  | Recoverable issue, best-effort cleanup failed |
//! | INFO  | Lifecycle events, prediction outcomes |
//! | DEBUG | Saga steps, decision points, config choices |
//! | TRACE | Per-item iteration (search scoring) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated from the HTTP layer.
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db", "storage", "inference", "search"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "gateway", "gate", "provenance", "history", "catalog"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "commit", "compensate", "delete_all", "score"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Owner (user) id of a scan.
pub const OWNER_ID: &str = "owner_id";

/// Scan record id.
pub const SCAN_ID: &str = "scan_id";

/// Blob store key of an artifact.
pub const ARTIFACT_KEY: &str = "artifact_key";

/// Catalog key of a motif.
pub const MOTIF_ID: &str = "motif_id";

/// Search query text.
pub const QUERY: &str = "query";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned.
pub const RESULT_COUNT: &str = "result_count";

/// Integer confidence percentage of a prediction.
pub const CONFIDENCE: &str = "confidence";

/// Attempt number of a retried step.
pub const ATTEMPT: &str = "attempt";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

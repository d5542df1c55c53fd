use thiserror::Error;

/// Unified error type for the entire allocation-core library.
///
/// Only structural problems are errors. Percentage sums that miss 100,
/// negative values and blank names are validation warnings and live in
/// the `ValidationReport` instead.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Import / Export ─────────────────────────────────────────────
    #[error("Invalid allocation structure: {0}")]
    InvalidStructure(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("CSV error: {0}")]
    Csv(String),

    // ── File I/O (native only) ──────────────────────────────────────
    #[error("File I/O error: {0}")]
    FileIO(String),

    // ── Business Logic ──────────────────────────────────────────────
    #[error("Cannot distribute over an empty allocation: {0}")]
    EmptyAllocation(String),

    #[error("Asset class not found: {0}")]
    ClassNotFound(String),

    #[error("Total patrimony must be a finite, non-negative amount (got {0})")]
    InvalidPatrimony(f64),
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<csv::Error> for CoreError {
    fn from(e: csv::Error) -> Self {
        CoreError::Csv(e.to_string())
    }
}

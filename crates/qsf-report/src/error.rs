//! Error types for report generation.

use thiserror::Error;

/// Errors that can occur while writing the table or the import script.
#[derive(Debug, Error)]
pub enum ReportError {
    // === Precondition Errors ===
    /// No destination was supplied for an artifact.
    #[error("no destination provided for the {artifact}")]
    MissingSink { artifact: &'static str },

    // === Stream Errors ===
    /// The CSV writer failed.
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Writing or flushing an artifact failed.
    #[error("failed to write the {artifact}: {source}")]
    Io {
        artifact: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

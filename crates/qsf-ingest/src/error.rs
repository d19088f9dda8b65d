//! Error types for survey ingestion.

use thiserror::Error;

use qsf_model::ModelError;

/// Errors that can occur while reading a survey definition or its responses.
#[derive(Debug, Error)]
pub enum IngestError {
    // === Stream Errors ===
    /// Failed to read the input stream.
    #[error("failed to read {document}: {source}")]
    Read {
        document: &'static str,
        #[source]
        source: std::io::Error,
    },

    // === Definition Document Errors ===
    /// The definition document is not valid JSON or not an object.
    #[error("survey definition is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A required top-level section is absent.
    #[error("survey definition has no {field}")]
    MissingMetadata { field: &'static str },

    /// A survey element matches no known payload shape for its tag.
    #[error("survey element {index} ({element}) is malformed: {reason}")]
    MalformedElement {
        index: usize,
        element: String,
        reason: String,
    },

    // === Response Document Errors ===
    /// The response document is not well-formed XML.
    #[error("response document is not valid XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// An answer element carries text that cannot be decoded.
    #[error("cannot decode text of <{tag}>: {reason}")]
    XmlText { tag: String, reason: String },

    /// Two answers of one response collapsed onto the same key.
    #[error("response {response_id}: {source}")]
    DuplicateAnswer {
        response_id: String,
        #[source]
        source: ModelError,
    },
}

impl IngestError {
    /// Whether a caller may report this error and carry on with other input.
    ///
    /// Duplicate answers mean the survey uses a loop/merge layout that cannot
    /// be flattened without losing data; processing must stop.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::DuplicateAnswer { .. })
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

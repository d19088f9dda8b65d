//! Survey ingestion.
//!
//! Reads the two documents a survey platform exports: the JSON survey
//! definition (`.qsf`) and the XML response export. Both readers take an
//! already-open stream and never touch the filesystem.

pub mod error;
pub mod qsf;
pub mod responses;

pub use error::{IngestError, Result};
pub use qsf::{
    ParsedSurvey, UnresolvedDynamicChoices, UnresolvedReason, parse_survey, parse_survey_slice,
    resolve_dynamic_choices,
};
pub use responses::{attach_responses, read_responses, read_responses_slice};

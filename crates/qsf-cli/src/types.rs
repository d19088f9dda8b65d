use std::path::PathBuf;

use qsf_ingest::UnresolvedDynamicChoices;

/// Outcome of one conversion run.
#[derive(Debug)]
pub struct ConvertResult {
    pub survey_id: String,
    pub title: String,
    pub questions: usize,
    /// Question columns, excluding the fixed leading columns.
    pub columns: usize,
    pub factor_columns: usize,
    pub responses: usize,
    pub unresolved: Vec<UnresolvedDynamicChoices>,
    pub csv_path: PathBuf,
    pub r_script_path: Option<PathBuf>,
    pub survey_dump_path: Option<PathBuf>,
}

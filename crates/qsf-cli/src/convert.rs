//! The conversion pipeline: definition, responses, then output files.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, info_span, warn};

use qsf_ingest::{IngestError, attach_responses, parse_survey};
use qsf_model::Survey;
use qsf_report::{RScriptOptions, write_csv, write_r_script};

use crate::types::ConvertResult;

/// Exit code for inputs that cannot be flattened without losing answers.
pub const EXIT_UNRECOVERABLE: i32 = 2;

/// Everything a conversion run needs.
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    pub survey_path: PathBuf,
    pub responses_path: PathBuf,
    pub output_dir: PathBuf,
    /// File stem shared by the CSV table and the R script.
    pub stem: String,
    pub write_r_script: bool,
    /// Path the R script reads the table from; the CSV path as written when unset.
    pub csv_path_in_script: Option<String>,
    /// Write the parsed survey model as JSON to this path.
    pub survey_dump: Option<PathBuf>,
    pub r_options: RScriptOptions,
}

impl ConvertRequest {
    /// Request with outputs next to the survey file, named after its stem.
    pub fn new(survey_path: impl Into<PathBuf>, responses_path: impl Into<PathBuf>) -> Self {
        let survey_path = survey_path.into();
        let output_dir = survey_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let stem = survey_path
            .file_stem()
            .map_or_else(|| "survey".to_string(), |s| s.to_string_lossy().into_owned());
        Self {
            survey_path,
            responses_path: responses_path.into(),
            output_dir,
            stem,
            write_r_script: true,
            csv_path_in_script: None,
            survey_dump: None,
            r_options: RScriptOptions::default(),
        }
    }

    pub fn csv_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.csv", self.stem))
    }

    pub fn r_script_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.R", self.stem))
    }
}

/// Run a full conversion.
///
/// Both inputs are read completely before any output file is created, so a
/// failed parse leaves the output directory untouched.
pub fn run_convert(request: &ConvertRequest) -> Result<ConvertResult> {
    let span = info_span!("convert", survey = %request.survey_path.display());
    let _guard = span.enter();

    let loaded = load_survey(request)?;
    let survey = &loaded.survey;
    let (column_count, factor_columns) = {
        let columns = survey.question_columns();
        let factors = columns
            .iter()
            .filter(|(_, column)| column.column_type.is_factor())
            .count();
        (columns.len(), factors)
    };

    fs::create_dir_all(&request.output_dir).with_context(|| {
        format!(
            "failed to create output directory {}",
            request.output_dir.display()
        )
    })?;

    let csv_path = request.csv_path();
    {
        let _span = info_span!("write_csv", path = %csv_path.display()).entered();
        let file = create_output(&csv_path)?;
        write_csv(survey, Some(BufWriter::new(file)))
            .with_context(|| format!("failed to write {}", csv_path.display()))?;
    }

    let r_script_path = if request.write_r_script {
        let path = request.r_script_path();
        let _span = info_span!("write_r_script", path = %path.display()).entered();
        let csv_ref = request
            .csv_path_in_script
            .clone()
            .unwrap_or_else(|| csv_path.display().to_string());
        let file = create_output(&path)?;
        write_r_script(
            survey,
            Some(BufWriter::new(file)),
            &csv_ref,
            &request.r_options,
        )
        .with_context(|| format!("failed to write {}", path.display()))?;
        Some(path)
    } else {
        None
    };

    let survey_dump_path = match &request.survey_dump {
        Some(path) => {
            dump_survey(survey, path)?;
            Some(path.clone())
        }
        None => None,
    };

    let result = ConvertResult {
        survey_id: survey.id.clone(),
        title: survey.title.clone(),
        questions: survey.questions.len(),
        columns: column_count,
        factor_columns,
        responses: survey.responses.len(),
        unresolved: loaded.unresolved,
        csv_path,
        r_script_path,
        survey_dump_path,
    };
    info!(
        questions = result.questions,
        columns = result.columns,
        responses = result.responses,
        "conversion complete"
    );
    Ok(result)
}

/// Exit code for a failed run.
pub fn exit_code_for(error: &anyhow::Error) -> i32 {
    let unrecoverable = error
        .chain()
        .filter_map(|cause| cause.downcast_ref::<IngestError>())
        .any(|cause| !cause.is_recoverable());
    if unrecoverable { EXIT_UNRECOVERABLE } else { 1 }
}

struct LoadedSurvey {
    survey: Survey,
    unresolved: Vec<qsf_ingest::UnresolvedDynamicChoices>,
}

fn load_survey(request: &ConvertRequest) -> Result<LoadedSurvey> {
    let parsed = {
        let _span = info_span!("parse_survey").entered();
        let file = open_input(&request.survey_path)?;
        parse_survey(BufReader::new(file)).with_context(|| {
            format!(
                "failed to parse survey definition {}",
                request.survey_path.display()
            )
        })?
    };
    if !parsed.unresolved.is_empty() {
        warn!(
            count = parsed.unresolved.len(),
            "some dynamic choice lists could not be resolved"
        );
    }

    let mut survey = parsed.survey;
    {
        let _span = info_span!("read_responses").entered();
        let file = open_input(&request.responses_path)?;
        attach_responses(&mut survey, BufReader::new(file)).with_context(|| {
            format!(
                "failed to read responses {}",
                request.responses_path.display()
            )
        })?;
    }

    Ok(LoadedSurvey {
        survey,
        unresolved: parsed.unresolved,
    })
}

fn dump_survey(survey: &Survey, path: &Path) -> Result<()> {
    let file = create_output(path)?;
    write_survey_json(survey, BufWriter::new(file))
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "wrote survey model");
    Ok(())
}

/// Serialize `survey` as pretty JSON and flush `writer`.
fn write_survey_json<W: Write>(survey: &Survey, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, survey)?;
    writer.flush()?;
    Ok(())
}

fn open_input(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("failed to open {}", path.display()))
}

fn create_output(path: &Path) -> Result<File> {
    File::create(path).with_context(|| format!("failed to create {}", path.display()))
}

//! CSV table export.

use std::io::Write;

use csv::WriterBuilder;
use tracing::info;

use qsf_model::{Response, Survey};

use crate::error::{ReportError, Result};

const ARTIFACT: &str = "CSV table";

/// Write the survey's responses as a CSV table.
///
/// The header is `id,finished,progress,duration` followed by every question
/// column in export order. Each response becomes one row of exactly the
/// header's width. Returns the number of data rows written.
pub fn write_csv<W: Write>(survey: &Survey, sink: Option<W>) -> Result<usize> {
    let sink = sink.ok_or(ReportError::MissingSink { artifact: ARTIFACT })?;
    let mut writer = WriterBuilder::new().from_writer(sink);

    writer.write_record(survey.header())?;

    let columns = survey.question_columns();
    for response in &survey.responses {
        let mut record = fixed_fields(response);
        record.extend(
            columns
                .iter()
                .map(|(question, column)| question.render_column(column, response)),
        );
        writer.write_record(&record)?;
    }

    writer.flush().map_err(|source| ReportError::Io {
        artifact: ARTIFACT,
        source,
    })?;

    info!(
        rows = survey.responses.len(),
        columns = columns.len() + 4,
        "wrote CSV table"
    );
    Ok(survey.responses.len())
}

/// Render the CSV table into a string.
pub fn render_csv(survey: &Survey) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(survey, Some(&mut buffer))?;
    String::from_utf8(buffer).map_err(|err| ReportError::Io {
        artifact: ARTIFACT,
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, err),
    })
}

fn fixed_fields(response: &Response) -> Vec<String> {
    vec![
        response.id.clone(),
        response.finished.to_string(),
        response.progress.to_string(),
        response.duration.to_string(),
    ]
}

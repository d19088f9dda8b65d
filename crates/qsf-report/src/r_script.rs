//! R import-script generation.
//!
//! The script reads the CSV table written by [`crate::write_csv`] with an
//! explicit column specification in header order. Categorical columns point at
//! shared level-set constants declared before the import and removed after it.

use std::fmt::Write as _;
use std::io::Write;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use qsf_model::{Column, ColumnType, Levels, Question, Survey};

use crate::error::{ReportError, Result};
use crate::scale::{NOT_GROUPED_LEVEL, ScaleRegistry};

const ARTIFACT: &str = "R script";

/// Column specifications for the leading fixed columns.
const FIXED_COLUMN_TYPES: [(&str, &str); 4] = [
    ("id", "col_character()"),
    ("finished", "col_logical()"),
    ("progress", "col_integer()"),
    ("duration", "col_integer()"),
];

const RESERVED_WORDS: [&str; 20] = [
    "if", "else", "repeat", "while", "function", "for", "next", "break", "TRUE", "FALSE", "NULL",
    "Inf", "NaN", "NA", "NA_integer_", "NA_real_", "NA_character_", "NA_complex_", "in", "T",
];

static SYNTACTIC_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z]|\.[A-Za-z._]|\.$)[A-Za-z0-9._]*$").expect("Invalid R name regex")
});

/// Options for R script generation.
#[derive(Debug, Clone)]
pub struct RScriptOptions {
    /// Package attached at the top of the script; must provide `read_csv`.
    pub library: String,
    /// Variable the imported data frame is assigned to.
    pub data_var: String,
    /// Comment line written first, if any.
    pub banner: Option<String>,
}

impl Default for RScriptOptions {
    fn default() -> Self {
        Self {
            library: "tidyverse".to_string(),
            data_var: "data".to_string(),
            banner: Some(format!("Generated by qsf-convert {}", env!("CARGO_PKG_VERSION"))),
        }
    }
}

/// Generate an R script importing the CSV table at `csv_path`.
pub fn generate_r_script(survey: &Survey, csv_path: &str, options: &RScriptOptions) -> String {
    let mut registry = ScaleRegistry::new();
    let mut specs = Vec::new();
    for (name, spec) in FIXED_COLUMN_TYPES {
        specs.push((name.to_string(), spec.to_string()));
    }
    for (question, column) in survey.question_columns() {
        let spec = column_spec(question, &column, &mut registry);
        specs.push((column.name, spec));
    }
    debug!(
        columns = specs.len(),
        scales = registry.len(),
        "built R column specification"
    );

    let mut script = String::new();
    if let Some(banner) = &options.banner {
        let _ = writeln!(script, "# {banner}");
    }
    if !survey.title.is_empty() {
        let _ = writeln!(script, "# Survey: {}", single_line(&survey.title));
    }
    if !script.is_empty() {
        script.push('\n');
    }

    let _ = writeln!(script, "library({})", options.library);
    script.push('\n');
    let _ = writeln!(script, "input_path <- {}", r_string(csv_path));

    if !registry.is_empty() {
        script.push('\n');
        for scale in registry.scales() {
            let levels: Vec<String> = scale.labels.iter().map(|label| r_string(label)).collect();
            let _ = writeln!(script, "{} <- c({})", scale.name, levels.join(", "));
        }
    }

    script.push('\n');
    let _ = writeln!(script, "message(\"Reading \", input_path)");
    let _ = writeln!(script, "{} <- read_csv(", options.data_var);
    let _ = writeln!(script, "  input_path,");
    let _ = writeln!(script, "  col_types = cols(");
    let last = specs.len().saturating_sub(1);
    for (index, (name, spec)) in specs.iter().enumerate() {
        let separator = if index == last { "" } else { "," };
        let _ = writeln!(script, "    {} = {spec}{separator}", r_name(name));
    }
    let _ = writeln!(script, "  )");
    let _ = writeln!(script, ")");

    script.push('\n');
    let mut removed = vec!["input_path".to_string()];
    removed.extend(registry.scales().map(|scale| scale.name.clone()));
    let _ = writeln!(script, "rm({})", removed.join(", "));

    script
}

/// Write the R script to `sink`.
pub fn write_r_script<W: Write>(
    survey: &Survey,
    sink: Option<W>,
    csv_path: &str,
    options: &RScriptOptions,
) -> Result<()> {
    let mut sink = sink.ok_or(ReportError::MissingSink { artifact: ARTIFACT })?;
    let script = generate_r_script(survey, csv_path, options);
    sink.write_all(script.as_bytes())
        .and_then(|()| sink.flush())
        .map_err(|source| ReportError::Io {
            artifact: ARTIFACT,
            source,
        })?;
    info!(bytes = script.len(), "wrote R script");
    Ok(())
}

fn column_spec(question: &Question, column: &Column, registry: &mut ScaleRegistry) -> String {
    match column.column_type {
        ColumnType::Factor(levels) => factor_spec(question, levels, registry),
        ColumnType::Text => "col_character()".to_string(),
        other => format!("{}()", other.import_keyword().unwrap_or("col_guess")),
    }
}

fn factor_spec(question: &Question, levels: Levels, registry: &mut ScaleRegistry) -> String {
    let mut labels: Vec<String> = question
        .levels(levels)
        .into_iter()
        .map(|choice| choice.label)
        .collect();
    if labels.is_empty() {
        return "col_factor()".to_string();
    }
    if levels == Levels::Groups {
        labels.push(NOT_GROUPED_LEVEL.to_string());
    }
    let scale = registry.intern(labels);
    if question.levels_ordered(levels) {
        format!("col_factor(levels = {scale}, ordered = TRUE)")
    } else {
        format!("col_factor(levels = {scale})")
    }
}

/// Quote `value` as an R string literal.
fn r_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for ch in value.chars() {
        match ch {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(quoted, "\\u{{{:04x}}}", u32::from(c));
            }
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Column name as an argument name, backquoted unless syntactic.
fn r_name(name: &str) -> String {
    if SYNTACTIC_NAME.is_match(name) && !RESERVED_WORDS.contains(&name) {
        name.to_string()
    } else {
        format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

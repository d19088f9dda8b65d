use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "qsf-convert",
    version,
    about = "Convert a survey export to a CSV table and an R import script",
    long_about = "Convert a survey export to a CSV table and an R import script.\n\n\
                  Reads the survey definition (.qsf) and the XML response export, then \
                  writes <DIR>/<STEM>.csv and <DIR>/<STEM>.R."
)]
pub struct Cli {
    /// Survey definition file (.qsf)
    #[arg(value_name = "SURVEY")]
    pub survey: PathBuf,

    /// XML response export
    #[arg(value_name = "RESPONSES")]
    pub responses: PathBuf,

    /// Output directory (defaults to the survey file's directory)
    #[arg(long = "output-dir", short = 'o', value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// File stem for the outputs (defaults to the survey file's stem)
    #[arg(long = "name", value_name = "STEM")]
    pub name: Option<String>,

    /// Only write the CSV table
    #[arg(long = "no-r-script")]
    pub no_r_script: bool,

    /// Path the R script reads the table from (defaults to the written CSV path)
    #[arg(long = "csv-path-in-script", value_name = "PATH")]
    pub csv_path_in_script: Option<String>,

    /// R package attached before the import; must provide read_csv
    #[arg(long = "r-library", value_name = "PACKAGE", default_value = "tidyverse")]
    pub r_library: String,

    /// Also write the parsed survey model as JSON
    #[arg(long = "dump-survey", value_name = "PATH")]
    pub dump_survey: Option<PathBuf>,

    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    #[command(flatten)]
    pub color: Color,

    /// Set log level explicitly (overrides -v/-q flags)
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format
    #[arg(long = "log-format", value_enum, default_value = "pretty", global = true)]
    pub log_format: LogFormatArg,

    /// Append logs to this file instead of stderr
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    /// Human-readable output
    Pretty,
    /// Single-line output
    Compact,
    /// Machine-readable JSON
    Json,
}

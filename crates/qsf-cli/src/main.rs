//! `qsf-convert`: survey export to CSV table and R import script.

mod cli;
mod summary;

use std::io::IsTerminal;

use clap::{ColorChoice, Parser};
use tracing::level_filters::LevelFilter;

use qsf_cli::convert::{ConvertRequest, exit_code_for, run_convert};
use qsf_cli::logging::{LogConfig, LogFormat, init_logging};
use qsf_report::RScriptOptions;

use crate::cli::{Cli, LogFormatArg, LogLevelArg};
use crate::summary::print_summary;

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();

    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("Failed to initialize logging: {error}");
        std::process::exit(1);
    }

    let request = request_from_cli(&cli);
    let exit_code = match run_convert(&request) {
        Ok(result) => {
            print_summary(&result);
            0
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            exit_code_for(&error)
        }
    };

    std::process::exit(exit_code);
}

fn request_from_cli(cli: &Cli) -> ConvertRequest {
    let mut request = ConvertRequest::new(&cli.survey, &cli.responses);
    if let Some(dir) = &cli.output_dir {
        request.output_dir.clone_from(dir);
    }
    if let Some(name) = &cli.name {
        request.stem.clone_from(name);
    }
    request.write_r_script = !cli.no_r_script;
    request.csv_path_in_script.clone_from(&cli.csv_path_in_script);
    request.survey_dump.clone_from(&cli.dump_survey);
    request.r_options = RScriptOptions {
        library: cli.r_library.clone(),
        ..RScriptOptions::default()
    };
    request
}

fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        // RUST_LOG applies only when no level was asked for on the command line.
        use_env_filter: !cli.verbosity.is_present() && cli.log_level.is_none(),
        ..LogConfig::default()
    };

    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }

    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };

    config.log_file.clone_from(&cli.log_file);
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && std::io::stderr().is_terminal(),
    };

    config
}

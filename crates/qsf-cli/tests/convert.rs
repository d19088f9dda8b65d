//! End-to-end conversion of fixture exports.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use qsf_cli::convert::{ConvertRequest, EXIT_UNRECOVERABLE, exit_code_for, run_convert};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("qsf-ingest")
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn request(output_dir: &std::path::Path) -> ConvertRequest {
    let mut request = ConvertRequest::new(fixture("survey.qsf"), fixture("responses.xml"));
    request.output_dir = output_dir.join("out");
    request.stem = "lunch".to_string();
    request.csv_path_in_script = Some("lunch.csv".to_string());
    request
}

#[test]
fn writes_table_and_script() {
    let dir = tempfile::tempdir().expect("tempdir");
    let result = run_convert(&request(dir.path())).expect("convert");

    assert_eq!(result.title, "Lunch preferences");
    assert_eq!(result.responses, 3);
    assert_eq!(result.columns, 7);
    assert!(result.unresolved.is_empty());

    let csv = fs::read_to_string(&result.csv_path).expect("read csv");
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("id,finished,progress,duration,Q1,Q4_1,Q4_2,Q4_3,Q4_4,Q4_2_text,Q4_4_text")
    );
    assert!(
        lines
            .next()
            .is_some_and(|line| line.starts_with("R_1,true,100,131,Blue,TRUE,TRUE,"))
    );

    let script_path = result.r_script_path.expect("script written");
    assert_eq!(script_path, dir.path().join("out").join("lunch.R"));
    let script = fs::read_to_string(script_path).expect("read script");
    assert!(script.contains("input_path <- \"lunch.csv\"\n"));
    assert!(script.contains("library(tidyverse)\n"));
    assert!(script.contains("    Q1 = col_factor(levels = scale_"));
    assert!(script.trim_end().ends_with(')'));
}

#[test]
fn script_can_be_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut request = request(dir.path());
    request.write_r_script = false;
    let result = run_convert(&request).expect("convert");

    assert!(result.r_script_path.is_none());
    assert!(result.csv_path.exists());
    assert!(!request.r_script_path().exists());
}

#[test]
fn survey_model_dump_is_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut request = request(dir.path());
    let dump = dir.path().join("survey.json");
    request.survey_dump = Some(dump.clone());
    run_convert(&request).expect("convert");

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dump).expect("read dump")).expect("json");
    assert_eq!(value["title"], "Lunch preferences");
    assert_eq!(value["question_order"][1], "QID1");
    assert!(value.get("responses").is_none());
}

#[test]
fn duplicate_answers_abort_before_writing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let responses = dir.path().join("looped.xml");
    fs::write(
        &responses,
        "<Responses><Response>\
         <_recordId>R_9</_recordId>\
         <_1_QID1>1</_1_QID1>\
         <_2_QID1>2</_2_QID1>\
         </Response></Responses>",
    )
    .expect("write responses");

    let mut request = request(dir.path());
    request.responses_path = responses;
    let error = run_convert(&request).expect_err("duplicate answers");

    assert_eq!(exit_code_for(&error), EXIT_UNRECOVERABLE);
    assert!(format!("{error:#}").contains("R_9"));
    assert!(!request.output_dir.exists());
}

#[test]
fn binary_converts_and_reports_missing_input() {
    let dir = tempfile::tempdir().expect("tempdir");
    let status = Command::new(env!("CARGO_BIN_EXE_qsf-convert"))
        .arg(fixture("variants.qsf"))
        .arg(fixture("variants.xml"))
        .arg("--output-dir")
        .arg(dir.path())
        .arg("--name")
        .arg("variants")
        .arg("--quiet")
        .status()
        .expect("run binary");
    assert!(status.success());
    assert!(dir.path().join("variants.csv").exists());
    assert!(dir.path().join("variants.R").exists());

    let output = Command::new(env!("CARGO_BIN_EXE_qsf-convert"))
        .arg(dir.path().join("missing.qsf"))
        .arg(fixture("variants.xml"))
        .arg("--output-dir")
        .arg(dir.path())
        .output()
        .expect("run binary");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to open"));
}

//! Table and script generation from fixture exports.

use std::fs::File;
use std::path::PathBuf;

use proptest::prelude::*;

use qsf_ingest::{attach_responses, parse_survey};
use qsf_model::{Choice, FIXED_COLUMNS, Question, QuestionType, Response, Survey};
use qsf_report::{RScriptOptions, generate_r_script, render_csv, write_csv, write_r_script};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("qsf-ingest")
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load(survey: &str, responses: &str) -> Survey {
    let file = File::open(fixture(survey)).expect("open survey fixture");
    let mut survey = parse_survey(file).expect("parse survey").survey;
    let file = File::open(fixture(responses)).expect("open responses fixture");
    attach_responses(&mut survey, file).expect("read responses");
    survey
}

fn options() -> RScriptOptions {
    RScriptOptions {
        banner: Some("test banner".to_string()),
        ..RScriptOptions::default()
    }
}

#[test]
fn lunch_survey_csv() {
    let survey = load("survey.qsf", "responses.xml");
    let csv = render_csv(&survey).expect("render CSV");
    insta::assert_snapshot!(csv.trim_end(), @r#"
id,finished,progress,duration,Q1,Q4_1,Q4_2,Q4_3,Q4_4,Q4_2_text,Q4_4_text
R_1,true,100,131,Blue,TRUE,TRUE,,,"Tomato, ""fresh""",
R_2,false,40,40,Red,,,,,,
R_3,true,100,65,,,,TRUE,TRUE,,"Noodles
with chili"
"#);
}

#[test]
fn lunch_survey_script() {
    let survey = load("survey.qsf", "responses.xml");
    let script = generate_r_script(&survey, "out/lunch.csv", &options());
    insta::assert_snapshot!(script.trim_end(), @r#"
# test banner
# Survey: Lunch preferences

library(tidyverse)

input_path <- "out/lunch.csv"

scale_70326044cacbe114961d01f3bfc4a0832c6d9254c69c008e05a206182b4eb804 <- c("Red", "Green", "Blue", "No response")

message("Reading ", input_path)
data <- read_csv(
  input_path,
  col_types = cols(
    id = col_character(),
    finished = col_logical(),
    progress = col_integer(),
    duration = col_integer(),
    Q1 = col_factor(levels = scale_70326044cacbe114961d01f3bfc4a0832c6d9254c69c008e05a206182b4eb804),
    Q4_1 = col_logical(),
    Q4_2 = col_logical(),
    Q4_3 = col_logical(),
    Q4_4 = col_logical(),
    Q4_2_text = col_character(),
    Q4_4_text = col_character()
  )
)

rm(input_path, scale_70326044cacbe114961d01f3bfc4a0832c6d9254c69c008e05a206182b4eb804)
"#);
}

#[test]
fn variants_script_declares_each_scale_once() {
    let survey = load("variants.qsf", "variants.xml");
    let script = generate_r_script(&survey, "variants.csv", &options());

    let declared: Vec<&str> = script
        .lines()
        .filter(|line| line.starts_with("scale_"))
        .filter_map(|line| line.split(" <- ").next())
        .collect();
    let mut sorted = declared.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(declared, sorted, "scales must be unique and sorted by name");

    // Matrix scale points, ranks 1..3, ranks 1..2 and the pick-group-rank groups.
    assert_eq!(declared.len(), 4);
    for name in &declared {
        assert!(script.contains(&format!("levels = {name}")), "{name} unused");
    }

    let teardown = script
        .lines()
        .find(|line| line.starts_with("rm("))
        .expect("teardown line");
    assert_eq!(teardown, format!("rm(input_path, {})", declared.join(", ")));

    assert!(script.contains("    Odd = col_factor(),"));
    assert!(script.contains("    NPS = col_factor(),"));
    assert!(script.contains("    source = col_character(),"));
    assert!(script.contains("    Sat_speed = col_factor(levels = scale_"));
}

#[test]
fn csv_and_script_share_the_column_layout() {
    let survey = load("variants.qsf", "variants.xml");
    let csv = render_csv(&survey).expect("render CSV");
    let header: Vec<&str> = csv.lines().next().expect("header").split(',').collect();

    let script = generate_r_script(&survey, "variants.csv", &options());
    let specified: Vec<&str> = script
        .lines()
        .filter(|line| line.starts_with("    "))
        .filter_map(|line| line.trim().split(" = ").next())
        .collect();
    assert_eq!(header, specified);
}

#[test]
fn writers_accept_open_sinks() {
    let survey = load("survey.qsf", "responses.xml");
    let mut table = Vec::new();
    let rows = write_csv(&survey, Some(&mut table)).expect("write CSV");
    assert_eq!(rows, 3);

    let mut script = Vec::new();
    write_r_script(&survey, Some(&mut script), "lunch.csv", &options()).expect("write script");
    assert!(String::from_utf8(script).expect("utf-8").contains("input_path <- \"lunch.csv\""));
}

fn arbitrary_survey() -> impl Strategy<Value = Survey> {
    let question = (0usize..4, 0usize..5, any::<bool>());
    prop::collection::vec(question, 0..6).prop_map(|specs| {
        let mut survey = Survey::default();
        for (index, (kind, choice_count, with_text)) in specs.into_iter().enumerate() {
            let kind = [
                QuestionType::SingleChoice,
                QuestionType::MultiSelect,
                QuestionType::RankOrder,
                QuestionType::TextEntry,
            ][kind];
            let id = format!("QID{}", index + 1);
            let mut question = Question::new(id.clone(), format!("Q{}", index + 1), kind);
            question.choices = (1..=choice_count)
                .map(|n| Choice::new(n.to_string(), format!("L{n}")).with_text(with_text && n == 1))
                .collect();
            survey.question_order.push(id.clone());
            survey.questions.insert(id, question);
        }
        let mut answered = Response::new("R_1");
        answered.add_answer("QID1", "1").expect("fresh key");
        survey.set_responses(vec![answered, Response::new("R_2")]);
        survey
    })
}

proptest! {
    #[test]
    fn every_row_matches_the_header(survey in arbitrary_survey()) {
        let expected = FIXED_COLUMNS.len()
            + survey
                .ordered_questions()
                .map(|question| question.columns().len())
                .sum::<usize>();
        prop_assert_eq!(survey.header().len(), expected);

        let csv = render_csv(&survey).expect("render CSV");
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(csv.as_bytes());
        prop_assert_eq!(reader.headers().expect("header").len(), expected);
        for record in reader.records() {
            prop_assert_eq!(record.expect("record").len(), expected);
        }
    }
}

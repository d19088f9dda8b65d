//! Survey definition (QSF) parsing.
//!
//! The definition document is a JSON object with a flat `SurveyEntry` and an
//! ordered `SurveyElements` list. Elements are decoded one by one with the
//! schema matching their tag, then the question set is assembled:
//!
//! 1. trash-block questions are dropped,
//! 2. the export order is derived from the flow,
//! 3. dynamic-choice questions are backfilled from their sources.
//!
//! Any structural problem aborts the parse; no partial survey is returned.

mod dynamic;
mod elements;
mod layout;
mod questions;

use std::collections::BTreeMap;
use std::io::Read;

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use qsf_model::{Question, Survey, TIMESTAMP_FORMAT};

use crate::error::{IngestError, Result};
use elements::{QsfDocument, SurveyElement, decode_element};
use layout::Layout;

pub use dynamic::{UnresolvedDynamicChoices, UnresolvedReason, resolve_dynamic_choices};

/// A parsed survey plus the dynamic-choice questions that could not be filled.
#[derive(Debug, Clone)]
pub struct ParsedSurvey {
    pub survey: Survey,
    pub unresolved: Vec<UnresolvedDynamicChoices>,
}

/// Parse a survey definition from a reader.
pub fn parse_survey<R: Read>(mut reader: R) -> Result<ParsedSurvey> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|source| IngestError::Read {
            document: "survey definition",
            source,
        })?;
    parse_survey_slice(&bytes)
}

/// Parse a survey definition already held in memory.
pub fn parse_survey_slice(bytes: &[u8]) -> Result<ParsedSurvey> {
    let document: QsfDocument = serde_json::from_slice(bytes)?;
    let entry = document
        .survey_entry
        .ok_or(IngestError::MissingMetadata {
            field: "SurveyEntry",
        })?;
    let elements = document
        .survey_elements
        .ok_or(IngestError::MissingMetadata {
            field: "SurveyElements",
        })?;

    let mut layout = Layout::default();
    let mut questions: BTreeMap<String, Question> = BTreeMap::new();
    let mut declared_count = None;
    let mut parsed_count = 0usize;

    for (index, value) in elements.into_iter().enumerate() {
        match decode_element(index, value)? {
            SurveyElement::Blocks(blocks) => layout.add_blocks(blocks),
            SurveyElement::Flow(nodes) => layout.add_flow(&nodes, &mut questions),
            SurveyElement::Question(shape) => {
                let question = questions::build_question(index, *shape)?;
                parsed_count += 1;
                if let Some(previous) = questions.insert(question.id.clone(), question) {
                    warn!(question = %previous.id, "question defined twice, keeping the later one");
                }
            }
            SurveyElement::Count(count) => declared_count = count,
            SurveyElement::Unknown(tag) => debug!(index, element = %tag, "skipping survey element"),
        }
    }

    if let Some(declared) = declared_count
        && declared != parsed_count
    {
        warn!(declared, parsed = parsed_count, "question count does not match the definition");
    }

    let trashed = layout.remove_trash(&mut questions);
    let question_order = layout.question_order(&questions);
    let (questions, unresolved) = resolve_dynamic_choices(&questions);

    let survey = Survey {
        id: entry.survey_id.unwrap_or_default(),
        title: entry.survey_name.unwrap_or_default(),
        description: entry.survey_description.unwrap_or_default(),
        status: entry.survey_status.unwrap_or_default(),
        created_on: parse_timestamp("SurveyCreationDate", entry.survey_creation_date.as_deref()),
        launched_on: parse_timestamp("SurveyStartDate", entry.survey_start_date.as_deref()),
        modified_on: parse_timestamp("LastModified", entry.last_modified.as_deref()),
        question_order,
        questions,
        responses: Vec::new(),
    };

    info!(
        survey = %survey.id,
        questions = survey.question_order.len(),
        trashed,
        unresolved = unresolved.len(),
        "parsed survey definition"
    );
    Ok(ParsedSurvey { survey, unresolved })
}

fn parse_timestamp(field: &'static str, value: Option<&str>) -> Option<NaiveDateTime> {
    let value = value.map(str::trim).filter(|value| !value.is_empty())?;
    match NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT) {
        Ok(timestamp) => Some(timestamp),
        Err(err) => {
            warn!(field, value, error = %err, "unreadable survey timestamp");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(elements: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "SurveyEntry": {
                "SurveyID": "SV_1",
                "SurveyName": "Demo",
                "SurveyCreationDate": "2024-01-02 03:04:05",
                "SurveyStartDate": "0000-00-00 00:00:00"
            },
            "SurveyElements": elements
        }))
        .unwrap()
    }

    #[test]
    fn missing_sections_are_reported() {
        let err = parse_survey_slice(br#"{"SurveyElements": []}"#).unwrap_err();
        assert!(matches!(err, IngestError::MissingMetadata { field: "SurveyEntry" }));

        let err = parse_survey_slice(br#"{"SurveyEntry": {}}"#).unwrap_err();
        assert!(matches!(err, IngestError::MissingMetadata { field: "SurveyElements" }));

        assert!(matches!(
            parse_survey_slice(b"not json").unwrap_err(),
            IngestError::Json(_)
        ));
    }

    #[test]
    fn metadata_timestamps_tolerate_placeholders() {
        let parsed = parse_survey_slice(&document(json!([]))).unwrap();
        let survey = parsed.survey;
        assert_eq!(survey.title, "Demo");
        assert_eq!(
            survey.created_on.map(|t| t.to_string()),
            Some("2024-01-02 03:04:05".to_string())
        );
        assert_eq!(survey.launched_on, None);
        assert!(survey.question_order.is_empty());
    }

    #[test]
    fn malformed_element_aborts_parse() {
        let bytes = document(json!([
            {"Element": "SQ", "Payload": {"QuestionType": "MC"}}
        ]));
        let err = parse_survey_slice(&bytes).unwrap_err();
        assert!(matches!(err, IngestError::MalformedElement { index: 0, .. }));
    }

    #[test]
    fn dynamic_choices_are_backfilled_after_ordering() {
        let bytes = document(json!([
            {"Element": "BL", "Payload": [
                {"Type": "Default", "ID": "BL_1", "BlockElements": [
                    {"Type": "Question", "QuestionID": "QID2"},
                    {"Type": "Question", "QuestionID": "QID1"}
                ]}
            ]},
            {"Element": "FL", "Payload": {"Flow": [{"Type": "Block", "ID": "BL_1"}]}},
            {"Element": "SQ", "Payload": {
                "QuestionID": "QID2", "DataExportTag": "Q2", "QuestionType": "MC",
                "Selector": "MAVR", "Choices": [],
                "DynamicChoices": {"Locator": "q://QID1/SelectedChoices"}
            }},
            {"Element": "SQ", "Payload": {
                "QuestionID": "QID1", "DataExportTag": "Q1", "QuestionType": "MC",
                "Selector": "MAVR",
                "Choices": {"1": {"Display": "A"}, "2": {"Display": "B"}},
                "ChoiceOrder": [1, 2]
            }},
            {"Element": "QC", "SecondaryAttribute": "3"}
        ]));
        let parsed = parse_survey_slice(&bytes).unwrap();
        assert!(parsed.unresolved.is_empty());
        assert_eq!(parsed.survey.question_order, vec!["QID2", "QID1"]);
        assert_eq!(
            parsed.survey.header(),
            vec!["id", "finished", "progress", "duration", "Q2_1", "Q2_2", "Q1_1", "Q1_2"]
        );
    }

    #[test]
    fn carried_forward_matrix_rows_become_columns() {
        let bytes = document(json!([
            {"Element": "BL", "Payload": [
                {"Type": "Default", "ID": "BL_1", "BlockElements": [
                    {"Type": "Question", "QuestionID": "QID1"},
                    {"Type": "Question", "QuestionID": "QID2"}
                ]}
            ]},
            {"Element": "SQ", "Payload": {
                "QuestionID": "QID1", "DataExportTag": "Q1", "QuestionType": "MC",
                "Selector": "MAVR",
                "Choices": {"1": {"Display": "Tea"}, "2": {"Display": "Coffee"}},
                "ChoiceOrder": [1, 2]
            }},
            {"Element": "SQ", "Payload": {
                "QuestionID": "QID2", "DataExportTag": "Q2", "QuestionType": "Matrix",
                "Selector": "Likert", "SubSelector": "SingleAnswer",
                "Choices": [],
                "Answers": {"1": {"Display": "Low"}, "2": {"Display": "High"}},
                "AnswerOrder": [1, 2],
                "DynamicChoices": {"Locator": "q://QID1/ChoiceGroup/SelectedChoices"}
            }}
        ]));
        let parsed = parse_survey_slice(&bytes).unwrap();
        assert!(parsed.unresolved.is_empty());
        assert_eq!(
            parsed.survey.header(),
            vec!["id", "finished", "progress", "duration", "Q1_1", "Q1_2", "Q2_1", "Q2_2"]
        );
    }

    #[test]
    fn matrix_with_unresolvable_rows_is_reported() {
        let bytes = document(json!([
            {"Element": "BL", "Payload": [
                {"Type": "Default", "ID": "BL_1", "BlockElements": [
                    {"Type": "Question", "QuestionID": "QID2"}
                ]}
            ]},
            {"Element": "SQ", "Payload": {
                "QuestionID": "QID2", "DataExportTag": "Q2", "QuestionType": "Matrix",
                "Selector": "Likert", "SubSelector": "SingleAnswer",
                "Choices": [],
                "Answers": {"1": {"Display": "Low"}},
                "DynamicChoices": {"Locator": "q://QID9/ChoiceGroup/SelectedChoices"}
            }}
        ]));
        let parsed = parse_survey_slice(&bytes).unwrap();
        assert_eq!(parsed.unresolved.len(), 1);
        assert_eq!(parsed.unresolved[0].question_id, "QID2");
        assert_eq!(parsed.unresolved[0].reason, UnresolvedReason::UnknownSource);
    }

    #[test]
    fn keyed_blocks_keep_positional_order_without_flow() {
        let mut blocks = serde_json::Map::new();
        let mut questions = Vec::new();
        for position in 0..12 {
            blocks.insert(
                position.to_string(),
                json!({"Type": "Standard", "ID": format!("BL_{position}"), "BlockElements": [
                    {"Type": "Question", "QuestionID": format!("QID{position}")}
                ]}),
            );
            questions.push(json!({"Element": "SQ", "Payload": {
                "QuestionID": format!("QID{position}"), "QuestionType": "TE", "Selector": "SL"
            }}));
        }
        let mut elements = vec![json!({"Element": "BL", "Payload": blocks})];
        elements.extend(questions);

        let parsed = parse_survey_slice(&document(json!(elements))).unwrap();
        let expected: Vec<String> = (0..12).map(|position| format!("QID{position}")).collect();
        assert_eq!(parsed.survey.question_order, expected);
    }
}

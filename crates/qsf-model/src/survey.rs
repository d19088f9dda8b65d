use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::column::Column;
use crate::question::Question;
use crate::response::Response;

/// Timestamp layout used by both the definition and response documents.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Leading columns of every exported table, before any question column.
pub const FIXED_COLUMNS: [&str; 4] = ["id", "finished", "progress", "duration"];

/// A parsed survey definition together with its responses.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Survey {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub created_on: Option<NaiveDateTime>,
    pub launched_on: Option<NaiveDateTime>,
    pub modified_on: Option<NaiveDateTime>,
    /// Question IDs in export order: block/flow order, then embedded data.
    pub question_order: Vec<String>,
    pub questions: BTreeMap<String, Question>,
    #[serde(skip)]
    pub responses: Vec<Response>,
}

impl Survey {
    /// Questions in export order.
    pub fn ordered_questions(&self) -> impl Iterator<Item = &Question> {
        self.question_order
            .iter()
            .filter_map(|id| self.questions.get(id))
    }

    /// Every question column, paired with the question that owns it.
    pub fn question_columns(&self) -> Vec<(&Question, Column)> {
        self.ordered_questions()
            .flat_map(|question| {
                question
                    .columns()
                    .into_iter()
                    .map(move |column| (question, column))
            })
            .collect()
    }

    /// Full table header: the fixed columns followed by every question column.
    pub fn header(&self) -> Vec<String> {
        FIXED_COLUMNS
            .iter()
            .map(|name| (*name).to_string())
            .chain(
                self.ordered_questions()
                    .flat_map(Question::column_names),
            )
            .collect()
    }

    /// Attach responses read from a response document, replacing any present.
    pub fn set_responses(&mut self, responses: Vec<Response>) {
        self.responses = responses;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choice::Choice;
    use crate::question::QuestionType;

    fn survey() -> Survey {
        let mut single = Question::new("QID1", "Q1", QuestionType::SingleChoice);
        single.choices = vec![Choice::new("1", "Yes"), Choice::new("2", "No")];
        let mut multi = Question::new("QID2", "Q2", QuestionType::MultiSelect);
        multi.choices = vec![Choice::new("1", "A"), Choice::new("2", "B").with_text(true)];
        let trashed = Question::new("QID3", "Q3", QuestionType::TextEntry);

        let mut survey = Survey::default();
        for question in [single, multi, trashed] {
            survey.questions.insert(question.id.clone(), question);
        }
        survey.question_order = vec!["QID2".to_string(), "QID1".to_string()];
        survey
    }

    #[test]
    fn header_follows_question_order() {
        let survey = survey();
        assert_eq!(
            survey.header(),
            vec!["id", "finished", "progress", "duration", "Q2_1", "Q2_2", "Q2_2_text", "Q1"]
        );
    }

    #[test]
    fn question_columns_match_header() {
        let survey = survey();
        let columns = survey.question_columns();
        assert_eq!(columns.len() + FIXED_COLUMNS.len(), survey.header().len());
        assert_eq!(columns[0].0.id, "QID2");
        assert_eq!(columns[3].0.id, "QID1");
    }
}

//! Survey data model.
//!
//! This crate holds the typed representation of a survey export:
//!
//! - **Choice**: an option or matrix row, with label and export name
//! - **Question**: a closed set of question variants, each knowing its export
//!   columns and how to render a response into them
//! - **Response**: one participant's answers, keyed by normalized answer keys
//! - **Survey**: ordered questions plus attached responses

pub mod choice;
pub mod column;
pub mod error;
pub mod normalize;
pub mod question;
pub mod response;
pub mod survey;

pub use choice::Choice;
pub use column::{Column, ColumnType, Levels};
pub use error::{ModelError, Result};
pub use normalize::{is_timer_key, normalize_answer_key};
pub use question::{
    DynamicChoiceKind, DynamicChoices, NO_RESPONSE_CODE, NO_RESPONSE_CODE_MULTI, Question,
    QuestionType, SELECTED,
};
pub use response::Response;
pub use survey::{FIXED_COLUMNS, Survey, TIMESTAMP_FORMAT};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_serializes() {
        let mut question = Question::new("QID1", "Q1", QuestionType::SingleChoice);
        question.choices = vec![Choice::new("1", "Yes")];
        let json = serde_json::to_string(&question).expect("serialize question");
        let round: Question = serde_json::from_str(&json).expect("deserialize question");
        assert_eq!(round, question);
    }
}

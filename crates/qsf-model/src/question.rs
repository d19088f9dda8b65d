use serde::{Deserialize, Serialize};

use crate::choice::Choice;
use crate::column::{Column, ColumnType, Levels, ValueSource};
use crate::response::Response;

/// Answer code the platform writes for "seen but not answered".
pub const NO_RESPONSE_CODE: &str = "-99";

/// Answer code for an unchecked box in multi-answer questions.
pub const NO_RESPONSE_CODE_MULTI: &str = "0";

/// Rendered value of a selected boolean column.
pub const SELECTED: &str = "TRUE";

const TIMER_FIELDS: [(&str, &str, ColumnType); 4] = [
    ("FIRST_CLICK", "first_click", ColumnType::Double),
    ("LAST_CLICK", "last_click", ColumnType::Double),
    ("PAGE_SUBMIT", "page_submit", ColumnType::Double),
    ("CLICK_COUNT", "click_count", ColumnType::Integer),
];

/// Question variants that the exporter knows how to flatten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    SingleChoice,
    MultiSelect,
    Matrix,
    RankOrder,
    PickGroupRank,
    /// Fixed 0-10 scales such as net-promoter questions.
    FixedScale,
    TextEntry,
    ConstantSum,
    Timing,
    EmbeddedData,
    /// Passed through as a single raw column.
    Unsupported,
}

impl QuestionType {
    /// Classify a definition-document type tag and selector.
    pub fn classify(question_type: &str, selector: &str) -> Self {
        match question_type {
            "MC" => match selector {
                "NPS" => QuestionType::FixedScale,
                "MSB" => QuestionType::MultiSelect,
                s if s.starts_with("MA") => QuestionType::MultiSelect,
                _ => QuestionType::SingleChoice,
            },
            "Matrix" => QuestionType::Matrix,
            "RO" => QuestionType::RankOrder,
            "PGR" => QuestionType::PickGroupRank,
            "TE" => QuestionType::TextEntry,
            "CS" => QuestionType::ConstantSum,
            "Timing" => QuestionType::Timing,
            _ => QuestionType::Unsupported,
        }
    }
}

/// Which of another question's choices a dynamic-choice question inherits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DynamicChoiceKind {
    DisplayedChoices,
    SelectedChoices,
    Other(String),
}

impl DynamicChoiceKind {
    pub fn parse(kind: &str) -> Self {
        match kind {
            "DisplayedChoices" => DynamicChoiceKind::DisplayedChoices,
            "SelectedChoices" => DynamicChoiceKind::SelectedChoices,
            other => DynamicChoiceKind::Other(other.to_string()),
        }
    }

    /// Kinds whose choice list is known from the definition alone.
    pub fn is_resolvable(&self) -> bool {
        matches!(
            self,
            DynamicChoiceKind::DisplayedChoices | DynamicChoiceKind::SelectedChoices
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicChoices {
    /// ID of the question the choices are carried forward from.
    pub source: String,
    pub kind: DynamicChoiceKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    /// Export variable name; the base of every column this question produces.
    pub export_tag: String,
    pub text: String,
    pub kind: QuestionType,
    /// Type tag as it appeared in the definition document.
    pub raw_type: String,
    pub selector: String,
    pub sub_selector: String,
    pub choices: Vec<Choice>,
    /// Whether the choices form an ordered scale.
    pub ordered_choices: bool,
    pub sub_questions: Vec<Choice>,
    pub groups: Vec<String>,
    pub dynamic_choices: Option<DynamicChoices>,
}

impl Question {
    pub fn new(id: impl Into<String>, export_tag: impl Into<String>, kind: QuestionType) -> Self {
        let id = id.into();
        let export_tag = export_tag.into();
        let export_tag = if export_tag.trim().is_empty() {
            id.clone()
        } else {
            export_tag
        };
        Self {
            id,
            export_tag,
            text: String::new(),
            kind,
            raw_type: String::new(),
            selector: String::new(),
            sub_selector: String::new(),
            choices: Vec::new(),
            ordered_choices: false,
            sub_questions: Vec::new(),
            groups: Vec::new(),
            dynamic_choices: None,
        }
    }

    /// Pseudo-question for an embedded-data field; the field name is both ID and column.
    pub fn embedded_data(field: impl Into<String>) -> Self {
        let field = field.into();
        let mut question = Self::new(field.clone(), field, QuestionType::EmbeddedData);
        question.raw_type = "EmbeddedData".to_string();
        question
    }

    fn is_multi_answer_matrix(&self) -> bool {
        self.sub_selector == "MultipleAnswer"
    }

    fn is_form(&self) -> bool {
        self.selector == "FORM"
    }

    /// Export columns in output order.
    ///
    /// The layout depends only on the question type, selector and the
    /// choice, sub-question and group lists, so it is stable across calls.
    /// Free-text companion columns always come last.
    pub fn columns(&self) -> Vec<Column> {
        let base = self.export_tag.as_str();
        let qid = self.id.as_str();
        let mut columns = Vec::new();

        match self.kind {
            QuestionType::SingleChoice => {
                columns.push(Column::new(
                    base,
                    ColumnType::Factor(Levels::Choices),
                    ValueSource::ChoiceLabel(qid.to_string()),
                ));
            }
            QuestionType::FixedScale => {
                columns.push(Column::new(
                    base,
                    ColumnType::Factor(Levels::Open),
                    ValueSource::Raw(qid.to_string()),
                ));
            }
            QuestionType::MultiSelect => {
                for choice in &self.choices {
                    columns.push(Column::new(
                        format!("{base}_{}", choice.column_suffix()),
                        ColumnType::Logical,
                        ValueSource::Flag(format!("{qid}_{}", choice.id)),
                    ));
                }
            }
            QuestionType::Matrix if self.is_multi_answer_matrix() => {
                for sub in &self.sub_questions {
                    for point in &self.choices {
                        columns.push(Column::new(
                            format!("{base}_{}_{}", sub.column_suffix(), point.column_suffix()),
                            ColumnType::Logical,
                            ValueSource::Flag(format!("{qid}_{}_{}", sub.id, point.id)),
                        ));
                    }
                }
            }
            QuestionType::Matrix => {
                for sub in &self.sub_questions {
                    columns.push(Column::new(
                        format!("{base}_{}", sub.column_suffix()),
                        ColumnType::Factor(Levels::Choices),
                        ValueSource::ChoiceLabel(format!("{qid}_{}", sub.id)),
                    ));
                }
            }
            QuestionType::RankOrder => {
                for choice in &self.choices {
                    columns.push(Column::new(
                        format!("{base}_{}", choice.column_suffix()),
                        ColumnType::Factor(Levels::Ranks),
                        ValueSource::Raw(format!("{qid}_{}", choice.id)),
                    ));
                }
            }
            QuestionType::PickGroupRank => {
                for choice in &self.choices {
                    let suffix = choice.column_suffix();
                    columns.push(Column::new(
                        format!("{base}_{suffix}_GROUP"),
                        ColumnType::Factor(Levels::Groups),
                        ValueSource::Group(choice.id.clone()),
                    ));
                    columns.push(Column::new(
                        format!("{base}_{suffix}_RANK"),
                        ColumnType::Factor(Levels::Ranks),
                        ValueSource::GroupRank(choice.id.clone()),
                    ));
                }
            }
            QuestionType::TextEntry if self.is_form() => {
                for field in &self.choices {
                    columns.push(Column::new(
                        format!("{base}_{}", field.column_suffix()),
                        ColumnType::Text,
                        ValueSource::Raw(format!("{qid}_{}", field.id)),
                    ));
                }
            }
            QuestionType::TextEntry => {
                columns.push(Column::new(
                    format!("{base}_text"),
                    ColumnType::Text,
                    ValueSource::Raw(format!("{qid}_TEXT")),
                ));
            }
            QuestionType::ConstantSum => {
                for choice in &self.choices {
                    columns.push(Column::new(
                        format!("{base}_{}", choice.column_suffix()),
                        ColumnType::Double,
                        ValueSource::Raw(format!("{qid}_{}", choice.id)),
                    ));
                }
            }
            QuestionType::Timing => {
                for (key_suffix, column_suffix, column_type) in TIMER_FIELDS {
                    columns.push(Column::new(
                        format!("{base}_{column_suffix}"),
                        column_type,
                        ValueSource::Raw(format!("{qid}_{key_suffix}")),
                    ));
                }
            }
            QuestionType::EmbeddedData => {
                columns.push(Column::new(
                    base,
                    ColumnType::Text,
                    ValueSource::Raw(qid.to_string()),
                ));
            }
            QuestionType::Unsupported => {
                // Descriptive text blocks collect no data.
                if self.raw_type != "DB" {
                    columns.push(Column::new(
                        base,
                        ColumnType::Text,
                        ValueSource::Raw(qid.to_string()),
                    ));
                }
            }
        }

        for owner in self.text_entry_owners() {
            columns.push(Column::new(
                format!("{base}_{}_text", owner.column_suffix()),
                ColumnType::Text,
                ValueSource::Raw(format!("{qid}_{}_TEXT", owner.id)),
            ));
        }

        columns
    }

    /// Column names, in the same order as [`Question::columns`].
    pub fn column_names(&self) -> Vec<String> {
        self.columns().into_iter().map(|column| column.name).collect()
    }

    fn text_entry_owners(&self) -> impl Iterator<Item = &Choice> {
        let owners: &[Choice] = match self.kind {
            QuestionType::SingleChoice
            | QuestionType::MultiSelect
            | QuestionType::RankOrder
            | QuestionType::PickGroupRank => &self.choices,
            QuestionType::Matrix => &self.sub_questions,
            _ => &[],
        };
        owners.iter().filter(|choice| choice.has_text)
    }

    /// Values for every column of this question, aligned 1:1 with [`Question::columns`].
    ///
    /// A response that never saw the question yields a full row of empty cells.
    pub fn render(&self, response: &Response) -> Vec<String> {
        self.columns()
            .iter()
            .map(|column| self.render_column(column, response))
            .collect()
    }

    /// Value of a single column previously returned by [`Question::columns`].
    pub fn render_column(&self, column: &Column, response: &Response) -> String {
        match &column.source {
            ValueSource::Raw(key) => match response.non_empty_answer(key) {
                Some(NO_RESPONSE_CODE) if column.column_type != ColumnType::Text => String::new(),
                Some(value) => value.to_string(),
                None => String::new(),
            },
            ValueSource::Flag(key) => match response.non_empty_answer(key) {
                Some(NO_RESPONSE_CODE | NO_RESPONSE_CODE_MULTI) | None => String::new(),
                Some(_) => SELECTED.to_string(),
            },
            ValueSource::ChoiceLabel(key) => match response.non_empty_answer(key) {
                Some(NO_RESPONSE_CODE) | None => String::new(),
                Some(value) => self
                    .choices
                    .iter()
                    .find(|choice| choice.id == value)
                    .map_or_else(|| value.to_string(), |choice| choice.label.clone()),
            },
            ValueSource::Group(choice_id) => self
                .placement(choice_id, response)
                .map(|(group, _)| group.to_string())
                .unwrap_or_default(),
            ValueSource::GroupRank(choice_id) => self
                .placement(choice_id, response)
                .map(|(_, rank)| rank.to_string())
                .unwrap_or_default(),
        }
    }

    /// Group label and rank of a pick-group-rank item, if it was placed.
    fn placement<'a>(&'a self, choice_id: &str, response: &'a Response) -> Option<(&'a str, &'a str)> {
        self.groups.iter().enumerate().find_map(|(index, group)| {
            let key = format!("{}_G{index}_{choice_id}_RANK", self.id);
            response
                .non_empty_answer(&key)
                .filter(|rank| *rank != NO_RESPONSE_CODE)
                .map(|rank| (group.as_str(), rank))
        })
    }

    /// Level list for a categorical column drawing from `levels`.
    pub fn levels(&self, levels: Levels) -> Vec<Choice> {
        match levels {
            Levels::Choices => self.choices.clone(),
            Levels::Ranks => (1..=self.choices.len())
                .map(|rank| Choice::label_only(rank.to_string()))
                .collect(),
            Levels::Groups => self
                .groups
                .iter()
                .map(|group| Choice::label_only(group.as_str()))
                .collect(),
            Levels::Open => Vec::new(),
        }
    }

    /// Whether the levels drawn from `levels` are ordered.
    pub fn levels_ordered(&self, levels: Levels) -> bool {
        match levels {
            Levels::Choices => self.ordered_choices,
            Levels::Ranks => true,
            Levels::Groups | Levels::Open => false,
        }
    }
}

use serde::Serialize;

/// Where a categorical column draws its levels from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Levels {
    /// The question's own (possibly inherited) choices.
    Choices,
    /// Rank positions `1..=N`, one per choice.
    Ranks,
    /// Pick-group-rank group labels.
    Groups,
    /// Values are fixed by the question type and carry no level list.
    Open,
}

/// Column type reported to the generated import script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ColumnType {
    Factor(Levels),
    Logical,
    Integer,
    Double,
    /// Free text; imported without conversion.
    Text,
}

impl ColumnType {
    /// readr column-type function for this column, `None` for free text.
    pub fn import_keyword(self) -> Option<&'static str> {
        match self {
            ColumnType::Factor(_) => Some("col_factor"),
            ColumnType::Logical => Some("col_logical"),
            ColumnType::Integer => Some("col_integer"),
            ColumnType::Double => Some("col_double"),
            ColumnType::Text => None,
        }
    }

    pub fn is_factor(self) -> bool {
        matches!(self, ColumnType::Factor(_))
    }
}

/// How a column's value is pulled out of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ValueSource {
    /// Stored value as-is.
    Raw(String),
    /// `TRUE` when the key holds a selection, empty otherwise.
    Flag(String),
    /// Stored choice ID translated to its label.
    ChoiceLabel(String),
    /// Label of the group a pick-group-rank item was placed in.
    Group(String),
    /// Rank of a pick-group-rank item within its group.
    GroupRank(String),
}

/// One exported table column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub(crate) source: ValueSource,
}

impl Column {
    pub(crate) fn new(name: impl Into<String>, column_type: ColumnType, source: ValueSource) -> Self {
        Self {
            name: name.into(),
            column_type,
            source,
        }
    }
}

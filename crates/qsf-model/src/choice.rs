use serde::{Deserialize, Serialize};

/// One selectable option of a question, or one row of a matrix.
///
/// Choices are plain values: dynamic-choice resolution copies them between
/// questions rather than sharing them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    pub label: String,
    /// Explicit export name from the survey definition, if any.
    #[serde(default)]
    pub var_name: Option<String>,
    #[serde(default)]
    pub has_text: bool,
}

impl Choice {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            var_name: None,
            has_text: false,
        }
    }

    /// A choice that only carries a label, used for synthetic level sets.
    pub fn label_only(label: impl Into<String>) -> Self {
        Self::new(String::new(), label)
    }

    #[must_use]
    pub fn with_var_name(mut self, var_name: Option<String>) -> Self {
        self.var_name = var_name.filter(|name| !name.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_text(mut self, has_text: bool) -> Self {
        self.has_text = has_text;
        self
    }

    /// Variable name, falling back to the display label.
    pub fn var_name(&self) -> &str {
        self.var_name.as_deref().unwrap_or(&self.label)
    }

    /// Suffix used when this choice contributes its own export column.
    pub fn column_suffix(&self) -> &str {
        self.var_name.as_deref().unwrap_or(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_name_falls_back_to_label() {
        let choice = Choice::new("1", "Strongly agree");
        assert_eq!(choice.var_name(), "Strongly agree");
        assert_eq!(choice.column_suffix(), "1");

        let named = choice.with_var_name(Some("agree_strong".to_string()));
        assert_eq!(named.var_name(), "agree_strong");
        assert_eq!(named.column_suffix(), "agree_strong");
    }

    #[test]
    fn blank_var_name_is_ignored() {
        let choice = Choice::new("2", "Other").with_var_name(Some("  ".to_string()));
        assert_eq!(choice.var_name, None);
        assert_eq!(choice.column_suffix(), "2");
    }
}

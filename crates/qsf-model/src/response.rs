use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::{ModelError, Result};
use crate::normalize::normalize_answer_key;

/// One participant's response.
///
/// Answers are stored under normalized keys and can only be added through
/// [`Response::add_answer`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct Response {
    pub id: String,
    /// Completion percentage (0-100).
    pub progress: u32,
    /// Time spent, in seconds.
    pub duration: u64,
    pub finished: bool,
    pub recorded_on: Option<NaiveDateTime>,
    answers: HashMap<String, String>,
}

impl Response {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Record an answer under the normalized form of `raw_key`.
    ///
    /// A non-empty value never replaces another non-empty value: when two raw
    /// keys collapse onto the same normalized key with different data, the
    /// response cannot be flattened and [`ModelError::DuplicateAnswer`] is
    /// returned. An empty value never clears a stored one.
    pub fn add_answer(&mut self, raw_key: &str, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        let key = normalize_answer_key(raw_key).into_owned();
        match self.answers.get(&key) {
            Some(existing) if !existing.is_empty() => {
                if value.is_empty() {
                    return Ok(());
                }
                Err(ModelError::DuplicateAnswer {
                    key,
                    raw_key: raw_key.to_string(),
                    existing: existing.clone(),
                    incoming: value,
                })
            }
            _ => {
                self.answers.insert(key, value);
                Ok(())
            }
        }
    }

    /// The raw answer stored under a normalized key.
    pub fn answer(&self, key: &str) -> Option<&str> {
        self.answers.get(key).map(String::as_str)
    }

    /// The answer under `key`, or `None` when absent or empty.
    pub fn non_empty_answer(&self, key: &str) -> Option<&str> {
        self.answer(key).filter(|value| !value.is_empty())
    }

    pub fn answer_count(&self) -> usize {
        self.answers.len()
    }
}

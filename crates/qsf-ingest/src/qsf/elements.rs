//! Raw survey-element shapes and the tag-dispatched decoder.
//!
//! Every entry of `SurveyElements` carries an `Element` tag, but the payload
//! layout differs per tag (and, for blocks and questions, per export
//! version). The tag is probed first and the element is then decoded with the
//! schema for that tag only.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{IngestError, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct QsfDocument {
    pub survey_entry: Option<SurveyEntry>,
    pub survey_elements: Option<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct SurveyEntry {
    #[serde(rename = "SurveyID", default)]
    pub survey_id: Option<String>,
    #[serde(default)]
    pub survey_name: Option<String>,
    #[serde(default)]
    pub survey_description: Option<String>,
    #[serde(default)]
    pub survey_status: Option<String>,
    #[serde(default)]
    pub survey_start_date: Option<String>,
    #[serde(default)]
    pub survey_creation_date: Option<String>,
    #[serde(default)]
    pub last_modified: Option<String>,
}

/// A decoded survey element.
#[derive(Debug)]
pub(crate) enum SurveyElement {
    Blocks(Vec<BlockDescriptor>),
    Flow(Vec<FlowNode>),
    Question(Box<QuestionShape>),
    /// Advisory question count; `None` when the count was unreadable.
    Count(Option<usize>),
    Unknown(String),
}

// === Blocks ===

#[derive(Debug, Deserialize)]
struct BlocksElement {
    #[serde(rename = "Payload")]
    payload: BlocksPayload,
}

/// Block payloads come either as a list or keyed by position.
///
/// Keyed payloads are put back in positional order: numeric keys by value,
/// anything else after them by name.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BlocksPayload {
    List(Vec<BlockDescriptor>),
    Map(BTreeMap<String, BlockDescriptor>),
}

impl BlocksPayload {
    fn into_blocks(self) -> Vec<BlockDescriptor> {
        match self {
            BlocksPayload::List(blocks) => blocks,
            BlocksPayload::Map(blocks) => {
                let mut entries: Vec<(String, BlockDescriptor)> = blocks.into_iter().collect();
                entries.sort_by_cached_key(|(key, _)| {
                    (key.trim().parse::<u64>().unwrap_or(u64::MAX), key.clone())
                });
                entries.into_iter().map(|(_, block)| block).collect()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct BlockDescriptor {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Type", default)]
    pub block_type: Option<String>,
    #[serde(default)]
    pub block_elements: Vec<BlockEntry>,
}

impl BlockDescriptor {
    pub fn is_trash(&self) -> bool {
        self.block_type.as_deref() == Some("Trash")
    }

    /// IDs of the questions placed in this block, skipping page breaks and the like.
    pub fn question_ids(&self) -> impl Iterator<Item = &str> {
        self.block_elements
            .iter()
            .filter(|entry| entry.entry_type == "Question")
            .filter_map(|entry| entry.question_id.as_deref())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct BlockEntry {
    #[serde(rename = "Type", default)]
    pub entry_type: String,
    #[serde(rename = "QuestionID", default)]
    pub question_id: Option<String>,
}

// === Flow ===

#[derive(Debug, Deserialize)]
struct FlowElement {
    #[serde(rename = "Payload")]
    payload: FlowPayload,
}

#[derive(Debug, Deserialize)]
struct FlowPayload {
    #[serde(rename = "Flow", default)]
    flow: Vec<FlowNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct FlowNode {
    /// Block ID, for nodes that place a block.
    #[serde(rename = "ID", default)]
    pub id: Option<String>,
    #[serde(rename = "Type", default)]
    pub node_type: Option<String>,
    /// Nested flow of randomizers, branches and groups.
    #[serde(default)]
    pub flow: Vec<FlowNode>,
    #[serde(default)]
    pub embedded_data: Vec<EmbeddedField>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct EmbeddedField {
    pub field: String,
    #[serde(default)]
    pub variable_type: Option<String>,
}

// === Questions ===

#[derive(Debug)]
pub(crate) enum QuestionShape {
    /// Choices keyed by ID with an explicit order list.
    Keyed(QuestionPayload),
    /// Choices stored as a positional array (fixed 0-10 scales).
    Positional(PositionalPayload),
}

#[derive(Debug, Deserialize)]
struct QuestionElement<P> {
    #[serde(rename = "Payload")]
    payload: P,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct QuestionPayload {
    #[serde(rename = "QuestionID")]
    pub question_id: String,
    #[serde(default)]
    pub data_export_tag: Option<String>,
    #[serde(default)]
    pub question_text: Option<String>,
    pub question_type: String,
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default)]
    pub sub_selector: Option<String>,
    #[serde(default)]
    pub choices: Option<ChoiceSet>,
    #[serde(default)]
    pub choice_order: Vec<ChoiceKey>,
    #[serde(default)]
    pub answers: Option<ChoiceSet>,
    #[serde(default)]
    pub answer_order: Vec<ChoiceKey>,
    #[serde(default)]
    pub variable_naming: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub choice_data_export_tags: Option<ExportTags>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub dynamic_choices: Option<DynamicChoicesPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct PositionalPayload {
    #[serde(rename = "QuestionID")]
    pub question_id: String,
    #[serde(default)]
    pub data_export_tag: Option<String>,
    #[serde(default)]
    pub question_text: Option<String>,
    pub question_type: String,
    #[serde(default)]
    pub selector: Option<String>,
}

/// A keyed choice map. Dynamic-choice questions export an empty list instead.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ChoiceSet {
    Keyed(BTreeMap<String, ChoicePayload>),
    List(Vec<Value>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ChoicePayload {
    #[serde(default)]
    pub display: Option<String>,
    #[serde(default)]
    pub text_entry: Option<Flag>,
}

/// Booleans that may be exported as JSON booleans or as strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Flag {
    Bool(bool),
    Text(String),
}

/// Choice keys appear as numbers or numeric strings, mixed in the same list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum ChoiceKey {
    Number(i64),
    Text(String),
}

/// `false` when a question has no per-choice export tags, a key map otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ExportTags {
    Tags(BTreeMap<String, String>),
    /// `false` or any other placeholder for "no tags".
    Absent(serde::de::IgnoredAny),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct DynamicChoicesPayload {
    pub locator: String,
    /// Inheritance kind; the locator's last segment names it when absent.
    #[serde(rename = "Type", default)]
    pub kind: Option<String>,
}

// === Question count ===

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CountElement {
    #[serde(default)]
    secondary_attribute: Option<Value>,
}

/// Decode one entry of `SurveyElements`.
pub(crate) fn decode_element(index: usize, value: Value) -> Result<SurveyElement> {
    let tag = value
        .get("Element")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| IngestError::MalformedElement {
            index,
            element: "?".to_string(),
            reason: "missing Element tag".to_string(),
        })?;
    debug!(index, element = %tag, "decoding survey element");

    match tag.as_str() {
        "BL" => {
            let element: BlocksElement = decode_as(index, &tag, value)?;
            Ok(SurveyElement::Blocks(element.payload.into_blocks()))
        }
        "FL" => {
            let element: FlowElement = decode_as(index, &tag, value)?;
            Ok(SurveyElement::Flow(element.payload.flow))
        }
        "SQ" => {
            let shape = if has_positional_choices(&value) {
                let element: QuestionElement<PositionalPayload> = decode_as(index, &tag, value)?;
                QuestionShape::Positional(element.payload)
            } else {
                let element: QuestionElement<QuestionPayload> = decode_as(index, &tag, value)?;
                QuestionShape::Keyed(element.payload)
            };
            Ok(SurveyElement::Question(Box::new(shape)))
        }
        "QC" => {
            let element: CountElement = decode_as(index, &tag, value)?;
            Ok(SurveyElement::Count(parse_count(element.secondary_attribute)))
        }
        _ => Ok(SurveyElement::Unknown(tag)),
    }
}

fn decode_as<T: DeserializeOwned>(index: usize, tag: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|err| IngestError::MalformedElement {
        index,
        element: tag.to_string(),
        reason: err.to_string(),
    })
}

/// Positional questions store `Choices` as an array of objects.
fn has_positional_choices(value: &Value) -> bool {
    value
        .get("Payload")
        .and_then(|payload| payload.get("Choices"))
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .is_some_and(Value::is_object)
}

fn parse_count(value: Option<Value>) -> Option<usize> {
    let parsed = match &value {
        Some(Value::String(text)) => text.trim().parse().ok(),
        Some(Value::Number(number)) => number.as_u64().and_then(|n| usize::try_from(n).ok()),
        _ => None,
    };
    if parsed.is_none() {
        warn!(value = ?value, "unreadable question count");
    }
    parsed
}

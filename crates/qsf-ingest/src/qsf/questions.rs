//! Conversion of decoded question payloads into model questions.

use std::collections::BTreeMap;

use qsf_model::{Choice, DynamicChoiceKind, DynamicChoices, Question, QuestionType};

use super::elements::{ChoiceKey, ChoicePayload, ChoiceSet, ExportTags, Flag, QuestionShape};
use crate::error::{IngestError, Result};

const QUESTION_TAG: &str = "SQ";
const LOCATOR_SCHEME: &str = "q://";

/// Build a [`Question`] from the survey element at `index`.
pub(crate) fn build_question(index: usize, shape: QuestionShape) -> Result<Question> {
    let payload = match shape {
        QuestionShape::Positional(payload) => {
            // Fixed 0-10 scales: the stored value is the scale point itself.
            let mut question = Question::new(
                payload.question_id,
                payload.data_export_tag.unwrap_or_default(),
                QuestionType::FixedScale,
            );
            question.text = payload.question_text.unwrap_or_default();
            question.raw_type = payload.question_type;
            question.selector = payload.selector.unwrap_or_default();
            return Ok(question);
        }
        QuestionShape::Keyed(payload) => payload,
    };

    let selector = payload.selector.unwrap_or_default();
    let kind = QuestionType::classify(&payload.question_type, &selector);
    let mut question = Question::new(
        payload.question_id,
        payload.data_export_tag.unwrap_or_default(),
        kind,
    );
    question.text = payload.question_text.unwrap_or_default();
    question.raw_type = payload.question_type;
    question.selector = selector;
    question.sub_selector = payload.sub_selector.unwrap_or_default();
    question.groups = payload.groups;

    let export_tags = match payload.choice_data_export_tags {
        Some(ExportTags::Tags(tags)) => Some(tags),
        Some(ExportTags::Absent(_)) | None => None,
    };

    if kind == QuestionType::Matrix {
        // Matrix rows live under Choices, scale points under Answers.
        question.sub_questions = enumerate_choices(
            index,
            payload.choices.as_ref(),
            &payload.choice_order,
            export_tags.as_ref(),
        )?;
        question.choices = enumerate_choices(
            index,
            payload.answers.as_ref(),
            &payload.answer_order,
            payload.variable_naming.as_ref(),
        )?;
        question.ordered_choices = true;
    } else {
        question.choices = enumerate_choices(
            index,
            payload.choices.as_ref(),
            &payload.choice_order,
            payload.variable_naming.as_ref(),
        )?;
    }

    if let Some(dynamic) = payload.dynamic_choices {
        let mut parsed = parse_locator(index, &dynamic.locator)?;
        if let Some(kind) = dynamic.kind.as_deref().map(str::trim)
            && !kind.is_empty()
        {
            parsed.kind = DynamicChoiceKind::parse(kind);
        }
        question.dynamic_choices = Some(parsed);
    }

    Ok(question)
}

/// Walk `order` through the keyed choice map, attaching export names from `names`.
///
/// Keys may be numbers or numeric strings; both land in the same integer
/// key space. Without an explicit order the choices are taken by key.
fn enumerate_choices(
    index: usize,
    set: Option<&ChoiceSet>,
    order: &[ChoiceKey],
    names: Option<&BTreeMap<String, String>>,
) -> Result<Vec<Choice>> {
    let map = match set {
        None => return Ok(Vec::new()),
        Some(ChoiceSet::List(items)) if items.is_empty() => return Ok(Vec::new()),
        Some(ChoiceSet::List(_)) => {
            return Err(malformed(index, "choice list holds non-object entries"));
        }
        Some(ChoiceSet::Keyed(map)) => map,
    };

    let mut payloads: BTreeMap<i64, &ChoicePayload> = BTreeMap::new();
    for (key, payload) in map {
        payloads.insert(parse_key(index, key)?, payload);
    }

    let mut export_names: BTreeMap<i64, &str> = BTreeMap::new();
    for (key, name) in names.into_iter().flatten() {
        export_names.insert(parse_key(index, key)?, name.as_str());
    }

    let keys: Vec<i64> = if order.is_empty() {
        payloads.keys().copied().collect()
    } else {
        order
            .iter()
            .map(|key| choice_key(index, key))
            .collect::<Result<_>>()?
    };

    let mut choices = Vec::with_capacity(keys.len());
    for key in keys {
        let Some(payload) = payloads.get(&key) else {
            tracing::warn!(index, key, "choice order references an undefined choice");
            continue;
        };
        let has_text = match &payload.text_entry {
            Some(flag) => parse_flag(index, flag)?,
            None => false,
        };
        let choice = Choice::new(key.to_string(), payload.display.clone().unwrap_or_default())
            .with_var_name(export_names.get(&key).map(|name| (*name).to_string()))
            .with_text(has_text);
        choices.push(choice);
    }
    Ok(choices)
}

fn choice_key(index: usize, key: &ChoiceKey) -> Result<i64> {
    match key {
        ChoiceKey::Number(number) => Ok(*number),
        ChoiceKey::Text(text) => parse_key(index, text),
    }
}

fn parse_key(index: usize, key: &str) -> Result<i64> {
    key.trim()
        .parse()
        .map_err(|_| malformed(index, &format!("choice key '{key}' is not an integer")))
}

fn parse_flag(index: usize, flag: &Flag) -> Result<bool> {
    match flag {
        Flag::Bool(value) => Ok(*value),
        Flag::Text(text) => match text.trim() {
            "true" | "1" => Ok(true),
            "false" | "0" | "" => Ok(false),
            other => Err(malformed(
                index,
                &format!("text-entry flag '{other}' is not a boolean"),
            )),
        },
    }
}

/// Parse a `q://<QID>/.../<Kind>` locator.
fn parse_locator(index: usize, locator: &str) -> Result<DynamicChoices> {
    let path = locator
        .strip_prefix(LOCATOR_SCHEME)
        .ok_or_else(|| malformed(index, &format!("dynamic-choice locator '{locator}'")))?;
    let mut segments = path.split('/').filter(|segment| !segment.is_empty());
    let source = segments.next();
    let kind = segments.next_back();
    match (source, kind) {
        (Some(source), Some(kind)) => Ok(DynamicChoices {
            source: source.to_string(),
            kind: DynamicChoiceKind::parse(kind),
        }),
        _ => Err(malformed(
            index,
            &format!("dynamic-choice locator '{locator}'"),
        )),
    }
}

fn malformed(index: usize, reason: &str) -> IngestError {
    IngestError::MalformedElement {
        index,
        element: QUESTION_TAG.to_string(),
        reason: reason.to_string(),
    }
}

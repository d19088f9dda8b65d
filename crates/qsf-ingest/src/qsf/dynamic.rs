//! Dynamic-choice backfill.
//!
//! A question may declare that its choices are carried forward from another
//! question. The definition document then exports it with no choices of its
//! own. Resolution copies the source's choices into every such question; a
//! matrix takes its rows from the source's rows, or from its choices when the
//! source is not a matrix.

use std::collections::BTreeMap;
use std::fmt;

use qsf_model::{Choice, DynamicChoiceKind, Question, QuestionType};
use tracing::{debug, warn};

/// Why a dynamic-choice question was left without choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// The inheritance kind depends on response-time data.
    UnsupportedKind,
    /// The source question is not part of the survey.
    UnknownSource,
    /// The source question has no choices to copy.
    EmptySource,
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            UnresolvedReason::UnsupportedKind => "unsupported inheritance kind",
            UnresolvedReason::UnknownSource => "source question not found",
            UnresolvedReason::EmptySource => "source question has no choices",
        };
        f.write_str(text)
    }
}

/// A dynamic-choice question that resolution could not fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedDynamicChoices {
    pub question_id: String,
    pub source: String,
    pub kind: DynamicChoiceKind,
    pub reason: UnresolvedReason,
}

/// Resolve dynamic-choice inheritance over a parsed question set.
///
/// Returns a new question map; the input is left untouched. Chains such as
/// `QID3 <- QID2 <- QID1` resolve regardless of ID order because the pass
/// repeats until nothing changes.
pub fn resolve_dynamic_choices(
    questions: &BTreeMap<String, Question>,
) -> (BTreeMap<String, Question>, Vec<UnresolvedDynamicChoices>) {
    let mut resolved = questions.clone();
    let pending: Vec<String> = resolved
        .values()
        .filter(|question| needs_choices(question))
        .map(|question| question.id.clone())
        .collect();

    // Every round fills at least one empty list or stops; each question has two.
    for round in 0..=2 * pending.len() {
        let mut filled = 0;
        for id in &pending {
            let Some(target) = resolved.get(id) else {
                continue;
            };
            if !needs_choices(target) {
                continue;
            }
            let Some(dynamic) = target.dynamic_choices.as_ref() else {
                continue;
            };
            if !dynamic.kind.is_resolvable() {
                continue;
            }
            let Some(source) = resolved.get(&dynamic.source) else {
                continue;
            };
            let Some(fill) = backfill(target, source) else {
                continue;
            };
            let source_id = source.id.clone();

            if let Some(target) = resolved.get_mut(id) {
                debug!(question = %id, source = %source_id, "copied dynamic choices");
                if let Some((choices, ordered)) = fill.choices {
                    target.choices = choices;
                    target.ordered_choices = ordered;
                }
                if let Some(rows) = fill.sub_questions {
                    target.sub_questions = rows;
                }
                filled += 1;
            }
        }
        if filled == 0 {
            debug!(rounds = round, "dynamic choice resolution settled");
            break;
        }
    }

    let unresolved: Vec<UnresolvedDynamicChoices> = pending
        .iter()
        .filter_map(|id| resolved.get(id))
        .filter(|question| needs_choices(question))
        .filter_map(|question| {
            let dynamic = question.dynamic_choices.as_ref()?;
            let reason = if !dynamic.kind.is_resolvable() {
                UnresolvedReason::UnsupportedKind
            } else if !resolved.contains_key(&dynamic.source) {
                UnresolvedReason::UnknownSource
            } else {
                UnresolvedReason::EmptySource
            };
            Some(UnresolvedDynamicChoices {
                question_id: question.id.clone(),
                source: dynamic.source.clone(),
                kind: dynamic.kind.clone(),
                reason,
            })
        })
        .collect();

    for entry in &unresolved {
        warn!(
            question = %entry.question_id,
            source = %entry.source,
            kind = ?entry.kind,
            reason = %entry.reason,
            "dynamic choices left unresolved"
        );
    }

    (resolved, unresolved)
}

/// Lists a dynamic-choice question still lacks.
///
/// Matrix rows live in `sub_questions` and are checked on their own, so a
/// matrix with its own scale points but carried-forward rows still counts.
fn needs_choices(question: &Question) -> bool {
    question.dynamic_choices.is_some()
        && (question.choices.is_empty()
            || (question.kind == QuestionType::Matrix && question.sub_questions.is_empty()))
}

struct Backfill {
    choices: Option<(Vec<Choice>, bool)>,
    sub_questions: Option<Vec<Choice>>,
}

/// What `source` can contribute to the empty lists of `target`.
fn backfill(target: &Question, source: &Question) -> Option<Backfill> {
    let target_is_matrix = target.kind == QuestionType::Matrix;
    let source_is_matrix = source.kind == QuestionType::Matrix;

    // A matrix only takes scale points from another matrix.
    let choices = (target.choices.is_empty()
        && (!target_is_matrix || source_is_matrix)
        && !source.choices.is_empty())
    .then(|| (source.choices.clone(), source.ordered_choices));

    let sub_questions = if target_is_matrix && target.sub_questions.is_empty() {
        let rows = if source_is_matrix {
            &source.sub_questions
        } else {
            &source.choices
        };
        (!rows.is_empty()).then(|| rows.clone())
    } else {
        None
    };

    if choices.is_none() && sub_questions.is_none() {
        return None;
    }
    Some(Backfill {
        choices,
        sub_questions,
    })
}

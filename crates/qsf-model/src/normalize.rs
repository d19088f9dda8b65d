//! Canonicalization of raw response answer keys.
//!
//! Loop-and-merge blocks export one key per loop iteration
//! (`_<iteration>_<stem>[-<n>]`) and dynamic choices export carried-forward
//! choice IDs with an `x` marker (`QID5_x3_TEXT`). Both are folded back onto the
//! keys the question model expects. Rules apply in priority order: the
//! loop-iteration rule first, then the dynamic-choice rule; anything else passes
//! through untouched.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// `_<iteration>_<stem>` with an optional `-<n>` repetition suffix.
static LOOP_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^_\d+_(QID\d+.*?)(?:-\d+)?$").expect("invalid loop key regex"));

/// `<QID>_x<N>` with an optional `_TEXT` suffix.
static DYNAMIC_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(QID\d+_)x(\d+)(_TEXT)?$").expect("invalid dynamic choice key regex")
});

/// Timer sub-fields: `_FIRST_CLICK`, `_LAST_CLICK`, `_PAGE_SUBMIT`, `_CLICK_COUNT`.
static TIMER_STEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_(?:CLICK|SUBMIT|COUNT)$").expect("invalid timer regex"));

/// Map a raw answer key onto its canonical key.
///
/// Timer keys inside loop-and-merge blocks keep their iteration prefix: each
/// iteration has its own timing and the values must not be merged.
///
/// Normalizing an already-normalized key returns it unchanged.
pub fn normalize_answer_key(raw: &str) -> Cow<'_, str> {
    if let Some(caps) = LOOP_KEY.captures(raw) {
        let stem = caps.get(1).map_or("", |m| m.as_str());
        if is_timer_key(stem) {
            return Cow::Borrowed(raw);
        }
        return match rewrite_dynamic(stem) {
            Some(rewritten) => Cow::Owned(rewritten),
            None => Cow::Borrowed(stem),
        };
    }
    match rewrite_dynamic(raw) {
        Some(rewritten) => Cow::Owned(rewritten),
        None => Cow::Borrowed(raw),
    }
}

/// Returns true for timing sub-field keys.
pub fn is_timer_key(key: &str) -> bool {
    TIMER_STEM.is_match(key)
}

fn rewrite_dynamic(key: &str) -> Option<String> {
    let caps = DYNAMIC_KEY.captures(key)?;
    let prefix = caps.get(1).map_or("", |m| m.as_str());
    let number = caps.get(2).map_or("", |m| m.as_str());
    let text = caps.get(3).map_or("", |m| m.as_str());
    Some(format!("{prefix}{number}{text}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_keys_merge_onto_stem() {
        assert_eq!(normalize_answer_key("_1_QID7_TEXT"), "QID7_TEXT");
        assert_eq!(normalize_answer_key("_12_QID4_3"), "QID4_3");
        assert_eq!(normalize_answer_key("_2_QID4_3-1"), "QID4_3");
    }

    #[test]
    fn loop_timer_keys_are_preserved() {
        for key in [
            "_1_QID16_FIRST_CLICK",
            "_2_QID16_LAST_CLICK",
            "_3_QID16_PAGE_SUBMIT",
            "_1_QID16_CLICK_COUNT",
        ] {
            assert_eq!(normalize_answer_key(key), key);
        }
    }

    #[test]
    fn dynamic_keys_drop_the_marker() {
        assert_eq!(normalize_answer_key("QID5_x3"), "QID5_3");
        assert_eq!(normalize_answer_key("QID5_x12_TEXT"), "QID5_12_TEXT");
        assert_eq!(normalize_answer_key("_1_QID5_x2"), "QID5_2");
    }

    #[test]
    fn other_keys_pass_through() {
        for key in ["QID1", "QID4_2_TEXT", "QID16_FIRST_CLICK", "gender", "QID5_xy"] {
            assert_eq!(normalize_answer_key(key), key);
        }
    }

    #[test]
    fn timer_suffix_detection() {
        assert!(is_timer_key("QID16_PAGE_SUBMIT"));
        assert!(is_timer_key("QID16_CLICK_COUNT"));
        assert!(!is_timer_key("QID16_TEXT"));
        assert!(!is_timer_key("QID16_CLICKS"));
    }
}

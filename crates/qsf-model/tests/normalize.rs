//! Property tests for answer-key normalization.

use proptest::prelude::*;

use qsf_model::{Response, is_timer_key, normalize_answer_key};

fn qid() -> impl Strategy<Value = String> {
    (1u32..500).prop_map(|n| format!("QID{n}"))
}

fn plain_key() -> impl Strategy<Value = String> {
    prop_oneof![
        qid(),
        (qid(), 1u32..40).prop_map(|(q, c)| format!("{q}_{c}")),
        (qid(), 1u32..40).prop_map(|(q, c)| format!("{q}_{c}_TEXT")),
        (qid(), 1u32..10, 1u32..10).prop_map(|(q, s, c)| format!("{q}_{s}_{c}")),
        qid().prop_map(|q| format!("{q}_TEXT")),
        "[a-z][a-z_]{0,12}",
    ]
}

fn timer_key() -> impl Strategy<Value = String> {
    (
        qid(),
        prop_oneof![
            Just("FIRST_CLICK"),
            Just("LAST_CLICK"),
            Just("PAGE_SUBMIT"),
            Just("CLICK_COUNT"),
        ],
    )
        .prop_map(|(q, suffix)| format!("{q}_{suffix}"))
}

proptest! {
    #[test]
    fn normalization_is_idempotent(
        key in prop_oneof![
            plain_key(),
            (1u32..20, plain_key()).prop_map(|(i, k)| format!("_{i}_{k}")),
            (1u32..20, qid(), 1u32..30).prop_map(|(i, q, c)| format!("_{i}_{q}_x{c}")),
            (qid(), 1u32..30).prop_map(|(q, c)| format!("{q}_x{c}_TEXT")),
            (1u32..20, timer_key()).prop_map(|(i, k)| format!("_{i}_{k}")),
        ]
    ) {
        let once = normalize_answer_key(&key).into_owned();
        let twice = normalize_answer_key(&once).into_owned();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn loop_iterations_merge_onto_the_stem(
        iteration in 1u32..50,
        repeat in proptest::option::of(1u32..9),
        stem in (qid(), 1u32..40).prop_map(|(q, c)| format!("{q}_{c}")),
    ) {
        let raw = match repeat {
            Some(n) => format!("_{iteration}_{stem}-{n}"),
            None => format!("_{iteration}_{stem}"),
        };
        prop_assert_eq!(normalize_answer_key(&raw), stem.as_str());
    }

    #[test]
    fn looped_timers_never_merge(iteration in 1u32..50, stem in timer_key()) {
        let raw = format!("_{iteration}_{stem}");
        prop_assert!(is_timer_key(&stem));
        prop_assert_eq!(normalize_answer_key(&raw), raw.as_str());
    }

    #[test]
    fn looped_timers_keep_every_iteration(
        stem in timer_key(),
        values in proptest::collection::vec("[1-9][0-9]{0,3}\\.[0-9]", 2..6),
    ) {
        let mut response = Response::new("R_1");
        for (index, value) in values.iter().enumerate() {
            response.add_answer(&format!("_{}_{stem}", index + 1), value.as_str()).unwrap();
        }
        for (index, value) in values.iter().enumerate() {
            let key = format!("_{}_{stem}", index + 1);
            prop_assert_eq!(response.answer(&key), Some(value.as_str()));
        }
    }

    #[test]
    fn dynamic_choice_marker_is_dropped(q in qid(), n in 1u32..100, text in any::<bool>()) {
        let suffix = if text { "_TEXT" } else { "" };
        let raw = format!("{q}_x{n}{suffix}");
        let expected = format!("{q}_{n}{suffix}");
        prop_assert_eq!(normalize_answer_key(&raw), expected.as_str());
    }

    #[test]
    fn plain_keys_pass_through(key in plain_key()) {
        prop_assert_eq!(normalize_answer_key(&key), key.as_str());
    }
}

//! Property tests for the cookie data codec.

use girder_session::codec::{decode, encode};
use proptest::prelude::*;
use std::collections::HashMap;

/// Strings heavy in the characters the framing depends on.
fn delimiter_heavy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::sample::select(vec!['\0', ':', '%', '3', 'A', '0', '2', '5', 'x', 'é', '\n', ' ']),
        0..12,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

fn any_text() -> impl Strategy<Value = String> {
    prop_oneof![
        "(?s).{0,16}",
        delimiter_heavy(),
        Just(String::new()),
    ]
}

proptest! {
    #[test]
    fn test_round_trips_any_map(data in prop::collection::hash_map(any_text(), any_text(), 0..8)) {
        let wire = encode(&data);
        prop_assert_eq!(decode(&wire), data);
    }

    #[test]
    fn test_wire_form_is_cookie_safe(data in prop::collection::hash_map(any_text(), any_text(), 0..8)) {
        let wire = encode(&data);
        prop_assert!(wire.chars().all(|c| c.is_ascii_alphanumeric() || "-._~%".contains(c)));
    }

    #[test]
    fn test_values_never_add_records(key in "[a-z]{1,8}", value in delimiter_heavy()) {
        let mut data = HashMap::new();
        data.insert(key, value);

        let payload = urlencoding::decode(&encode(&data)).unwrap().into_owned();
        prop_assert_eq!(payload.matches('\0').count(), 2);
        prop_assert_eq!(payload.matches(':').count(), 1);
        prop_assert_eq!(decode(&encode(&data)).len(), 1);
    }

    #[test]
    fn test_decode_never_panics(wire in "(?s).{0,64}") {
        let _ = decode(&wire);
    }

    #[test]
    fn test_query_string_format_decodes_empty(wire in "[a-zA-Z0-9_]{1,8}=[a-zA-Z0-9_]{0,8}(&[a-zA-Z0-9_]{1,8}=[a-zA-Z0-9_]{0,8}){0,4}") {
        prop_assert!(decode(&wire).is_empty());
    }

    #[test]
    fn test_truncation_never_yields_partial_records(
        data in prop::collection::hash_map("[a-z]{1,6}", any_text(), 1..6),
        cut in 1usize..64,
    ) {
        let wire = encode(&data);
        let cut = cut.min(wire.len());
        let decoded = decode(&wire[..wire.len() - cut]);
        for (key, value) in &decoded {
            prop_assert_eq!(data.get(key), Some(value));
        }
    }
}

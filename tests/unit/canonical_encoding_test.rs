// Canonical parameter encoding
//
// The signed string must not depend on insertion order, must sort by the
// percent-encoded key, and must encode spaces as '+'.

use proptest::prelude::*;
use serde_json::json;
use settlepay::modules::gateways::services::{encode_component, ParamSet};

#[test]
fn test_reserved_punctuation_is_escaped() {
    assert_eq!(encode_component("Don (2) *gap*"), "Don+%282%29+%2Agap%2A");
    assert_eq!(encode_component("it's!"), "it%27s%21");
    assert_eq!(encode_component("a~b"), "a%7Eb");
    assert_eq!(encode_component("a-b_c.d"), "a-b_c.d");
}

#[test]
fn test_pairs_are_sorted_and_joined() {
    let params: ParamSet = [("b", "2"), ("a", "1"), ("c", "3")].into_iter().collect();
    assert_eq!(params.canonical_string(), "a=1&b=2&c=3");
}

#[test]
fn test_space_becomes_plus() {
    assert_eq!(encode_component("Thanh toan don hang"), "Thanh+toan+don+hang");
    assert_eq!(encode_component("a+b"), "a%2Bb");
}

#[test]
fn test_non_ascii_is_percent_encoded() {
    assert_eq!(encode_component("Thanh toán"), "Thanh+to%C3%A1n");
}

#[test]
fn test_sort_uses_encoded_key() {
    // Raw order puts "a b" first; encoded order puts "a%2B" before "a+b"
    let params: ParamSet = [("a b", "1"), ("a+", "2")].into_iter().collect();
    assert_eq!(params.canonical_string(), "a%2B=2&a+b=1");
}

#[test]
fn test_return_url_is_encoded() {
    let params: ParamSet = [("vnp_ReturnUrl", "https://shop.test/return?x=1")]
        .into_iter()
        .collect();
    assert_eq!(
        params.canonical_string(),
        "vnp_ReturnUrl=https%3A%2F%2Fshop.test%2Freturn%3Fx%3D1"
    );
}

#[test]
fn test_without_drops_signature_fields() {
    let params: ParamSet = [
        ("vnp_Amount", "5000000"),
        ("vnp_SecureHash", "abc"),
        ("vnp_SecureHashType", "HmacSHA512"),
    ]
    .into_iter()
    .collect();

    let stripped = params.without(&["vnp_SecureHash", "vnp_SecureHashType"]);
    assert_eq!(stripped.canonical_string(), "vnp_Amount=5000000");
    assert_eq!(params.len(), 3);
}

#[test]
fn test_from_json_flat_object() {
    let params = ParamSet::from_json(&json!({"amount": 50000, "orderId": "O1"})).unwrap();
    assert_eq!(params.canonical_string(), "amount=50000&orderId=O1");
}

#[test]
fn test_from_json_rejects_nested_values() {
    assert!(ParamSet::from_json(&json!({"items": [1, 2]})).is_err());
    assert!(ParamSet::from_json(&json!({"meta": {"a": 1}})).is_err());
    assert!(ParamSet::from_json(&json!({"flag": true})).is_err());
    assert!(ParamSet::from_json(&json!(["a"])).is_err());
}

#[test]
fn test_empty_set_encodes_to_empty_string() {
    assert_eq!(ParamSet::new().canonical_string(), "");
}

proptest! {
    #[test]
    fn test_encoding_is_insertion_order_independent(
        pairs in prop::collection::btree_map("[a-zA-Z_ +&=]{1,12}", "[ -~]{0,16}", 1..10),
        seed in any::<u64>()
    ) {
        let forward: Vec<(String, String)> = pairs.into_iter().collect();

        // Deterministic shuffle driven by the seed
        let mut shuffled = forward.clone();
        let mut state = seed;
        for i in (1..shuffled.len()).rev() {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let j = (state >> 33) as usize % (i + 1);
            shuffled.swap(i, j);
        }

        let a: ParamSet = forward.into_iter().collect();
        let b: ParamSet = shuffled.into_iter().collect();
        prop_assert_eq!(a.canonical_string(), b.canonical_string());
    }

    #[test]
    fn test_encoded_output_has_no_raw_separators_inside_pairs(
        pairs in prop::collection::btree_map("[a-z&= ]{1,8}", "[a-z&= ]{0,8}", 1..6)
    ) {
        let count = pairs.len();
        let params: ParamSet = pairs.into_iter().collect();
        let canonical = params.canonical_string();

        prop_assert_eq!(canonical.split('&').count(), count);
        for pair in canonical.split('&') {
            prop_assert_eq!(pair.matches('=').count(), 1);
            prop_assert!(!pair.contains(' '));
        }
    }
}

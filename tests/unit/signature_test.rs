// HMAC-SHA512 signing over canonical parameter strings

use proptest::prelude::*;
use settlepay::modules::gateways::services::callback_verifier::verify_signed_params;
use settlepay::modules::gateways::services::{signature, ParamSet};

fn scenario_params() -> ParamSet {
    [("a", "1"), ("b", "2")].into_iter().collect()
}

#[test]
fn test_sign_then_verify_with_same_secret() {
    let canonical = scenario_params().canonical_string();
    let digest = signature::sign(&canonical, "S").unwrap();

    assert!(signature::verify(&canonical, "S", &digest));
}

#[test]
fn test_verify_with_other_secret_fails() {
    let canonical = scenario_params().canonical_string();
    let digest = signature::sign(&canonical, "S").unwrap();

    assert!(!signature::verify(&canonical, "S2", &digest));
}

#[test]
fn test_digest_is_lowercase_sha512_hex() {
    let digest = signature::sign("a=1&b=2", "S").unwrap();
    assert_eq!(digest.len(), 128);
    assert!(digest.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
}

#[test]
fn test_uppercase_supplied_digest_accepted() {
    let digest = signature::sign("a=1&b=2", "S").unwrap();
    assert!(signature::verify("a=1&b=2", "S", &digest.to_uppercase()));
}

#[test]
fn test_malformed_supplied_digest_fails() {
    assert!(!signature::verify("a=1&b=2", "S", ""));
    assert!(!signature::verify("a=1&b=2", "S", "not-hex"));
    let digest = signature::sign("a=1&b=2", "S").unwrap();
    assert!(!signature::verify("a=1&b=2", "S", &digest[..64]));
}

#[test]
fn test_verify_signed_params_strips_signature_fields() {
    let mut params = scenario_params();
    let digest = signature::sign(&params.canonical_string(), "S").unwrap();
    params.insert("sig", digest).insert("sigType", "HmacSHA512");

    let verified = verify_signed_params(&params, "S", &["sig", "sigType"]).unwrap();
    assert_eq!(verified, scenario_params());
}

#[test]
fn test_verify_signed_params_rejects_missing_signature() {
    assert!(verify_signed_params(&scenario_params(), "S", &["sig"]).is_err());
}

proptest! {
    #[test]
    fn test_any_permutation_verifies(
        pairs in prop::collection::vec(("[a-zA-Z_]{1,10}", "[ -~]{0,20}"), 1..8),
        secret in "[ -~]{1,32}"
    ) {
        let signed: ParamSet = pairs.clone().into_iter().collect();
        let digest = signature::sign(&signed.canonical_string(), &secret).unwrap();

        let reversed: ParamSet = pairs.into_iter().rev().collect();

        // Later duplicates win on insert, so compare only when both saw the same values
        if reversed == signed {
            prop_assert!(signature::verify(&reversed.canonical_string(), &secret, &digest));
        }
    }

    #[test]
    fn test_single_character_mutation_fails(
        pairs in prop::collection::btree_map("[a-z]{1,8}", "[a-z0-9]{1,12}", 1..6),
        position in any::<prop::sample::Index>()
    ) {
        let params: ParamSet = pairs.into_iter().collect();
        let canonical = params.canonical_string();
        let digest = signature::sign(&canonical, "S").unwrap();

        let mut bytes = canonical.into_bytes();
        let i = position.index(bytes.len());
        bytes[i] = if bytes[i] == b'x' { b'y' } else { b'x' };
        let mutated = String::from_utf8(bytes).unwrap();

        prop_assert!(!signature::verify(&mutated, "S", &digest));
    }

    #[test]
    fn test_different_secret_fails(
        canonical in "[ -~]{0,64}",
        secret in "[a-z]{1,16}",
        other in "[A-Z]{1,16}"
    ) {
        let digest = signature::sign(&canonical, &secret).unwrap();
        prop_assert!(!signature::verify(&canonical, &other, &digest));
    }
}

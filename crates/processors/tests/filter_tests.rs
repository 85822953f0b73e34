//! Record filter tests.
//!
//! The predicate runs on raw, unnormalized records and must never panic,
//! whatever shape the record has.

use processors::RecordFilter;
use serde_json::json;

fn filter() -> RecordFilter {
    RecordFilter::from_parts("blackfriday", "en")
}

// ============================================================================
// Positive Cases
// ============================================================================

#[test]
fn keyword_and_language_match() {
    assert!(filter()
        .is_eligible(&json!({"text": "Big BlackFriday sale!", "lang": "en"})));
}

#[test]
fn keyword_match_is_case_insensitive() {
    let f = filter();
    assert!(f.is_eligible(&json!({"text": "BLACKFRIDAY!!!", "lang": "en"})));
    assert!(f.is_eligible(&json!({"text": "#blackfriday deals", "lang": "en"})));
}

#[test]
fn language_match_is_case_insensitive() {
    assert!(filter()
        .is_eligible(&json!({"text": "blackfriday", "lang": "EN"})));
}

#[test]
fn keyword_inside_longer_word_matches() {
    // Substring containment, hashtag or not.
    assert!(filter().is_eligible(
        &json!({"text": "pre-blackfridaysale starts now", "lang": "en"})
    ));
}

// ============================================================================
// Negative Cases
// ============================================================================

#[test]
fn wrong_language_is_ineligible() {
    assert!(!filter()
        .is_eligible(&json!({"text": "Big BlackFriday sale!", "lang": "fr"})));
}

#[test]
fn missing_text_is_ineligible() {
    assert!(!filter().is_eligible(&json!({"lang": "en"})));
}

#[test]
fn missing_lang_is_ineligible() {
    assert!(!filter().is_eligible(&json!({"text": "blackfriday"})));
}

#[test]
fn null_fields_are_ineligible() {
    let f = filter();
    assert!(!f.is_eligible(&json!({"text": null, "lang": "en"})));
    assert!(!f.is_eligible(&json!({"text": "blackfriday", "lang": null})));
}

#[test]
fn wrong_typed_fields_are_ineligible() {
    let f = filter();
    assert!(!f.is_eligible(&json!({"text": 42, "lang": "en"})));
    assert!(!f.is_eligible(&json!({"text": "blackfriday", "lang": ["en"]})));
}

#[test]
fn non_object_records_are_ineligible() {
    let f = filter();
    assert!(!f.is_eligible(&json!("blackfriday")));
    assert!(!f.is_eligible(&json!(null)));
    assert!(!f.is_eligible(&json!([1, 2, 3])));
}

#[test]
fn text_without_keyword_is_ineligible() {
    assert!(!filter()
        .is_eligible(&json!({"text": "just a tuesday", "lang": "en"})));
}

/*!
 * Tests for reply validation against each operation's schema
 */

use anyhow::Result;
use serde_json::json;

use aicm::errors::ValidationError;
use aicm::operations::Operation;
use aicm::validation::{validate, validate_required_keys};

#[test]
fn test_validate_summary_withFourKeyPoints_shouldPass() -> Result<()> {
    let payload = r#"{"summary": "S", "key_points": ["a", "b", "c", "d"]}"#;
    let result = validate(payload, Operation::summarize().schema())?;
    assert_eq!(result.get_list("key_points").len(), 4);
    Ok(())
}

#[test]
fn test_validate_summary_withSixKeyPoints_shouldFailLength() {
    let payload = r#"{"summary": "S", "key_points": ["a", "b", "c", "d", "e", "f"]}"#;
    let error = validate(payload, Operation::summarize().schema()).unwrap_err();
    assert_eq!(
        error,
        ValidationError::BadLength {
            key: "key_points".to_string(),
            len: 6,
            min: 3,
            max: 5,
        }
    );
}

#[test]
fn test_validate_summary_withMissingKeys_shouldReportEveryKey() {
    let error = validate("{}", Operation::summarize().schema()).unwrap_err();
    assert_eq!(
        error,
        ValidationError::MissingKeys(vec!["summary".to_string(), "key_points".to_string()])
    );
}

#[test]
fn test_validate_translation_withExtraKeys_shouldKeepThem() -> Result<()> {
    let payload = r#"{"translated_text": "Hallo", "target_language": "German", "notes": "informal"}"#;
    let result = validate(payload, Operation::translate("German").schema())?;
    assert_eq!(result.get_str("notes"), Some("informal"));
    Ok(())
}

#[test]
fn test_validate_translation_withNumericText_shouldFailType() {
    let payload = r#"{"translated_text": 42, "target_language": "German"}"#;
    assert!(matches!(
        validate(payload, Operation::translate("German").schema()),
        Err(ValidationError::WrongType { key, .. }) if key == "translated_text"
    ));
}

#[test]
fn test_validate_sentiment_withBoundaryConfidence_shouldPass() -> Result<()> {
    for confidence in ["0", "1", "0.0", "1.0"] {
        let payload = format!(
            r#"{{"sentiment": "neutral", "confidence": {}, "explanation": "e"}}"#,
            confidence
        );
        let result = validate(&payload, Operation::sentiment().schema())?;
        let value = result.get_f64("confidence").unwrap_or(-1.0);
        assert!((0.0..=1.0).contains(&value));
    }
    Ok(())
}

#[test]
fn test_validate_sentiment_withIntegerConfidence_shouldKeepOriginalNumber() -> Result<()> {
    let payload = r#"{"sentiment": "positive", "confidence": 1, "explanation": "e"}"#;
    let result = validate(payload, Operation::sentiment().schema())?;

    assert_eq!(result.get("confidence"), Some(&json!(1)));
    let stored = serde_json::to_string(&result)?;
    assert!(stored.contains(r#""confidence":1,"#), "{}", stored);
    Ok(())
}

#[test]
fn test_validate_sentiment_withNegativeConfidence_shouldBeOutOfRange() {
    let payload = r#"{"sentiment": "negative", "confidence": -0.1, "explanation": "e"}"#;
    assert!(matches!(
        validate(payload, Operation::sentiment().schema()),
        Err(ValidationError::OutOfRange { .. })
    ));
}

#[test]
fn test_validate_sentiment_withMixedLabel_shouldFailVocabulary() {
    let payload = r#"{"sentiment": "Mixed", "confidence": 0.5, "explanation": "e"}"#;
    assert!(matches!(
        validate(payload, Operation::sentiment().schema()),
        Err(ValidationError::NotInVocabulary { value, .. }) if value == "Mixed"
    ));
}

#[test]
fn test_validate_detection_withFencedPayload_shouldBeInvalidJson() {
    let payload = "```json\n{\"language\": \"English\"}\n```";
    assert!(matches!(
        validate(payload, Operation::detect_language().schema()),
        Err(ValidationError::InvalidJson(_))
    ));
}

#[test]
fn test_validate_detection_withString_shouldNotBeAnObject() {
    assert_eq!(
        validate("\"English\"", Operation::detect_language().schema()),
        Err(ValidationError::NotAnObject("a string".to_string()))
    );
}

#[test]
fn test_validate_required_keys_withAllPresent_shouldPass() -> Result<()> {
    let object = serde_json::json!({"a": 1, "b": null});
    let map = object.as_object().cloned().unwrap_or_default();
    validate_required_keys(&map, &["a", "b"])?;
    assert!(validate_required_keys(&map, &["a", "c"]).is_err());
    Ok(())
}

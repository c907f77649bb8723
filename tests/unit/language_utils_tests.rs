/*!
 * Tests for language utilities
 */

use aicm::language_utils::{get_language_name, normalize_target_language, same_language};

#[test]
fn test_get_language_name_withTerminologicCode_shouldResolve() {
    assert_eq!(get_language_name("deu").unwrap(), "German");
    assert_eq!(get_language_name("fre").unwrap(), get_language_name("fra").unwrap());
}

#[test]
fn test_get_language_name_withNonAlphabeticCode_shouldFail() {
    assert!(get_language_name("e-").is_err());
    assert!(get_language_name("").is_err());
}

#[test]
fn test_normalize_target_language_withCode_shouldExpand() {
    assert_eq!(normalize_target_language("it").unwrap(), "Italian");
    assert_eq!(normalize_target_language("IT").unwrap(), "Italian");
}

#[test]
fn test_normalize_target_language_withFreeFormName_shouldTrimOnly() {
    assert_eq!(normalize_target_language("  Swiss German\n").unwrap(), "Swiss German");
}

#[test]
fn test_same_language_withTwoCodes_shouldMatch() {
    assert!(same_language("fr", "fra"));
    assert!(!same_language("fr", "de"));
}

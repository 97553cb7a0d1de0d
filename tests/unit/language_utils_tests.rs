/*!
 * Tests for language utility functions
 */

use hbrip::language_utils::{get_language_name, normalize_allow_list, normalize_to_part2t};

/// Test normalization of language codes to ISO 639-2/T format
#[test]
fn test_normalize_to_part2t_withValidCodes_shouldNormalizeCorrectly() {
    // ISO 639-1
    assert_eq!(normalize_to_part2t("en").unwrap(), "eng");
    assert_eq!(normalize_to_part2t("de").unwrap(), "deu");
    assert_eq!(normalize_to_part2t("fr").unwrap(), "fra");

    // ISO 639-2/B
    assert_eq!(normalize_to_part2t("ger").unwrap(), "deu");
    assert_eq!(normalize_to_part2t("fre").unwrap(), "fra");
    assert_eq!(normalize_to_part2t("dut").unwrap(), "nld");

    // ISO 639-2/T is kept
    assert_eq!(normalize_to_part2t("deu").unwrap(), "deu");
    assert_eq!(normalize_to_part2t("ita").unwrap(), "ita");

    // Whitespace and case
    assert_eq!(normalize_to_part2t(" EN ").unwrap(), "eng");
    assert_eq!(normalize_to_part2t("GER").unwrap(), "deu");
}

/// Test invalid codes are rejected
#[test]
fn test_normalize_to_part2t_withInvalidCodes_shouldFail() {
    assert!(normalize_to_part2t("").is_err());
    assert!(normalize_to_part2t("e").is_err());
    assert!(normalize_to_part2t("123").is_err());
    assert!(normalize_to_part2t("english").is_err());
}

/// Test allow-lists keep unknown codes instead of dropping them
#[test]
fn test_normalize_allow_list_withUnknownCode_shouldKeepLowercase() {
    let codes = vec!["DE".to_string(), "Xx1".to_string(), "eng".to_string()];
    assert_eq!(normalize_allow_list(&codes), vec!["deu", "xx1", "eng"]);
    assert!(normalize_allow_list(&[]).is_empty());
}

/// Test language names
#[test]
fn test_get_language_name_withValidCodes_shouldReturnEnglishName() {
    assert_eq!(get_language_name("de").unwrap(), "German");
    assert_eq!(get_language_name("eng").unwrap(), "English");
    assert_eq!(get_language_name("fre").unwrap(), "French");
    assert!(get_language_name("123").is_err());
}

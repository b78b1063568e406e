/*!
 * Tests for language utility functions
 */

use doctrans::language_utils::{
    LanguageCodeType, get_language_name, language_codes_match, normalize_to_part1_or_part2t, normalize_to_part2t,
    provider_code, validate_language_code,
};

/// Test validation of language codes
#[test]
fn test_validate_language_code_withValidCodes_shouldReturnCorrectType() {
    // ISO 639-1 tests
    assert_eq!(validate_language_code("en").unwrap(), LanguageCodeType::Part1);
    assert_eq!(validate_language_code("de").unwrap(), LanguageCodeType::Part1);

    // ISO 639-2/T tests
    assert_eq!(validate_language_code("eng").unwrap(), LanguageCodeType::Part2T);
    assert_eq!(validate_language_code("deu").unwrap(), LanguageCodeType::Part2T);

    // ISO 639-2/B tests
    assert_eq!(validate_language_code("fre").unwrap(), LanguageCodeType::Part2B);
    assert_eq!(validate_language_code("ger").unwrap(), LanguageCodeType::Part2B);

    // Whitespace and case tests
    assert_eq!(validate_language_code(" EN ").unwrap(), LanguageCodeType::Part1);

    // Invalid codes
    assert!(validate_language_code("123").is_err());
    assert!(validate_language_code("e").is_err());
    assert!(validate_language_code("").is_err());
}

#[test]
fn test_normalize_withValidCodes_shouldNormalizeCorrectly() {
    assert_eq!(normalize_to_part2t("fr").unwrap(), "fra");
    assert_eq!(normalize_to_part2t("FRE").unwrap(), "fra");
    assert_eq!(normalize_to_part1_or_part2t("deu").unwrap(), "de");
    assert_eq!(normalize_to_part1_or_part2t("ger").unwrap(), "de");
}

#[test]
fn test_provider_code_shouldBeUpperCasePart1() {
    assert_eq!(provider_code("en").unwrap(), "EN");
    assert_eq!(provider_code("jpn").unwrap(), "JA");
    assert!(provider_code("??").is_err());
}

#[test]
fn test_language_codes_match_withEquivalentCodes_shouldMatch() {
    assert!(language_codes_match("en", "eng"));
    assert!(language_codes_match("fre", "fr"));
    assert!(!language_codes_match("en", "fr"));
    assert!(!language_codes_match("en", "nonsense"));
}

#[test]
fn test_get_language_name_shouldUseEnglishName() {
    assert_eq!(get_language_name("es").unwrap(), "Spanish");
    assert_eq!(get_language_name("ger").unwrap(), "German");
    assert!(get_language_name("").is_err());
}

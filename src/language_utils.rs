//! Language utilities for ISO language code handling
//!
//! Validation, normalization and matching of ISO 639-1 (2-letter) and
//! ISO 639-2 (3-letter) codes, plus the codes translation providers expect.

use anyhow::{Result, anyhow};
use isolang::Language;

/// ISO 639-2/B codes that differ from their ISO 639-2/T counterpart
const BIBLIOGRAPHIC_CODES: [(&str, &str); 18] = [
    ("fre", "fra"), // French
    ("ger", "deu"), // German
    ("dut", "nld"), // Dutch
    ("gre", "ell"), // Greek
    ("chi", "zho"), // Chinese
    ("cze", "ces"), // Czech
    ("ice", "isl"), // Icelandic
    ("alb", "sqi"), // Albanian
    ("arm", "hye"), // Armenian
    ("baq", "eus"), // Basque
    ("bur", "mya"), // Burmese
    ("per", "fas"), // Persian
    ("geo", "kat"), // Georgian
    ("may", "msa"), // Malay
    ("mac", "mkd"), // Macedonian
    ("rum", "ron"), // Romanian
    ("slo", "slk"), // Slovak
    ("wel", "cym"), // Welsh
];

/// Language code type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageCodeType {
    /// ISO 639-1 (2-letter) code
    Part1,
    /// ISO 639-2/T (3-letter) code
    Part2T,
    /// ISO 639-2/B (3-letter) code
    Part2B,
}

fn terminological(code: &str) -> Option<&'static str> {
    BIBLIOGRAPHIC_CODES
        .iter()
        .find(|(bibliographic, _)| *bibliographic == code)
        .map(|(_, terminological)| *terminological)
}

/// Resolve a code of any supported kind to a language
fn resolve(code: &str) -> Option<(Language, LanguageCodeType)> {
    let normalized_code = code.trim().to_lowercase();
    match normalized_code.len() {
        2 => Language::from_639_1(&normalized_code).map(|lang| (lang, LanguageCodeType::Part1)),
        3 => Language::from_639_3(&normalized_code)
            .map(|lang| (lang, LanguageCodeType::Part2T))
            .or_else(|| {
                terminological(&normalized_code)
                    .and_then(Language::from_639_3)
                    .map(|lang| (lang, LanguageCodeType::Part2B))
            }),
        _ => None,
    }
}

/// Validate if a language code is a valid ISO 639-1 or ISO 639-2 code
pub fn validate_language_code(code: &str) -> Result<LanguageCodeType> {
    resolve(code)
        .map(|(_, kind)| kind)
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    resolve(code)
        .map(|(lang, _)| lang.to_639_3().to_string())
        .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-1 (2-letter) format if possible
/// Falls back to ISO 639-2/T if no ISO 639-1 code exists
pub fn normalize_to_part1_or_part2t(code: &str) -> Result<String> {
    let (lang, _) = resolve(code).ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))?;
    Ok(lang
        .to_639_1()
        .map(|part1| part1.to_string())
        .unwrap_or_else(|| lang.to_639_3().to_string()))
}

/// Upper-case ISO 639-1 code as DeepL expects it (`EN`, `DE`)
pub fn provider_code(code: &str) -> Result<String> {
    Ok(normalize_to_part1_or_part2t(code)?.to_uppercase())
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part2t(code1), normalize_to_part2t(code2)) {
        (Ok(normalized1), Ok(normalized2)) => normalized1 == normalized2,
        _ => false,
    }
}

/// Get the language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let (lang, _) = resolve(code).ok_or_else(|| anyhow!("Failed to get language from code: {}", code))?;
    Ok(lang.to_name().to_string())
}

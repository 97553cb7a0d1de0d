use anyhow::{Result, anyhow};
use isolang::Language;
use log::warn;

// Language utilities for ISO language code handling
//
// HandBrake reports track languages as ISO 639-2/T codes (`deu`, `eng`,
// `fra`). User supplied codes (ISO 639-1, ISO 639-2/B or ISO 639-2/T) are
// normalized to that form so allow-lists compare equal to scan output.

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

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();

    // If it's a 2-letter code, convert to 3-letter
    if normalized_code.len() == 2 {
        if let Some(lang) = Language::from_639_1(&normalized_code) {
            return Ok(lang.to_639_3().to_string());
        }
    }
    // If it's already a 3-letter code, ensure it's ISO 639-2/T
    else if normalized_code.len() == 3 {
        if let Some((_, terminology)) = BIBLIOGRAPHIC_CODES.iter().find(|(b, _)| *b == normalized_code) {
            return Ok(terminology.to_string());
        }

        if Language::from_639_3(&normalized_code).is_some() {
            return Ok(normalized_code);
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Normalize every code of an allow-list, keeping unknown codes lowercase.
///
/// Codes such as `und` are not real languages but still appear in scan output,
/// so they are kept instead of rejected.
pub fn normalize_allow_list(codes: &[String]) -> Vec<String> {
    codes.iter()
        .map(|code| match normalize_to_part2t(code) {
            Ok(normalized) => normalized,
            Err(e) => {
                warn!("Language code issue: {}", e);
                code.trim().to_lowercase()
            }
        })
        .collect()
}

/// Get the language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}

//! Language utilities for translation targets
//!
//! Targets may be given as an English language name or as an ISO 639-1
//! (2-letter) or ISO 639-2 (3-letter) code. Codes are expanded to the English
//! name before they are interpolated into an instruction.

use anyhow::{Result, anyhow};
use isolang::Language;

/// ISO 639-2/B codes that differ from their ISO 639-2/T counterpart
const BIBLIOGRAPHIC_CODES: &[(&str, &str)] = &[
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("dut", "nld"),
    ("fre", "fra"),
    ("geo", "kat"),
    ("ger", "deu"),
    ("gre", "ell"),
    ("ice", "isl"),
    ("mac", "mkd"),
    ("may", "msa"),
    ("per", "fas"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Resolve a 2- or 3-letter code to a language
fn resolve_code(code: &str) -> Option<Language> {
    let normalized_code = code.trim().to_lowercase();
    if !normalized_code.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    match normalized_code.len() {
        2 => Language::from_639_1(&normalized_code),
        3 => {
            let part2t = BIBLIOGRAPHIC_CODES
                .iter()
                .find(|(bibliographic, _)| *bibliographic == normalized_code)
                .map(|(_, terminologic)| *terminologic)
                .unwrap_or(normalized_code.as_str());
            Language::from_639_3(part2t)
        }
        _ => None,
    }
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let lang = resolve_code(code).ok_or_else(|| anyhow!("Invalid language code: {}", code))?;
    Ok(lang.to_name().to_string())
}

/// Turn a user-supplied target into the name sent to the model
///
/// Codes become English names, anything else is passed through trimmed.
pub fn normalize_target_language(target: &str) -> Result<String> {
    let trimmed = target.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Target language must not be empty"));
    }

    Ok(get_language_name(trimmed).unwrap_or_else(|_| trimmed.to_string()))
}

/// Check if two language names or codes denote the same language
pub fn same_language(first: &str, second: &str) -> bool {
    let name = |value: &str| {
        get_language_name(value)
            .unwrap_or_else(|_| value.trim().to_string())
            .to_lowercase()
    };
    name(first) == name(second)
}

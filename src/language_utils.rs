use anyhow::{anyhow, Result};
use isolang::Language;

/// Language utilities for ISO language code handling
///
/// Translation prompts address languages by name, so every code that enters
/// the pipeline is validated and resolvable to an English display name.
/// Validate that a code is a known ISO 639-1 or ISO 639-3 language code
pub fn validate_language_code(code: &str) -> Result<()> {
    let normalized = code.trim().to_lowercase();

    let known = match normalized.len() {
        2 => Language::from_639_1(&normalized).is_some(),
        3 => Language::from_639_3(&normalized).is_some(),
        _ => false,
    };

    if known {
        Ok(())
    } else {
        Err(anyhow!("Invalid language code: {}", code))
    }
}

/// English display name for a language code, used in translation prompts
pub fn language_name(code: &str) -> Result<String> {
    let normalized = code.trim().to_lowercase();

    let language = match normalized.len() {
        2 => Language::from_639_1(&normalized),
        3 => Language::from_639_3(&normalized),
        _ => None,
    };

    language
        .map(|l| l.to_name().to_string())
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

/// Whether two language codes denote the same language
pub fn language_codes_match(first: &str, second: &str) -> bool {
    let resolve = |code: &str| {
        let normalized = code.trim().to_lowercase();
        match normalized.len() {
            2 => Language::from_639_1(&normalized),
            3 => Language::from_639_3(&normalized),
            _ => None,
        }
    };

    match (resolve(first), resolve(second)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

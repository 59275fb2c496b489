/*!
 * Prompt construction for batch translation.
 *
 * Segments are serialized as `SEGMENT_<index>: <text>` lines and the system
 * prompt instructs the model to answer with the markers preserved verbatim,
 * one line per segment, so the response can be parsed back per segment.
 */

use once_cell::sync::Lazy;
use regex::Regex;

// @const: response line regex, one translated segment per line
pub static SEGMENT_LINE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^SEGMENT_(\d+):\s*(.+)$").unwrap());

/// System prompt template for batch subtitle translation.
pub const BATCH_TRANSLATOR: &str = r#"You are an expert subtitle translator specializing in {source_language} to {target_language} translation.

## Your Role
- Translate each segment naturally while preserving meaning and emotion
- Adapt pronouns, honorifics and cultural references for a {target_language} audience
- Keep translations concise; subtitles have limited display time

## Output Requirements
- Answer with EXACTLY one line per input segment
- Each line MUST start with its marker, copied verbatim: SEGMENT_<number>:
- Keep the segments in their input order
- Do not add commentary, notes or any text outside the marked lines

## Quality Standards
- Natural, idiomatic {target_language}
- Appropriate register (formal/informal) based on dialogue context
- Length similar to the original where possible
- Never translate proper names unless the target language convention requires it"#;

/// Render the batch system prompt for a language pair
pub fn system_prompt(source_language: &str, target_language: &str) -> String {
    BATCH_TRANSLATOR
        .replace("{source_language}", source_language)
        .replace("{target_language}", target_language)
}

/// Serialize segment texts as marker-delimited lines, preserving order
pub fn serialize_segments(texts: &[String]) -> String {
    texts
        .iter()
        .enumerate()
        .map(|(index, text)| format!("SEGMENT_{}: {}", index, text.replace('\n', " ")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse a marked-up response into (index, translation) pairs.
///
/// Lines that do not match the marker pattern are ignored; the caller
/// compares returned indices against the request to surface partial results.
pub fn parse_response(response: &str) -> Vec<(usize, String)> {
    response
        .lines()
        .filter_map(|line| {
            SEGMENT_LINE_REGEX.captures(line.trim()).and_then(|capture| {
                let index: usize = capture[1].parse().ok()?;
                let text = capture[2].trim().to_string();
                if text.is_empty() {
                    None
                } else {
                    Some((index, text))
                }
            })
        })
        .collect()
}

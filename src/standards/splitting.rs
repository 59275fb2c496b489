/*!
 * Splitting of over-long segments.
 *
 * A segment whose span exceeds the maximum display duration is split at
 * sentence boundaries where possible, falling back to proportional word
 * chunks for a single run-on sentence. The sub-spans always partition the
 * original span exactly.
 */

use once_cell::sync::Lazy;
use regex::Regex;

// Sentence enders cover Latin punctuation plus the Bengali danda.
static SENTENCE_SPLIT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)(.*?[.!?\u{0964}](?:\s+|$))").unwrap()
});

/// A sub-segment produced by splitting
#[derive(Debug, Clone, PartialEq)]
pub struct SplitSegment {
    /// Text of the sub-segment
    pub text: String,
    /// Start of the sub-span in milliseconds
    pub start_time_ms: u64,
    /// End of the sub-span in milliseconds
    pub end_time_ms: u64,
}

/// Split a segment that exceeds `max_duration_ms` into sub-segments.
///
/// Time is allocated to sub-segments in proportion to their character share
/// of the whole text; the final sub-segment absorbs rounding so the spans
/// always sum to the original span. A segment within the limit is returned
/// unchanged as a single element.
pub fn split_long_segment(
    text: &str,
    start_time_ms: u64,
    end_time_ms: u64,
    max_duration_ms: u64,
) -> Vec<SplitSegment> {
    let duration = end_time_ms.saturating_sub(start_time_ms);

    if duration <= max_duration_ms || text.trim().is_empty() {
        return vec![SplitSegment {
            text: text.to_string(),
            start_time_ms,
            end_time_ms,
        }];
    }

    let parts_needed = duration.div_ceil(max_duration_ms) as usize;

    let sentences = split_sentences(text);
    let pieces = if sentences.len() >= 2 {
        group_sentences(sentences, parts_needed)
    } else {
        split_by_word_count(text, parts_needed)
    };

    allocate_spans(pieces, start_time_ms, end_time_ms)
}

/// Break text into sentences, keeping terminal punctuation attached
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences: Vec<String> = SENTENCE_SPLIT_REGEX
        .captures_iter(text)
        .map(|c| c[1].trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    // Trailing text without a sentence ender
    let consumed: usize = SENTENCE_SPLIT_REGEX
        .find_iter(text)
        .map(|m| m.end())
        .max()
        .unwrap_or(0);
    let tail = text[consumed..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }

    sentences
}

/// Distribute sentences over roughly `parts` groups of balanced length
fn group_sentences(sentences: Vec<String>, parts: usize) -> Vec<String> {
    let parts = parts.min(sentences.len()).max(1);
    let total_chars: usize = sentences.iter().map(|s| s.chars().count()).sum();
    let target = total_chars.div_ceil(parts);

    let mut groups: Vec<String> = Vec::with_capacity(parts);
    let mut current = String::new();

    for sentence in sentences {
        if !current.is_empty() && current.chars().count() + sentence.chars().count() > target {
            groups.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&sentence);
    }
    if !current.is_empty() {
        groups.push(current);
    }

    groups
}

/// Split a single long sentence into `parts` chunks of balanced word count
fn split_by_word_count(text: &str, parts: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return vec![text.to_string()];
    }

    let parts = parts.min(words.len()).max(1);
    let per_chunk = words.len().div_ceil(parts);

    words
        .chunks(per_chunk)
        .map(|chunk| chunk.join(" "))
        .collect()
}

/// Allocate the original span over pieces proportionally to character count
fn allocate_spans(pieces: Vec<String>, start_time_ms: u64, end_time_ms: u64) -> Vec<SplitSegment> {
    let duration = end_time_ms - start_time_ms;
    let total_chars: usize = pieces.iter().map(|p| p.chars().count()).sum();
    let count = pieces.len();

    let mut segments = Vec::with_capacity(count);
    let mut cursor = start_time_ms;

    for (idx, piece) in pieces.into_iter().enumerate() {
        let end = if idx == count - 1 {
            end_time_ms
        } else {
            let share = if total_chars == 0 {
                duration / count as u64
            } else {
                (duration as f64 * piece.chars().count() as f64 / total_chars as f64) as u64
            };
            // Every sub-span keeps at least one millisecond
            (cursor + share.max(1)).min(end_time_ms.saturating_sub(1))
        };

        segments.push(SplitSegment {
            text: piece,
            start_time_ms: cursor,
            end_time_ms: end,
        });
        cursor = end;
    }

    segments
}

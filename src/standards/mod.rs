/*!
 * Broadcast subtitle standards engine.
 *
 * Validates a text + time-span unit against duration, line-length, line-count
 * and reading-speed constraints, producing a [`StandardsReport`] with a
 * 0-100 compliance score. The report is ephemeral: it feeds the confidence
 * scorer and is discarded once the confidence value is derived.
 *
 * Defaults follow common broadcast practice; youth content gets a stricter
 * reading-speed cap.
 */

use std::fmt;

pub mod splitting;

pub use splitting::{split_long_segment, SplitSegment};

/// Minimum on-screen duration (5/6 of a second)
pub const MIN_DURATION_MS: u64 = 833;

/// Maximum on-screen duration
pub const MAX_DURATION_MS: u64 = 7_000;

/// Maximum characters per subtitle line
pub const MAX_CHARS_PER_LINE: usize = 47;

/// Maximum number of lines per subtitle
pub const MAX_LINES: usize = 2;

/// Maximum reading speed in words per minute
pub const MAX_READING_SPEED_WPM: f64 = 250.0;

/// Stricter reading-speed cap for youth content
pub const MAX_READING_SPEED_WPM_YOUTH: f64 = 180.0;

/// A single line under this length earns a compactness bonus
const SINGLE_LINE_BONUS_CHARS: usize = 40;

/// Reading speed inside this band is comfortable and earns a bonus
const COMFORT_SPEED_WPM: (f64, f64) = (150.0, 200.0);

/// Score penalties per violation kind
const PENALTY_DURATION_TOO_SHORT: i32 = 15;
const PENALTY_DURATION_TOO_LONG: i32 = 10;
const PENALTY_LINE_TOO_LONG: i32 = 20;
const PENALTY_TOO_MANY_LINES: i32 = 25;
const PENALTY_READING_TOO_FAST: i32 = 15;

/// Small bonuses for comfortable formatting
const BONUS_COMFORT_SPEED: i32 = 5;
const BONUS_COMPACT_LINE: i32 = 5;

/// A standards violation found while validating a segment
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    /// Segment is on screen for less than the minimum duration
    DurationTooShort {
        duration_ms: u64,
        min_ms: u64,
    },
    /// Segment is on screen for longer than the maximum duration
    DurationTooLong {
        duration_ms: u64,
        max_ms: u64,
    },
    /// A rendered line exceeds the per-line character limit
    LineTooLong {
        line: usize,
        chars: usize,
        max_chars: usize,
    },
    /// Text needs more lines than the subtitle may occupy
    TooManyLines {
        lines: usize,
        max_lines: usize,
    },
    /// Required reading speed exceeds the cap
    ReadingSpeedTooFast {
        wpm: f64,
        max_wpm: f64,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::DurationTooShort { duration_ms, min_ms } => {
                write!(f, "Duration too short: {}ms < {}ms", duration_ms, min_ms)
            }
            Violation::DurationTooLong { duration_ms, max_ms } => {
                write!(f, "Duration too long: {}ms > {}ms", duration_ms, max_ms)
            }
            Violation::LineTooLong { line, chars, max_chars } => {
                write!(f, "Line {} too long: {} chars > {}", line, chars, max_chars)
            }
            Violation::TooManyLines { lines, max_lines } => {
                write!(f, "Too many lines: {} > {}", lines, max_lines)
            }
            Violation::ReadingSpeedTooFast { wpm, max_wpm } => {
                write!(f, "Reading speed too fast: {:.0} wpm > {:.0} wpm", wpm, max_wpm)
            }
        }
    }
}

/// Compliance report for a single text + time-span unit
#[derive(Debug, Clone)]
pub struct StandardsReport {
    /// True iff no violations were found
    pub is_valid: bool,
    /// Violations found, in check order
    pub violations: Vec<Violation>,
    /// One actionable recommendation per violation
    pub recommendations: Vec<String>,
    /// Compliance score, 0-100
    pub quality_score: u8,
}

/// Subtitle standards validator
#[derive(Debug, Clone, Copy, Default)]
pub struct SubtitleStandards {
    /// Apply the stricter youth reading-speed cap
    pub youth_content: bool,
}

impl SubtitleStandards {
    /// Create a validator with the default (adult) reading-speed cap
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a validator with the stricter youth reading-speed cap
    pub fn for_youth_content() -> Self {
        Self { youth_content: true }
    }

    /// Effective reading-speed cap in words per minute
    pub fn max_reading_speed(&self) -> f64 {
        if self.youth_content {
            MAX_READING_SPEED_WPM_YOUTH
        } else {
            MAX_READING_SPEED_WPM
        }
    }

    /// Validate a text + time-span unit against every standards rule
    pub fn validate(&self, text: &str, start_time_ms: u64, end_time_ms: u64) -> StandardsReport {
        let mut violations = Vec::new();
        let mut recommendations = Vec::new();
        let mut score: i32 = 100;

        let duration_ms = end_time_ms.saturating_sub(start_time_ms);

        if duration_ms < MIN_DURATION_MS {
            violations.push(Violation::DurationTooShort {
                duration_ms,
                min_ms: MIN_DURATION_MS,
            });
            recommendations
                .push("Extend the display time or merge with an adjacent segment".to_string());
            score -= PENALTY_DURATION_TOO_SHORT;
        } else if duration_ms > MAX_DURATION_MS {
            violations.push(Violation::DurationTooLong {
                duration_ms,
                max_ms: MAX_DURATION_MS,
            });
            recommendations.push("Split the segment into shorter parts".to_string());
            score -= PENALTY_DURATION_TOO_LONG;
        }

        // Explicit line breaks are honored as-is; otherwise the text is packed
        // greedily without the display cap so an overflow is observable.
        let lines: Vec<String> = if text.contains('\n') {
            text.lines().map(|l| l.to_string()).collect()
        } else {
            pack_lines(text)
        };

        for (idx, line) in lines.iter().enumerate() {
            let chars = line.chars().count();
            if chars > MAX_CHARS_PER_LINE {
                violations.push(Violation::LineTooLong {
                    line: idx + 1,
                    chars,
                    max_chars: MAX_CHARS_PER_LINE,
                });
                recommendations.push(format!(
                    "Break line {} at a natural phrase boundary",
                    idx + 1
                ));
                score -= PENALTY_LINE_TOO_LONG;
                break;
            }
        }

        if lines.len() > MAX_LINES {
            violations.push(Violation::TooManyLines {
                lines: lines.len(),
                max_lines: MAX_LINES,
            });
            recommendations.push("Shorten the text or split the segment".to_string());
            score -= PENALTY_TOO_MANY_LINES;
        }

        let wpm = reading_speed_wpm(text, duration_ms);
        let max_wpm = self.max_reading_speed();
        if wpm > max_wpm {
            violations.push(Violation::ReadingSpeedTooFast { wpm, max_wpm });
            recommendations
                .push("Condense the wording or increase the display time".to_string());
            score -= PENALTY_READING_TOO_FAST;
        }

        if wpm >= COMFORT_SPEED_WPM.0 && wpm <= COMFORT_SPEED_WPM.1 {
            score += BONUS_COMFORT_SPEED;
        }
        if lines.len() == 1
            && lines
                .first()
                .map(|l| l.chars().count() < SINGLE_LINE_BONUS_CHARS)
                .unwrap_or(false)
        {
            score += BONUS_COMPACT_LINE;
        }

        StandardsReport {
            is_valid: violations.is_empty(),
            violations,
            recommendations,
            quality_score: score.clamp(0, 100) as u8,
        }
    }
}

/// Reading speed in words per minute for a text shown over a duration
pub fn reading_speed_wpm(text: &str, duration_ms: u64) -> f64 {
    let words = text.split_whitespace().count();
    if duration_ms == 0 {
        return f64::INFINITY;
    }
    let minutes = duration_ms as f64 / 60_000.0;
    words as f64 / minutes
}

/// Greedily pack words into display lines, capped at [`MAX_LINES`].
///
/// Words beyond the line cap are dropped; the caller is expected to have
/// split over-long segments beforehand.
pub fn line_break(text: &str) -> Vec<String> {
    let mut lines = pack_lines(text);
    lines.truncate(MAX_LINES);
    lines
}

/// Greedy word packing without the display cap.
///
/// A single word longer than the per-line limit is hard-split at the limit.
fn pack_lines(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > MAX_CHARS_PER_LINE {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let chars: Vec<char> = word.chars().collect();
            for chunk in chars.chunks(MAX_CHARS_PER_LINE) {
                lines.push(chunk.iter().collect());
            }
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
        } else if current.chars().count() + 1 + word_len <= MAX_CHARS_PER_LINE {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

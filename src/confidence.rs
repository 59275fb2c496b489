/*!
 * Confidence scoring for transcript segments and translations.
 *
 * Combines a per-provider reliability weight, the standards compliance score
 * and segment-structural heuristics into a single 0-1 confidence value. The
 * same blend is used for transcription and translation; the translation
 * variant additionally weighs the source/target length ratio as a proxy for
 * omission or padding.
 */

use std::collections::HashMap;

use log::debug;

use crate::standards::{MAX_CHARS_PER_LINE, MAX_DURATION_MS, MIN_DURATION_MS};

/// Reliability weight applied to providers without a table entry
const DEFAULT_RELIABILITY: f64 = 0.8;

/// Weight of the provider-reported confidence in the blend
const PROVIDER_WEIGHT: f64 = 0.7;

/// Weight of the standards compliance score in the blend
const STANDARDS_WEIGHT: f64 = 0.3;

/// Bonus for a duration inside the standards bounds
const DURATION_BONUS: f64 = 0.05;

/// Bonus for a text length inside the ideal line envelope
const LENGTH_BONUS: f64 = 0.03;

/// Penalty for a text short enough to be noise
const FRAGMENT_PENALTY: f64 = 0.10;

/// Texts below this length are treated as likely noise fragments
const FRAGMENT_CHARS: usize = 5;

/// Translation length ratios outside this band suggest omission or padding
const LENGTH_RATIO_BOUNDS: (f64, f64) = (0.3, 3.0);

/// Confidence scorer with a per-provider reliability table
#[derive(Debug, Clone)]
pub struct ConfidenceScorer {
    reliability: HashMap<String, f64>,
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        let mut reliability = HashMap::new();
        reliability.insert("whisper".to_string(), 0.92);
        reliability.insert("deepgram".to_string(), 0.90);
        reliability.insert("anthropic".to_string(), 0.93);
        reliability.insert("openai".to_string(), 0.90);
        reliability.insert("ollama".to_string(), 0.75);
        Self { reliability }
    }
}

impl ConfidenceScorer {
    /// Create a scorer with the default reliability table
    pub fn new() -> Self {
        Self::default()
    }

    /// Reliability weight for a provider, defaulting for unknown names
    pub fn reliability(&self, provider: &str) -> f64 {
        self.reliability
            .get(&provider.to_lowercase())
            .copied()
            .unwrap_or(DEFAULT_RELIABILITY)
    }

    /// Score a transcription segment.
    ///
    /// `raw_confidence` is the provider-reported confidence, `quality_score`
    /// the 0-100 standards compliance score for the same text and span.
    pub fn score(
        &self,
        raw_confidence: f64,
        provider: &str,
        quality_score: u8,
        text_len: usize,
        duration_ms: u64,
    ) -> f64 {
        let weighted = raw_confidence.clamp(0.0, 1.0) * self.reliability(provider);
        let mut confidence =
            PROVIDER_WEIGHT * weighted + STANDARDS_WEIGHT * (quality_score as f64 / 100.0);

        if (MIN_DURATION_MS..=MAX_DURATION_MS).contains(&duration_ms) {
            confidence += DURATION_BONUS;
        }
        if text_len > 0 && text_len <= MAX_CHARS_PER_LINE {
            confidence += LENGTH_BONUS;
        }
        if text_len < FRAGMENT_CHARS {
            confidence -= FRAGMENT_PENALTY;
        }

        let confidence = confidence.clamp(0.0, 1.0);
        debug!(
            "scored segment: provider={} raw={:.2} quality={} -> {:.3}",
            provider, raw_confidence, quality_score, confidence
        );
        confidence
    }

    /// Score a translation of a source segment.
    ///
    /// There is no provider-reported confidence for a text completion, so a
    /// structural baseline stands in for it before the common blend.
    pub fn score_translation(
        &self,
        source_text: &str,
        translated_text: &str,
        provider: &str,
        quality_score: u8,
        duration_ms: u64,
    ) -> f64 {
        let baseline = translation_baseline(source_text, translated_text);
        self.score(
            baseline,
            provider,
            quality_score,
            translated_text.chars().count(),
            duration_ms,
        )
    }
}

/// Structural baseline confidence for a translated text.
///
/// Starts from a trustful baseline and subtracts for signals that the model
/// emitted an apology, an error marker, an echo of the source, a truncation,
/// or a length wildly out of proportion to the source.
fn translation_baseline(source_text: &str, translated_text: &str) -> f64 {
    let mut baseline: f64 = 0.95;
    let translated = translated_text.trim();

    if translated.is_empty() {
        return 0.0;
    }

    if translated.starts_with('[') || translated.contains("Unable") || translated.contains("unable to")
    {
        baseline -= 0.35;
    }

    if translated == source_text.trim() {
        baseline -= 0.25;
    }

    if !ends_with_terminal_punctuation(translated) {
        baseline -= 0.05;
    }

    let source_len = source_text.trim().chars().count();
    if source_len > 0 {
        let ratio = translated.chars().count() as f64 / source_len as f64;
        if ratio < LENGTH_RATIO_BOUNDS.0 || ratio > LENGTH_RATIO_BOUNDS.1 {
            baseline -= 0.20;
        }
    }

    baseline.clamp(0.0, 1.0)
}

fn ends_with_terminal_punctuation(text: &str) -> bool {
    matches!(
        text.chars().next_back(),
        Some('.' | '!' | '?' | '\u{0964}' | '…' | '"' | '\'' | ')')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_reliability_withUnknownProvider_shouldUseDefault() {
        let scorer = ConfidenceScorer::new();
        assert!((scorer.reliability("mystery") - DEFAULT_RELIABILITY).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reliability_shouldBeCaseInsensitive() {
        let scorer = ConfidenceScorer::new();
        assert!((scorer.reliability("Whisper") - 0.92).abs() < f64::EPSILON);
    }

    #[test]
    fn test_score_shouldStayInUnitInterval() {
        let scorer = ConfidenceScorer::new();
        let mut rng = rand::rng();

        for _ in 0..500 {
            let raw: f64 = rng.random_range(-0.5..1.5);
            let quality: u8 = rng.random_range(0..=100);
            let len: usize = rng.random_range(0..200);
            let duration: u64 = rng.random_range(0..15_000);
            let value = scorer.score(raw, "whisper", quality, len, duration);
            assert!((0.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn test_score_withGoodSegment_shouldEarnBonuses() {
        let scorer = ConfidenceScorer::new();
        let inside = scorer.score(0.9, "whisper", 100, 30, 3_000);
        let outside = scorer.score(0.9, "whisper", 100, 30, 200);

        assert!(inside > outside);
    }

    #[test]
    fn test_score_withTinyFragment_shouldBePenalized() {
        let scorer = ConfidenceScorer::new();
        let fragment = scorer.score(0.9, "whisper", 80, 3, 3_000);
        let normal = scorer.score(0.9, "whisper", 80, 30, 3_000);

        assert!(fragment < normal);
    }

    #[test]
    fn test_score_withUnreliableProvider_shouldScoreLower() {
        let scorer = ConfidenceScorer::new();
        let trusted = scorer.score(0.9, "anthropic", 90, 30, 3_000);
        let local = scorer.score(0.9, "ollama", 90, 30, 3_000);

        assert!(trusted > local);
    }

    #[test]
    fn test_scoreTranslation_withErrorMarker_shouldScoreLow() {
        let scorer = ConfidenceScorer::new();
        let clean = scorer.score_translation(
            "আমি একটি পরীক্ষা ভিডিও তৈরি করছি।",
            "I am creating a test video.",
            "anthropic",
            100,
            5_000,
        );
        let marked = scorer.score_translation(
            "আমি একটি পরীক্ষা ভিডিও তৈরি করছি।",
            "[Unable to translate this segment]",
            "anthropic",
            100,
            5_000,
        );

        assert!(marked < clean);
    }

    #[test]
    fn test_scoreTranslation_withSourceEcho_shouldScoreLower() {
        let scorer = ConfidenceScorer::new();
        let echoed = scorer.score_translation(
            "This stayed in the source language.",
            "This stayed in the source language.",
            "anthropic",
            100,
            4_000,
        );
        let translated = scorer.score_translation(
            "This stayed in the source language.",
            "Esto se quedó en el idioma original.",
            "anthropic",
            100,
            4_000,
        );

        assert!(echoed < translated);
    }

    #[test]
    fn test_scoreTranslation_withExtremeLengthRatio_shouldScoreLower() {
        let scorer = ConfidenceScorer::new();
        let padded = scorer.score_translation(
            "Yes.",
            "This translation is suspiciously far longer than its tiny source text ever was.",
            "anthropic",
            100,
            3_000,
        );
        let proportionate =
            scorer.score_translation("Yes, of course.", "Oui, bien sûr.", "anthropic", 100, 3_000);

        assert!(padded < proportionate);
    }

    #[test]
    fn test_translationBaseline_withEmptyTranslation_shouldBeZero() {
        assert_eq!(translation_baseline("source", "   "), 0.0);
    }
}

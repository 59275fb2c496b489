/*!
 * Transcription reconciler.
 *
 * Drives one or more speech-to-text adapters over the same audio, classifies
 * failures to decide whether the chain advances, and merges the successful
 * results into a single authoritative segment set. The first success in
 * provider priority order is authoritative; later successes contribute
 * per-segment alternative transcripts, aligned by time overlap rather than
 * positional index so providers that segment the audio differently still
 * pair up.
 */

use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::classifier::{classify, classify_provider_error, ErrorClassification};
use crate::providers::{AudioInput, RecognitionOutput, SpeechToText};
use crate::standards::{split_long_segment, MAX_DURATION_MS};

/// Minimum share of the shorter interval two segments must share to be
/// treated as the same utterance
const MIN_OVERLAP_RATIO: f64 = 0.5;

/// One provider's classified failure during reconciliation
#[derive(Debug, Clone)]
pub struct ProviderFailure {
    /// Provider that failed
    pub provider: String,
    /// Classification of the failure
    pub classification: ErrorClassification,
}

/// Failure of an entire reconciliation: every provider in the chain failed
#[derive(Debug)]
pub struct ReconcileError {
    /// Per-provider failures, in attempt order
    pub failures: Vec<ProviderFailure>,
}

impl ReconcileError {
    /// The classification of the last attempt, which the job carries
    pub fn last_classification(&self) -> ErrorClassification {
        self.failures
            .last()
            .map(|f| f.classification.clone())
            .unwrap_or_else(|| classify("no speech-to-text providers configured"))
    }
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary: Vec<String> = self
            .failures
            .iter()
            .map(|failure| format!("{}: {}", failure.provider, failure.classification))
            .collect();
        write!(f, "all providers failed: {}", summary.join("; "))
    }
}

impl std::error::Error for ReconcileError {}

/// One authoritative segment with an optional aligned alternative
#[derive(Debug, Clone)]
pub struct ReconciledSegment {
    /// Authoritative text
    pub text: String,
    /// Start time in milliseconds
    pub start_time_ms: u64,
    /// End time in milliseconds
    pub end_time_ms: u64,
    /// Provider-reported confidence for this utterance
    pub raw_confidence: f64,
    /// Provider that produced the authoritative text
    pub provider: String,
    /// Alternative transcript from another provider, if one aligned
    pub alternative_text: Option<String>,
    /// Provider of the alternative transcript
    pub alternative_provider: Option<String>,
    /// Speaker label, if the provider diarizes
    pub speaker: Option<String>,
}

/// Result of a successful reconciliation
#[derive(Debug)]
pub struct ReconcilerOutcome {
    /// Authoritative segments in time order
    pub segments: Vec<ReconciledSegment>,
    /// Provider that produced the authoritative set
    pub provider: String,
    /// Providers that failed along the way, with classifications
    pub failures: Vec<ProviderFailure>,
}

/// Reconciler over a prioritized chain of speech-to-text providers
pub struct TranscriptionReconciler {
    providers: Vec<Arc<dyn SpeechToText>>,
}

impl TranscriptionReconciler {
    /// Create a reconciler over providers in priority order
    pub fn new(providers: Vec<Arc<dyn SpeechToText>>) -> Self {
        Self { providers }
    }

    /// Run every provider in the chain and merge the results.
    ///
    /// Providers run sequentially: a retryable failure advances the chain, a
    /// fatal one (bad format, missing file) stops it since the same media is
    /// handed to every provider. Zero successes fail the whole reconciliation
    /// with the last classification.
    pub async fn reconcile(
        &self,
        audio: &AudioInput,
    ) -> Result<ReconcilerOutcome, ReconcileError> {
        let mut successes: Vec<(String, RecognitionOutput)> = Vec::new();
        let mut failures: Vec<ProviderFailure> = Vec::new();

        for provider in &self.providers {
            let name = provider.name().to_string();
            match provider.recognize(audio).await {
                Ok(output) if !output.segments.is_empty() => {
                    info!(
                        "Provider {} recognized {} segments",
                        name,
                        output.segments.len()
                    );
                    successes.push((name, output));
                }
                Ok(_) => {
                    let classification = classify("provider returned no segments");
                    warn!("Provider {} returned no segments", name);
                    failures.push(ProviderFailure {
                        provider: name,
                        classification,
                    });
                }
                Err(error) => {
                    let classification = classify_provider_error(&error);
                    warn!("Provider {} failed: {}", name, classification);
                    let fatal = !classification.retryable;
                    failures.push(ProviderFailure {
                        provider: name,
                        classification,
                    });
                    if fatal {
                        // The same media goes to every provider; a format or
                        // missing-file error will not get better downstream.
                        break;
                    }
                }
            }
        }

        if successes.is_empty() {
            return Err(ReconcileError { failures });
        }

        let (authoritative_provider, authoritative) = successes.remove(0);
        let mut segments = split_over_long(&authoritative, &authoritative_provider);

        for (alt_provider, alt_output) in &successes {
            attach_alternatives(&mut segments, alt_provider, alt_output);
        }

        Ok(ReconcilerOutcome {
            segments,
            provider: authoritative_provider,
            failures,
        })
    }
}

/// Expand the authoritative output into segments, splitting any that exceed
/// the maximum display duration
fn split_over_long(output: &RecognitionOutput, provider: &str) -> Vec<ReconciledSegment> {
    let mut segments = Vec::with_capacity(output.segments.len());

    for recognized in &output.segments {
        let raw_confidence = recognized
            .confidence
            .unwrap_or(output.raw_confidence)
            .clamp(0.0, 1.0);

        for piece in split_long_segment(
            &recognized.text,
            recognized.start_time_ms,
            recognized.end_time_ms,
            MAX_DURATION_MS,
        ) {
            segments.push(ReconciledSegment {
                text: piece.text,
                start_time_ms: piece.start_time_ms,
                end_time_ms: piece.end_time_ms,
                raw_confidence,
                provider: provider.to_string(),
                alternative_text: None,
                alternative_provider: None,
                speaker: recognized.speaker.clone(),
            });
        }
    }

    segments
}

/// Attach alternative transcripts by time overlap.
///
/// For each authoritative segment the best-overlapping alternative segment is
/// attached if it shares at least half of the shorter interval; alternative
/// segments that align with nothing are dropped.
fn attach_alternatives(
    segments: &mut [ReconciledSegment],
    alt_provider: &str,
    alt_output: &RecognitionOutput,
) {
    for segment in segments.iter_mut() {
        if segment.alternative_text.is_some() {
            continue;
        }

        let best = alt_output
            .segments
            .iter()
            .map(|candidate| {
                (
                    overlap_ratio(
                        segment.start_time_ms,
                        segment.end_time_ms,
                        candidate.start_time_ms,
                        candidate.end_time_ms,
                    ),
                    candidate,
                )
            })
            .filter(|(ratio, _)| *ratio >= MIN_OVERLAP_RATIO)
            .max_by(|(a, _), (b, _)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        if let Some((ratio, candidate)) = best {
            if candidate.text != segment.text {
                debug!(
                    "Aligned alternative from {} at overlap {:.2}",
                    alt_provider, ratio
                );
                segment.alternative_text = Some(candidate.text.clone());
                segment.alternative_provider = Some(alt_provider.to_string());
            }
        }
    }
}

/// Share of the shorter of two intervals covered by their intersection
fn overlap_ratio(a_start: u64, a_end: u64, b_start: u64, b_end: u64) -> f64 {
    let intersection = a_end.min(b_end).saturating_sub(a_start.max(b_start));
    let shorter = (a_end.saturating_sub(a_start)).min(b_end.saturating_sub(b_start));
    if shorter == 0 {
        return 0.0;
    }
    intersection as f64 / shorter as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ErrorCode;
    use crate::providers::mock::MockSpeechToText;
    use bytes::Bytes;

    fn audio() -> AudioInput {
        AudioInput::wav(Bytes::from_static(b"RIFF-test")).unwrap()
    }

    fn segments_a() -> Vec<(&'static str, u64, u64, f64)> {
        vec![
            ("First utterance.", 0, 2_000, 0.95),
            ("Second utterance.", 2_500, 5_000, 0.90),
            ("Third utterance.", 5_500, 8_000, 0.85),
        ]
    }

    #[tokio::test]
    async fn test_reconcile_withSingleWorkingProvider_shouldBeAuthoritative() {
        let reconciler = TranscriptionReconciler::new(vec![Arc::new(
            MockSpeechToText::working("stt-a", &segments_a()),
        )]);

        let outcome = reconciler.reconcile(&audio()).await.unwrap();

        assert_eq!(outcome.provider, "stt-a");
        assert_eq!(outcome.segments.len(), 3);
        assert!(outcome.failures.is_empty());
        assert!(outcome.segments.iter().all(|s| s.alternative_text.is_none()));
    }

    #[tokio::test]
    async fn test_reconcile_withQuotaError_shouldInvokeNextProvider() {
        let primary = Arc::new(MockSpeechToText::rate_limited("stt-a"));
        let secondary = Arc::new(MockSpeechToText::working("stt-b", &segments_a()));
        let reconciler =
            TranscriptionReconciler::new(vec![primary.clone(), secondary.clone()]);

        let outcome = reconciler.reconcile(&audio()).await.unwrap();

        assert_eq!(primary.request_count(), 1);
        assert_eq!(secondary.request_count(), 1);
        assert_eq!(outcome.provider, "stt-b");
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(
            outcome.failures[0].classification.code,
            ErrorCode::ApiQuotaExceeded
        );
    }

    #[tokio::test]
    async fn test_reconcile_withAllProvidersFailing_shouldCarryLastClassification() {
        let reconciler = TranscriptionReconciler::new(vec![
            Arc::new(MockSpeechToText::rate_limited("stt-a")),
            Arc::new(MockSpeechToText::connection_error("stt-b")),
        ]);

        let error = reconciler.reconcile(&audio()).await.err().unwrap();

        assert_eq!(error.failures.len(), 2);
        assert_eq!(error.last_classification().code, ErrorCode::NetworkError);
    }

    #[tokio::test]
    async fn test_reconcile_withFatalError_shouldStopChain() {
        let primary = Arc::new(MockSpeechToText::unsupported_format("stt-a"));
        let secondary = Arc::new(MockSpeechToText::working("stt-b", &segments_a()));
        let reconciler =
            TranscriptionReconciler::new(vec![primary.clone(), secondary.clone()]);

        let error = reconciler.reconcile(&audio()).await.err().unwrap();

        assert_eq!(secondary.request_count(), 0, "fatal errors must not fall back");
        assert_eq!(
            error.last_classification().code,
            ErrorCode::UnsupportedFormat
        );
        assert!(!error.last_classification().retryable);
    }

    #[tokio::test]
    async fn test_reconcile_withTwoSuccesses_shouldAlignAlternativesByOverlap() {
        // Secondary segments shifted slightly but overlapping their authoritative
        // counterparts; the middle one sits in a gap and must be dropped.
        let secondary_segments = vec![
            ("A different first reading.", 100, 1_900, 0.8),
            ("Orphan utterance.", 2_050, 2_400, 0.8),
            ("A different third reading.", 5_400, 7_900, 0.8),
        ];
        let reconciler = TranscriptionReconciler::new(vec![
            Arc::new(MockSpeechToText::working("stt-a", &segments_a())),
            Arc::new(MockSpeechToText::working("stt-b", &secondary_segments)),
        ]);

        let outcome = reconciler.reconcile(&audio()).await.unwrap();

        assert_eq!(
            outcome.segments[0].alternative_text.as_deref(),
            Some("A different first reading.")
        );
        assert_eq!(
            outcome.segments[0].alternative_provider.as_deref(),
            Some("stt-b")
        );
        // "Orphan utterance." overlaps no authoritative segment enough
        assert!(outcome.segments[1].alternative_text.is_none());
        assert_eq!(
            outcome.segments[2].alternative_text.as_deref(),
            Some("A different third reading.")
        );
    }

    #[tokio::test]
    async fn test_reconcile_withOverlongSegment_shouldSplitIt() {
        let long = vec![(
            "One sentence here. Another sentence there. A final remark at the end.",
            0u64,
            16_000u64,
            0.9,
        )];
        let reconciler = TranscriptionReconciler::new(vec![Arc::new(
            MockSpeechToText::working("stt-a", &long),
        )]);

        let outcome = reconciler.reconcile(&audio()).await.unwrap();

        assert!(outcome.segments.len() >= 2);
        assert_eq!(outcome.segments.first().unwrap().start_time_ms, 0);
        assert_eq!(outcome.segments.last().unwrap().end_time_ms, 16_000);
    }

    #[test]
    fn test_overlapRatio_shouldMeasureSharedShare() {
        assert!((overlap_ratio(0, 1_000, 0, 1_000) - 1.0).abs() < f64::EPSILON);
        assert!((overlap_ratio(0, 1_000, 500, 1_500) - 0.5).abs() < f64::EPSILON);
        assert_eq!(overlap_ratio(0, 1_000, 2_000, 3_000), 0.0);
    }
}

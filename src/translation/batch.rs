/*!
 * Batch translation engine.
 *
 * Packs confirmed segments into one marker-delimited prompt, calls the
 * translation provider chain with fallback, parses the response back per
 * segment and scores each translation. Unmatched markers never vanish
 * silently: the outcome lists every segment left untranslated so callers can
 * surface a partial-translation warning.
 */

use std::sync::Arc;

use log::{info, warn};

use crate::classifier::classify_provider_error;
use crate::confidence::ConfidenceScorer;
use crate::errors::PipelineError;
use crate::providers::TranslationModel;
use crate::standards::SubtitleStandards;

use super::prompts;

/// A confirmed source segment handed to the engine
#[derive(Debug, Clone)]
pub struct SourceSegment {
    /// Persisted segment ID
    pub segment_id: i64,
    /// Source-language text
    pub text: String,
    /// Display duration in milliseconds, reused for the translated text
    pub duration_ms: u64,
}

/// One scored translation produced by the engine
#[derive(Debug, Clone)]
pub struct SegmentTranslation {
    /// Persisted segment ID
    pub segment_id: i64,
    /// Translated text
    pub text: String,
    /// Derived confidence in [0, 1]
    pub confidence: f64,
}

/// Result of translating one batch
#[derive(Debug)]
pub struct BatchOutcome {
    /// Scored translations, in input order
    pub translations: Vec<SegmentTranslation>,
    /// Segment IDs the response did not cover; non-empty means partial
    pub missing: Vec<i64>,
    /// Provider that produced the response
    pub provider: String,
}

impl BatchOutcome {
    /// Whether the response covered only part of the batch
    pub fn is_partial(&self) -> bool {
        !self.missing.is_empty()
    }
}

/// Batch translation engine over a provider fallback chain
pub struct BatchTranslationEngine {
    chain: Vec<Arc<dyn TranslationModel>>,
    scorer: ConfidenceScorer,
    standards: SubtitleStandards,
}

impl BatchTranslationEngine {
    /// Create an engine over providers in priority order
    pub fn new(
        chain: Vec<Arc<dyn TranslationModel>>,
        scorer: ConfidenceScorer,
        standards: SubtitleStandards,
    ) -> Self {
        Self {
            chain,
            scorer,
            standards,
        }
    }

    /// Translate a batch of segments into the target language.
    ///
    /// Language arguments are display names ("Bengali", "English") since the
    /// prompt addresses the model in prose.
    pub async fn translate_batch(
        &self,
        segments: &[SourceSegment],
        source_language: &str,
        target_language: &str,
    ) -> Result<BatchOutcome, PipelineError> {
        if segments.is_empty() {
            return Ok(BatchOutcome {
                translations: Vec::new(),
                missing: Vec::new(),
                provider: String::new(),
            });
        }

        let texts: Vec<String> = segments.iter().map(|s| s.text.clone()).collect();
        let prompt = prompts::serialize_segments(&texts);
        let system = prompts::system_prompt(source_language, target_language);

        let (provider, response) = self.call_chain(&system, &prompt).await?;

        let parsed = prompts::parse_response(&response);
        let mut translations = Vec::with_capacity(parsed.len());
        let mut missing = Vec::new();

        for (index, segment) in segments.iter().enumerate() {
            let translated = parsed
                .iter()
                .find(|(parsed_index, _)| *parsed_index == index)
                .map(|(_, text)| text.clone());

            match translated {
                Some(text) => {
                    let confidence = self.score(segment, &text, &provider);
                    translations.push(SegmentTranslation {
                        segment_id: segment.segment_id,
                        text,
                        confidence,
                    });
                }
                None => missing.push(segment.segment_id),
            }
        }

        if missing.is_empty() {
            info!(
                "Batch of {} segments translated to {} by {}",
                segments.len(),
                target_language,
                provider
            );
        } else {
            warn!(
                "Partial translation: {} of {} segments missing from the {} response",
                missing.len(),
                segments.len(),
                provider
            );
        }

        Ok(BatchOutcome {
            translations,
            missing,
            provider,
        })
    }

    /// Translate a single segment, used for re-translation.
    ///
    /// Reruns the batch flow with a batch of one; the caller overwrites the
    /// stored translation in place.
    pub async fn translate_single(
        &self,
        segment: &SourceSegment,
        source_language: &str,
        target_language: &str,
    ) -> Result<SegmentTranslation, PipelineError> {
        let outcome = self
            .translate_batch(
                std::slice::from_ref(segment),
                source_language,
                target_language,
            )
            .await?;

        outcome
            .translations
            .into_iter()
            .next()
            .ok_or(PipelineError::PartialTranslation {
                missing: 1,
                total: 1,
            })
    }

    /// Walk the provider chain until one call succeeds.
    ///
    /// Every failure is classified and recorded; exhausting the chain
    /// surfaces a combined error naming each provider's failure reason.
    async fn call_chain(
        &self,
        system: &str,
        prompt: &str,
    ) -> Result<(String, String), PipelineError> {
        let mut reasons: Vec<String> = Vec::new();

        for model in &self.chain {
            let name = model.name().to_string();
            match model.translate(system, prompt).await {
                Ok(response) => return Ok((name, response)),
                Err(error) => {
                    let classification = classify_provider_error(&error);
                    warn!("Translation provider {} failed: {}", name, classification);
                    reasons.push(format!("{}: {}", name, classification.message));
                }
            }
        }

        Err(PipelineError::AllProvidersFailed {
            reasons: reasons.join("; "),
        })
    }

    /// Score one translated segment via standards compliance and heuristics
    fn score(&self, segment: &SourceSegment, translated: &str, provider: &str) -> f64 {
        let report = self
            .standards
            .validate(translated, 0, segment.duration_ms.max(1));
        self.scorer.score_translation(
            &segment.text,
            translated,
            provider,
            report.quality_score,
            segment.duration_ms,
        )
    }
}

/*!
 * Pipeline controller.
 *
 * Drives the per-job flow: transcribe → wait for confirmation → translate →
 * dub. Each stage runs under its own timeout, failures are classified and
 * persisted on the job, and the confirmation gate keeps unreviewed source
 * text out of translation. Jobs are independent; the only shared resource is
 * the repository, whose writes are keyed for concurrent retries.
 */

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use log::{info, warn};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::app_config::{Config, SttProvider, TranslationProvider};
use crate::classifier::{classify, classify_media_error, ErrorClassification};
use crate::confidence::ConfidenceScorer;
use crate::database::models::{JobRecord, JobStatus, SegmentRecord, TranslationRecord};
use crate::database::Repository;
use crate::errors::{AppError, PipelineError};
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::media;
use crate::providers::anthropic::Anthropic;
use crate::providers::deepgram::Deepgram;
use crate::providers::elevenlabs::ElevenLabs;
use crate::providers::ollama::Ollama;
use crate::providers::openai::OpenAI;
use crate::providers::whisper::Whisper;
use crate::providers::{AudioInput, SpeechSynthesis, SpeechToText, TranslationModel};
use crate::reconciler::TranscriptionReconciler;
use crate::standards::SubtitleStandards;
use crate::translation::{BatchTranslationEngine, SourceSegment};

/// Summary of one translation run over a job
#[derive(Debug, Clone)]
pub struct TranslationSummary {
    /// Target language code
    pub target_language: String,
    /// Segments requested
    pub requested: usize,
    /// Segments translated and stored
    pub translated: usize,
    /// Segments the responses did not cover
    pub missing: usize,
}

impl TranslationSummary {
    /// Whether any requested segment was left untranslated
    pub fn is_partial(&self) -> bool {
        self.missing > 0
    }
}

/// Main pipeline controller
pub struct PipelineController {
    config: Config,
    repository: Repository,
    stt_providers: Vec<Arc<dyn SpeechToText>>,
    translation_chain: Vec<Arc<dyn TranslationModel>>,
    synthesis: Arc<dyn SpeechSynthesis>,
    scorer: ConfidenceScorer,
    standards: SubtitleStandards,
    /// Jobs currently being driven by this process
    active_jobs: Mutex<HashSet<String>>,
}

impl PipelineController {
    /// Create a controller with providers built from the configuration
    pub fn new(config: Config, repository: Repository) -> Self {
        let stt_providers = build_stt_providers(&config);
        let translation_chain = build_translation_chain(&config);
        let synthesis: Arc<dyn SpeechSynthesis> = Arc::new(ElevenLabs::new(
            config.dubbing.api_key.clone(),
            config.dubbing.endpoint.clone(),
            config.dubbing.model_id.clone(),
            config.dubbing.timeout_secs,
        ));

        Self::with_providers(config, repository, stt_providers, translation_chain, synthesis)
    }

    /// Create a controller with explicit providers (used by tests)
    pub fn with_providers(
        config: Config,
        repository: Repository,
        stt_providers: Vec<Arc<dyn SpeechToText>>,
        translation_chain: Vec<Arc<dyn TranslationModel>>,
        synthesis: Arc<dyn SpeechSynthesis>,
    ) -> Self {
        let standards = if config.standards.youth_content {
            SubtitleStandards::for_youth_content()
        } else {
            SubtitleStandards::new()
        };

        Self {
            config,
            repository,
            stt_providers,
            translation_chain,
            synthesis,
            scorer: ConfidenceScorer::new(),
            standards,
            active_jobs: Mutex::new(HashSet::new()),
        }
    }

    /// Access the repository (for status reporting)
    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    // =========================================================================
    // Transcription
    // =========================================================================

    /// Start (or resume) transcription of a media file.
    ///
    /// Jobs are keyed by media hash: an existing unfinished or reconciled job
    /// is returned as-is, a retryable failed job is reset and re-run, and a
    /// fatally failed job is returned untouched so the user can see why.
    pub async fn start_transcription(
        &self,
        media_path: &Path,
        provider_filter: Option<Vec<SttProvider>>,
    ) -> Result<JobRecord, AppError> {
        let media_path = media_path.to_path_buf();
        let hash_path = media_path.clone();
        let media_hash = tokio::task::spawn_blocking(move || FileManager::hash_file(&hash_path))
            .await
            .map_err(|e| AppError::Unknown(e.to_string()))??;

        let job = match self.repository.find_job_by_media_hash(&media_hash).await? {
            Some(existing) if existing.status != JobStatus::Failed => {
                info!("Job {} already exists for this media", existing.id);
                return Ok(existing);
            }
            Some(existing) if existing.is_retryable() => {
                info!("Retrying failed job {}", existing.id);
                self.repository.reset_job_for_retry(&existing.id).await?;
                existing
            }
            Some(existing) => {
                warn!(
                    "Job {} failed fatally ({}); not retrying",
                    existing.id,
                    existing.error_message.as_deref().unwrap_or("unknown")
                );
                return Ok(existing);
            }
            None => {
                let job = JobRecord::new(
                    Uuid::new_v4().to_string(),
                    media_path.to_string_lossy().to_string(),
                    media_hash,
                    self.config.source_language.clone(),
                );
                self.repository.create_job(&job).await?;
                job
            }
        };

        if !self.active_jobs.lock().insert(job.id.clone()) {
            info!("Job {} is already running", job.id);
            return Ok(job);
        }

        let timeout = Duration::from_secs(self.config.transcription.job_timeout_secs);
        let run = tokio::time::timeout(
            timeout,
            self.run_transcription(&job, provider_filter),
        )
        .await;

        self.active_jobs.lock().remove(&job.id);

        match run {
            Ok(Ok(())) => {}
            Ok(Err(classification)) => {
                self.repository.mark_job_failed(&job.id, &classification).await?;
            }
            Err(_) => {
                let classification = classify(&format!(
                    "transcription timed out after {}s",
                    timeout.as_secs()
                ));
                self.repository.mark_job_failed(&job.id, &classification).await?;
            }
        }

        self.repository
            .get_job(&job.id)
            .await?
            .ok_or_else(|| AppError::Pipeline(PipelineError::JobNotFound(job.id.clone())))
    }

    /// Run the transcription stage for one job
    async fn run_transcription(
        &self,
        job: &JobRecord,
        provider_filter: Option<Vec<SttProvider>>,
    ) -> Result<(), ErrorClassification> {
        self.repository
            .update_job_status(&job.id, JobStatus::Running)
            .await
            .map_err(|e| classify(&e.to_string()))?;

        let extracted = media::extract_audio(Path::new(&job.media_path))
            .await
            .map_err(|e| classify_media_error(&e))?;
        let audio_bytes = extracted
            .read_bytes()
            .await
            .map_err(|e| classify_media_error(&e))?;
        let audio = AudioInput::wav(audio_bytes).map_err(|e| classify(&e.to_string()))?;

        let providers = self.select_stt_providers(provider_filter);
        let reconciler = TranscriptionReconciler::new(providers);
        let outcome = reconciler
            .reconcile(&audio)
            .await
            .map_err(|e| e.last_classification())?;

        info!(
            "Job {}: {} authoritative segments from {}",
            job.id,
            outcome.segments.len(),
            outcome.provider
        );

        let mut records = Vec::with_capacity(outcome.segments.len());
        for (seq_num, segment) in outcome.segments.iter().enumerate() {
            let report =
                self.standards
                    .validate(&segment.text, segment.start_time_ms, segment.end_time_ms);
            let confidence = self.scorer.score(
                segment.raw_confidence,
                &segment.provider,
                report.quality_score,
                segment.text.chars().count(),
                segment.end_time_ms.saturating_sub(segment.start_time_ms),
            );

            let mut record = SegmentRecord::new_validated(
                job.id.clone(),
                seq_num as i64,
                segment.text.clone(),
                segment.start_time_ms as i64,
                segment.end_time_ms as i64,
                confidence,
                segment.provider.clone(),
            )
            .map_err(|e| classify(&e.to_string()))?
            .with_speaker(segment.speaker.clone());

            if let (Some(text), Some(provider)) =
                (&segment.alternative_text, &segment.alternative_provider)
            {
                record = record.with_alternative(text.clone(), provider.clone());
            }

            records.push(record);
        }

        self.repository
            .insert_segments(records)
            .await
            .map_err(|e| classify(&e.to_string()))?;

        self.repository
            .update_job_status(&job.id, JobStatus::Reconciled)
            .await
            .map_err(|e| classify(&e.to_string()))?;

        Ok(())
    }

    /// Filter the configured speech-to-text chain down to a caller subset
    fn select_stt_providers(
        &self,
        filter: Option<Vec<SttProvider>>,
    ) -> Vec<Arc<dyn SpeechToText>> {
        match filter {
            None => self.stt_providers.clone(),
            Some(wanted) => {
                let names: Vec<String> = wanted.iter().map(|p| p.to_string()).collect();
                self.stt_providers
                    .iter()
                    .filter(|p| names.iter().any(|n| n == p.name()))
                    .cloned()
                    .collect()
            }
        }
    }

    // =========================================================================
    // Confirmation and translation
    // =========================================================================

    /// Confirm the source transcript of a reconciled job for translation
    pub async fn confirm_source(&self, job_id: &str) -> Result<(), AppError> {
        let job = self
            .repository
            .get_job(job_id)
            .await?
            .ok_or_else(|| PipelineError::JobNotFound(job_id.to_string()))?;

        if job.status != JobStatus::Reconciled {
            return Err(AppError::Unknown(format!(
                "Job {} is {}, only a reconciled transcript can be confirmed",
                job_id, job.status
            )));
        }

        self.repository.confirm_source(job_id).await?;
        info!("Job {}: source transcript confirmed", job_id);
        Ok(())
    }

    /// Translate every confirmed segment of a job into one target language
    pub async fn translate(
        &self,
        job_id: &str,
        target_language: &str,
    ) -> Result<TranslationSummary, AppError> {
        self.translate_with_progress(job_id, target_language, |_, _| {}).await
    }

    /// Translate with a per-batch progress callback
    pub async fn translate_with_progress(
        &self,
        job_id: &str,
        target_language: &str,
        progress: impl Fn(usize, usize),
    ) -> Result<TranslationSummary, AppError> {
        let job = self
            .repository
            .get_job(job_id)
            .await?
            .ok_or_else(|| PipelineError::JobNotFound(job_id.to_string()))?;

        // Hard gate: never translate an unreviewed transcript
        if !job.source_confirmed {
            return Err(PipelineError::NotConfirmed.into());
        }

        language_utils::validate_language_code(target_language)
            .map_err(|e| AppError::Unknown(e.to_string()))?;
        let source_name = language_utils::language_name(&job.source_language)
            .map_err(|e| AppError::Unknown(e.to_string()))?;
        let target_name = language_utils::language_name(target_language)
            .map_err(|e| AppError::Unknown(e.to_string()))?;

        let segments = self.repository.get_segments(job_id).await?;
        let sources: Vec<SourceSegment> = segments
            .iter()
            .map(|s| SourceSegment {
                segment_id: s.id,
                text: s.text.clone(),
                duration_ms: s.duration_ms(),
            })
            .collect();

        let engine = BatchTranslationEngine::new(
            self.translation_chain.clone(),
            self.scorer.clone(),
            self.standards,
        );

        let batch_timeout = Duration::from_secs(self.config.translation.batch_timeout_secs);
        let batches: Vec<&[SourceSegment]> =
            sources.chunks(self.config.translation.batch_size).collect();
        let total_batches = batches.len();

        let mut translated = 0;
        let mut missing = 0;

        for (batch_index, batch) in batches.into_iter().enumerate() {
            let outcome = tokio::time::timeout(
                batch_timeout,
                engine.translate_batch(batch, &source_name, &target_name),
            )
            .await
            .map_err(|_| PipelineError::Timeout {
                stage: "translation".to_string(),
                secs: batch_timeout.as_secs(),
            })??;

            if outcome.is_partial() {
                warn!(
                    "Job {}: partial translation of batch {} ({} segments missing)",
                    job_id,
                    batch_index + 1,
                    outcome.missing.len()
                );
            }

            for translation in &outcome.translations {
                let record = TranslationRecord::new(
                    translation.segment_id,
                    target_language.to_string(),
                    translation.text.clone(),
                    translation.confidence,
                    outcome.provider.clone(),
                );
                self.repository.upsert_translation(&record).await?;
            }

            translated += outcome.translations.len();
            missing += outcome.missing.len();
            progress(batch_index + 1, total_batches);
        }

        Ok(TranslationSummary {
            target_language: target_language.to_string(),
            requested: sources.len(),
            translated,
            missing,
        })
    }

    /// Translate a job into every configured target language.
    ///
    /// Languages fan out concurrently, bounded by the configured batch
    /// concurrency; each language's batches still run in transcript order.
    pub async fn translate_all(&self, job_id: &str) -> Result<Vec<TranslationSummary>, AppError> {
        let languages = self.config.target_languages.clone();

        let results: Vec<Result<TranslationSummary, AppError>> = stream::iter(languages)
            .map(|language| async move { self.translate(job_id, &language).await })
            .buffer_unordered(self.config.translation.max_concurrent_batches)
            .collect()
            .await;

        let mut summaries = Vec::with_capacity(results.len());
        for result in results {
            summaries.push(result?);
        }
        summaries.sort_by(|a, b| a.target_language.cmp(&b.target_language));
        Ok(summaries)
    }

    /// Re-translate a single segment, overwriting the stored translation
    pub async fn retranslate(
        &self,
        segment_id: i64,
        target_language: &str,
    ) -> Result<TranslationRecord, AppError> {
        let segment = self
            .repository
            .get_segment(segment_id)
            .await?
            .ok_or(PipelineError::SegmentNotFound(segment_id))?;

        let job = self
            .repository
            .get_job(&segment.job_id)
            .await?
            .ok_or_else(|| PipelineError::JobNotFound(segment.job_id.clone()))?;

        if !job.source_confirmed {
            return Err(PipelineError::NotConfirmed.into());
        }

        let source_name = language_utils::language_name(&job.source_language)
            .map_err(|e| AppError::Unknown(e.to_string()))?;
        let target_name = language_utils::language_name(target_language)
            .map_err(|e| AppError::Unknown(e.to_string()))?;

        let engine = BatchTranslationEngine::new(
            self.translation_chain.clone(),
            self.scorer.clone(),
            self.standards,
        );

        let source = SourceSegment {
            segment_id: segment.id,
            text: segment.text.clone(),
            duration_ms: segment.duration_ms(),
        };
        let outcome = engine
            .translate_batch(std::slice::from_ref(&source), &source_name, &target_name)
            .await?;
        let translation = outcome.translations.into_iter().next().ok_or(
            PipelineError::PartialTranslation {
                missing: 1,
                total: 1,
            },
        )?;

        let record = TranslationRecord::new(
            translation.segment_id,
            target_language.to_string(),
            translation.text,
            translation.confidence,
            outcome.provider,
        );
        self.repository.upsert_translation(&record).await?;

        Ok(record)
    }

    /// Swap a segment's text with its alternative transcript.
    ///
    /// The swapped text is not re-validated; the alternative was scored when
    /// it was attached.
    pub async fn switch_alternative(&self, segment_id: i64) -> Result<SegmentRecord, AppError> {
        let swapped = self.repository.switch_alternative(segment_id).await?;
        info!(
            "Segment {}: now showing the {} transcript",
            segment_id, swapped.provider
        );
        Ok(swapped)
    }

    // =========================================================================
    // Dubbing
    // =========================================================================

    /// Render dubbing audio for a job's translations in one language.
    ///
    /// The voice is resolved from the explicit argument, then the job record,
    /// then the configured default, and the chosen voice is persisted on the
    /// job. One audio file is written per segment, in transcript order.
    pub async fn dub(
        &self,
        job_id: &str,
        target_language: &str,
        voice_id: Option<String>,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, AppError> {
        let job = self
            .repository
            .get_job(job_id)
            .await?
            .ok_or_else(|| PipelineError::JobNotFound(job_id.to_string()))?;

        let translations = self
            .repository
            .get_translations(job_id, target_language)
            .await?;
        if translations.is_empty() {
            return Err(PipelineError::NoTranslations {
                job_id: job_id.to_string(),
                language: target_language.to_string(),
            }
            .into());
        }

        let voice = voice_id
            .or(job.voice_id)
            .unwrap_or_else(|| self.config.dubbing.default_voice_id.clone());
        if voice.is_empty() {
            return Err(AppError::Unknown(
                "No dubbing voice configured; pass one or set a default".to_string(),
            ));
        }
        self.repository.set_voice_id(job_id, &voice).await?;

        FileManager::ensure_dir(output_dir).context("Failed to create dub output directory")?;

        let mut written = Vec::with_capacity(translations.len());
        for (index, translation) in translations.iter().enumerate() {
            let audio = self
                .synthesis
                .synthesize(&translation.text, &voice)
                .await
                .map_err(AppError::Provider)?;

            let path = output_dir.join(format!(
                "{}_{}_{:04}.mp3",
                job_id, target_language, index
            ));
            FileManager::write_bytes(&path, &audio)?;
            written.push(path);
        }

        info!(
            "Job {}: wrote {} dub clips for {}",
            job_id,
            written.len(),
            target_language
        );
        Ok(written)
    }
}

/// Build the speech-to-text chain from configuration, in priority order
fn build_stt_providers(config: &Config) -> Vec<Arc<dyn SpeechToText>> {
    config
        .transcription
        .providers
        .iter()
        .map(|provider| -> Arc<dyn SpeechToText> {
            match provider {
                SttProvider::Whisper => Arc::new(Whisper::new(
                    config.transcription.whisper.api_key.clone(),
                    config.transcription.whisper.endpoint.clone(),
                    config.transcription.whisper.model.clone(),
                    config.source_language.clone(),
                    config.transcription.whisper.timeout_secs,
                )),
                SttProvider::Deepgram => Arc::new(Deepgram::new(
                    config.transcription.deepgram.api_key.clone(),
                    config.transcription.deepgram.endpoint.clone(),
                    config.transcription.deepgram.model.clone(),
                    config.source_language.clone(),
                    config.transcription.deepgram.timeout_secs,
                )),
            }
        })
        .collect()
}

/// Build the translation chain from configuration, in priority order
fn build_translation_chain(config: &Config) -> Vec<Arc<dyn TranslationModel>> {
    config
        .translation
        .providers
        .iter()
        .map(|provider| -> Arc<dyn TranslationModel> {
            match provider {
                TranslationProvider::Anthropic => Arc::new(Anthropic::new(
                    config.translation.anthropic.api_key.clone(),
                    config.translation.anthropic.endpoint.clone(),
                    config.translation.anthropic.model.clone(),
                    config.translation.anthropic.max_tokens,
                    config.translation.anthropic.timeout_secs,
                )),
                TranslationProvider::OpenAI => Arc::new(OpenAI::new(
                    config.translation.openai.api_key.clone(),
                    config.translation.openai.endpoint.clone(),
                    config.translation.openai.model.clone(),
                    config.translation.openai.max_tokens,
                    config.translation.openai.timeout_secs,
                )),
                TranslationProvider::Ollama => Arc::new(Ollama::new(
                    config.translation.ollama.host.clone(),
                    config.translation.ollama.port,
                    config.translation.ollama.model.clone(),
                )),
            }
        })
        .collect()
}

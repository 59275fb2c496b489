/*!
 * # Dubflow
 *
 * A Rust library for transcribing spoken-language video, translating the
 * transcript and rendering AI dubbing audio.
 *
 * ## Features
 *
 * - Transcribe audio through multiple speech-to-text providers with fallback
 * - Reconcile multi-provider results into one authoritative transcript with
 *   per-segment alternatives
 * - Enforce broadcast subtitle standards (duration, line length, reading speed)
 * - Derive a confidence score for every segment and translation
 * - Batch-translate confirmed transcripts into multiple target languages
 * - Invoke speech synthesis for dubbing audio
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `providers`: Client implementations for external model providers:
 *   - `providers::whisper` / `providers::deepgram`: speech-to-text
 *   - `providers::anthropic` / `providers::openai` / `providers::ollama`: translation
 *   - `providers::elevenlabs`: speech synthesis
 * - `classifier`: Failure classification into a closed taxonomy
 * - `standards`: Subtitle standards validation and segment splitting
 * - `confidence`: Confidence scoring for segments and translations
 * - `reconciler`: Multi-provider transcription reconciliation
 * - `translation`: Marker-packed batch translation with fallback
 * - `pipeline`: Per-job orchestration (transcribe, confirm, translate, dub)
 * - `database`: SQLite persistence for jobs, segments and translations
 * - `media`: Audio extraction boundary (ffmpeg)
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod classifier;
pub mod confidence;
pub mod database;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod media;
pub mod pipeline;
pub mod providers;
pub mod reconciler;
pub mod standards;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use classifier::{classify, ErrorClassification, ErrorCode};
pub use confidence::ConfidenceScorer;
pub use errors::{AppError, MediaError, PipelineError, ProviderError};
pub use pipeline::PipelineController;
pub use reconciler::TranscriptionReconciler;
pub use standards::{StandardsReport, SubtitleStandards};
pub use translation::BatchTranslationEngine;

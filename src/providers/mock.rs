/*!
 * Mock provider implementations for testing.
 *
 * The mocks script provider behavior without any network traffic:
 * - `MockSpeechToText` returns canned recognition output or a scripted failure
 * - `MockTranslator` answers marker-packed prompts, optionally mangling or
 *   dropping individual `SEGMENT_<i>` lines
 * - `MockSynthesis` returns a fixed audio payload
 *
 * Each mock counts its requests so tests can assert which providers in a
 * fallback chain were actually invoked.
 */

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ProviderError;
use crate::providers::{
    AudioInput, RecognitionOutput, RecognizedSegment, SpeechSynthesis, SpeechToText,
    TranslationModel,
};

static PROMPT_SEGMENT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^SEGMENT_(\d+):\s*(.+)$").unwrap());

/// Scripted behavior for a mock speech-to-text provider
#[derive(Debug, Clone)]
pub enum MockRecognitionBehavior {
    /// Succeed with the given output
    Working(RecognitionOutput),
    /// Fail with HTTP 429
    RateLimited,
    /// Fail with a non-retryable format error
    UnsupportedFormat,
    /// Fail with a connection error
    ConnectionError,
}

/// Mock speech-to-text provider
#[derive(Debug)]
pub struct MockSpeechToText {
    name: String,
    behavior: MockRecognitionBehavior,
    request_count: Arc<AtomicUsize>,
}

impl MockSpeechToText {
    /// Create a mock with an explicit behavior
    pub fn new(name: impl Into<String>, behavior: MockRecognitionBehavior) -> Self {
        Self {
            name: name.into(),
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a working mock from (text, start_ms, end_ms, confidence) tuples
    pub fn working(name: impl Into<String>, segments: &[(&str, u64, u64, f64)]) -> Self {
        let segments: Vec<RecognizedSegment> = segments
            .iter()
            .map(|(text, start, end, confidence)| RecognizedSegment {
                text: text.to_string(),
                start_time_ms: *start,
                end_time_ms: *end,
                confidence: Some(*confidence),
                speaker: None,
            })
            .collect();
        let raw_confidence = if segments.is_empty() {
            0.0
        } else {
            segments.iter().filter_map(|s| s.confidence).sum::<f64>() / segments.len() as f64
        };
        let text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        Self::new(
            name,
            MockRecognitionBehavior::Working(RecognitionOutput {
                text,
                segments,
                raw_confidence,
            }),
        )
    }

    /// Create a mock that always hits a quota error
    pub fn rate_limited(name: impl Into<String>) -> Self {
        Self::new(name, MockRecognitionBehavior::RateLimited)
    }

    /// Create a mock that always reports an unsupported format
    pub fn unsupported_format(name: impl Into<String>) -> Self {
        Self::new(name, MockRecognitionBehavior::UnsupportedFormat)
    }

    /// Create a mock that always fails to connect
    pub fn connection_error(name: impl Into<String>) -> Self {
        Self::new(name, MockRecognitionBehavior::ConnectionError)
    }

    /// Number of recognize calls received
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Shared handle to the request counter
    pub fn counter(&self) -> Arc<AtomicUsize> {
        self.request_count.clone()
    }
}

#[async_trait]
impl SpeechToText for MockSpeechToText {
    fn name(&self) -> &str {
        &self.name
    }

    async fn recognize(&self, _audio: &AudioInput) -> Result<RecognitionOutput, ProviderError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            MockRecognitionBehavior::Working(output) => Ok(output.clone()),
            MockRecognitionBehavior::RateLimited => Err(ProviderError::RateLimitExceeded(
                "HTTP 429 Too Many Requests".to_string(),
            )),
            MockRecognitionBehavior::UnsupportedFormat => Err(ProviderError::ApiError {
                status_code: 400,
                message: "unsupported audio codec".to_string(),
            }),
            MockRecognitionBehavior::ConnectionError => Err(ProviderError::ConnectionError(
                "connection refused".to_string(),
            )),
        }
    }
}

/// Scripted behavior for a mock translation provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockTranslationBehavior {
    /// Answer every segment line
    Working,
    /// Answer every segment line but mangle the marker of one index
    MangleIndex(usize),
    /// Answer every segment line except one index
    DropIndex(usize),
    /// Echo the source text untranslated
    EchoSource,
    /// Fail with HTTP 429
    RateLimited,
    /// Fail with a server error
    Failing,
}

/// Mock translation provider that answers marker-packed prompts
#[derive(Debug)]
pub struct MockTranslator {
    name: String,
    behavior: MockTranslationBehavior,
    request_count: Arc<AtomicUsize>,
}

impl MockTranslator {
    /// Create a mock with an explicit behavior
    pub fn new(name: impl Into<String>, behavior: MockTranslationBehavior) -> Self {
        Self {
            name: name.into(),
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a working mock translator
    pub fn working(name: impl Into<String>) -> Self {
        Self::new(name, MockTranslationBehavior::Working)
    }

    /// Create a mock that always hits a quota error
    pub fn rate_limited(name: impl Into<String>) -> Self {
        Self::new(name, MockTranslationBehavior::RateLimited)
    }

    /// Create a mock that always fails with a server error
    pub fn failing(name: impl Into<String>) -> Self {
        Self::new(name, MockTranslationBehavior::Failing)
    }

    /// Number of translate calls received
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Shared handle to the request counter
    pub fn counter(&self) -> Arc<AtomicUsize> {
        self.request_count.clone()
    }

    /// Canonical mock translation for a source line
    pub fn translated(text: &str) -> String {
        format!("Translated: {}", text)
    }
}

#[async_trait]
impl TranslationModel for MockTranslator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn translate(
        &self,
        _system_prompt: &str,
        prompt: &str,
    ) -> Result<String, ProviderError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockTranslationBehavior::RateLimited => {
                return Err(ProviderError::RateLimitExceeded(
                    "HTTP 429 Too Many Requests".to_string(),
                ));
            }
            MockTranslationBehavior::Failing => {
                return Err(ProviderError::ApiError {
                    status_code: 500,
                    message: "internal server error".to_string(),
                });
            }
            _ => {}
        }

        let mut lines = Vec::new();
        for capture in PROMPT_SEGMENT_REGEX.captures_iter(prompt) {
            let index: usize = capture[1].parse().unwrap_or(0);
            let source = capture[2].trim();

            match self.behavior {
                MockTranslationBehavior::DropIndex(dropped) if dropped == index => continue,
                MockTranslationBehavior::MangleIndex(mangled) if mangled == index => {
                    // A marker the parser cannot match
                    lines.push(format!("GARBLED {} {}", index, Self::translated(source)));
                }
                MockTranslationBehavior::EchoSource => {
                    lines.push(format!("SEGMENT_{}: {}", index, source));
                }
                _ => {
                    lines.push(format!("SEGMENT_{}: {}", index, Self::translated(source)));
                }
            }
        }

        Ok(lines.join("\n"))
    }
}

/// Mock speech synthesis provider
#[derive(Debug)]
pub struct MockSynthesis {
    request_count: Arc<AtomicUsize>,
}

impl MockSynthesis {
    /// Create a mock synthesis provider
    pub fn new() -> Self {
        Self {
            request_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of synthesize calls received
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Shared handle to the request counter
    pub fn counter(&self) -> Arc<AtomicUsize> {
        self.request_count.clone()
    }
}

impl Default for MockSynthesis {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechSynthesis for MockSynthesis {
    fn name(&self) -> &str {
        "mock-synthesis"
    }

    async fn synthesize(&self, text: &str, _voice_id: &str) -> Result<Bytes, ProviderError> {
        if text.trim().is_empty() {
            return Err(ProviderError::InvalidInput(
                "synthesis text is empty".to_string(),
            ));
        }
        self.request_count.fetch_add(1, Ordering::SeqCst);
        Ok(Bytes::from_static(b"RIFF-mock-audio"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt() -> &'static str {
        "SEGMENT_0: First line.\nSEGMENT_1: Second line.\nSEGMENT_2: Third line."
    }

    #[tokio::test]
    async fn test_mockTranslator_working_shouldAnswerEveryMarker() {
        let translator = MockTranslator::working("mock");
        let response = translator.translate("system", prompt()).await.unwrap();

        assert_eq!(response.lines().count(), 3);
        assert!(response.contains("SEGMENT_0:"));
        assert!(response.contains("SEGMENT_2:"));
        assert_eq!(translator.request_count(), 1);
    }

    #[tokio::test]
    async fn test_mockTranslator_withMangledIndex_shouldBreakThatMarker() {
        let translator = MockTranslator::new("mock", MockTranslationBehavior::MangleIndex(1));
        let response = translator.translate("system", prompt()).await.unwrap();

        assert!(response.contains("SEGMENT_0:"));
        assert!(!response.contains("SEGMENT_1:"));
        assert!(response.contains("SEGMENT_2:"));
    }

    #[tokio::test]
    async fn test_mockSpeechToText_rateLimited_shouldReturnQuotaError() {
        let stt = MockSpeechToText::rate_limited("mock");
        let audio = AudioInput::wav(Bytes::from_static(b"RIFF")).unwrap();
        let result = stt.recognize(&audio).await;

        assert!(matches!(result, Err(ProviderError::RateLimitExceeded(_))));
        assert_eq!(stt.request_count(), 1);
    }
}

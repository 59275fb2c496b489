/*!
 * Provider adapters for speech-to-text, translation and speech synthesis.
 *
 * Each adapter normalizes its provider's wire format into one strict internal
 * shape at this boundary; provider-specific field names never leak past it.
 * Adapters never retry internally; retries and fallback belong to the
 * reconciler and the batch translation engine.
 *
 * Implementations:
 * - `whisper`: OpenAI-compatible audio transcription endpoint
 * - `deepgram`: Deepgram listen API
 * - `anthropic`: Anthropic messages API
 * - `openai`: OpenAI chat completions API
 * - `ollama`: local Ollama server
 * - `elevenlabs`: ElevenLabs text-to-speech
 * - `mock`: scripted behaviors for tests
 */

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Audio payload handed to a speech-to-text adapter
#[derive(Debug, Clone)]
pub struct AudioInput {
    /// Raw audio bytes (mono 16 kHz PCM WAV from the media boundary)
    pub data: Bytes,
    /// MIME type of the payload
    pub mime_type: String,
    /// File name reported to providers that want one
    pub file_name: String,
}

impl AudioInput {
    /// Create an audio input, rejecting empty payloads
    pub fn new(
        data: Bytes,
        mime_type: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        if data.is_empty() {
            return Err(ProviderError::InvalidInput(
                "audio payload is empty".to_string(),
            ));
        }
        Ok(Self {
            data,
            mime_type: mime_type.into(),
            file_name: file_name.into(),
        })
    }

    /// Create a WAV audio input
    pub fn wav(data: Bytes) -> Result<Self, ProviderError> {
        Self::new(data, "audio/wav", "audio.wav")
    }
}

/// A single recognized utterance, normalized across providers
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedSegment {
    /// Utterance text
    pub text: String,
    /// Start of the utterance in milliseconds
    pub start_time_ms: u64,
    /// End of the utterance in milliseconds
    pub end_time_ms: u64,
    /// Provider-reported confidence for this utterance, if given
    pub confidence: Option<f64>,
    /// Speaker label, if the provider diarizes
    pub speaker: Option<String>,
}

/// Normalized recognition result, the only shape that crosses the adapter boundary
#[derive(Debug, Clone)]
pub struct RecognitionOutput {
    /// Full transcript text
    pub text: String,
    /// Recognized utterances in time order
    pub segments: Vec<RecognizedSegment>,
    /// Overall provider-reported confidence in [0, 1]
    pub raw_confidence: f64,
}

/// Speech-to-text provider adapter
#[async_trait]
pub trait SpeechToText: Send + Sync + Debug {
    /// Stable lowercase provider name, used for reliability lookup and persistence
    fn name(&self) -> &str;

    /// Recognize speech in the given audio
    async fn recognize(&self, audio: &AudioInput) -> Result<RecognitionOutput, ProviderError>;
}

/// Translation provider adapter
#[async_trait]
pub trait TranslationModel: Send + Sync + Debug {
    /// Stable lowercase provider name
    fn name(&self) -> &str;

    /// Complete a translation prompt, returning the raw response text
    async fn translate(&self, system_prompt: &str, prompt: &str)
        -> Result<String, ProviderError>;
}

/// Speech synthesis provider adapter (dubbing boundary)
#[async_trait]
pub trait SpeechSynthesis: Send + Sync + Debug {
    /// Stable lowercase provider name
    fn name(&self) -> &str;

    /// Synthesize speech for a text with the given voice, returning audio bytes
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Bytes, ProviderError>;
}

pub mod anthropic;
pub mod deepgram;
pub mod elevenlabs;
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod whisper;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audioInput_withEmptyPayload_shouldBeRejected() {
        let result = AudioInput::wav(Bytes::new());
        assert!(matches!(result, Err(ProviderError::InvalidInput(_))));
    }

    #[test]
    fn test_audioInput_wav_shouldSetMimeType() {
        let input = AudioInput::wav(Bytes::from_static(b"RIFF")).unwrap();
        assert_eq!(input.mime_type, "audio/wav");
        assert_eq!(input.file_name, "audio.wav");
    }
}

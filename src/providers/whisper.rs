/*!
 * Whisper speech-to-text client.
 *
 * Talks to an OpenAI-compatible `/v1/audio/transcriptions` endpoint with a
 * multipart upload and the verbose JSON response format, which carries
 * per-segment timing and log probabilities.
 */

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde::Deserialize;

use crate::errors::ProviderError;
use crate::providers::{AudioInput, RecognitionOutput, RecognizedSegment, SpeechToText};

/// Whisper client for OpenAI-compatible transcription endpoints
#[derive(Debug)]
pub struct Whisper {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL (optional, defaults to the public API)
    endpoint: String,
    /// Model identifier sent with each request
    model: String,
    /// Language hint (ISO 639-1)
    language: String,
}

/// Verbose transcription response
#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    /// Full transcript text
    text: String,
    /// Recognized segments with timing
    #[serde(default)]
    segments: Vec<TranscriptionSegment>,
}

/// One segment of a verbose transcription response
#[derive(Debug, Deserialize)]
struct TranscriptionSegment {
    /// Segment text
    text: String,
    /// Start time in seconds
    start: f64,
    /// End time in seconds
    end: f64,
    /// Average token log probability
    #[serde(default)]
    avg_logprob: f64,
    /// Probability that the segment contains no speech
    #[serde(default)]
    no_speech_prob: f64,
}

impl Whisper {
    /// Create a new Whisper client
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        language: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: model.into(),
            language: language.into(),
        }
    }

    fn api_url(&self) -> String {
        if self.endpoint.is_empty() {
            "https://api.openai.com/v1/audio/transcriptions".to_string()
        } else {
            format!(
                "{}/v1/audio/transcriptions",
                self.endpoint.trim_end_matches('/')
            )
        }
    }

    /// Derive a 0-1 confidence from a segment's log probability.
    ///
    /// `avg_logprob` is the mean natural log of token probabilities, so its
    /// exponential approximates a per-token probability; discounting by the
    /// no-speech probability penalizes segments that are likely silence.
    fn segment_confidence(segment: &TranscriptionSegment) -> f64 {
        (segment.avg_logprob.exp() * (1.0 - segment.no_speech_prob)).clamp(0.0, 1.0)
    }
}

#[async_trait]
impl SpeechToText for Whisper {
    fn name(&self) -> &str {
        "whisper"
    }

    async fn recognize(&self, audio: &AudioInput) -> Result<RecognitionOutput, ProviderError> {
        let part = multipart::Part::bytes(audio.data.to_vec())
            .file_name(audio.file_name.clone())
            .mime_str(&audio.mime_type)
            .map_err(|e| ProviderError::InvalidInput(e.to_string()))?;

        let form = multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("language", self.language.clone())
            .text("response_format", "verbose_json");

        let response = self
            .client
            .post(self.api_url())
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            return Err(ProviderError::from_status(status.as_u16(), body));
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        let segments: Vec<RecognizedSegment> = parsed
            .segments
            .iter()
            .map(|s| RecognizedSegment {
                text: s.text.trim().to_string(),
                start_time_ms: (s.start * 1000.0) as u64,
                end_time_ms: (s.end * 1000.0) as u64,
                confidence: Some(Self::segment_confidence(s)),
                speaker: None,
            })
            .collect();

        let raw_confidence = if segments.is_empty() {
            0.0
        } else {
            segments.iter().filter_map(|s| s.confidence).sum::<f64>() / segments.len() as f64
        };

        Ok(RecognitionOutput {
            text: parsed.text.trim().to_string(),
            segments,
            raw_confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apiUrl_withEmptyEndpoint_shouldUsePublicApi() {
        let client = Whisper::new("key", "", "whisper-1", "bn", 120);
        assert_eq!(
            client.api_url(),
            "https://api.openai.com/v1/audio/transcriptions"
        );
    }

    #[test]
    fn test_apiUrl_withCustomEndpoint_shouldTrimTrailingSlash() {
        let client = Whisper::new("key", "http://localhost:8080/", "whisper-1", "bn", 120);
        assert_eq!(
            client.api_url(),
            "http://localhost:8080/v1/audio/transcriptions"
        );
    }

    #[test]
    fn test_segmentConfidence_withCertainTokens_shouldApproachOne() {
        let segment = TranscriptionSegment {
            text: "hello".to_string(),
            start: 0.0,
            end: 1.0,
            avg_logprob: 0.0,
            no_speech_prob: 0.0,
        };
        assert!((Whisper::segment_confidence(&segment) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_segmentConfidence_withLikelySilence_shouldBeDiscounted() {
        let segment = TranscriptionSegment {
            text: "...".to_string(),
            start: 0.0,
            end: 1.0,
            avg_logprob: -0.1,
            no_speech_prob: 0.9,
        };
        assert!(Whisper::segment_confidence(&segment) < 0.2);
    }
}

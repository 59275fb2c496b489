/*!
 * Deepgram speech-to-text client.
 *
 * Sends raw audio bytes to the listen API with utterance segmentation
 * enabled, so the response carries per-utterance timing, confidence and
 * optional speaker labels.
 */

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::errors::ProviderError;
use crate::providers::{AudioInput, RecognitionOutput, RecognizedSegment, SpeechToText};

/// Deepgram client for the listen API
#[derive(Debug)]
pub struct Deepgram {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL (optional, defaults to the public API)
    endpoint: String,
    /// Model identifier
    model: String,
    /// Language hint (ISO 639-1)
    language: String,
}

/// Top-level listen response
#[derive(Debug, Deserialize)]
struct ListenResponse {
    results: ListenResults,
}

#[derive(Debug, Deserialize)]
struct ListenResults {
    channels: Vec<Channel>,
    #[serde(default)]
    utterances: Vec<Utterance>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    transcript: String,
    confidence: f64,
}

/// One utterance with timing and confidence
#[derive(Debug, Deserialize)]
struct Utterance {
    /// Start time in seconds
    start: f64,
    /// End time in seconds
    end: f64,
    /// Utterance confidence
    confidence: f64,
    /// Utterance text
    transcript: String,
    /// Speaker index when diarization is on
    #[serde(default)]
    speaker: Option<u32>,
}

impl Deepgram {
    /// Create a new Deepgram client
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
        let base = if self.endpoint.is_empty() {
            "https://api.deepgram.com".to_string()
        } else {
            self.endpoint.trim_end_matches('/').to_string()
        };
        format!(
            "{}/v1/listen?model={}&language={}&punctuate=true&utterances=true&diarize=true",
            base, self.model, self.language
        )
    }
}

#[async_trait]
impl SpeechToText for Deepgram {
    fn name(&self) -> &str {
        "deepgram"
    }

    async fn recognize(&self, audio: &AudioInput) -> Result<RecognitionOutput, ProviderError> {
        let response = self
            .client
            .post(self.api_url())
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", audio.mime_type.clone())
            .body(audio.data.to_vec())
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

        let parsed: ListenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        let alternative = parsed
            .results
            .channels
            .first()
            .and_then(|c| c.alternatives.first())
            .ok_or_else(|| {
                ProviderError::ParseError("response carried no transcription alternative".to_string())
            })?;

        let segments: Vec<RecognizedSegment> = parsed
            .results
            .utterances
            .iter()
            .map(|u| RecognizedSegment {
                text: u.transcript.trim().to_string(),
                start_time_ms: (u.start * 1000.0) as u64,
                end_time_ms: (u.end * 1000.0) as u64,
                confidence: Some(u.confidence.clamp(0.0, 1.0)),
                speaker: u.speaker.map(|s| format!("speaker_{}", s)),
            })
            .collect();

        Ok(RecognitionOutput {
            text: alternative.transcript.trim().to_string(),
            segments,
            raw_confidence: alternative.confidence.clamp(0.0, 1.0),
        })
    }
}

/*!
 * ElevenLabs text-to-speech client, the dubbing synthesis boundary.
 *
 * The pipeline only invokes synthesis; everything past this call (mixing,
 * timing alignment, mastering) is outside the system.
 */

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::Serialize;

use crate::errors::ProviderError;
use crate::providers::SpeechSynthesis;

/// ElevenLabs client for the text-to-speech API
#[derive(Debug)]
pub struct ElevenLabs {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL (optional, defaults to the public API)
    endpoint: String,
    /// Model identifier
    model_id: String,
}

/// Text-to-speech request body
#[derive(Debug, Serialize)]
struct SynthesisRequest {
    /// Text to synthesize
    text: String,
    /// Model to synthesize with
    model_id: String,
    /// Voice rendering settings
    voice_settings: VoiceSettings,
}

/// Voice rendering settings
#[derive(Debug, Serialize)]
struct VoiceSettings {
    /// Voice stability (0-1)
    stability: f32,
    /// Similarity to the reference voice (0-1)
    similarity_boost: f32,
}

impl ElevenLabs {
    /// Create a new ElevenLabs client
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model_id: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model_id: model_id.into(),
        }
    }

    fn api_url(&self, voice_id: &str) -> String {
        let base = if self.endpoint.is_empty() {
            "https://api.elevenlabs.io".to_string()
        } else {
            self.endpoint.trim_end_matches('/').to_string()
        };
        format!("{}/v1/text-to-speech/{}", base, voice_id)
    }
}

#[async_trait]
impl SpeechSynthesis for ElevenLabs {
    fn name(&self) -> &str {
        "elevenlabs"
    }

    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Bytes, ProviderError> {
        if text.trim().is_empty() {
            return Err(ProviderError::InvalidInput(
                "synthesis text is empty".to_string(),
            ));
        }

        let request = SynthesisRequest {
            text: text.to_string(),
            model_id: self.model_id.clone(),
            voice_settings: VoiceSettings {
                stability: 0.5,
                similarity_boost: 0.75,
            },
        };

        let response = self
            .client
            .post(self.api_url(voice_id))
            .header("xi-api-key", &self.api_key)
            .json(&request)
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

        response
            .bytes()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apiUrl_shouldEmbedVoiceId() {
        let client = ElevenLabs::new("key", "", "eleven_multilingual_v2", 120);
        assert_eq!(
            client.api_url("voice-123"),
            "https://api.elevenlabs.io/v1/text-to-speech/voice-123"
        );
    }
}

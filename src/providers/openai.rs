/*!
 * OpenAI chat completions client, used as the secondary translation provider.
 */

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;
use crate::providers::TranslationModel;

/// OpenAI client for the chat completions API
#[derive(Debug)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL (optional, defaults to the public API)
    endpoint: String,
    /// Model identifier
    model: String,
    /// Maximum tokens to generate per request
    max_tokens: u32,
}

/// Chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    /// The model to use
    model: String,

    /// The messages of the conversation
    messages: Vec<ChatCompletionMessage>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Maximum number of tokens to generate
    max_tokens: u32,
}

/// Chat message format
#[derive(Debug, Serialize, Deserialize)]
struct ChatCompletionMessage {
    /// Role of the message sender (system, user, assistant)
    role: String,

    /// Content of the message
    content: String,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    /// Completion choices
    choices: Vec<ChatCompletionChoice>,
}

/// One completion choice
#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    /// The completed message
    message: ChatCompletionMessage,
}

impl OpenAI {
    /// Create a new OpenAI client
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
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
            max_tokens,
        }
    }

    fn api_url(&self) -> String {
        if self.endpoint.is_empty() {
            "https://api.openai.com/v1/chat/completions".to_string()
        } else {
            format!(
                "{}/v1/chat/completions",
                self.endpoint.trim_end_matches('/')
            )
        }
    }
}

#[async_trait]
impl TranslationModel for OpenAI {
    fn name(&self) -> &str {
        "openai"
    }

    async fn translate(
        &self,
        system_prompt: &str,
        prompt: &str,
    ) -> Result<String, ProviderError> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatCompletionMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatCompletionMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: Some(0.3),
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(self.api_url())
            .bearer_auth(&self.api_key)
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

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderError::ParseError("response carried no choices".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apiUrl_withEmptyEndpoint_shouldUsePublicApi() {
        let client = OpenAI::new("key", "", "gpt-4o-mini", 4096, 120);
        assert_eq!(
            client.api_url(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_apiUrl_withAzureStyleEndpoint_shouldAppendPath() {
        let client = OpenAI::new("key", "https://example.azure.com/", "gpt-4o-mini", 4096, 120);
        assert_eq!(
            client.api_url(),
            "https://example.azure.com/v1/chat/completions"
        );
    }
}

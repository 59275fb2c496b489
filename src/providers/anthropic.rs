/*!
 * Anthropic messages API client, used as the primary translation provider.
 */

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use reqwest::Client;

use crate::errors::ProviderError;
use crate::providers::TranslationModel;

/// Anthropic client for the messages API
#[derive(Debug)]
pub struct Anthropic {
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

/// Anthropic message request
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<AnthropicMessage>,

    /// System prompt to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Maximum number of tokens to generate
    max_tokens: u32,
}

/// Anthropic message format
#[derive(Debug, Serialize, Deserialize)]
struct AnthropicMessage {
    /// Role of the message sender (user, assistant)
    role: String,

    /// Content of the message
    content: String,
}

/// Anthropic response
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    /// The content blocks of the response
    content: Vec<AnthropicContent>,
}

/// Individual content block in an Anthropic response
#[derive(Debug, Deserialize)]
struct AnthropicContent {
    /// The type of content
    #[serde(rename = "type")]
    content_type: String,

    /// The actual text content
    #[serde(default)]
    text: String,
}

impl Anthropic {
    /// Create a new Anthropic client
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
            "https://api.anthropic.com/v1/messages".to_string()
        } else {
            format!("{}/v1/messages", self.endpoint.trim_end_matches('/'))
        }
    }

    async fn complete(&self, request: AnthropicRequest) -> Result<AnthropicResponse, ProviderError> {
        let response = self
            .client
            .post(self.api_url())
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
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
            .json::<AnthropicResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))
    }

    /// Extract concatenated text blocks from a response
    fn extract_text(response: &AnthropicResponse) -> String {
        response
            .content
            .iter()
            .filter(|c| c.content_type == "text")
            .map(|c| c.text.as_str())
            .collect()
    }
}

#[async_trait]
impl TranslationModel for Anthropic {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn translate(
        &self,
        system_prompt: &str,
        prompt: &str,
    ) -> Result<String, ProviderError> {
        let request = AnthropicRequest {
            model: self.model.clone(),
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            system: Some(system_prompt.to_string()),
            temperature: Some(0.3),
            max_tokens: self.max_tokens,
        };

        let response = self.complete(request).await?;
        let text = Self::extract_text(&response);
        if text.trim().is_empty() {
            return Err(ProviderError::ParseError(
                "response contained no text content".to_string(),
            ));
        }
        Ok(text)
    }
}

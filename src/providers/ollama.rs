/*!
 * Ollama client for a locally hosted LLM, usable as a zero-cost translation
 * fallback when no remote provider is configured.
 */

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::ProviderError;
use crate::providers::TranslationModel;

/// Ollama client for the generate API
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama server
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    /// Model identifier
    model: String,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize)]
struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// System message to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Whether to stream the response
    stream: bool,
}

/// Generation response from the Ollama API
#[derive(Debug, Deserialize)]
struct GenerationResponse {
    /// Generated text
    response: String,
}

impl Ollama {
    /// Create a new Ollama client from a host and port.
    ///
    /// The host may be bare ("localhost"), carry a scheme, or carry its own
    /// port, which then wins over the `port` argument.
    pub fn new(host: impl Into<String>, port: u16, model: impl Into<String>) -> Self {
        let host = host.into();
        let with_scheme = if host.starts_with("http://") || host.starts_with("https://") {
            host
        } else {
            format!("http://{}", host)
        };
        let base_url = match Url::parse(&with_scheme) {
            Ok(url) => {
                let scheme = url.scheme();
                let host_part = url.host_str().unwrap_or("localhost");
                let port = url.port().unwrap_or(port);
                format!("{}://{}:{}", scheme, host_part, port)
            }
            Err(_) => format!("http://localhost:{}", port),
        };

        Self {
            base_url,
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .http1_only()
                .build()
                .unwrap_or_default(),
            model: model.into(),
        }
    }

    /// Assemble the final text from a response body that may be JSONL.
    ///
    /// Ollama streams by default even when asked not to on some versions, so
    /// a line-wise concatenation fallback keeps the adapter tolerant.
    fn parse_body(body: &str) -> Result<String, ProviderError> {
        if let Ok(single) = serde_json::from_str::<GenerationResponse>(body) {
            return Ok(single.response);
        }

        let mut assembled = String::new();
        let mut saw_done = false;
        for line in body.lines().filter(|l| !l.is_empty()) {
            let value: serde_json::Value = serde_json::from_str(line)
                .map_err(|e| ProviderError::ParseError(e.to_string()))?;
            if let Some(part) = value.get("response").and_then(|v| v.as_str()) {
                assembled.push_str(part);
            }
            saw_done |= value.get("done").and_then(|v| v.as_bool()).unwrap_or(false);
        }

        if assembled.is_empty() && !saw_done {
            return Err(ProviderError::ParseError(
                "response contained no generated text".to_string(),
            ));
        }
        Ok(assembled)
    }
}

#[async_trait]
impl TranslationModel for Ollama {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn translate(
        &self,
        system_prompt: &str,
        prompt: &str,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerationRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            system: Some(system_prompt.to_string()),
            stream: false,
        };

        let response = self
            .client
            .post(&url)
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

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        Self::parse_body(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_withBareHost_shouldAddSchemeAndPort() {
        let client = Ollama::new("localhost", 11434, "llama3");
        assert_eq!(client.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_new_withFullUrl_shouldKeepIt() {
        let client = Ollama::new("http://ollama.local:8080", 11434, "llama3");
        assert_eq!(client.base_url, "http://ollama.local:8080");
    }

    #[test]
    fn test_parseBody_withSingleObject_shouldReturnResponse() {
        let body = r#"{"response": "SEGMENT_0: Hola", "done": true}"#;
        assert_eq!(Ollama::parse_body(body).unwrap(), "SEGMENT_0: Hola");
    }

    #[test]
    fn test_parseBody_withJsonLines_shouldConcatenate() {
        let body = "{\"response\": \"SEGMENT_0: \", \"done\": false}\n\
                    {\"response\": \"Hola\", \"done\": true}";
        assert_eq!(Ollama::parse_body(body).unwrap(), "SEGMENT_0: Hola");
    }

    #[test]
    fn test_parseBody_withInvalidJson_shouldError() {
        assert!(Ollama::parse_body("not json at all").is_err());
    }
}

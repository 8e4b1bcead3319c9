//! Gemini `generateContent` client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::config::GeminiSettings;
use crate::core::errors::{Result, ScrivenerError};

use super::{CompletionOptions, LanguageModel};

const PROVIDER_NAME: &str = "gemini";

/// Connection settings for the Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key
    pub api_key: String,
    /// Endpoint base URL
    pub api_endpoint: String,
    /// Model name
    pub model: String,
    /// Nucleus sampling parameter
    pub top_p: f32,
}

impl GeminiConfig {
    /// Create configuration from the `GEMINI_API_KEY` environment variable
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(&GeminiSettings::default())
    }

    /// Create configuration from the environment and explicit settings
    pub fn from_env_with(settings: &GeminiSettings) -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
            ScrivenerError::config("GEMINI_API_KEY environment variable not set")
        })?;

        Ok(Self {
            api_key,
            api_endpoint: settings.api_endpoint.clone(),
            model: settings.model.clone(),
            top_p: settings.top_p,
        })
    }

    /// Override the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "topK")]
    top_k: i32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiResponseContent,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: String,
}

/// Language model backed by the Gemini REST API.
pub struct GeminiClient {
    config: GeminiConfig,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a new client.
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn build_request(&self, prompt: &str, options: &CompletionOptions) -> GeminiRequest {
        let response_mime_type = if options.json_response {
            "application/json"
        } else {
            "text/plain"
        };

        GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: options.temperature,
                top_k: 40,
                top_p: self.config.top_p,
                max_output_tokens: options.max_output_tokens,
                response_mime_type: response_mime_type.to_string(),
            },
        }
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            self.config.api_endpoint, self.config.model, self.config.api_key
        );
        let request = self.build_request(prompt, options);

        debug!(
            model = %self.config.model,
            prompt_chars = prompt.chars().count(),
            "Sending Gemini request"
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ScrivenerError::provider(PROVIDER_NAME, format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ScrivenerError::provider(
                PROVIDER_NAME,
                format!("API error {status}: {error_text}"),
            ));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            ScrivenerError::provider(PROVIDER_NAME, format!("invalid response body: {e}"))
        })?;

        extract_text(gemini_response)
    }
}

fn extract_text(response: GeminiResponse) -> Result<String> {
    response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ScrivenerError::provider(PROVIDER_NAME, "no candidates in response"))?
        .content
        .parts
        .into_iter()
        .next()
        .map(|part| part.text)
        .ok_or_else(|| ScrivenerError::provider(PROVIDER_NAME, "no parts in response"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GeminiClient {
        GeminiClient::new(GeminiConfig {
            api_key: "test".to_string(),
            api_endpoint: "http://localhost".to_string(),
            model: "gemini-test".to_string(),
            top_p: 0.9,
        })
    }

    #[test]
    fn request_serializes_generation_config_names() {
        let request = client().build_request("hi", &CompletionOptions::json(0.3));
        let value = serde_json::to_value(&request).unwrap();
        let config = &value["generationConfig"];
        assert_eq!(config["responseMimeType"], "application/json");
        assert_eq!(config["maxOutputTokens"], 2048);
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hi");
    }

    #[test]
    fn text_mode_requests_plain_text() {
        let request = client().build_request("hi", &CompletionOptions::text(0.3, 512));
        assert_eq!(request.generation_config.response_mime_type, "text/plain");
    }

    #[test]
    fn extract_text_reads_first_candidate() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"ok"}]}}]}"#;
        let response: GeminiResponse = serde_json::from_str(body).unwrap();
        assert_eq!(extract_text(response).unwrap(), "ok");
    }

    #[test]
    fn empty_candidates_is_provider_error() {
        let response: GeminiResponse = serde_json::from_str("{}").unwrap();
        let err = extract_text(response).unwrap_err();
        assert!(matches!(err, ScrivenerError::Provider { .. }));
    }
}

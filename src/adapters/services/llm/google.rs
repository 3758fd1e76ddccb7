//! Google Gemini LLM service adapter
//!
//! Implements the ModelGatewayPort for Google's Gemini `generateContent` API.

use crate::error::{AppError, ExtractionError, Result};
use crate::ports::llm::{GenerationConfig, ModelGatewayPort};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const GOOGLE_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini service implementation
pub struct GoogleService {
    client: Client,
    api_key: String,
    base_url: String,
    config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationParams,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationParams {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate
    fn into_first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

impl GoogleService {
    /// Create a new Google Gemini service with the given API key
    ///
    /// Fails when the key is empty or the HTTP client cannot be built; there is
    /// no useful degraded mode for a misconfigured deployment.
    pub fn new(api_key: String, config: GenerationConfig, timeout: Duration) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(AppError::Config(
                "Gemini API key is required. Set GEMINI_API_KEY.".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        log::info!("Google Gemini gateway initialized for model {}", config.model);

        Ok(Self {
            client,
            api_key,
            base_url: GOOGLE_API_BASE.to_string(),
            config,
        })
    }

    /// Point the service at a different API root (used by tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        // Accept both "gemini-2.0-flash" and "models/gemini-2.0-flash"
        let model_name = if self.config.model.starts_with("models/") {
            self.config.model.clone()
        } else {
            format!("models/{}", self.config.model)
        };
        format!("{}/{}:generateContent", self.base_url, model_name)
    }
}

#[async_trait]
impl ModelGatewayPort for GoogleService {
    async fn generate(&self, prompt: &str) -> std::result::Result<String, ExtractionError> {
        let request_body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationParams {
                temperature: self.config.temperature,
                top_p: self.config.top_p,
                top_k: self.config.top_k,
                max_output_tokens: self.config.max_output_tokens,
            },
        };

        log::info!("Calling Google generateContent with model: {}", self.config.model);

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", &self.api_key)])
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExtractionError::Transport(format!("GenerateContent timed out: {}", e))
                } else {
                    ExtractionError::Transport(format!("GenerateContent request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Transport(format!(
                "GenerateContent failed with status {}: {}",
                status, error_text
            )));
        }

        let body = response.text().await?;
        let parsed: GenerateContentResponse = serde_json::from_str(&body).map_err(|e| {
            ExtractionError::MalformedResponse(format!("Failed to parse content response: {}", e))
        })?;

        let content = parsed.into_first_text().ok_or_else(|| {
            ExtractionError::MalformedResponse(
                "No text in candidates[0].content.parts[0]".to_string(),
            )
        })?;

        log::info!(
            "Google completion successful, generated {} characters",
            content.len()
        );

        Ok(content)
    }

    fn provider_name(&self) -> &'static str {
        "google"
    }
}

/// Model gateway port trait
///
/// Defines the interface for the external generative-text service.
/// Implementation: Google Gemini
use crate::error::ExtractionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Generation parameters sent with every prompt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    /// Model name (e.g., "gemini-2.0-flash")
    pub model: String,

    /// Temperature for generation (0.0 to 1.0)
    pub temperature: f32,

    /// Nucleus sampling probability mass
    pub top_p: f32,

    /// Number of highest-probability tokens considered per step
    pub top_k: u32,

    /// Maximum tokens in response
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            temperature: 0.2, // Low temperature keeps the JSON output stable
            top_p: 0.8,
            top_k: 40,
            max_output_tokens: 8192,
        }
    }
}

/// Port trait for the generative-text endpoint
///
/// One call per prompt, no retries. Callers decide what a failure means.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelGatewayPort: Send + Sync {
    /// Send a prompt and return the raw text of the first candidate
    async fn generate(&self, prompt: &str) -> Result<String, ExtractionError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}

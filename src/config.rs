//! Runtime configuration
//!
//! Every setting can be passed as a flag or through the environment.

use crate::adapters::services::docs::google_docs::GOOGLE_DOCS_API_BASE;
use crate::adapters::services::llm::google::GOOGLE_API_BASE;
use crate::error::{AppError, Result};
use crate::ports::llm::GenerationConfig;
use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "scholar-sidekick")]
#[command(author, version, about = "Meeting notes backend with transcript card extraction")]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "API_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "API_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Path to the SQLite database file
    #[arg(long = "database", env = "DATABASE_PATH", default_value = "scholar-sidekick.db")]
    pub database_path: String,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: String,

    /// Gemini model used for extraction
    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-2.0-flash")]
    pub gemini_model: String,

    /// Root of the Gemini REST API
    #[arg(long, env = "GEMINI_BASE_URL", default_value = GOOGLE_API_BASE)]
    pub gemini_base_url: String,

    /// Timeout for a single model call, in seconds
    #[arg(long, env = "LLM_TIMEOUT_SECS", default_value_t = 60)]
    pub llm_timeout_secs: u64,

    /// Root of the Google Docs REST API
    #[arg(long, env = "GOOGLE_DOCS_BASE_URL", default_value = GOOGLE_DOCS_API_BASE)]
    pub docs_base_url: String,
}

impl Config {
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid listen address: {}", e)))
    }

    pub fn generation(&self) -> GenerationConfig {
        GenerationConfig {
            model: self.gemini_model.clone(),
            ..GenerationConfig::default()
        }
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }
}

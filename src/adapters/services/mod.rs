//! External service adapters
//!
//! This module contains adapters for external APIs including:
//! - Document services (Google Docs)
//! - LLM (Large Language Model) services

pub mod docs;
pub mod llm;

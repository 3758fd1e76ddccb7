//! Scholar Sidekick: meeting notes backend that turns transcripts into
//! canvas cards.

pub mod adapters;
pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod extraction;
pub mod ports;

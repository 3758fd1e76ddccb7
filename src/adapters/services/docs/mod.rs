//! Document service adapters
//!
//! Implementations of the DocumentSourcePort trait:
//! - Google Docs

pub mod google_docs;

pub use google_docs::GoogleDocsService;

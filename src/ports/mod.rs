/// Port trait definitions (interfaces)
///
/// These traits define the contracts for adapters to implement.
/// Following the ports-and-adapters (hexagonal) architecture pattern.
pub mod documents;
pub mod llm;
pub mod storage;

#[cfg(test)]
pub mod mocks;

pub use documents::{DocumentMetadata, DocumentSourcePort, FetchedDocument};
pub use llm::{GenerationConfig, ModelGatewayPort};
pub use storage::{CardFilter, StoragePort, DEFAULT_LIMIT};

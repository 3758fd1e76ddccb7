/// Domain layer - core business models and the pure parts of extraction
///
/// Nothing in here performs I/O.
pub mod card_validator;
pub mod json_recovery;
pub mod models;
pub mod prompts;

pub use card_validator::{grid_position, validate_candidates};
pub use json_recovery::recover_json;
pub use models::{Canvas, Card, CardCandidate, CardStatus, CardType, CardUpdate, Meeting};
pub use prompts::PromptTemplates;

//! Transcript extraction pipeline
//!
//! Prompt → model gateway → JSON recovery → validation. Every operation is
//! best effort: failures are logged and reported through
//! [`ExtractionOutcome`], never raised to the caller.

use crate::domain::card_validator::{json_kind, validate_candidates};
use crate::domain::json_recovery::recover_json;
use crate::domain::models::{CardCandidate, CardType};
use crate::domain::prompts::PromptTemplates;
use crate::error::ExtractionError;
use crate::ports::llm::ModelGatewayPort;
use serde_json::Value;
use std::sync::Arc;

/// Result of a best-effort extraction
#[derive(Debug)]
pub enum ExtractionOutcome<T> {
    Extracted(Vec<T>),
    Failed(ExtractionError),
}

impl<T> ExtractionOutcome<T> {
    /// The extracted items, empty when extraction failed
    pub fn into_items(self) -> Vec<T> {
        match self {
            ExtractionOutcome::Extracted(items) => items,
            ExtractionOutcome::Failed(_) => Vec::new(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ExtractionOutcome::Failed(_))
    }
}

/// Runs extraction prompts against a model gateway
pub struct ExtractionService {
    gateway: Arc<dyn ModelGatewayPort>,
}

impl ExtractionService {
    pub fn new(gateway: Arc<dyn ModelGatewayPort>) -> Self {
        Self { gateway }
    }

    /// Extract card candidates of the requested types from a transcript
    pub async fn extract_cards(
        &self,
        transcript: &str,
        agenda_items: &[String],
        requested: &[CardType],
    ) -> ExtractionOutcome<CardCandidate> {
        let prompt = PromptTemplates::card_extraction(transcript, agenda_items, requested);

        let result = self
            .prompt_for_json(&prompt)
            .await
            .and_then(|value| validate_candidates(&value, requested));

        match result {
            Ok(candidates) => {
                log::info!(
                    "Extracted {} cards via {}",
                    candidates.len(),
                    self.gateway.provider_name()
                );
                ExtractionOutcome::Extracted(candidates)
            }
            Err(e) => {
                log::warn!("Card extraction failed, continuing without cards: {}", e);
                ExtractionOutcome::Failed(e)
            }
        }
    }

    /// Agenda items the transcript did not cover, always a subset of `agenda_items`
    pub async fn find_uncovered_agenda_items(
        &self,
        agenda_items: &[String],
        transcript: &str,
    ) -> ExtractionOutcome<String> {
        if agenda_items.is_empty() {
            return ExtractionOutcome::Extracted(Vec::new());
        }

        let prompt = PromptTemplates::uncovered_agenda(agenda_items, transcript);
        let result = self
            .prompt_for_json(&prompt)
            .await
            .and_then(|value| restrict_to_agenda(&value, agenda_items));

        match result {
            Ok(uncovered) => {
                log::info!(
                    "{} of {} agenda items uncovered",
                    uncovered.len(),
                    agenda_items.len()
                );
                ExtractionOutcome::Extracted(uncovered)
            }
            Err(e) => {
                log::warn!("Agenda coverage analysis failed: {}", e);
                ExtractionOutcome::Failed(e)
            }
        }
    }

    /// Transcript snippet that best supports a card, if the model finds one
    pub async fn extract_segment_for_card(
        &self,
        transcript: &str,
        card_content: &str,
    ) -> Option<String> {
        let prompt = PromptTemplates::supporting_segment(transcript, card_content);
        match self.gateway.generate(&prompt).await {
            Ok(text) => {
                let segment = text.trim();
                (!segment.is_empty()).then(|| segment.to_string())
            }
            Err(e) => {
                log::error!("Segment lookup failed: {}", e);
                None
            }
        }
    }

    async fn prompt_for_json(&self, prompt: &str) -> Result<Value, ExtractionError> {
        let raw = self.gateway.generate(prompt).await?;
        log::debug!("Model returned {} characters", raw.len());
        recover_json(&raw)
    }
}

fn restrict_to_agenda(value: &Value, agenda_items: &[String]) -> Result<Vec<String>, ExtractionError> {
    let returned = value.as_array().ok_or(ExtractionError::UnexpectedShape {
        expected: "array",
        found: json_kind(value),
    })?;

    let mut uncovered: Vec<String> = Vec::new();
    for item in returned.iter().filter_map(Value::as_str) {
        if !agenda_items.iter().any(|a| a == item) {
            log::debug!("Ignoring agenda item not in the original list: {}", item);
            continue;
        }
        if !uncovered.iter().any(|u| u == item) {
            uncovered.push(item.to_string());
        }
    }
    Ok(uncovered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::llm::MockModelGatewayPort;

    fn service_returning(response: &'static str) -> ExtractionService {
        let mut gateway = MockModelGatewayPort::new();
        gateway
            .expect_generate()
            .times(1)
            .returning(move |_| Ok(response.to_string()));
        gateway.expect_provider_name().return_const("mock");
        ExtractionService::new(Arc::new(gateway))
    }

    fn agenda(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_fenced_response_with_trailing_prose() {
        let service = service_returning(
            "```json\n[{\"type\":\"todo\",\"title\":\"Ship v1\",\"content\":\"Ship by Friday\"}]\n```\nHope this helps!",
        );

        let outcome = service
            .extract_cards("transcript", &[], &CardType::default_requested())
            .await;
        assert!(!outcome.is_failed());

        let cards = outcome.into_items();
        assert_eq!(
            cards,
            vec![CardCandidate {
                category: CardType::Todo,
                title: "Ship v1".to_string(),
                body: "Ship by Friday".to_string(),
                quote: String::new(),
                position_x: 0,
                position_y: 0,
            }]
        );
    }

    #[tokio::test]
    async fn test_prose_only_response_yields_no_cards() {
        let service = service_returning("Sorry, I could not find any action items.");

        let outcome = service
            .extract_cards("transcript", &[], &CardType::default_requested())
            .await;
        assert!(matches!(
            outcome,
            ExtractionOutcome::Failed(ExtractionError::Parse(_))
        ));
        assert!(outcome.into_items().is_empty());
    }

    #[tokio::test]
    async fn test_truncated_response_yields_no_cards() {
        let service =
            service_returning("[{\"type\":\"todo\",\"title\":\"Ship\",\"content\":\"Ship it\"},");

        let outcome = service.extract_cards("transcript", &[], &[]).await;
        assert!(outcome.is_failed());
        assert!(outcome.into_items().is_empty());
    }

    #[tokio::test]
    async fn test_object_response_is_unexpected_shape() {
        let service = service_returning("{\"cards\": []}");

        let outcome = service.extract_cards("transcript", &[], &[]).await;
        assert!(matches!(
            outcome,
            ExtractionOutcome::Failed(ExtractionError::UnexpectedShape { found: "object", .. })
        ));
    }

    #[tokio::test]
    async fn test_transport_failure_degrades_to_empty() {
        let mut gateway = MockModelGatewayPort::new();
        gateway
            .expect_generate()
            .returning(|_| Err(ExtractionError::Transport("connection refused".to_string())));
        let service = ExtractionService::new(Arc::new(gateway));

        let outcome = service.extract_cards("transcript", &[], &[]).await;
        assert!(matches!(
            outcome,
            ExtractionOutcome::Failed(ExtractionError::Transport(_))
        ));
        assert!(outcome.into_items().is_empty());
    }

    #[tokio::test]
    async fn test_prompt_carries_transcript_and_requested_types() {
        let mut gateway = MockModelGatewayPort::new();
        gateway
            .expect_generate()
            .withf(|prompt: &str| prompt.contains("Alice: ship it") && prompt.contains("decision"))
            .times(1)
            .returning(|_| Ok("[]".to_string()));
        gateway.expect_provider_name().return_const("mock");
        let service = ExtractionService::new(Arc::new(gateway));

        let outcome = service
            .extract_cards("Alice: ship it", &[], &[CardType::Decision])
            .await;
        assert!(outcome.into_items().is_empty());
    }

    #[tokio::test]
    async fn test_empty_agenda_skips_gateway() {
        let mut gateway = MockModelGatewayPort::new();
        gateway.expect_generate().never();
        let service = ExtractionService::new(Arc::new(gateway));

        let outcome = service.find_uncovered_agenda_items(&[], "transcript").await;
        assert!(!outcome.is_failed());
        assert!(outcome.into_items().is_empty());
    }

    #[tokio::test]
    async fn test_uncovered_items_are_subset_of_agenda() {
        let service = service_returning(
            "Here you go:\n[\"Hiring\", \"Budget review\", \"hiring\", 42, \"Hiring\", \"Roadmap\"]",
        );

        let items = agenda(&["Roadmap", "Hiring", "Budget"]);
        let uncovered = service
            .find_uncovered_agenda_items(&items, "transcript")
            .await
            .into_items();

        assert_eq!(uncovered, agenda(&["Hiring", "Roadmap"]));
        assert!(uncovered.iter().all(|u| items.contains(u)));
    }

    #[tokio::test]
    async fn test_unparseable_coverage_response_is_failure() {
        let service = service_returning("Everything was covered.");

        let outcome = service
            .find_uncovered_agenda_items(&agenda(&["Roadmap"]), "transcript")
            .await;
        assert!(outcome.is_failed());
        assert!(outcome.into_items().is_empty());
    }

    #[tokio::test]
    async fn test_segment_lookup() {
        let service = service_returning("  \"Bob: I'll send the deck tomorrow\"\n");
        let segment = service
            .extract_segment_for_card("transcript", "Send the deck")
            .await;
        assert_eq!(
            segment.as_deref(),
            Some("\"Bob: I'll send the deck tomorrow\"")
        );

        let service = service_returning("   ");
        assert_eq!(
            service.extract_segment_for_card("transcript", "x").await,
            None
        );
    }

    #[tokio::test]
    async fn test_segment_lookup_failure_is_none() {
        let mut gateway = MockModelGatewayPort::new();
        gateway
            .expect_generate()
            .returning(|_| Err(ExtractionError::MalformedResponse("no text".to_string())));
        let service = ExtractionService::new(Arc::new(gateway));

        assert_eq!(
            service.extract_segment_for_card("transcript", "x").await,
            None
        );
    }
}

//! Prompt templates for transcript extraction
//!
//! Each template asks the model for a machine-readable answer; the
//! extraction pipeline still treats whatever comes back as untrusted text.

use crate::domain::models::CardType;

/// Prompt builders for the extraction pipeline
pub struct PromptTemplates;

impl PromptTemplates {
    /// One-line definition of each card type, listed in every card prompt
    pub fn definition(card_type: CardType) -> &'static str {
        match card_type {
            CardType::Tldr => "A brief summary of the entire meeting (1-3 sentences capturing key points)",
            CardType::Todo => "General tasks that need to be done",
            CardType::ActionItem => "Specific tasks assigned to someone with clear deliverables",
            CardType::Decision => "Decisions that were made during the meeting",
            CardType::Question => "Questions raised that may need answers",
            CardType::DiscussionPoint => "Important topics that were discussed",
            CardType::FollowUp => "Items that need follow-up in future meetings",
            CardType::Custom => "Anything else worth capturing that fits no other type",
        }
    }

    /// Prompt asking for a JSON array of cards of the requested types
    pub fn card_extraction(
        transcript: &str,
        agenda_items: &[String],
        requested_types: &[CardType],
    ) -> String {
        let type_instructions = requested_types
            .iter()
            .map(|t| format!("- {}", t))
            .collect::<Vec<_>>()
            .join("\n");

        let definitions = CardType::ALL
            .iter()
            .map(|t| format!("- {}: {}", t, Self::definition(*t)))
            .collect::<Vec<_>>()
            .join("\n");

        let agenda_section = if agenda_items.is_empty() {
            String::new()
        } else {
            let items = agenda_items
                .iter()
                .map(|a| format!("- {}", a))
                .collect::<Vec<_>>()
                .join("\n");
            format!("\nAgenda Items:\n{}", items)
        };

        format!(
            r#"You are an AI assistant that extracts structured information from meeting transcripts.

You MUST extract ONLY the following card types:
{type_instructions}

Card type definitions:
{definitions}

For each card, return a JSON object with:
- type: the card type (MUST match one of the requested types above)
- title: short descriptive title (max 50 chars)
- content: the extracted information
- segment: exact quote from transcript supporting this (empty string "" for tldr type)

Transcript:
"""{transcript}"""
{agenda_section}

Return ONLY a valid JSON array with the requested card types. No markdown code blocks, no explanation."#
        )
    }

    /// Prompt asking which agenda items the transcript did not cover
    pub fn uncovered_agenda(agenda_items: &[String], transcript: &str) -> String {
        let agenda_json = serde_json::to_string_pretty(agenda_items).unwrap_or_else(|_| "[]".into());

        format!(
            r#"Analyze the meeting transcript and identify which agenda items were NOT discussed or covered.

Agenda Items:
{agenda_json}

Transcript:
"""{transcript}"""

Return ONLY a JSON array of the agenda item strings that were NOT covered in the meeting.
If all items were covered, return an empty array [].
No markdown, no explanation, just the JSON array."#
        )
    }

    /// Prompt asking for the transcript snippet that backs a card
    pub fn supporting_segment(transcript: &str, card_content: &str) -> String {
        format!(
            r#"Find the exact snippet in the transcript that best supports or relates to the following card content.

Card Content:
"""{card_content}"""

Transcript:
"""{transcript}"""

Return ONLY the matching snippet from the transcript as a plain string.
If no relevant snippet is found, return an empty string.
No JSON, no quotes, no explanation."#
        )
    }
}

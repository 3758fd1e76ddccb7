//! Turns recovered model JSON into card candidates laid out on a grid

use crate::domain::models::{CardCandidate, CardType};
use crate::error::ExtractionError;
use serde_json::{Map, Value};

/// Number of cards per canvas row
pub const GRID_COLUMNS: usize = 3;
/// Horizontal distance between card columns
pub const COLUMN_SPACING: i64 = 300;
/// Vertical distance between card rows
pub const ROW_SPACING: i64 = 200;

/// Canvas coordinates of the `index`-th card, filling rows left to right.
pub fn grid_position(index: usize) -> (i64, i64) {
    let column = (index % GRID_COLUMNS) as i64;
    let row = (index / GRID_COLUMNS) as i64;
    (column * COLUMN_SPACING, row * ROW_SPACING)
}

/// Filters a recovered JSON value down to well-formed card candidates.
///
/// Records missing `type`, `title` or `content`, carrying an unknown type, or
/// carrying a type outside `requested` (when non-empty) are dropped silently.
/// Positions follow the order of the records that were kept.
pub fn validate_candidates(
    value: &Value,
    requested: &[CardType],
) -> Result<Vec<CardCandidate>, ExtractionError> {
    let records = value.as_array().ok_or(ExtractionError::UnexpectedShape {
        expected: "array",
        found: json_kind(value),
    })?;

    let mut candidates = Vec::new();
    for (raw_index, record) in records.iter().enumerate() {
        let Some(fields) = record.as_object() else {
            log::debug!("Dropping extracted record {}: not an object", raw_index);
            continue;
        };

        let Some((category, title, body)) = required_fields(fields) else {
            log::debug!(
                "Dropping extracted record {}: missing type, title or content",
                raw_index
            );
            continue;
        };

        let category = match category.trim().parse::<CardType>() {
            Ok(category) => category,
            Err(e) => {
                log::debug!("Dropping extracted record {}: {}", raw_index, e);
                continue;
            }
        };

        if !requested.is_empty() && !requested.contains(&category) {
            log::debug!(
                "Dropping extracted record {}: type {} was not requested",
                raw_index,
                category
            );
            continue;
        }

        let quote = fields
            .get("segment")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let (position_x, position_y) = grid_position(candidates.len());
        candidates.push(CardCandidate {
            category,
            title: title.to_string(),
            body: body.to_string(),
            quote,
            position_x,
            position_y,
        });
    }

    Ok(candidates)
}

/// Blank values count as missing, present ones are returned as written
fn required_fields(fields: &Map<String, Value>) -> Option<(&str, &str, &str)> {
    let non_empty = |key: &str| {
        fields
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    };
    Some((non_empty("type")?, non_empty("title")?, non_empty("content")?))
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

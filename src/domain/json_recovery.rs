//! Recovery of a JSON value from free-form model output
//!
//! Model responses are not guaranteed to be pure JSON: they may be wrapped in
//! a fenced code block, preceded by commentary, or followed by it. The
//! recovery is a fixed sequence of text edits followed by a strict parse.
//!
//! Known limitation: the bracket balancing below counts every `[`/`]` (or
//! `{`/`}`) character, including ones inside JSON string literals. A title
//! such as `"fix ] parsing"` ends the value early and the parse then fails.

use crate::error::ExtractionError;
use serde_json::Value;
use std::borrow::Cow;

const FENCE: &str = "```";

/// Narrows a model response down to the text of its embedded JSON value.
///
/// The result is not guaranteed to be valid JSON; see [`recover_json`].
pub fn isolate_json(text: &str) -> String {
    let unfenced = strip_code_fence(text.trim());
    let cleaned = skip_to_json_start(unfenced.trim());
    truncate_after_balanced(cleaned).to_string()
}

/// Recovers the JSON value embedded in a model response.
pub fn recover_json(text: &str) -> Result<Value, ExtractionError> {
    let candidate = isolate_json(text);
    Ok(serde_json::from_str(&candidate)?)
}

/// Drops an opening fence line (with or without a language tag) and, when the
/// last line is a bare closing fence, that line too.
fn strip_code_fence(text: &str) -> Cow<'_, str> {
    if !text.starts_with(FENCE) {
        return Cow::Borrowed(text);
    }

    let mut lines: Vec<&str> = text.split('\n').skip(1).collect();
    if lines.last().is_some_and(|last| last.trim() == FENCE) {
        lines.pop();
    }
    Cow::Owned(lines.join("\n"))
}

/// Discards any prose in front of the first `[` or `{`, whichever comes first.
fn skip_to_json_start(text: &str) -> &str {
    if text.starts_with('[') || text.starts_with('{') {
        return text;
    }

    let start = match (text.find('['), text.find('{')) {
        (Some(arr), Some(obj)) => Some(arr.min(obj)),
        (Some(arr), None) => Some(arr),
        (None, Some(obj)) => Some(obj),
        (None, None) => None,
    };

    match start {
        Some(index) => &text[index..],
        None => text,
    }
}

/// Cuts the text right after the bracket that closes the opening one.
///
/// Text that does not start with a bracket, or never balances, is returned
/// unchanged.
fn truncate_after_balanced(text: &str) -> &str {
    let (open, close) = if text.starts_with('[') {
        ('[', ']')
    } else if text.starts_with('{') {
        ('{', '}')
    } else {
        return text;
    };

    let mut depth = 0usize;
    for (index, ch) in text.char_indices() {
        if ch == open {
            depth += 1;
        } else if ch == close {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return &text[..index + close.len_utf8()];
            }
        }
    }
    text
}

//! Best-effort text extraction from `generateContent` responses.
//!
//! A successful HTTP call always yields some answer text: shape mismatches
//! degrade to a diagnostic string carrying a prefix of the raw body.

use serde_json::Value;

/// Answer used when the response parses but carries no text.
pub const NO_TEXT_FALLBACK: &str = "No response text returned from model.";

/// Prefix of the answer used when the response shape is unrecognised.
pub const UNPARSEABLE_PREFIX: &str = "Unable to parse model response. Raw: ";

/// Maximum number of characters of a raw body echoed back to callers.
pub const RAW_BODY_LIMIT: usize = 500;

/// First `limit` characters of `text`, on char boundaries.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

/// Extract the answer text from a raw response body. Never fails.
pub fn extract_answer(raw_body: &str) -> String {
    let extracted = serde_json::from_str::<Value>(raw_body)
        .ok()
        .and_then(|value| extract_text(&value));

    match extracted {
        Some(text) => text,
        None => {
            tracing::warn!("Unrecognised Gemini response shape, returning raw body excerpt");
            format!(
                "{}{}",
                UNPARSEABLE_PREFIX,
                truncate_chars(raw_body, RAW_BODY_LIMIT)
            )
        }
    }
}

/// `None` means the tree does not have the expected shape.
fn extract_text(value: &Value) -> Option<String> {
    let root = value.as_object()?;

    let candidates = match root.get("candidates") {
        None | Some(Value::Null) => return None,
        Some(candidates) => candidates.as_array()?,
    };
    let first = candidates.first()?.as_object()?;

    // An absent key defaults to empty; an explicit null is a shape mismatch.
    let parts = match first.get("content") {
        None => None,
        Some(content) => match content.as_object()?.get("parts") {
            None => None,
            Some(parts) => Some(parts.as_array()?),
        },
    };

    let mut texts = Vec::new();
    for part in parts.into_iter().flatten() {
        match part.as_object()?.get("text") {
            None | Some(Value::Null) => {}
            Some(Value::String(text)) if text.is_empty() => {}
            Some(Value::String(text)) => texts.push(text.as_str()),
            Some(_) => return None,
        }
    }

    let mut text = texts.join("\n");
    if text.is_empty() {
        if let Some(Value::String(top_level)) = root.get("text") {
            text = top_level.clone();
        }
    }
    if text.is_empty() {
        text = NO_TEXT_FALLBACK.to_string();
    }

    Some(text)
}

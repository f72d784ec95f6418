//! Pulling structured JSON out of free-form model output.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Contents of the first ```json fenced block, else of the first ``` block, else the text itself
pub fn strip_code_fence(text: &str) -> &str {
    if let Some(inner) = fenced_block(text, "```json") {
        return inner;
    }
    if let Some(inner) = fenced_block(text, "```") {
        return inner;
    }
    text
}

fn fenced_block<'a>(text: &'a str, opener: &str) -> Option<&'a str> {
    let start = text.find(opener)? + opener.len();
    let rest = &text[start..];
    let end = rest.find("```")?;
    Some(rest[..end].trim())
}

/// Outermost span between the first `open` and the last `close` delimiter
fn delimited_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Parse a JSON array out of model text, keeping only the items that deserialize
/// into `T`. `None` when no array can be found or parsed.
pub fn parse_array<T: DeserializeOwned>(text: &str) -> Option<Vec<T>> {
    let body = strip_code_fence(text.trim());
    let span = delimited_span(body, '[', ']')?;

    let items: Vec<Value> = match serde_json::from_str(span) {
        Ok(items) => items,
        Err(e) => {
            debug!(error = %e, "model output is not a JSON array");
            return None;
        }
    };

    let total = items.len();
    let parsed: Vec<T> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    if parsed.len() < total {
        debug!(dropped = total - parsed.len(), "dropped invalid items from model output");
    }
    Some(parsed)
}

/// Parse a single JSON object out of model text
pub fn parse_object<T: DeserializeOwned>(text: &str) -> Option<T> {
    let body = strip_code_fence(text.trim());
    let span = delimited_span(body, '{', '}')?;
    serde_json::from_str(span)
        .map_err(|e| debug!(error = %e, "model output is not the expected JSON object"))
        .ok()
}

/// Trim the text and drop one surrounding quote character from each end
pub fn clean_title(text: &str) -> &str {
    let trimmed = text.trim();
    let trimmed = trimmed
        .strip_prefix('"')
        .or_else(|| trimmed.strip_prefix('\''))
        .unwrap_or(trimmed);
    trimmed
        .strip_suffix('"')
        .or_else(|| trimmed.strip_suffix('\''))
        .unwrap_or(trimmed)
}

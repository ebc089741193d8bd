//! Validation of chat-completion replies before anything reaches the ledger.

use crate::models::{EntryBatch, ExerciseEntry, FoodEntry};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("could not parse JSON from assistant: {0}")]
    NotJson(String),
    #[error("assistant reply missing required fields")]
    MissingFields,
    #[error("unsupported entry type '{0}'")]
    UnknownType(String),
    #[error("malformed {kind} item at index {index}: {source}")]
    MalformedItem {
        kind: &'static str,
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Pulls the assistant text out of a chat endpoint response, accepting both
/// an OpenAI-style `choices` body and a proxy-wrapped `{"reply": ...}`.
pub fn extract_reply(body: &Value) -> &str {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .or_else(|| body.get("reply").and_then(Value::as_str))
        .map(str::trim)
        .unwrap_or("")
}

pub fn parse_reply(body: &Value) -> Result<EntryBatch, ChatError> {
    parse_content(extract_reply(body))
}

/// Parses assistant text of the form `{"type": "food"|"exercise", "items": [...]}`.
pub fn parse_content(text: &str) -> Result<EntryBatch, ChatError> {
    let value: Value =
        serde_json::from_str(text).map_err(|_| ChatError::NotJson(text.to_string()))?;

    let kind = value.get("type").and_then(Value::as_str);
    let items = value.get("items").and_then(Value::as_array);
    let (Some(kind), Some(items)) = (kind, items) else {
        return Err(ChatError::MissingFields);
    };

    match kind {
        "food" => Ok(EntryBatch::Food(parse_items::<FoodEntry>("food", items)?)),
        "exercise" => Ok(EntryBatch::Exercise(parse_items::<ExerciseEntry>(
            "exercise", items,
        )?)),
        other => Err(ChatError::UnknownType(other.to_string())),
    }
}

fn parse_items<T: DeserializeOwned>(
    kind: &'static str,
    items: &[Value],
) -> Result<Vec<T>, ChatError> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item.clone()).map_err(|source| ChatError::MalformedItem {
                kind,
                index,
                source,
            })
        })
        .collect()
}

use std::collections::BTreeSet;

use serde_json::Value;

use crate::report::SummaryResult;

/// Keys that may hold the answer in a single JSON object response.
const SUMMARY_KEYS: [&str; 4] = ["summary", "result", "message", "data"];

/// Same, one level down under `data`.
const NESTED_SUMMARY_KEYS: [&str; 3] = ["summary", "result", "message"];

/// Extracts a summary from a chat endpoint response body.
///
/// The endpoint answers either with one JSON object or with a stream of
/// newline-delimited JSON packets. Tried in order:
/// 1. a string under one of [`SUMMARY_KEYS`], or under `data.` + [`NESTED_SUMMARY_KEYS`];
/// 2. the last packet carrying a `message`, plus every `top_documents[].document_id`;
/// 3. the raw body.
pub fn parse_response(body: &str) -> SummaryResult {
    if let Some(summary) = serde_json::from_str::<Value>(body)
        .ok()
        .as_ref()
        .and_then(summary_from_object)
    {
        return SummaryResult::text(summary);
    }

    let (message, document_ids) = scan_packets(body);
    match message {
        Some(summary) => SummaryResult {
            summary,
            document_ids,
        },
        None => SummaryResult {
            summary: body.to_string(),
            document_ids,
        },
    }
}

fn summary_from_object(value: &Value) -> Option<String> {
    let object = value.as_object()?;

    let direct = SUMMARY_KEYS
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str));
    if let Some(summary) = direct {
        return Some(summary.to_string());
    }

    let nested = object.get("data")?.as_object()?;
    NESTED_SUMMARY_KEYS
        .iter()
        .find_map(|key| nested.get(*key).and_then(Value::as_str))
        .map(ToString::to_string)
}

/// Scans NDJSON packets from the end. Lines that are not JSON objects are
/// skipped.
fn scan_packets(body: &str) -> (Option<String>, BTreeSet<String>) {
    let mut message = None;
    let mut document_ids = BTreeSet::new();

    let packets = body
        .trim()
        .lines()
        .rev()
        .filter_map(|line| serde_json::from_str::<Value>(line).ok());

    for packet in packets {
        if message.is_none() {
            message = packet.get("message").and_then(message_text);
        }
        if let Some(documents) = packet.get("top_documents").and_then(Value::as_array) {
            document_ids.extend(
                documents
                    .iter()
                    .filter_map(|doc| doc.get("document_id"))
                    .filter_map(document_id_text),
            );
        }
    }

    (message, document_ids)
}

fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn document_id_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(id) => Some(id.clone()),
        other => Some(other.to_string()),
    }
}

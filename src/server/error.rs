use axum::http::StatusCode;
use axum::Json;
use serde_json::{Map, Value};

use crate::error::{LogError, StatusError};

/// Flat error body: `{"error": message, ...context}`. The dashboard reads
/// `error` and the optional context keys off the same object.
fn envelope(message: String, context: Map<String, Value>) -> Json<Value> {
    let mut body = Map::new();
    body.insert("error".into(), Value::String(message));
    body.extend(context);
    Json(Value::Object(body))
}

pub fn map_status_error(err: &StatusError) -> (StatusCode, Json<Value>) {
    let status = match err {
        StatusError::NoRuns | StatusError::NoCompletedRuns | StatusError::MissingBuildNumber => {
            StatusCode::NOT_FOUND
        }
        StatusError::Upstream(_) => StatusCode::BAD_GATEWAY,
    };
    (status, envelope(err.to_string(), Map::new()))
}

pub fn map_log_error(err: &LogError) -> (StatusCode, Json<Value>) {
    let status = match err {
        LogError::NodeLogNotFound { .. } => StatusCode::NOT_FOUND,
        LogError::NodeLogFetchFailed { status: 404, .. } => StatusCode::NOT_FOUND,
        LogError::NodeLogFetchFailed { .. }
        | LogError::DownstreamHtmlUnparsable { .. }
        | LogError::DownstreamFetchFailed { .. }
        | LogError::Upstream(_) => StatusCode::BAD_GATEWAY,
    };
    (status, envelope(err.to_string(), err.context()))
}

pub fn bad_request(message: impl Into<String>) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, envelope(message.into(), Map::new()))
}

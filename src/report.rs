use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status of the most recent completed pipeline run, as served to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStatus {
    pub pipeline_name: String,
    pub build_number: String,
    /// Stage records exactly as Jenkins reported them
    pub stages: Vec<Value>,
    pub status: Option<String>,
    #[serde(rename = "startTimeMillis")]
    pub start_time_millis: Option<i64>,
    #[serde(rename = "endTimeMillis")]
    pub end_time_millis: Option<i64>,
}

/// Result of a log lookup for one execution node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StageLog {
    Log {
        log: String,
        /// Absent when the log body is empty
        #[serde(skip_serializing_if = "Option::is_none")]
        summary: Option<SummaryOutcome>,
    },
    /// Only a link to the console could be salvaged
    DownstreamConsole { downstream_console_url: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub summary: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub document_ids: BTreeSet<String>,
}

impl SummaryResult {
    pub fn text(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            document_ids: BTreeSet::new(),
        }
    }
}

/// Outcome of a summarisation attempt. Both arms serialise as JSON objects,
/// distinguished by the `summary` or `error` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SummaryOutcome {
    Summary(SummaryResult),
    Failed { error: String },
}

impl SummaryOutcome {
    pub fn summary(&self) -> Option<&SummaryResult> {
        match self {
            Self::Summary(result) => Some(result),
            Self::Failed { .. } => None,
        }
    }
}

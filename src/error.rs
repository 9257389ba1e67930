use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CIDigestError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected status {status} for url: {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CIDigestError>;

/// Outcomes of the status fetcher that are not a pipeline status.
#[derive(Error, Debug)]
pub enum StatusError {
    #[error("No runs found for this pipeline.")]
    NoRuns,

    #[error("No completed runs found for this pipeline.")]
    NoCompletedRuns,

    #[error("Could not determine build number of last completed run.")]
    MissingBuildNumber,

    /// Network, non-success status or undecodable payload. Carries the
    /// textual cause only.
    #[error("{0}")]
    Upstream(String),
}

impl From<CIDigestError> for StatusError {
    fn from(err: CIDigestError) -> Self {
        Self::Upstream(err.to_string())
    }
}

/// Failures of the log resolver. Every variant keeps whatever debug context
/// was known when resolution gave up.
#[derive(Error, Debug)]
pub enum LogError {
    #[error("Could not extract log from downstream job HTML.")]
    DownstreamHtmlUnparsable { console_html_url: String },

    #[error("Downstream job log fetch failed: {status}")]
    DownstreamFetchFailed { status: u16, console_html_url: String },

    #[error("Log not found for this node, but you can search Jenkins for: {display_name}")]
    NodeLogNotFound {
        display_name: String,
        search_url: String,
    },

    #[error("{status} error fetching node log: {log_url}")]
    NodeLogFetchFailed {
        status: u16,
        log_url: String,
        describe_url: String,
        node_description: Option<Value>,
    },

    #[error("{0}")]
    Upstream(String),
}

impl From<CIDigestError> for LogError {
    fn from(err: CIDigestError) -> Self {
        Self::Upstream(err.to_string())
    }
}

impl LogError {
    /// Auxiliary fields reported next to the error message.
    pub fn context(&self) -> Map<String, Value> {
        let mut context = Map::new();
        match self {
            Self::DownstreamHtmlUnparsable { console_html_url }
            | Self::DownstreamFetchFailed {
                console_html_url, ..
            } => {
                context.insert("console_html_url".into(), console_html_url.clone().into());
            }
            Self::NodeLogNotFound { search_url, .. } => {
                context.insert("jenkins_search_url".into(), search_url.clone().into());
            }
            Self::NodeLogFetchFailed {
                status,
                log_url,
                describe_url,
                node_description,
            } => {
                context.insert("status_code".into(), (*status).into());
                context.insert("log_url".into(), log_url.clone().into());
                context.insert("describe_url".into(), describe_url.clone().into());
                context.insert(
                    "node_description".into(),
                    node_description.clone().unwrap_or(Value::Null),
                );
            }
            Self::Upstream(_) => {}
        }
        context
    }
}

#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("Summarization request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Summarization request failed with status {status}: {body}")]
    Status { status: u16, body: String },
}

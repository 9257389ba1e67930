use serde::Deserialize;
use serde_json::Value;

/// One entry of `wfapi/runs`.
///
/// `id` is kept as raw JSON because Jenkins versions disagree on whether it
/// is a string or a number.
#[derive(Debug, Clone, Deserialize)]
pub struct RunSummary {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub status: Option<String>,
}

impl RunSummary {
    /// Whether the run has reached a final state.
    pub fn is_completed(&self) -> bool {
        !matches!(self.status.as_deref(), Some("IN_PROGRESS" | "PAUSED"))
    }

    /// The build number, if the run carries a usable one.
    pub fn build_number(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(id) if !id.is_empty() => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }
}

/// `{build}/wfapi/describe` for a whole pipeline run.
#[derive(Debug, Clone, Deserialize)]
pub struct RunDescription {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "startTimeMillis", default)]
    pub start_time_millis: Option<i64>,
    #[serde(rename = "endTimeMillis", default)]
    pub end_time_millis: Option<i64>,
    #[serde(default)]
    pub stages: Vec<Value>,
}

/// `{build}/execution/node/{node}/wfapi/describe`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeDescription {
    #[serde(rename = "stageFlowNodes", default)]
    pub stage_flow_nodes: Vec<StageFlowNode>,
    #[serde(rename = "_links", default)]
    pub links: Links,
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StageFlowNode {
    #[serde(rename = "_links", default)]
    pub links: Links,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Links {
    #[serde(default)]
    pub console: Option<Link>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Link {
    pub href: Option<String>,
}

impl Links {
    pub fn console_href(&self) -> Option<&str> {
        self.console
            .as_ref()
            .and_then(|link| link.href.as_deref())
            .filter(|href| !href.is_empty())
    }
}

impl StageFlowNode {
    pub fn console_href(&self) -> Option<&str> {
        self.links.console_href()
    }
}

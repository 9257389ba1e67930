use log::{debug, info, warn};
use serde_json::Value;

use super::client::JenkinsClient;
use super::links::{downstream_job_url, join_url, resolve_href, search_url};
use super::scrape::{ConsoleScraper, DownstreamLink};
use super::types::NodeDescription;
use crate::error::LogError;

/// What the resolver found for a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedLog {
    /// Console text of the node, or of the downstream build it triggered
    Log(String),
    /// The log itself was unavailable, but the node links to a console page
    DownstreamConsole(String),
}

/// The node describe document, both raw (for error context) and typed.
struct Describe {
    raw: Value,
    node: NodeDescription,
}

/// Retrieves the console log for one execution node of a build.
///
/// Strategies, in order:
/// 1. follow each stage flow node's console and, if it triggered a downstream
///    build, return that build's console (plain text, else the HTML `<pre>`);
/// 2. the node's own `log` endpoint;
/// 3. salvage a console link or search URL from the describe document.
pub struct LogResolver<'a> {
    client: &'a JenkinsClient,
    scraper: ConsoleScraper,
}

impl<'a> LogResolver<'a> {
    pub fn new(client: &'a JenkinsClient) -> Self {
        Self {
            client,
            scraper: ConsoleScraper,
        }
    }

    pub async fn resolve(&self, build_number: &str, node_id: &str) -> Result<ResolvedLog, LogError> {
        let describe_url = self.client.node_describe_url(build_number, node_id);
        let describe = self.describe(&describe_url).await?;

        if let Some(describe) = &describe {
            if let Some(resolved) = self.resolve_downstream(&describe.node).await? {
                return Ok(resolved);
            }
        }

        let log_url = self.client.node_log_url(build_number, node_id);
        let fetched = self.client.fetch(&log_url).await?;
        if fetched.is_ok() {
            return Ok(ResolvedLog::Log(fetched.body));
        }

        warn!(
            "Log fetch failed for node {node_id} (build {build_number}): {} from {log_url}",
            fetched.status
        );
        debug!(
            "Response body: {}",
            fetched.body.chars().take(500).collect::<String>()
        );

        self.salvage(describe, fetched.status.as_u16(), log_url, describe_url)
    }

    /// Fetches the node describe document. Unusable documents are not errors,
    /// only unreachable servers are.
    async fn describe(&self, describe_url: &str) -> Result<Option<Describe>, LogError> {
        let fetched = self.client.fetch(describe_url).await?;
        if !fetched.status.is_success() {
            warn!("Node describe returned {} for {describe_url}", fetched.status);
            return Ok(None);
        }

        let describe = serde_json::from_str::<Value>(&fetched.body)
            .ok()
            .and_then(|raw| {
                let node = serde_json::from_value(raw.clone()).ok()?;
                Some(Describe { raw, node })
            });
        if describe.is_none() {
            warn!("Node describe at {describe_url} is not a usable JSON document");
        }
        Ok(describe)
    }

    /// Looks for a downstream build in the console of each stage flow node.
    ///
    /// Returns `Ok(None)` when no node references a downstream build. Once a
    /// downstream build is found its outcome is final.
    async fn resolve_downstream(
        &self,
        node: &NodeDescription,
    ) -> Result<Option<ResolvedLog>, LogError> {
        let base = self.client.base_url();

        for flow_node in &node.stage_flow_nodes {
            let Some(href) = flow_node.console_href() else {
                continue;
            };
            let console_url = resolve_href(base, href)?;
            let fetched = self.client.fetch(&console_url).await?;
            if !fetched.is_ok() {
                warn!("Flow node console returned {} for {console_url}", fetched.status);
                continue;
            }

            let Some(link) = self.scraper.find_downstream(&fetched.body) else {
                debug!("No downstream build referenced in {console_url}");
                continue;
            };
            let downstream_url = match link {
                // Anchor paths are relative to the configured root, context path included.
                DownstreamLink::Path(path) => join_url(&[base.as_str(), &path]),
                DownstreamLink::Named {
                    segments,
                    build_number,
                } => {
                    let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
                    downstream_job_url(base, &segments, &build_number)?
                }
            };
            info!("Following downstream build {downstream_url}");
            return self.fetch_downstream(&downstream_url).await.map(Some);
        }

        Ok(None)
    }

    async fn fetch_downstream(&self, downstream_url: &str) -> Result<ResolvedLog, LogError> {
        let downstream_url = downstream_url.trim_end_matches('/');

        let text_url = format!("{downstream_url}/consoleText");
        let fetched = self.client.fetch(&text_url).await?;
        if fetched.is_ok() && !self.scraper.looks_like_html(&fetched.body) {
            return Ok(ResolvedLog::Log(fetched.body));
        }

        let console_html_url = format!("{downstream_url}/console");
        info!("Plain console unavailable, falling back to {console_html_url}");
        let fetched = self.client.fetch(&console_html_url).await?;
        if !fetched.is_ok() {
            return Err(LogError::DownstreamFetchFailed {
                status: fetched.status.as_u16(),
                console_html_url,
            });
        }

        self.scraper
            .extract_pre(&fetched.body)
            .map(ResolvedLog::Log)
            .ok_or(LogError::DownstreamHtmlUnparsable { console_html_url })
    }

    fn salvage(
        &self,
        describe: Option<Describe>,
        status: u16,
        log_url: String,
        describe_url: String,
    ) -> Result<ResolvedLog, LogError> {
        let base = self.client.base_url();

        if let Some(Describe { raw, node }) = describe {
            if let Some(href) = node.links.console_href() {
                return Ok(ResolvedLog::DownstreamConsole(resolve_href(base, href)?));
            }
            if let Some(display_name) = node.display_name {
                let search_url = search_url(base, &display_name)?;
                return Err(LogError::NodeLogNotFound {
                    display_name,
                    search_url,
                });
            }
            return Err(LogError::NodeLogFetchFailed {
                status,
                log_url,
                describe_url,
                node_description: Some(raw),
            });
        }

        Err(LogError::NodeLogFetchFailed {
            status,
            log_url,
            describe_url,
            node_description: None,
        })
    }
}

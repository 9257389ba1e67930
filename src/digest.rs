use log::info;

use crate::config::Config;
use crate::error::{LogError, Result, StatusError};
use crate::providers::jenkins::{fetch_pipeline_status, JenkinsClient, LogResolver, ResolvedLog};
use crate::report::{PipelineStatus, StageLog};
use crate::summarizer::{RunSearch, Summarizer, SummaryKey};

/// Everything the dashboard asks for, behind one handle shared by the server
/// and the CLI.
pub struct PipelineDigest {
    jenkins: JenkinsClient,
    summarizer: Summarizer,
}

impl PipelineDigest {
    pub fn new(jenkins: JenkinsClient, summarizer: Summarizer) -> Self {
        Self {
            jenkins,
            summarizer,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let jenkins = JenkinsClient::new(&config.jenkins, config.jenkins_timeout())?;
        let summarizer = Summarizer::new(&config.chat, config.cache.capacity, config.cache_ttl())?;
        Ok(Self::new(jenkins, summarizer))
    }

    pub async fn status(&self) -> std::result::Result<PipelineStatus, StatusError> {
        fetch_pipeline_status(&self.jenkins).await
    }

    /// Resolves a node's log and attaches a summary when there is text to
    /// summarise.
    pub async fn stage_log(
        &self,
        build_number: &str,
        node_id: &str,
        run_search: RunSearch,
    ) -> std::result::Result<StageLog, LogError> {
        let resolved = LogResolver::new(&self.jenkins)
            .resolve(build_number, node_id)
            .await?;

        match resolved {
            ResolvedLog::DownstreamConsole(url) => {
                info!("Only a console link is available for node {node_id}: {url}");
                Ok(StageLog::DownstreamConsole {
                    downstream_console_url: url,
                })
            }
            ResolvedLog::Log(log) if log.is_empty() => Ok(StageLog::Log { log, summary: None }),
            ResolvedLog::Log(log) => {
                let key = SummaryKey::new(build_number, node_id, run_search);
                let summary = self.summarizer.summarize(key, &log).await;
                Ok(StageLog::Log {
                    log,
                    summary: Some(summary),
                })
            }
        }
    }
}

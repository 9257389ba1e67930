use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::{Config, Overrides};
use crate::digest::PipelineDigest;
use crate::output::{print_stage_log, print_status, Spinner};
use crate::providers::jenkins::{fetch_pipeline_status, JenkinsClient};
use crate::server::{self, AppState};
use crate::summarizer::RunSearch;

#[derive(Parser)]
#[command(name = "cidigest")]
#[command(author, version, about = "Jenkins pipeline status and failure digests", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./cidigest.{toml,json,yaml,yml})
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,

    #[arg(long, global = true, env = "JENKINS_URL")]
    jenkins_url: Option<String>,

    /// Job path below the Jenkins root, e.g. /job/team/job/promotion
    #[arg(long, global = true, env = "JENKINS_JOB_PATH")]
    job_path: Option<String>,

    #[arg(long, global = true, env = "JENKINS_USER")]
    jenkins_user: Option<String>,

    #[arg(long, global = true, env = "JENKINS_TOKEN", hide_env_values = true)]
    jenkins_token: Option<String>,

    /// Chat `send-message` endpoint used for summaries
    #[arg(long, global = true, env = "CHAT_API_URL")]
    chat_url: Option<String>,

    #[arg(long, global = true, env = "INTERNAL_LLM_CHAT_SESSION_ID")]
    chat_session_id: Option<String>,

    #[arg(long, global = true, env = "CHAT_API_COOKIE", hide_env_values = true)]
    chat_cookie: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard API
    Serve {
        #[arg(short, long, env = "CIDIGEST_BIND")]
        bind: Option<String>,
    },
    /// Show the stages of the last completed run
    Status {
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Fetch and summarise the log of one execution node
    Log {
        build_number: String,

        node_id: String,

        #[arg(long, value_enum, default_value_t = RunSearch::Auto)]
        run_search: RunSearch,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

impl Cli {
    fn overrides(&self) -> Overrides {
        let bind = match &self.command {
            Commands::Serve { bind } => bind.clone(),
            _ => None,
        };
        Overrides {
            jenkins_url: self.jenkins_url.clone(),
            job_path: self.job_path.clone(),
            user: self.jenkins_user.clone(),
            token: self.jenkins_token.clone(),
            chat_url: self.chat_url.clone(),
            chat_session_id: self.chat_session_id.clone(),
            chat_cookie: self.chat_cookie.clone(),
            bind,
        }
    }

    fn to_json<T: Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(json)
    }

    async fn execute_status(&self, jenkins: &JenkinsClient, json: bool) -> Result<()> {
        let spinner = Spinner::start("Fetching last completed run");
        let status = match fetch_pipeline_status(jenkins).await {
            Ok(status) => {
                spinner.finish(&format!("Fetched build #{}", status.build_number));
                status
            }
            Err(err) => {
                spinner.fail("Could not fetch pipeline status");
                return Err(err.into());
            }
        };

        if json {
            println!("{}", self.to_json(&status)?);
        } else {
            print_status(&status);
        }
        Ok(())
    }

    async fn execute_log(
        &self,
        digest: &PipelineDigest,
        build_number: &str,
        node_id: &str,
        run_search: RunSearch,
        json: bool,
    ) -> Result<()> {
        info!("Resolving log for node {node_id} of build {build_number}");

        let spinner = Spinner::start("Resolving log and asking for a summary");
        let log = match digest.stage_log(build_number, node_id, run_search).await {
            Ok(log) => {
                spinner.finish("Log resolved");
                log
            }
            Err(err) => {
                spinner.fail("Could not resolve log");
                return Err(err.into());
            }
        };

        if json {
            println!("{}", self.to_json(&log)?);
        } else {
            print_stage_log(&log);
        }
        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?.apply(self.overrides());

        match &self.command {
            Commands::Serve { .. } => {
                let digest = PipelineDigest::from_config(&config)?;
                info!("Serving pipeline {}", config.jenkins.job_path);
                server::serve(AppState::new(digest), &config.server.bind).await
            }
            Commands::Status { json } => {
                let jenkins = status_client(&config)?;
                self.execute_status(&jenkins, *json).await
            }
            Commands::Log {
                build_number,
                node_id,
                run_search,
                json,
            } => {
                let digest = PipelineDigest::from_config(&config)?;
                self.execute_log(&digest, build_number, node_id, *run_search, *json)
                    .await
            }
        }
    }
}

/// `status` never summarises, so it only needs the Jenkins settings.
fn status_client(config: &Config) -> Result<JenkinsClient> {
    config.validate_jenkins()?;
    Ok(JenkinsClient::new(&config.jenkins, config.jenkins_timeout())?)
}

/// Loads `KEY=value` pairs from a `.env` file into the process environment,
/// before clap reads its `env` arguments. Variables already set win.
pub fn load_env_file(path: Option<&Path>) -> Option<PathBuf> {
    match path {
        Some(path) => dotenvy::from_path(path).ok().map(|()| path.to_path_buf()),
        None => dotenvy::dotenv().ok(),
    }
}

use log::{debug, info};

use super::client::JenkinsClient;
use super::types::{RunDescription, RunSummary};
use crate::error::StatusError;
use crate::report::PipelineStatus;

/// Name reported when Jenkins omits one from the run description.
const DEFAULT_PIPELINE_NAME: &str = "promotion-pipeline";

/// Picks the first run that is neither running nor paused, keeping the
/// order Jenkins returned (newest first).
pub(crate) fn select_completed_run(runs: &[RunSummary]) -> Result<&RunSummary, StatusError> {
    if runs.is_empty() {
        return Err(StatusError::NoRuns);
    }
    runs.iter()
        .find(|run| run.is_completed())
        .ok_or(StatusError::NoCompletedRuns)
}

/// Fetches the stage breakdown of the most recent completed run.
///
/// # Errors
///
/// Returns [`StatusError::NoRuns`], [`StatusError::NoCompletedRuns`] or
/// [`StatusError::MissingBuildNumber`] when the run list gives nothing to
/// describe, and [`StatusError::Upstream`] for network, status or decoding
/// failures. Nothing is retried.
pub async fn fetch_pipeline_status(client: &JenkinsClient) -> Result<PipelineStatus, StatusError> {
    let runs: Vec<RunSummary> = client.get_json(&client.runs_url()).await?;
    debug!("Jenkins returned {} runs", runs.len());

    let run = select_completed_run(&runs)?;
    let build_number = run.build_number().ok_or(StatusError::MissingBuildNumber)?;
    info!("Describing completed build #{build_number}");

    let description: RunDescription = client
        .get_json(&client.run_describe_url(&build_number))
        .await?;

    Ok(PipelineStatus {
        pipeline_name: description
            .name
            .unwrap_or_else(|| DEFAULT_PIPELINE_NAME.to_string()),
        build_number,
        stages: description.stages,
        status: description.status,
        start_time_millis: description.start_time_millis,
        end_time_millis: description.end_time_millis,
    })
}

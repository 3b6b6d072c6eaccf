//! Apify as the job provider.

use anyhow::{Context, Result};
use async_trait::async_trait;

use apify_client::{ApifyClient, ListRunsOptions, RunData, RunStatus};
use jobscout_common::{ExecutionRequest, ExecutionStatus, ExternalRun, JobPosting};

use crate::traits::{CallOptions, JobProvider};

#[async_trait]
impl JobProvider for ApifyClient {
    async fn call(
        &self,
        actor_id: &str,
        input: &ExecutionRequest,
        options: &CallOptions,
    ) -> Result<ExternalRun> {
        let options = apify_client::CallOptions {
            memory_mbytes: Some(options.memory_mbytes),
            timeout_secs: Some(options.timeout_secs),
        };
        let run = ApifyClient::call(self, actor_id, input, &options)
            .await
            .with_context(|| {
                format!(
                    "Apify run of {actor_id} for {} / {}",
                    input.title, input.location
                )
            })?;
        Ok(to_external_run(run, None))
    }

    async fn recent_runs(
        &self,
        actor_id: &str,
        limit: u32,
        status: ExecutionStatus,
    ) -> Result<Vec<ExternalRun>> {
        let options = ListRunsOptions {
            limit,
            desc: true,
            status: Some(to_run_status(status)),
        };
        let runs = self
            .list_runs(actor_id, &options)
            .await
            .with_context(|| format!("Listing runs of {actor_id}"))?;
        Ok(runs.into_iter().map(|r| to_external_run(r, None)).collect())
    }

    async fn run_detail(&self, run_id: &str) -> Result<ExternalRun> {
        let run = self
            .get_run(run_id)
            .await
            .with_context(|| format!("Fetching run {run_id}"))?;
        let input = self
            .get_run_input(&run)
            .await
            .with_context(|| format!("Fetching input of run {run_id}"))?;
        Ok(to_external_run(run, input))
    }

    async fn dataset_items(&self, dataset_id: &str) -> Result<Vec<JobPosting>> {
        self.get_dataset_items(dataset_id)
            .await
            .with_context(|| format!("Reading dataset {dataset_id}"))
    }
}

fn to_external_run(run: RunData, input: Option<serde_json::Value>) -> ExternalRun {
    ExternalRun {
        id: run.id,
        status: to_execution_status(run.status),
        started_at: run.started_at,
        input,
        dataset_id: run.default_dataset_id,
    }
}

/// Collapse Apify's lifecycle into the four states the scheduler reasons
/// about. Anything terminal and not succeeded counts as failed.
pub fn to_execution_status(status: RunStatus) -> ExecutionStatus {
    match status {
        RunStatus::Ready => ExecutionStatus::Queued,
        RunStatus::Running | RunStatus::TimingOut | RunStatus::Aborting => {
            ExecutionStatus::Running
        }
        RunStatus::Succeeded => ExecutionStatus::Succeeded,
        RunStatus::Failed | RunStatus::TimedOut | RunStatus::Aborted | RunStatus::Unknown => {
            ExecutionStatus::Failed
        }
    }
}

fn to_run_status(status: ExecutionStatus) -> RunStatus {
    match status {
        ExecutionStatus::Queued => RunStatus::Ready,
        ExecutionStatus::Running => RunStatus::Running,
        ExecutionStatus::Succeeded => RunStatus::Succeeded,
        ExecutionStatus::Failed => RunStatus::Failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_success_terminal_states_are_failures() {
        for status in [RunStatus::Failed, RunStatus::TimedOut, RunStatus::Aborted] {
            assert_eq!(to_execution_status(status), ExecutionStatus::Failed);
        }
        assert_eq!(
            to_execution_status(RunStatus::Succeeded),
            ExecutionStatus::Succeeded
        );
        assert_eq!(
            to_execution_status(RunStatus::TimingOut),
            ExecutionStatus::Running
        );
    }

    #[test]
    fn run_data_maps_to_external_run() {
        let run: RunData = serde_json::from_value(serde_json::json!({
            "id": "r1",
            "status": "SUCCEEDED",
            "defaultDatasetId": "ds1",
            "startedAt": "2024-06-01T10:00:00.000Z"
        }))
        .unwrap();
        let external = to_external_run(run, Some(serde_json::json!({"rows": 50})));

        assert_eq!(external.id, "r1");
        assert_eq!(external.dataset_id, "ds1");
        assert_eq!(external.status, ExecutionStatus::Succeeded);
        assert_eq!(external.started_at.as_deref(), Some("2024-06-01T10:00:00.000Z"));
        assert!(external.input.is_some());
    }
}

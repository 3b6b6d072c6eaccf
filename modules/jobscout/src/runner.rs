use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{error, info, warn};
use typed_builder::TypedBuilder;

use jobscout_common::{ExecutionRequest, ExecutionStatus, ExternalRun, JobPosting};

use crate::traits::{CallOptions, JobProvider};

/// Settings for starting provider executions.
#[derive(Debug, Clone, TypedBuilder)]
pub struct RunnerConfig {
    #[builder(setter(into))]
    pub actor_id: String,
    #[builder(default = 256)]
    pub memory_mbytes: u32,
    #[builder(default = 600)]
    pub timeout_secs: u64,
    /// Random delay before each new execution, in milliseconds.
    #[builder(default = 100..500)]
    pub stagger_ms: Range<u64>,
}

/// Where a unit's postings came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunSource {
    Reused { run_id: String },
    Started { run_id: String },
    /// The execution failed or its results could not be read.
    Failed,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub source: RunSource,
    pub postings: Vec<JobPosting>,
}

impl RunOutcome {
    fn failed() -> Self {
        Self {
            source: RunSource::Failed,
            postings: Vec::new(),
        }
    }
}

/// Issues one provider execution per request, or reads a reused one.
pub struct ExternalJobRunner {
    provider: Arc<dyn JobProvider>,
    config: RunnerConfig,
}

impl ExternalJobRunner {
    pub fn new(provider: Arc<dyn JobProvider>, config: RunnerConfig) -> Self {
        Self { provider, config }
    }

    /// Fetch postings for `request`.
    ///
    /// A reused execution is read as-is. Otherwise a new execution is started
    /// after a short random stagger and awaited until it finishes. Failed
    /// executions and unreadable results yield no postings.
    pub async fn run(&self, request: &ExecutionRequest, reused: Option<ExternalRun>) -> RunOutcome {
        if let Some(run) = reused {
            info!(
                run_id = run.id.as_str(),
                title = request.title.as_str(),
                location = request.location.as_str(),
                "Reading results of reused run"
            );
            return match self.provider.dataset_items(&run.dataset_id).await {
                Ok(postings) => RunOutcome {
                    source: RunSource::Reused { run_id: run.id },
                    postings,
                },
                Err(e) => {
                    error!(run_id = run.id.as_str(), error = %e, "Failed to read reused run results");
                    RunOutcome::failed()
                }
            };
        }

        self.stagger().await;

        info!(
            title = request.title.as_str(),
            location = request.location.as_str(),
            rows = request.result_limit,
            "Starting new scraper run"
        );
        let options = CallOptions {
            memory_mbytes: self.config.memory_mbytes,
            timeout_secs: self.config.timeout_secs,
        };
        let run = match self
            .provider
            .call(&self.config.actor_id, request, &options)
            .await
        {
            Ok(run) => run,
            Err(e) => {
                error!(
                    title = request.title.as_str(),
                    location = request.location.as_str(),
                    error = %e,
                    "Scraper run could not be executed"
                );
                return RunOutcome::failed();
            }
        };

        if run.status != ExecutionStatus::Succeeded {
            error!(run_id = run.id.as_str(), status = ?run.status, "Scraper run did not succeed");
            return RunOutcome::failed();
        }

        match self.provider.dataset_items(&run.dataset_id).await {
            Ok(postings) => {
                info!(run_id = run.id.as_str(), count = postings.len(), "Scraper run finished");
                RunOutcome {
                    source: RunSource::Started { run_id: run.id },
                    postings,
                }
            }
            Err(e) => {
                warn!(run_id = run.id.as_str(), error = %e, "Failed to read run results");
                RunOutcome::failed()
            }
        }
    }

    async fn stagger(&self) {
        let range = self.config.stagger_ms.clone();
        if range.is_empty() {
            return;
        }
        let delay = Duration::from_millis(rand::rng().random_range(range));
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use jobscout_common::SearchUnit;

    fn request() -> ExecutionRequest {
        ExecutionRequest::new(&SearchUnit::new("Engineer", "Remote"), 10, 24)
    }

    fn runner(provider: Arc<MockProvider>) -> ExternalJobRunner {
        ExternalJobRunner::new(
            provider,
            RunnerConfig::builder()
                .actor_id("actor")
                .stagger_ms(0..0)
                .build(),
        )
    }

    #[tokio::test]
    async fn new_run_returns_dataset_postings() {
        let provider = Arc::new(
            MockProvider::new().on_search("Engineer", "Remote", postings_with_urls(&["a", "b"])),
        );
        let outcome = runner(provider.clone()).run(&request(), None).await;

        assert!(matches!(outcome.source, RunSource::Started { .. }));
        assert_eq!(outcome.postings.len(), 2);
        assert_eq!(provider.calls().len(), 1);
        assert_eq!(provider.calls()[0].result_limit, 10);
        assert_eq!(
            provider.call_options(),
            vec![CallOptions {
                memory_mbytes: 256,
                timeout_secs: 600
            }]
        );
    }

    #[tokio::test]
    async fn reused_run_skips_provider_call() {
        let provider = Arc::new(
            MockProvider::new().with_dataset("ds-old", postings_with_urls(&["x"])),
        );
        let reused = ExternalRun {
            id: "old".to_string(),
            status: ExecutionStatus::Succeeded,
            started_at: None,
            input: None,
            dataset_id: "ds-old".to_string(),
        };
        let outcome = runner(provider.clone()).run(&request(), Some(reused)).await;

        assert_eq!(
            outcome.source,
            RunSource::Reused {
                run_id: "old".to_string()
            }
        );
        assert_eq!(outcome.postings.len(), 1);
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_run_yields_no_postings() {
        let provider = Arc::new(
            MockProvider::new()
                .on_search("Engineer", "Remote", postings_with_urls(&["a"]))
                .fail_search("Engineer", "Remote"),
        );
        let outcome = runner(provider).run(&request(), None).await;

        assert_eq!(outcome.source, RunSource::Failed);
        assert!(outcome.postings.is_empty());
    }
}

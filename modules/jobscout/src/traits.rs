// Trait seams between the scheduling core and the outside world.
//
// JobProvider is the job-scraping platform (Apify in production).
// FilterSource supplies titles, locations and excluded companies (DataGOL).
// PostingSink receives the final collection (DataGOL rows, or logs).
//
// testing.rs carries in-memory mocks for all three.

use anyhow::Result;
use async_trait::async_trait;

use jobscout_common::{ExecutionRequest, ExecutionStatus, ExternalRun, FilterKind, JobPosting};

/// Resource hints forwarded to the provider when starting an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallOptions {
    pub memory_mbytes: u32,
    /// Passed through to the provider; no local timeout wraps the call.
    pub timeout_secs: u64,
}

// ---------------------------------------------------------------------------
// JobProvider
// ---------------------------------------------------------------------------

#[async_trait]
pub trait JobProvider: Send + Sync {
    /// Start an execution and suspend until it reaches a terminal status.
    /// A non-successful terminal status is returned as data, not an error.
    async fn call(
        &self,
        actor_id: &str,
        input: &ExecutionRequest,
        options: &CallOptions,
    ) -> Result<ExternalRun>;

    /// The `limit` most recent executions with `status`, newest first.
    async fn recent_runs(
        &self,
        actor_id: &str,
        limit: u32,
        status: ExecutionStatus,
    ) -> Result<Vec<ExternalRun>>;

    /// Full detail of one execution, including its recorded input.
    async fn run_detail(&self, run_id: &str) -> Result<ExternalRun>;

    /// Read every posting in an execution's result set.
    async fn dataset_items(&self, dataset_id: &str) -> Result<Vec<JobPosting>>;
}

// ---------------------------------------------------------------------------
// FilterSource
// ---------------------------------------------------------------------------

#[async_trait]
pub trait FilterSource: Send + Sync {
    /// Values for one filter list. An empty list means "use defaults".
    async fn filter_values(&self, kind: FilterKind) -> Result<Vec<String>>;
}

// ---------------------------------------------------------------------------
// PostingSink
// ---------------------------------------------------------------------------

/// Delivery counts from one `emit` call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EmitReport {
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[async_trait]
pub trait PostingSink: Send + Sync {
    /// Deliver postings downstream. Per-posting failures are logged and
    /// counted in the report, never returned as errors.
    async fn emit(&self, postings: &[JobPosting]) -> EmitReport;
}

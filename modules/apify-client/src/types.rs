use serde::{Deserialize, Serialize};

/// Wrapper for Apify API responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

/// Paginated list envelope used by the `/runs` endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationList<T> {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub count: u64,
    pub items: Vec<T>,
}

/// Lifecycle status of an actor run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunStatus {
    #[serde(rename = "READY")]
    Ready,
    #[serde(rename = "RUNNING")]
    Running,
    #[serde(rename = "SUCCEEDED")]
    Succeeded,
    #[serde(rename = "FAILED")]
    Failed,
    #[serde(rename = "TIMING-OUT")]
    TimingOut,
    #[serde(rename = "TIMED-OUT")]
    TimedOut,
    #[serde(rename = "ABORTING")]
    Aborting,
    #[serde(rename = "ABORTED")]
    Aborted,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// The run will not change status again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Succeeded | RunStatus::Failed | RunStatus::TimedOut | RunStatus::Aborted
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Ready => "READY",
            RunStatus::Running => "RUNNING",
            RunStatus::Succeeded => "SUCCEEDED",
            RunStatus::Failed => "FAILED",
            RunStatus::TimingOut => "TIMING-OUT",
            RunStatus::TimedOut => "TIMED-OUT",
            RunStatus::Aborting => "ABORTING",
            RunStatus::Aborted => "ABORTED",
            RunStatus::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Apify actor run metadata.
///
/// Timestamps are kept as the raw strings the API returned so that a single
/// malformed entry does not fail deserialization of a whole run list.
#[derive(Debug, Clone, Deserialize)]
pub struct RunData {
    pub id: String,
    pub status: RunStatus,
    #[serde(rename = "defaultDatasetId")]
    pub default_dataset_id: String,
    #[serde(rename = "defaultKeyValueStoreId", default)]
    pub default_key_value_store_id: Option<String>,
    #[serde(rename = "startedAt", default)]
    pub started_at: Option<String>,
}

/// Resource hints passed when starting a run.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub memory_mbytes: Option<u32>,
    pub timeout_secs: Option<u64>,
}

/// Query for listing an actor's runs.
#[derive(Debug, Clone)]
pub struct ListRunsOptions {
    pub limit: u32,
    pub desc: bool,
    pub status: Option<RunStatus>,
}

impl Default for ListRunsOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            desc: true,
            status: None,
        }
    }
}

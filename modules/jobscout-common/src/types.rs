use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// --- Search space ---

/// One (job title, location) pair to search.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchUnit {
    pub title: String,
    pub location: String,
}

impl SearchUnit {
    pub fn new(title: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            location: location.into(),
        }
    }
}

impl std::fmt::Display for SearchUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} @ {}", self.title, self.location)
    }
}

/// Canonical input handed to the provider actor for one search unit.
///
/// Serializes to the actor's own input shape (`title`, `location`, `rows`,
/// `publishedAt`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub title: String,
    pub location: String,
    #[serde(rename = "rows")]
    pub result_limit: u32,
    /// Provider recency filter, e.g. `r86400` for the last 24 hours.
    #[serde(rename = "publishedAt")]
    pub recency_window: String,
}

impl ExecutionRequest {
    pub fn new(unit: &SearchUnit, result_limit: u32, posted_in_last_hours: u32) -> Self {
        Self {
            title: unit.title.clone(),
            location: unit.location.clone(),
            result_limit,
            recency_window: recency_window(posted_in_last_hours),
        }
    }
}

/// Provider recency token for a window of `hours`.
pub fn recency_window(hours: u32) -> String {
    format!("r{}", u64::from(hours) * 3600)
}

// --- Provider executions ---

/// Status of a provider execution, as seen by this system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

/// A provider execution. Owned by the provider; only ever read here.
#[derive(Debug, Clone)]
pub struct ExternalRun {
    pub id: String,
    pub status: ExecutionStatus,
    /// Raw start timestamp; may be missing or malformed.
    pub started_at: Option<String>,
    /// Input the execution was started with, when known.
    pub input: Option<Value>,
    pub dataset_id: String,
}

impl ExternalRun {
    /// Start time, if present and valid RFC 3339.
    pub fn started_at_utc(&self) -> Option<DateTime<Utc>> {
        self.started_at
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

// --- Postings ---

/// A job posting as returned by the provider.
///
/// Only the fields this system reasons about are typed; everything else the
/// provider sends is preserved in `extra` and round-trips on serialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "companyName", default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "jobUrl", default, skip_serializing_if = "Option::is_none")]
    pub job_url: Option<String>,
    #[serde(rename = "publishedAt", default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(rename = "postedTime", default, skip_serializing_if = "Option::is_none")]
    pub posted_time: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// --- Filtering & budget ---

/// Which list the filter-value source is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    JobTitles,
    Locations,
    ExcludedCompanies,
}

impl FilterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterKind::JobTitles => "job titles",
            FilterKind::Locations => "locations",
            FilterKind::ExcludedCompanies => "excluded companies",
        }
    }
}

/// Posting filters for one invocation.
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    /// Company-name substrings to reject; doubles as a keyword blocklist
    /// over title and description.
    pub excluded_companies: Vec<String>,
    /// When non-empty, a posting's location must contain one of these.
    pub allowed_locations: Vec<String>,
    pub posted_in_last_hours: u32,
}

/// Global result budget for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    pub total_jobs_to_fetch: usize,
    pub max_concurrent: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn execution_request_uses_actor_input_shape() {
        let req = ExecutionRequest::new(&SearchUnit::new("Accountant", "Namur"), 50, 24);
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"title": "Accountant", "location": "Namur", "rows": 50, "publishedAt": "r86400"})
        );
    }

    #[test]
    fn posting_keeps_unknown_provider_fields() {
        let raw = json!({
            "title": "FP&A Analyst",
            "companyName": "Solvay",
            "jobUrl": "https://www.linkedin.com/jobs/view/1?refId=x",
            "salary": "60k",
            "applicationsCount": 12
        });
        let posting: JobPosting = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(posting.company_name.as_deref(), Some("Solvay"));
        assert_eq!(posting.extra.get("salary"), Some(&json!("60k")));
        assert_eq!(serde_json::to_value(&posting).unwrap(), raw);
    }

    #[test]
    fn start_time_parses_only_valid_rfc3339() {
        let mut run = ExternalRun {
            id: "r1".to_string(),
            status: ExecutionStatus::Succeeded,
            started_at: Some("2024-06-01T10:00:00.000Z".to_string()),
            input: None,
            dataset_id: "ds1".to_string(),
        };
        assert!(run.started_at_utc().is_some());

        run.started_at = Some("yesterday".to_string());
        assert!(run.started_at_utc().is_none());
        run.started_at = None;
        assert!(run.started_at_utc().is_none());
    }
}

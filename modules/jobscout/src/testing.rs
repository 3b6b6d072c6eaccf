// Test mocks for the scheduling core.
//
// Three mocks matching the three trait boundaries:
// - MockProvider (JobProvider): (title, location)→postings, plus run history
// - MockFilterSource (FilterSource): FilterKind→values
// - MockSink (PostingSink): records everything emitted
//
// Plus helpers for building postings and run history entries.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

use jobscout_common::{ExecutionRequest, ExecutionStatus, ExternalRun, FilterKind, JobPosting};

use crate::traits::{CallOptions, EmitReport, FilterSource, JobProvider, PostingSink};

// ---------------------------------------------------------------------------
// MockProvider
// ---------------------------------------------------------------------------

/// In-memory job provider.
///
/// `call` yields to the scheduler once before completing, so unit tasks of a
/// batch interleave the way real network calls do. Unregistered searches
/// succeed with an empty result set.
pub struct MockProvider {
    searches: HashMap<(String, String), Vec<JobPosting>>,
    failing_searches: HashSet<(String, String)>,
    history: Vec<ExternalRun>,
    failing_details: HashSet<String>,
    listing_fails: bool,
    datasets: Mutex<HashMap<String, Vec<JobPosting>>>,
    calls: Mutex<Vec<ExecutionRequest>>,
    call_options: Mutex<Vec<CallOptions>>,
    detail_calls: Mutex<Vec<String>>,
    list_calls: AtomicUsize,
    next_run: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            searches: HashMap::new(),
            failing_searches: HashSet::new(),
            history: Vec::new(),
            failing_details: HashSet::new(),
            listing_fails: false,
            datasets: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            call_options: Mutex::new(Vec::new()),
            detail_calls: Mutex::new(Vec::new()),
            list_calls: AtomicUsize::new(0),
            next_run: AtomicUsize::new(0),
        }
    }

    /// Postings a new run for (title, location) produces.
    pub fn on_search(mut self, title: &str, location: &str, postings: Vec<JobPosting>) -> Self {
        self.searches
            .insert((title.to_string(), location.to_string()), postings);
        self
    }

    /// Runs for (title, location) terminate with `Failed`.
    pub fn fail_search(mut self, title: &str, location: &str) -> Self {
        self.failing_searches
            .insert((title.to_string(), location.to_string()));
        self
    }

    /// Append a past run to the history, which is kept newest first.
    pub fn with_history(mut self, run: ExternalRun) -> Self {
        self.history.push(run);
        self
    }

    /// Register the contents of an existing dataset.
    pub fn with_dataset(self, dataset_id: &str, postings: Vec<JobPosting>) -> Self {
        self.datasets
            .lock()
            .unwrap()
            .insert(dataset_id.to_string(), postings);
        self
    }

    pub fn fail_detail_for(mut self, run_id: &str) -> Self {
        self.failing_details.insert(run_id.to_string());
        self
    }

    pub fn fail_listing(mut self) -> Self {
        self.listing_fails = true;
        self
    }

    /// Requests passed to `call`, in call order.
    pub fn calls(&self) -> Vec<ExecutionRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_options(&self) -> Vec<CallOptions> {
        self.call_options.lock().unwrap().clone()
    }

    /// Run ids passed to `run_detail`, in call order.
    pub fn detail_calls(&self) -> Vec<String> {
        self.detail_calls.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobProvider for MockProvider {
    async fn call(
        &self,
        _actor_id: &str,
        input: &ExecutionRequest,
        options: &CallOptions,
    ) -> Result<ExternalRun> {
        self.calls.lock().unwrap().push(input.clone());
        self.call_options.lock().unwrap().push(*options);
        tokio::task::yield_now().await;

        let n = self.next_run.fetch_add(1, Ordering::SeqCst);
        let key = (input.title.clone(), input.location.clone());
        let dataset_id = format!("ds-run-{n}");

        let status = if self.failing_searches.contains(&key) {
            ExecutionStatus::Failed
        } else {
            let postings = self.searches.get(&key).cloned().unwrap_or_default();
            self.datasets
                .lock()
                .unwrap()
                .insert(dataset_id.clone(), postings);
            ExecutionStatus::Succeeded
        };

        Ok(ExternalRun {
            id: format!("run-{n}"),
            status,
            started_at: None,
            input: Some(input_for(input)),
            dataset_id,
        })
    }

    async fn recent_runs(
        &self,
        _actor_id: &str,
        limit: u32,
        status: ExecutionStatus,
    ) -> Result<Vec<ExternalRun>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.listing_fails {
            bail!("MockProvider: listing runs failed");
        }
        Ok(self
            .history
            .iter()
            .filter(|r| r.status == status)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn run_detail(&self, run_id: &str) -> Result<ExternalRun> {
        self.detail_calls.lock().unwrap().push(run_id.to_string());
        if self.failing_details.contains(run_id) {
            bail!("MockProvider: detail unavailable for {run_id}");
        }
        self.history
            .iter()
            .find(|r| r.id == run_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("MockProvider: no run registered for {run_id}"))
    }

    async fn dataset_items(&self, dataset_id: &str) -> Result<Vec<JobPosting>> {
        self.datasets
            .lock()
            .unwrap()
            .get(dataset_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("MockProvider: no dataset registered for {dataset_id}"))
    }
}

// ---------------------------------------------------------------------------
// MockFilterSource
// ---------------------------------------------------------------------------

/// Returns registered values per kind; `Err` for kinds marked failing and an
/// empty list for anything unregistered.
#[derive(Default)]
pub struct MockFilterSource {
    values: HashMap<FilterKind, Vec<String>>,
    failing: HashSet<FilterKind>,
}

impl MockFilterSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, kind: FilterKind, values: &[&str]) -> Self {
        self.values
            .insert(kind, values.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn failing(mut self, kind: FilterKind) -> Self {
        self.failing.insert(kind);
        self
    }
}

#[async_trait]
impl FilterSource for MockFilterSource {
    async fn filter_values(&self, kind: FilterKind) -> Result<Vec<String>> {
        if self.failing.contains(&kind) {
            bail!("MockFilterSource: {} unavailable", kind.as_str());
        }
        Ok(self.values.get(&kind).cloned().unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// MockSink
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockSink {
    emitted: Mutex<Vec<JobPosting>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emitted(&self) -> Vec<JobPosting> {
        self.emitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl PostingSink for MockSink {
    async fn emit(&self, postings: &[JobPosting]) -> EmitReport {
        self.emitted.lock().unwrap().extend_from_slice(postings);
        EmitReport {
            sent: postings.len(),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn posting(job_url: Option<&str>, title: &str, company: &str, location: &str) -> JobPosting {
    JobPosting {
        job_url: job_url.map(String::from),
        title: Some(title.to_string()),
        company_name: Some(company.to_string()),
        location: Some(location.to_string()),
        ..Default::default()
    }
}

/// One acceptable posting per slug, keyed by `https://jobs.example/<slug>`.
pub fn postings_with_urls(slugs: &[&str]) -> Vec<JobPosting> {
    slugs
        .iter()
        .map(|slug| {
            posting(
                Some(&format!("https://jobs.example/{slug}")),
                &format!("Job {slug}"),
                &format!("Company {slug}"),
                "Remote",
            )
        })
        .collect()
}

/// The input record a provider keeps for `request`.
pub fn input_for(request: &ExecutionRequest) -> Value {
    json!({
        "title": request.title,
        "location": request.location,
        "rows": request.result_limit,
        "publishedAt": request.recency_window,
    })
}

/// A succeeded history entry. An empty `started_at` means "missing".
pub fn succeeded_run(id: &str, started_at: &str, input: Option<Value>) -> ExternalRun {
    ExternalRun {
        id: id.to_string(),
        status: ExecutionStatus::Succeeded,
        started_at: (!started_at.is_empty()).then(|| started_at.to_string()),
        input,
        dataset_id: format!("ds-{id}"),
    }
}

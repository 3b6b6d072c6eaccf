//! Pure Apify REST API client.
//!
//! Covers the slice of the platform API a batch caller needs: start an actor
//! run and wait for it, list an actor's recent runs, read a run's detail and
//! recorded input, and fetch dataset items.

pub mod error;
pub mod types;

pub use error::{ApifyError, Result};
pub use types::{CallOptions, ListRunsOptions, PaginationList, RunData, RunStatus};

use serde::de::DeserializeOwned;
use serde::Serialize;
use types::ApiResponse;

const BASE_URL: &str = "https://api.apify.com/v2";

/// Long-poll window for run status requests, in seconds (API maximum is 60).
const WAIT_FOR_FINISH_SECS: u32 = 60;

pub struct ApifyClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl ApifyClient {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Point the client at a different API root (proxies, local fakes).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Start a run of `actor_id` with `input`. Returns immediately with run metadata.
    pub async fn start_run<I: Serialize + ?Sized>(
        &self,
        actor_id: &str,
        input: &I,
        options: &CallOptions,
    ) -> Result<RunData> {
        let url = format!("{}/acts/{}/runs", self.base_url, actor_path(actor_id));

        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(memory) = options.memory_mbytes {
            query.push(("memory", memory.to_string()));
        }
        if let Some(timeout) = options.timeout_secs {
            query.push(("timeout", timeout.to_string()));
        }

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .query(&query)
            .json(input)
            .send()
            .await?;

        let api_resp: ApiResponse<RunData> = read_json(resp).await?;
        Ok(api_resp.data)
    }

    /// Poll until a run reaches a terminal status. Uses `waitForFinish` for
    /// efficient long-polling. Non-success terminal statuses are returned as
    /// data; callers decide what a failed run means to them.
    pub async fn wait_for_run(&self, run_id: &str) -> Result<RunData> {
        loop {
            let url = format!(
                "{}/actor-runs/{}?waitForFinish={}",
                self.base_url, run_id, WAIT_FOR_FINISH_SECS
            );
            let resp = self
                .client
                .get(&url)
                .bearer_auth(&self.token)
                .send()
                .await?;

            let api_resp: ApiResponse<RunData> = read_json(resp).await?;
            if api_resp.data.status.is_terminal() {
                return Ok(api_resp.data);
            }
            tracing::debug!(run_id, status = %api_resp.data.status, "Run still in progress");
        }
    }

    /// Start a run and wait for it to finish. The actor's own `timeout` bounds
    /// how long this can take; no local timeout is applied.
    pub async fn call<I: Serialize + ?Sized>(
        &self,
        actor_id: &str,
        input: &I,
        options: &CallOptions,
    ) -> Result<RunData> {
        let run = self.start_run(actor_id, input, options).await?;
        tracing::info!(run_id = %run.id, actor_id, "Apify run started, polling for completion");

        let completed = self.wait_for_run(&run.id).await?;
        tracing::info!(
            run_id = %completed.id,
            status = %completed.status,
            dataset_id = %completed.default_dataset_id,
            "Run reached terminal status"
        );
        Ok(completed)
    }

    /// List runs of an actor, newest first when `options.desc` is set.
    pub async fn list_runs(
        &self,
        actor_id: &str,
        options: &ListRunsOptions,
    ) -> Result<Vec<RunData>> {
        let url = format!("{}/acts/{}/runs", self.base_url, actor_path(actor_id));

        let mut query: Vec<(&str, String)> = vec![
            ("limit", options.limit.to_string()),
            ("desc", if options.desc { "1" } else { "0" }.to_string()),
        ];
        if let Some(status) = options.status {
            query.push(("status", status.as_str().to_string()));
        }

        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&query)
            .send()
            .await?;

        let api_resp: ApiResponse<PaginationList<RunData>> = read_json(resp).await?;
        Ok(api_resp.data.items)
    }

    /// Fetch the current state of a single run.
    pub async fn get_run(&self, run_id: &str) -> Result<RunData> {
        let url = format!("{}/actor-runs/{}", self.base_url, run_id);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let api_resp: ApiResponse<RunData> = read_json(resp).await?;
        Ok(api_resp.data)
    }

    /// Read a JSON record from a key-value store. A missing record is `None`.
    pub async fn get_record(
        &self,
        store_id: &str,
        key: &str,
    ) -> Result<Option<serde_json::Value>> {
        let url = format!(
            "{}/key-value-stores/{}/records/{}",
            self.base_url, store_id, key
        );
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        match read_json::<serde_json::Value>(resp).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// The input a run was started with, read from its default key-value store.
    pub async fn get_run_input(&self, run: &RunData) -> Result<Option<serde_json::Value>> {
        match run.default_key_value_store_id.as_deref() {
            Some(store_id) => self.get_record(store_id, "INPUT").await,
            None => Ok(None),
        }
    }

    /// Fetch dataset items from a completed run.
    pub async fn get_dataset_items<T: DeserializeOwned>(&self, dataset_id: &str) -> Result<Vec<T>> {
        let url = format!(
            "{}/datasets/{}/items?format=json&clean=1",
            self.base_url, dataset_id
        );
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let items: Vec<T> = read_json(resp).await?;
        tracing::debug!(dataset_id, count = items.len(), "Fetched dataset items");
        Ok(items)
    }
}

/// Actor ids of the form `username/actor-name` use `~` in URL paths.
fn actor_path(actor_id: &str) -> String {
    actor_id.replace('/', "~")
}

async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ApifyError::Api {
            status: status.as_u16(),
            message: body,
        });
    }
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

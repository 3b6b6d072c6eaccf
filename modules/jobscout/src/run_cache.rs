use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use jobscout_common::{ExecutionRequest, ExecutionStatus, ExternalRun, ScoutError};

use crate::traits::JobProvider;

/// How far back a completed execution may be reused.
pub const LOOKBACK_HOURS: i64 = 24;

/// How many recent succeeded executions are inspected per lookup.
pub const RECENT_RUN_WINDOW: u32 = 10;

/// Finds a recent succeeded execution whose input matches a request, so the
/// provider does not have to be called again.
pub struct RunReuseCache {
    provider: Arc<dyn JobProvider>,
    actor_id: String,
    lookback: Duration,
    window: u32,
}

impl RunReuseCache {
    pub fn new(provider: Arc<dyn JobProvider>, actor_id: impl Into<String>) -> Self {
        Self {
            provider,
            actor_id: actor_id.into(),
            lookback: Duration::hours(LOOKBACK_HOURS),
            window: RECENT_RUN_WINDOW,
        }
    }

    /// Newest equivalent execution started within the lookback window.
    ///
    /// Walks recent succeeded runs newest first and stops at the first one
    /// older than the window. Runs with a missing or unparseable start time
    /// are skipped, as are runs whose detail cannot be fetched. Failure to
    /// list runs is returned as [`ScoutError::ProviderList`].
    pub async fn find(
        &self,
        request: &ExecutionRequest,
        now: DateTime<Utc>,
    ) -> Result<Option<ExternalRun>, ScoutError> {
        let cutoff = now - self.lookback;

        let runs = self
            .provider
            .recent_runs(&self.actor_id, self.window, ExecutionStatus::Succeeded)
            .await
            .map_err(|e| ScoutError::ProviderList {
                actor_id: self.actor_id.clone(),
                message: format!("{e:#}"),
            })?;

        for run in runs {
            if run.status != ExecutionStatus::Succeeded {
                continue;
            }
            let Some(started_at) = run.started_at_utc() else {
                warn!(
                    run_id = run.id.as_str(),
                    started_at = run.started_at.as_deref().unwrap_or("<missing>"),
                    "Run has no valid start time, skipping"
                );
                continue;
            };

            if started_at < cutoff {
                debug!(
                    run_id = run.id.as_str(),
                    %started_at,
                    "Reached runs older than the lookback window"
                );
                break;
            }

            let detail = match self.provider.run_detail(&run.id).await {
                Ok(detail) => detail,
                Err(e) => {
                    warn!(run_id = run.id.as_str(), error = %e, "Failed to fetch run detail, skipping");
                    continue;
                }
            };

            let Some(input) = detail.input.as_ref() else {
                warn!(run_id = run.id.as_str(), "Run has no recorded input, skipping");
                continue;
            };

            if is_equivalent(request, input) {
                info!(
                    run_id = detail.id.as_str(),
                    title = request.title.as_str(),
                    location = request.location.as_str(),
                    "Reusing recent run"
                );
                return Ok(Some(detail));
            }
        }

        debug!(
            title = request.title.as_str(),
            location = request.location.as_str(),
            "No reusable run found"
        );
        Ok(None)
    }
}

/// Exact equality on title, location and requested row count.
pub fn is_equivalent(request: &ExecutionRequest, recorded: &Value) -> bool {
    recorded.get("title").and_then(Value::as_str) == Some(request.title.as_str())
        && recorded.get("location").and_then(Value::as_str) == Some(request.location.as_str())
        && recorded.get("rows").and_then(Value::as_u64) == Some(u64::from(request.result_limit))
}

use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use jobscout_common::{Budget, Config, FilterSpec, JobPosting, ScoutError, SearchUnit};

use crate::filter::PostingFilter;
use crate::run_cache::RunReuseCache;
use crate::runner::{ExternalJobRunner, RunnerConfig};
use crate::scheduler::{BatchScheduler, SchedulerConfig};
use crate::search_space::require_search_space;
use crate::sources::resolve_lists;
use crate::stats::ScoutStats;
use crate::traits::{FilterSource, JobProvider, PostingSink};

/// Slack added on top of the per-batch timeout when estimating run time.
const EXPECTED_TIME_SLACK_SECS: u64 = 120;

/// Result of one invocation.
#[derive(Debug)]
pub struct ScoutRun {
    pub run_id: Uuid,
    pub postings: Vec<JobPosting>,
    pub stats: ScoutStats,
}

/// Search space and lists an invocation would use.
#[derive(Debug)]
pub struct ScoutPlan {
    pub units: Vec<SearchUnit>,
    pub batches: usize,
    pub excluded_companies: Vec<String>,
    /// Rough upper bound on wall-clock time, in seconds.
    pub expected_secs: u64,
}

/// One end-to-end invocation: resolve lists, schedule searches, emit.
pub struct JobScout {
    config: Config,
    provider: Arc<dyn JobProvider>,
    source: Arc<dyn FilterSource>,
    sink: Arc<dyn PostingSink>,
    batch_pause: Duration,
    stagger_ms: Range<u64>,
}

impl JobScout {
    pub fn new(
        config: Config,
        provider: Arc<dyn JobProvider>,
        source: Arc<dyn FilterSource>,
        sink: Arc<dyn PostingSink>,
    ) -> Self {
        Self {
            config,
            provider,
            source,
            sink,
            batch_pause: Duration::from_millis(1500),
            stagger_ms: 100..500,
        }
    }

    /// Override the pauses between batches and before new provider runs.
    pub fn with_pacing(mut self, batch_pause: Duration, stagger_ms: Range<u64>) -> Self {
        self.batch_pause = batch_pause;
        self.stagger_ms = stagger_ms;
        self
    }

    pub async fn run(&self) -> Result<ScoutRun, ScoutError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("scout_run", run_id = %run_id);
        self.run_inner(run_id).instrument(span).await
    }

    /// Resolve lists and the search space without contacting the provider.
    pub async fn plan(&self) -> Result<ScoutPlan, ScoutError> {
        let config = &self.config;
        let lists = resolve_lists(config, self.source.as_ref()).await;
        let units = require_search_space(&lists.job_titles, &lists.locations)?;
        let batches = units.len().div_ceil(config.max_concurrent.max(1));
        let expected_secs = batches as u64 * config.timeout_secs + EXPECTED_TIME_SLACK_SECS;

        info!(
            titles = lists.job_titles.len(),
            locations = lists.locations.len(),
            excluded_companies = lists.excluded_companies.len(),
            units = units.len(),
            batches,
            expected_secs,
            "Search space ready"
        );
        Ok(ScoutPlan {
            units,
            batches,
            excluded_companies: lists.excluded_companies,
            expected_secs,
        })
    }

    async fn run_inner(&self, run_id: Uuid) -> Result<ScoutRun, ScoutError> {
        info!(actor_id = self.config.actor_id.as_str(), "Job scout run starting");

        let plan = self.plan().await?;
        let scheduler = self.build_scheduler(plan.excluded_companies);
        let report = scheduler.run(&plan.units, Utc::now()).await?;
        let mut stats = report.stats;

        if report.postings.is_empty() {
            info!("No postings admitted, nothing to emit");
        } else {
            let emitted = self.sink.emit(&report.postings).await;
            stats.record_emit(emitted);
        }

        info!("{stats}");
        Ok(ScoutRun {
            run_id,
            postings: report.postings,
            stats,
        })
    }

    fn build_scheduler(&self, excluded_companies: Vec<String>) -> BatchScheduler {
        let config = &self.config;
        let filter = PostingFilter::new(&FilterSpec {
            excluded_companies,
            allowed_locations: config.allowed_locations.clone(),
            posted_in_last_hours: config.posted_in_last_hours,
        });
        let runner = ExternalJobRunner::new(
            self.provider.clone(),
            RunnerConfig::builder()
                .actor_id(config.actor_id.as_str())
                .memory_mbytes(config.memory_mbytes)
                .timeout_secs(config.timeout_secs)
                .stagger_ms(self.stagger_ms.clone())
                .build(),
        );
        let scheduler_config = SchedulerConfig::builder()
            .budget(Budget {
                total_jobs_to_fetch: config.total_jobs_to_fetch,
                max_concurrent: config.max_concurrent,
            })
            .result_limit(config.rows_per_search)
            .posted_in_last_hours(config.posted_in_last_hours)
            .batch_pause(self.batch_pause)
            .build();

        BatchScheduler::new(
            RunReuseCache::new(self.provider.clone(), config.actor_id.as_str()),
            runner,
            filter,
            scheduler_config,
        )
    }
}

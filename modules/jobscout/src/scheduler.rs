//! Fan-out/fan-in over search units.
//!
//! Units are split into contiguous batches of `max_concurrent`. Batches run
//! one after another; the units of a batch run as concurrent tasks polled by
//! a single `join_all`, so they interleave only at await points. Each task
//! consults the run-reuse cache, runs (or reuses) a provider execution, then
//! filters and deduplicates the postings against the shared budget.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{info, warn};
use typed_builder::TypedBuilder;

use jobscout_common::{Budget, ExecutionRequest, JobPosting, ScoutError, SearchUnit};

use crate::aggregator::ResultAggregator;
use crate::budget::FetchBudget;
use crate::dedup::Deduplicator;
use crate::filter::PostingFilter;
use crate::run_cache::RunReuseCache;
use crate::runner::{ExternalJobRunner, RunSource};
use crate::stats::ScoutStats;

#[derive(Debug, Clone, TypedBuilder)]
pub struct SchedulerConfig {
    /// Batch size and admission limit. `max_concurrent` below 1 is treated
    /// as 1; `total_jobs_to_fetch` of 0 starts no batch.
    pub budget: Budget,
    /// Rows requested from the provider per unit.
    pub result_limit: u32,
    #[builder(default = 24)]
    pub posted_in_last_hours: u32,
    /// Pause between consecutive batches.
    #[builder(default = Duration::from_millis(1500))]
    pub batch_pause: Duration,
}

/// Aggregated postings plus the counters gathered while producing them.
#[derive(Debug)]
pub struct ScheduleReport {
    pub postings: Vec<JobPosting>,
    pub stats: ScoutStats,
}

/// What one unit task contributed.
#[derive(Debug, Default)]
struct UnitOutcome {
    /// `None` when the task was skipped for budget.
    source: Option<RunSource>,
    fetched: usize,
    filtered: usize,
    duplicates: usize,
    admitted: Vec<JobPosting>,
}

/// Shared mutable state of one invocation. Lives only as long as `run`.
struct Invocation {
    budget: FetchBudget,
    dedup: Deduplicator,
    now: DateTime<Utc>,
}

pub struct BatchScheduler {
    cache: RunReuseCache,
    runner: ExternalJobRunner,
    filter: PostingFilter,
    config: SchedulerConfig,
}

impl BatchScheduler {
    pub fn new(
        cache: RunReuseCache,
        runner: ExternalJobRunner,
        filter: PostingFilter,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            cache,
            runner,
            filter,
            config,
        }
    }

    fn batch_size(&self) -> usize {
        self.config.budget.max_concurrent.max(1)
    }

    /// Process every unit, honoring the budget.
    ///
    /// A batch is never started once the budget is spent. A started batch
    /// always runs to completion, so the aggregate may exceed the budget by
    /// up to `max_concurrent - 1`. A failure to list recent provider runs
    /// inside a batch is returned after that batch has joined.
    pub async fn run(
        &self,
        units: &[SearchUnit],
        now: DateTime<Utc>,
    ) -> Result<ScheduleReport, ScoutError> {
        let state = Invocation {
            budget: FetchBudget::new(self.config.budget.total_jobs_to_fetch),
            dedup: Deduplicator::new(),
            now,
        };
        let mut stats = ScoutStats {
            search_units: units.len(),
            ..Default::default()
        };
        let mut aggregate = ResultAggregator::new();

        let batches: Vec<&[SearchUnit]> = units.chunks(self.batch_size()).collect();
        let total_batches = batches.len();

        for (index, batch) in batches.into_iter().enumerate() {
            if state.budget.is_exhausted() {
                stats.batches_skipped = total_batches - index;
                info!(
                    admitted = state.budget.admitted(),
                    limit = state.budget.limit(),
                    skipped_batches = stats.batches_skipped,
                    "Budget reached, not starting remaining batches"
                );
                break;
            }

            if index > 0 && !self.config.batch_pause.is_zero() {
                tokio::time::sleep(self.config.batch_pause).await;
            }

            info!(
                batch = index + 1,
                of = total_batches,
                units = batch.len(),
                "Starting batch"
            );

            let results = join_all(batch.iter().map(|unit| self.run_unit(unit, &state))).await;
            stats.batches_run += 1;

            let mut per_unit = Vec::with_capacity(results.len());
            let mut first_error = None;
            for result in results {
                match result {
                    Ok(outcome) => per_unit.push(fold(&mut stats, outcome)),
                    Err(e) => {
                        first_error.get_or_insert(e);
                    }
                }
            }
            if let Some(e) = first_error {
                return Err(e);
            }
            aggregate.append_batch(per_unit);

            state.budget.log_status();
        }

        stats.postings_admitted = aggregate.len();
        Ok(ScheduleReport {
            postings: aggregate.into_postings(),
            stats,
        })
    }

    async fn run_unit(
        &self,
        unit: &SearchUnit,
        state: &Invocation,
    ) -> Result<UnitOutcome, ScoutError> {
        if state.budget.is_exhausted() {
            info!(unit = %unit, "Budget reached, skipping unit");
            return Ok(UnitOutcome::default());
        }

        let request = ExecutionRequest::new(
            unit,
            self.config.result_limit,
            self.config.posted_in_last_hours,
        );
        let reused = self.cache.find(&request, state.now).await?;
        let run = self.runner.run(&request, reused).await;

        let mut outcome = UnitOutcome {
            source: Some(run.source),
            fetched: run.postings.len(),
            ..Default::default()
        };

        for posting in run.postings {
            if !self.filter.accepts(&posting, state.now) {
                outcome.filtered += 1;
                continue;
            }
            if !state.dedup.admit(&posting) {
                outcome.duplicates += 1;
                continue;
            }
            outcome.admitted.push(posting);
            state.budget.record_admission();
            if state.budget.is_exhausted() {
                break;
            }
        }

        if outcome.fetched > 0 && outcome.admitted.is_empty() {
            warn!(
                unit = %unit,
                fetched = outcome.fetched,
                filtered = outcome.filtered,
                duplicates = outcome.duplicates,
                "No postings admitted for unit"
            );
        }
        Ok(outcome)
    }
}

fn fold(stats: &mut ScoutStats, outcome: UnitOutcome) -> Vec<JobPosting> {
    match outcome.source {
        None => stats.units_skipped += 1,
        Some(RunSource::Started { .. }) => stats.runs_started += 1,
        Some(RunSource::Reused { .. }) => stats.runs_reused += 1,
        Some(RunSource::Failed) => stats.runs_failed += 1,
    }
    stats.postings_fetched += outcome.fetched;
    stats.postings_filtered += outcome.filtered;
    stats.postings_duplicate += outcome.duplicates;
    outcome.admitted
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use chrono::TimeZone;
    use jobscout_common::FilterSpec;

    use super::*;
    use crate::dedup::posting_key;
    use crate::runner::RunnerConfig;
    use crate::testing::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn units(titles: &[&str], locations: &[&str]) -> Vec<SearchUnit> {
        titles
            .iter()
            .flat_map(|t| locations.iter().map(move |l| SearchUnit::new(*t, *l)))
            .collect()
    }

    fn scheduler(
        provider: Arc<MockProvider>,
        filter: FilterSpec,
        max_concurrent: usize,
        budget: usize,
    ) -> BatchScheduler {
        BatchScheduler::new(
            RunReuseCache::new(provider.clone(), "actor"),
            ExternalJobRunner::new(
                provider,
                RunnerConfig::builder()
                    .actor_id("actor")
                    .stagger_ms(0..0)
                    .build(),
            ),
            PostingFilter::new(&filter),
            SchedulerConfig::builder()
                .budget(Budget {
                    total_jobs_to_fetch: budget,
                    max_concurrent,
                })
                .result_limit(10)
                .batch_pause(Duration::ZERO)
                .build(),
        )
    }

    fn no_filters() -> FilterSpec {
        FilterSpec {
            posted_in_last_hours: 24,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn single_task_stops_at_budget() {
        let provider = Arc::new(MockProvider::new().on_search(
            "Engineer",
            "Remote",
            postings_with_urls(&["a", "b", "c"]),
        ));
        let report = scheduler(provider, no_filters(), 1, 2)
            .run(&units(&["Engineer"], &["Remote"]), now())
            .await
            .unwrap();

        assert_eq!(report.postings.len(), 2);
        assert_eq!(report.stats.postings_fetched, 3);
        assert_eq!(report.stats.postings_admitted, 2);
    }

    #[tokio::test]
    async fn concurrent_tasks_overshoot_by_at_most_concurrency_minus_one() {
        let provider = Arc::new(
            MockProvider::new()
                .on_search("A", "Remote", postings_with_urls(&["a1", "a2"]))
                .on_search("B", "Remote", postings_with_urls(&["b1", "b2"]))
                .on_search("C", "Remote", postings_with_urls(&["c1", "c2"])),
        );
        let report = scheduler(provider.clone(), no_filters(), 3, 2)
            .run(&units(&["A", "B", "C"], &["Remote"]), now())
            .await
            .unwrap();

        // All three tasks passed the start check before any admitted; each
        // stops after its first admission past the budget.
        assert_eq!(provider.calls().len(), 3);
        assert_eq!(report.postings.len(), 4);
        assert!(report.postings.len() <= 2 + 3 - 1);
    }

    #[tokio::test]
    async fn no_batch_starts_after_budget_is_spent() {
        let provider = Arc::new(
            MockProvider::new()
                .on_search("A", "X", postings_with_urls(&["a1", "a2"]))
                .on_search("A", "Y", postings_with_urls(&["b1", "b2"]))
                .on_search("B", "X", postings_with_urls(&["c1", "c2"]))
                .on_search("B", "Y", postings_with_urls(&["d1", "d2"])),
        );
        let report = scheduler(provider.clone(), no_filters(), 2, 2)
            .run(&units(&["A", "B"], &["X", "Y"]), now())
            .await
            .unwrap();

        assert_eq!(provider.calls().len(), 2);
        assert_eq!(report.stats.batches_run, 1);
        assert_eq!(report.stats.batches_skipped, 1);
        assert!(report.postings.len() <= 2 + 2 - 1);
    }

    #[tokio::test]
    async fn aggregate_has_unique_keys_in_unit_order() {
        let shared = postings_with_urls(&["shared"]);
        let mut first = postings_with_urls(&["x1"]);
        first.extend(shared.clone());
        let mut second = shared;
        second.extend(postings_with_urls(&["y1"]));

        let provider = Arc::new(
            MockProvider::new()
                .on_search("Analyst", "Ghent", first)
                .on_search("Analyst", "Liège", second),
        );
        let report = scheduler(provider, no_filters(), 2, 10)
            .run(&units(&["Analyst"], &["Ghent", "Liège"]), now())
            .await
            .unwrap();

        let keys: Vec<String> = report.postings.iter().map(posting_key).collect();
        let unique: HashSet<&String> = keys.iter().collect();
        assert_eq!(keys.len(), unique.len());
        assert_eq!(
            keys,
            vec![
                "https://jobs.example/x1",
                "https://jobs.example/shared",
                "https://jobs.example/y1",
            ]
        );
        assert_eq!(report.stats.postings_duplicate, 1);
    }

    #[tokio::test]
    async fn zero_budget_makes_no_provider_call() {
        let provider = Arc::new(MockProvider::new().on_search(
            "Engineer",
            "Remote",
            postings_with_urls(&["a"]),
        ));
        let report = scheduler(provider.clone(), no_filters(), 2, 0)
            .run(&units(&["Engineer"], &["Remote", "Ghent"]), now())
            .await
            .unwrap();

        assert!(provider.calls().is_empty());
        assert_eq!(provider.list_calls(), 0);
        assert!(report.postings.is_empty());
        assert_eq!(report.stats.batches_run, 0);
        assert_eq!(report.stats.batches_skipped, 1);
    }

    #[tokio::test]
    async fn filtered_postings_do_not_use_budget() {
        let mut postings = vec![posting(
            Some("https://jobs.example/big4"),
            "Auditor",
            "Deloitte Belgium",
            "Brussels",
        )];
        postings.extend(postings_with_urls(&["ok"]));
        let provider = Arc::new(MockProvider::new().on_search("Auditor", "Brussels", postings));
        let filters = FilterSpec {
            excluded_companies: vec!["Deloitte".to_string()],
            ..no_filters()
        };

        let report = scheduler(provider, filters, 1, 1)
            .run(&units(&["Auditor"], &["Brussels"]), now())
            .await
            .unwrap();

        assert_eq!(report.postings.len(), 1);
        assert_eq!(
            report.postings[0].job_url.as_deref(),
            Some("https://jobs.example/ok")
        );
        assert_eq!(report.stats.postings_filtered, 1);
    }

    #[tokio::test]
    async fn failed_run_contributes_nothing() {
        let provider = Arc::new(
            MockProvider::new()
                .fail_search("Engineer", "Remote")
                .on_search("Engineer", "Ghent", postings_with_urls(&["g1"])),
        );
        let report = scheduler(provider, no_filters(), 2, 10)
            .run(&units(&["Engineer"], &["Remote", "Ghent"]), now())
            .await
            .unwrap();

        assert_eq!(report.postings.len(), 1);
        assert_eq!(report.stats.runs_failed, 1);
        assert_eq!(report.stats.runs_started, 1);
    }

    #[tokio::test]
    async fn reused_run_replaces_provider_call() {
        let request = ExecutionRequest::new(&SearchUnit::new("Engineer", "Remote"), 10, 24);
        let started = (now() - chrono::Duration::hours(2)).to_rfc3339();
        let provider = Arc::new(
            MockProvider::new()
                .with_history(succeeded_run("earlier", &started, Some(input_for(&request))))
                .with_dataset("ds-earlier", postings_with_urls(&["r1", "r2"])),
        );
        let report = scheduler(provider.clone(), no_filters(), 1, 10)
            .run(&units(&["Engineer"], &["Remote"]), now())
            .await
            .unwrap();

        assert!(provider.calls().is_empty());
        assert_eq!(provider.list_calls(), 1);
        assert_eq!(report.stats.runs_reused, 1);
        assert_eq!(report.postings.len(), 2);
    }

    #[tokio::test]
    async fn listing_failure_aborts_the_invocation() {
        let provider = Arc::new(MockProvider::new().fail_listing());
        let err = scheduler(provider, no_filters(), 2, 10)
            .run(&units(&["Engineer"], &["Remote", "Ghent"]), now())
            .await
            .unwrap_err();

        assert!(matches!(err, ScoutError::ProviderList { .. }));
    }
}

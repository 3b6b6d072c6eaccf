//! Integration test: run input → JobScout::run → sink, against in-memory mocks.
//!
//! Each test wires a MockProvider, MockFilterSource and MockSink into a full
//! invocation with pacing disabled, then checks what reached the sink.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use jobscout::dedup::posting_key;
use jobscout::scout::JobScout;
use jobscout::testing::{posting, postings_with_urls, MockFilterSource, MockProvider, MockSink};
use jobscout_common::{Config, FilterKind, RunInput, ScoutError};

fn config(titles: &[&str], locations: &[&str], total: u64, concurrency: u64) -> Config {
    let input = RunInput {
        job_titles: Some(titles.iter().map(|s| s.to_string()).collect()),
        locations: Some(locations.iter().map(|s| s.to_string()).collect()),
        total_jobs_to_fetch: Some(total),
        max_concurrent_scrapers: Some(concurrency),
        ..Default::default()
    };
    Config::resolve(input, |_: &str| None)
}

fn scout(
    config: Config,
    provider: Arc<MockProvider>,
    source: MockFilterSource,
    sink: Arc<MockSink>,
) -> JobScout {
    JobScout::new(config, provider, Arc::new(source), sink).with_pacing(Duration::ZERO, 0..0)
}

#[tokio::test]
async fn single_unit_respects_budget() {
    let provider = Arc::new(MockProvider::new().on_search(
        "Engineer",
        "Remote",
        postings_with_urls(&["1", "2", "3"]),
    ));
    let sink = Arc::new(MockSink::new());

    let run = scout(
        config(&["Engineer"], &["Remote"], 2, 1),
        provider.clone(),
        MockFilterSource::new(),
        sink.clone(),
    )
    .run()
    .await
    .unwrap();

    assert_eq!(run.postings.len(), 2);
    assert_eq!(sink.emitted().len(), 2);
    assert_eq!(run.stats.rows_emitted, 2);
    assert_eq!(provider.calls().len(), 1);
    assert_eq!(provider.calls()[0].result_limit, 2);
}

#[tokio::test]
async fn equivalent_units_yield_the_union() {
    // Same pair searched twice; each call returns the same result set, which
    // itself repeats one posting under a tracking query string.
    let mut results = postings_with_urls(&["a", "b", "c"]);
    let mut tracked = results[1].clone();
    tracked.job_url = Some("https://jobs.example/b?trk=feed".to_string());
    results.push(tracked);
    let provider = Arc::new(MockProvider::new().on_search("Engineer", "Remote", results));
    let sink = Arc::new(MockSink::new());

    let run = scout(
        config(&["Engineer", "Engineer"], &["Remote"], 50, 2),
        provider.clone(),
        MockFilterSource::new(),
        sink,
    )
    .run()
    .await
    .unwrap();

    assert_eq!(provider.calls().len(), 2);
    let keys: Vec<String> = run.postings.iter().map(posting_key).collect();
    let unique: HashSet<&String> = keys.iter().collect();
    assert_eq!(keys.len(), unique.len());
    assert_eq!(
        keys,
        vec![
            "https://jobs.example/a",
            "https://jobs.example/b",
            "https://jobs.example/c",
        ]
    );
    assert_eq!(run.stats.postings_duplicate, 5);
}

#[tokio::test]
async fn failed_provider_run_still_completes() {
    let provider = Arc::new(
        MockProvider::new()
            .on_search("Engineer", "Remote", postings_with_urls(&["x"]))
            .fail_search("Engineer", "Remote"),
    );
    let sink = Arc::new(MockSink::new());

    let run = scout(
        config(&["Engineer"], &["Remote"], 10, 1),
        provider,
        MockFilterSource::new(),
        sink.clone(),
    )
    .run()
    .await
    .unwrap();

    assert!(run.postings.is_empty());
    assert_eq!(run.stats.runs_failed, 1);
    assert!(sink.emitted().is_empty());
}

#[tokio::test]
async fn excluded_companies_come_from_the_filter_source() {
    let provider = Arc::new(MockProvider::new().on_search(
        "Analyst",
        "Namur",
        vec![
            posting(Some("https://jobs.example/1"), "Analyst", "Acme Consulting", "Namur"),
            posting(Some("https://jobs.example/2"), "Analyst", "Solvay", "Namur"),
        ],
    ));
    let sink = Arc::new(MockSink::new());
    let source = MockFilterSource::new().on(FilterKind::ExcludedCompanies, &["Acme"]);

    let run = scout(
        config(&["Analyst"], &["Namur"], 10, 1),
        provider,
        source,
        sink.clone(),
    )
    .run()
    .await
    .unwrap();

    let emitted = sink.emitted();
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].company_name.as_deref(), Some("Solvay"));
    assert_eq!(run.stats.postings_filtered, 1);
}

#[tokio::test]
async fn plan_reports_batches_and_expected_time() {
    let provider = Arc::new(MockProvider::new());
    let sink = Arc::new(MockSink::new());

    let plan = scout(
        config(&["A", "B", "C"], &["X", "Y"], 10, 4),
        provider.clone(),
        MockFilterSource::new(),
        sink,
    )
    .plan()
    .await
    .unwrap();

    assert_eq!(plan.units.len(), 6);
    assert_eq!(plan.batches, 2);
    assert_eq!(plan.expected_secs, 2 * 600 + 120);
    assert!(provider.calls().is_empty());
}

#[test]
fn empty_search_space_error_names_both_lists() {
    let err = jobscout::search_space::require_search_space(&["Engineer".to_string()], &[])
        .unwrap_err();
    assert!(matches!(
        err,
        ScoutError::EmptySearchSpace {
            titles: 1,
            locations: 0
        }
    ));
}

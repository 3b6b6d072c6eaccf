use serde::Deserialize;

const DEFAULT_ACTOR_ID: &str = "bebity/linkedin-jobs-scraper";
const DEFAULT_DATAGOL_BASE_URL: &str = "https://be-eu.datagol.ai/noCo/api/v2";
const DEFAULT_TOTAL_JOBS: usize = 50;
const DEFAULT_MAX_CONCURRENT: usize = 24;
const DEFAULT_TIMEOUT_SECS: u64 = 600;
const MAX_TIMEOUT_SECS: u64 = 3600;
const DEFAULT_MEMORY_MBYTES: u32 = 256;
const DEFAULT_POSTED_IN_LAST_HOURS: u32 = 24;

/// Per-invocation input, usually read from a JSON file. Every field is
/// optional; absent fields fall back to the environment, then to defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunInput {
    pub scraper_id: Option<String>,
    pub job_titles: Option<Vec<String>>,
    pub locations: Option<Vec<String>>,
    pub allowed_locations: Option<Vec<String>>,
    pub total_jobs_to_fetch: Option<u64>,
    pub max_concurrent_scrapers: Option<u64>,
    pub scraper_timeout_secs: Option<u64>,
    pub scraper_memory: Option<u64>,
    pub rows: Option<u64>,
    pub posted_in_last_hours: Option<u64>,
    pub datagol_api_base_url: Option<String>,
    pub job_titles_table_id: Option<String>,
    pub excluded_companies_table_id: Option<String>,
    pub locations_table_id: Option<String>,
    pub job_postings_table_id: Option<String>,
}

/// DataGOL table ids for the filter lists and the postings sink.
#[derive(Debug, Clone)]
pub struct DatagolTables {
    pub job_titles: String,
    pub excluded_companies: String,
    pub locations: String,
    pub job_postings: String,
}

/// Resolved configuration for one invocation.
#[derive(Debug, Clone)]
pub struct Config {
    // Provider
    pub apify_token: String,
    pub actor_id: String,
    pub timeout_secs: u64,
    pub memory_mbytes: u32,

    // Budget
    pub total_jobs_to_fetch: usize,
    pub max_concurrent: usize,
    pub rows_per_search: u32,

    // Search space & filters (empty lists mean "ask the filter source")
    pub job_titles: Vec<String>,
    pub locations: Vec<String>,
    pub allowed_locations: Vec<String>,
    pub posted_in_last_hours: u32,

    // DataGOL
    pub datagol_base_url: String,
    pub datagol_workspace_id: Option<String>,
    pub datagol_token: Option<String>,
    pub tables: DatagolTables,
}

impl Config {
    /// Resolve configuration from run input and process environment.
    pub fn from_env(input: RunInput) -> Self {
        Self::resolve(input, |key| std::env::var(key).ok())
    }

    /// Resolve configuration: input wins over `env`, which wins over defaults.
    /// Zero or unparseable numbers fall back to the default.
    pub fn resolve(input: RunInput, env: impl Fn(&str) -> Option<String>) -> Self {
        let number = |from_input: Option<u64>, key: &str, default: u64| -> u64 {
            from_input
                .filter(|n| *n > 0)
                .or_else(|| env(key).and_then(|v| v.trim().parse::<u64>().ok()))
                .filter(|n| *n > 0)
                .unwrap_or(default)
        };
        let text = |from_input: Option<String>, key: &str, default: &str| -> String {
            from_input
                .filter(|s| !s.trim().is_empty())
                .or_else(|| env(key).filter(|s| !s.trim().is_empty()))
                .unwrap_or_else(|| default.to_string())
        };

        let total_jobs_to_fetch = to_usize(
            number(
                input.total_jobs_to_fetch,
                "TOTAL_JOBS_TO_FETCH",
                DEFAULT_TOTAL_JOBS as u64,
            ),
            DEFAULT_TOTAL_JOBS,
        );
        let rows_per_search = to_u32(
            number(input.rows, "ROWS", total_jobs_to_fetch as u64),
            u32::try_from(total_jobs_to_fetch).unwrap_or(u32::MAX),
        );

        Self {
            apify_token: env("APIFY_TOKEN").unwrap_or_default(),
            actor_id: text(input.scraper_id, "SCRAPER_ACTOR_ID", DEFAULT_ACTOR_ID),
            timeout_secs: number(
                input.scraper_timeout_secs,
                "SCRAPER_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )
            .min(MAX_TIMEOUT_SECS),
            memory_mbytes: to_u32(
                number(
                    input.scraper_memory,
                    "SCRAPER_MEMORY",
                    u64::from(DEFAULT_MEMORY_MBYTES),
                ),
                DEFAULT_MEMORY_MBYTES,
            ),
            total_jobs_to_fetch,
            max_concurrent: to_usize(
                number(
                    input.max_concurrent_scrapers,
                    "MAX_CONCURRENT_SCRAPERS",
                    DEFAULT_MAX_CONCURRENT as u64,
                ),
                DEFAULT_MAX_CONCURRENT,
            ),
            rows_per_search,
            job_titles: clean_list(input.job_titles),
            locations: clean_list(input.locations),
            allowed_locations: clean_list(input.allowed_locations),
            posted_in_last_hours: to_u32(
                number(
                    input.posted_in_last_hours,
                    "POSTED_IN_LAST_HOURS",
                    u64::from(DEFAULT_POSTED_IN_LAST_HOURS),
                ),
                DEFAULT_POSTED_IN_LAST_HOURS,
            ),
            datagol_base_url: text(
                input.datagol_api_base_url,
                "DATAGOL_API_BASE_URL",
                DEFAULT_DATAGOL_BASE_URL,
            ),
            datagol_workspace_id: env("DATAGOL_WORKSPACE_ID").filter(|s| !s.is_empty()),
            datagol_token: env("DATAGOL_WRITE_TOKEN").filter(|s| !s.is_empty()),
            tables: DatagolTables {
                job_titles: input
                    .job_titles_table_id
                    .unwrap_or_else(|| "395a586f-2d3e-4489-a5d9-be0039f97aa1".to_string()),
                excluded_companies: input
                    .excluded_companies_table_id
                    .unwrap_or_else(|| "ac27bdbc-b564-429e-815d-356d58b00d06".to_string()),
                locations: input
                    .locations_table_id
                    .unwrap_or_else(|| "6122189a-764f-40a9-9721-d756b7dd3626".to_string()),
                job_postings: input
                    .job_postings_table_id
                    .unwrap_or_else(|| "8e71ed6d-ae6a-495c-b93b-1a9429370b56".to_string()),
            },
        }
    }

    /// Log the resolved configuration without exposing secrets.
    pub fn log_redacted(&self) {
        fn preview(val: &str) -> String {
            let head: String = val.chars().take(5).collect();
            format!("{}...({} chars)", head, val.len())
        }
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) if !v.is_empty() => preview(v),
                _ => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded:");
        let token = if self.apify_token.is_empty() {
            "<not set>".to_string()
        } else {
            preview(&self.apify_token)
        };
        tracing::info!("  APIFY_TOKEN: {}", token);
        tracing::info!("  Scraper actor: {}", self.actor_id);
        tracing::info!(
            "  Budget: {} jobs, {} concurrent, {} rows per search",
            self.total_jobs_to_fetch,
            self.max_concurrent,
            self.rows_per_search
        );
        tracing::info!(
            "  Run limits: {}s timeout, {} MB memory, posted in last {}h",
            self.timeout_secs,
            self.memory_mbytes,
            self.posted_in_last_hours
        );
        tracing::info!("  DataGOL base URL: {}", self.datagol_base_url);
        tracing::info!(
            "  DATAGOL_WORKSPACE_ID: {}",
            preview_opt(&self.datagol_workspace_id)
        );
        tracing::info!("  DATAGOL_WRITE_TOKEN: {}", preview_opt(&self.datagol_token));
    }
}

/// Values that do not fit the target type fall back to `default`.
fn to_u32(n: u64, default: u32) -> u32 {
    u32::try_from(n).unwrap_or(default)
}

fn to_usize(n: u64, default: usize) -> usize {
    usize::try_from(n).unwrap_or(default)
}

fn clean_list(list: Option<Vec<String>>) -> Vec<String> {
    list.unwrap_or_default()
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_with_empty_input_and_env() {
        let config = Config::resolve(RunInput::default(), env_of(&[]));
        assert_eq!(config.actor_id, "bebity/linkedin-jobs-scraper");
        assert_eq!(config.total_jobs_to_fetch, 50);
        assert_eq!(config.max_concurrent, 24);
        assert_eq!(config.timeout_secs, 600);
        assert_eq!(config.memory_mbytes, 256);
        assert_eq!(config.rows_per_search, 50);
        assert_eq!(config.posted_in_last_hours, 24);
        assert!(config.datagol_workspace_id.is_none());
    }

    #[test]
    fn input_wins_over_env() {
        let input = RunInput {
            total_jobs_to_fetch: Some(10),
            ..Default::default()
        };
        let config = Config::resolve(
            input,
            env_of(&[("TOTAL_JOBS_TO_FETCH", "99"), ("MAX_CONCURRENT_SCRAPERS", "4")]),
        );
        assert_eq!(config.total_jobs_to_fetch, 10);
        assert_eq!(config.max_concurrent, 4);
        assert_eq!(config.rows_per_search, 10);
    }

    #[test]
    fn zero_and_garbage_fall_back_to_defaults() {
        let input = RunInput {
            max_concurrent_scrapers: Some(0),
            ..Default::default()
        };
        let config = Config::resolve(input, env_of(&[("SCRAPER_MEMORY", "lots")]));
        assert_eq!(config.max_concurrent, 24);
        assert_eq!(config.memory_mbytes, 256);
    }

    #[test]
    fn oversized_numbers_fall_back_instead_of_truncating() {
        let input = RunInput {
            total_jobs_to_fetch: Some(20),
            rows: Some(u64::from(u32::MAX) + 5),
            scraper_memory: Some(u64::from(u32::MAX) + 1),
            ..Default::default()
        };
        let config = Config::resolve(
            input,
            env_of(&[("POSTED_IN_LAST_HOURS", "4294967297")]),
        );
        assert_eq!(config.rows_per_search, 20);
        assert_eq!(config.memory_mbytes, 256);
        assert_eq!(config.posted_in_last_hours, 24);
    }

    #[test]
    fn timeout_is_capped_at_one_hour() {
        let config = Config::resolve(
            RunInput::default(),
            env_of(&[("SCRAPER_TIMEOUT_SECS", "7200")]),
        );
        assert_eq!(config.timeout_secs, 3600);
    }

    #[test]
    fn input_lists_are_trimmed() {
        let input: RunInput = serde_json::from_str(
            r#"{"jobTitles": [" Accountant ", ""], "locations": ["Namur"]}"#,
        )
        .unwrap();
        let config = Config::resolve(input, env_of(&[]));
        assert_eq!(config.job_titles, vec!["Accountant"]);
        assert_eq!(config.locations, vec!["Namur"]);
        assert!(config.allowed_locations.is_empty());
    }
}

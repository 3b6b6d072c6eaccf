//! DataGOL adapters: filter lists in, posting rows out.

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use datagol_client::{DatagolClient, DEFAULT_PAGE_SIZE};
use jobscout_common::{Config, DatagolTables, FilterKind, JobPosting};

use crate::traits::{EmitReport, FilterSource, PostingSink};

/// Posting property → DataGOL column.
pub const COLUMN_MAP: &[(&str, &str)] = &[
    ("title", "title"),
    ("companyName", "companyname"),
    ("location", "location"),
    ("description", "description"),
    ("jobUrl", "joburl"),
    ("companyUrl", "companyurl"),
    ("applyUrl", "applyurl"),
    ("applyType", "applytype"),
    ("workType", "worktype"),
    ("contractType", "contracttype"),
    ("experienceLevel", "experiencelevel"),
    ("publishedAt", "publishedat"),
    ("postedTime", "postedtime"),
    ("applicationsCount", "applicationscount"),
    ("salary", "salary"),
    ("benefits", "benefits"),
    ("sector", "sector"),
    ("companyId", "companyid"),
    ("posterProfileUrl", "posterprofileurl"),
    ("posterFullName", "posterfullname"),
];

/// Client only when both workspace and token are configured.
fn client_from(config: &Config) -> Option<DatagolClient> {
    match (&config.datagol_workspace_id, &config.datagol_token) {
        (Some(workspace), Some(token)) => Some(DatagolClient::new(
            &config.datagol_base_url,
            workspace,
            token,
        )),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Filter source
// ---------------------------------------------------------------------------

pub struct DatagolFilterSource {
    client: Option<DatagolClient>,
    tables: DatagolTables,
}

impl DatagolFilterSource {
    pub fn new(config: &Config) -> Self {
        Self {
            client: client_from(config),
            tables: config.tables.clone(),
        }
    }

    fn table_for(&self, kind: FilterKind) -> &str {
        match kind {
            FilterKind::JobTitles => &self.tables.job_titles,
            FilterKind::Locations => &self.tables.locations,
            FilterKind::ExcludedCompanies => &self.tables.excluded_companies,
        }
    }
}

#[async_trait]
impl FilterSource for DatagolFilterSource {
    /// Read one list table. Failures are logged and yield an empty list.
    async fn filter_values(&self, kind: FilterKind) -> Result<Vec<String>> {
        let Some(client) = &self.client else {
            warn!(
                kind = kind.as_str(),
                "DATAGOL_WORKSPACE_ID or DATAGOL_WRITE_TOKEN not set, skipping fetch"
            );
            return Ok(Vec::new());
        };
        let table_id = self.table_for(kind);
        if table_id.is_empty() {
            warn!(kind = kind.as_str(), "No DataGOL table configured, skipping fetch");
            return Ok(Vec::new());
        }

        match client.table_rows(table_id, DEFAULT_PAGE_SIZE).await {
            Ok(rows) => {
                let values = extract_values(&rows, candidate_fields(kind));
                info!(kind = kind.as_str(), count = values.len(), "Fetched filter values");
                Ok(values)
            }
            Err(e) => {
                error!(kind = kind.as_str(), table_id, error = %e, "Failed to fetch filter values");
                Ok(Vec::new())
            }
        }
    }
}

/// Row fields that may carry the value, in order of preference.
fn candidate_fields(kind: FilterKind) -> &'static [&'static str] {
    match kind {
        FilterKind::JobTitles => &["Job Title", "title", "name", "jobTitle"],
        FilterKind::Locations => &["City", "location", "city", "name"],
        FilterKind::ExcludedCompanies => &["name", "company", "companyName"],
    }
}

/// First non-empty candidate string per row, trimmed, first occurrence kept.
fn extract_values(rows: &[Value], fields: &[&str]) -> Vec<String> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter_map(|row| {
            fields.iter().find_map(|field| {
                row.get(*field)
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
            })
        })
        .filter(|value| seen.insert(value.to_string()))
        .map(String::from)
        .collect()
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Appends one DataGOL row per posting.
pub struct DatagolSink {
    client: Option<DatagolClient>,
    table_id: String,
}

impl DatagolSink {
    pub fn new(config: &Config) -> Self {
        Self {
            client: client_from(config),
            table_id: config.tables.job_postings.clone(),
        }
    }
}

#[async_trait]
impl PostingSink for DatagolSink {
    async fn emit(&self, postings: &[JobPosting]) -> EmitReport {
        let mut report = EmitReport::default();
        let Some(client) = &self.client else {
            warn!(
                count = postings.len(),
                "DATAGOL_WORKSPACE_ID or DATAGOL_WRITE_TOKEN not set, postings not saved"
            );
            report.skipped = postings.len();
            return report;
        };

        info!(count = postings.len(), table_id = self.table_id.as_str(), "Saving postings to DataGOL");
        for posting in postings {
            let cells = to_cells(posting);
            if cells.is_empty() {
                warn!("Skipping posting with no data to save");
                report.skipped += 1;
                continue;
            }

            let title = posting.title.as_deref().unwrap_or("");
            match client.add_row(&self.table_id, &cells).await {
                Ok(()) => {
                    info!(title, "Saved posting");
                    report.sent += 1;
                }
                Err(e) => {
                    error!(title, error = %e, "Failed to save posting");
                    report.failed += 1;
                }
            }
        }
        report
    }
}

/// Translate a posting into DataGOL cell values. Absent and null
/// properties are left out.
pub fn to_cells(posting: &JobPosting) -> Map<String, Value> {
    let Ok(Value::Object(props)) = serde_json::to_value(posting) else {
        return Map::new();
    };
    COLUMN_MAP
        .iter()
        .filter_map(|(property, column)| match props.get(*property) {
            None | Some(Value::Null) => None,
            Some(value) => Some((column.to_string(), value.clone())),
        })
        .collect()
}

/// Logs postings instead of delivering them (dry runs).
pub struct LogSink;

#[async_trait]
impl PostingSink for LogSink {
    async fn emit(&self, postings: &[JobPosting]) -> EmitReport {
        for posting in postings {
            info!(
                title = posting.title.as_deref().unwrap_or(""),
                company = posting.company_name.as_deref().unwrap_or(""),
                location = posting.location.as_deref().unwrap_or(""),
                url = posting.job_url.as_deref().unwrap_or(""),
                "Posting"
            );
        }
        EmitReport {
            sent: postings.len(),
            ..Default::default()
        }
    }
}

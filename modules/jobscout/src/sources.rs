//! Search and filter lists for one invocation.
//!
//! Precedence per list: explicit run input, then the filter source, then the
//! built-in defaults below. Excluded companies never come from run input.

use tracing::{info, warn};

use jobscout_common::{Config, FilterKind};

use crate::traits::FilterSource;

pub const DEFAULT_JOB_TITLES: &[&str] = &[
    "Financial controller",
    "Business controller",
    "Financial analyst",
    "FP&A",
    "Finance Business Partner",
    "Contrôleur de gestion",
    "Analyste Financier",
    "Financieel analist",
    "Financieel controller",
    "Accountant",
    "comptable",
    "boekhouder",
    "gestionnaire de dossiers",
    "dossierbeheerder",
];

pub const DEFAULT_LOCATIONS: &[&str] = &["Brussels", "Namur", "Charleroi", "Liège", "Mons", "Arlon"];

pub const DEFAULT_EXCLUDED_COMPANIES: &[&str] = &[
    "Deloitte",
    "PwC",
    "EY",
    "KPMG",
    "Accenture",
    "Deloitte Belgium",
    "PwC Belgium",
    "EY Belgium",
    "KPMG Belgium",
    "Accenture Belgium",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLists {
    pub job_titles: Vec<String>,
    pub locations: Vec<String>,
    pub excluded_companies: Vec<String>,
}

/// Resolve all three lists, fetching the ones input does not provide
/// concurrently.
pub async fn resolve_lists(config: &Config, source: &dyn FilterSource) -> ResolvedLists {
    let (job_titles, locations, excluded_companies) = tokio::join!(
        resolve_one(
            &config.job_titles,
            source,
            FilterKind::JobTitles,
            DEFAULT_JOB_TITLES
        ),
        resolve_one(
            &config.locations,
            source,
            FilterKind::Locations,
            DEFAULT_LOCATIONS
        ),
        resolve_one(
            &[],
            source,
            FilterKind::ExcludedCompanies,
            DEFAULT_EXCLUDED_COMPANIES
        ),
    );

    ResolvedLists {
        job_titles,
        locations,
        excluded_companies,
    }
}

async fn resolve_one(
    from_input: &[String],
    source: &dyn FilterSource,
    kind: FilterKind,
    defaults: &[&str],
) -> Vec<String> {
    if !from_input.is_empty() {
        info!(kind = kind.as_str(), count = from_input.len(), "Using list from run input");
        return from_input.to_vec();
    }

    match source.filter_values(kind).await {
        Ok(values) if !values.is_empty() => values,
        Ok(_) => {
            info!(kind = kind.as_str(), "Filter source returned nothing, using defaults");
            to_owned(defaults)
        }
        Err(e) => {
            warn!(kind = kind.as_str(), error = %e, "Filter source failed, using defaults");
            to_owned(defaults)
        }
    }
}

fn to_owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

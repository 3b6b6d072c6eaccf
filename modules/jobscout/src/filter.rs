//! Posting filters: excluded companies, banned keywords, allowed locations
//! and recency.
//!
//! Pure functions over a posting and the invocation's [`FilterSpec`]. Rules
//! run in a fixed order and stop at the first rejection.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use regex::Regex;

use jobscout_common::{FilterSpec, JobPosting};

static RE_RELATIVE_AGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*(minute|min|hour|hr|day|week|month)s?\s+ago").unwrap()
});

/// Outcome of running one posting through the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterVerdict {
    Accept,
    MissingCompany,
    /// Company name contains this excluded entry.
    ExcludedCompany(String),
    /// Title or description contains this excluded entry.
    BannedKeyword(String),
    LocationNotAllowed,
    TooOld,
}

impl FilterVerdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, FilterVerdict::Accept)
    }
}

/// Filter rules with their match lists lower-cased once up front.
#[derive(Debug, Clone)]
pub struct PostingFilter {
    excluded: Vec<String>,
    allowed_locations: Vec<String>,
    max_age: Option<TimeDelta>,
}

impl PostingFilter {
    pub fn new(spec: &FilterSpec) -> Self {
        Self {
            excluded: lowered(&spec.excluded_companies),
            allowed_locations: lowered(&spec.allowed_locations),
            max_age: (spec.posted_in_last_hours > 0)
                .then(|| TimeDelta::try_hours(i64::from(spec.posted_in_last_hours)))
                .flatten(),
        }
    }

    /// Apply the rules in order:
    ///
    /// 1. No company name → reject
    /// 2. Company name contains an excluded entry → reject
    /// 3. Title + description contains an excluded entry → reject
    /// 4. Allowed locations set and none contained in location → reject
    /// 5. Parseable posting date older than the window → reject
    ///
    /// An absent or unparseable date never rejects.
    pub fn evaluate(&self, posting: &JobPosting, now: DateTime<Utc>) -> FilterVerdict {
        let company = match posting.company_name.as_deref().map(str::trim) {
            Some(c) if !c.is_empty() => c.to_lowercase(),
            _ => return FilterVerdict::MissingCompany,
        };

        if let Some(hit) = self.excluded.iter().find(|e| company.contains(e.as_str())) {
            return FilterVerdict::ExcludedCompany(hit.clone());
        }

        let text = format!(
            "{} {}",
            posting.title.as_deref().unwrap_or(""),
            posting.description.as_deref().unwrap_or("")
        )
        .to_lowercase();
        if let Some(hit) = self.excluded.iter().find(|e| text.contains(e.as_str())) {
            return FilterVerdict::BannedKeyword(hit.clone());
        }

        if !self.allowed_locations.is_empty() {
            let location = posting.location.as_deref().unwrap_or("").to_lowercase();
            if !self
                .allowed_locations
                .iter()
                .any(|allowed| location.contains(allowed.as_str()))
            {
                return FilterVerdict::LocationNotAllowed;
            }
        }

        if let (Some(max_age), Some(posted)) = (self.max_age, posted_at(posting, now)) {
            if now.checked_sub_signed(max_age).is_some_and(|cutoff| posted < cutoff) {
                return FilterVerdict::TooOld;
            }
        }

        FilterVerdict::Accept
    }

    pub fn accepts(&self, posting: &JobPosting, now: DateTime<Utc>) -> bool {
        self.evaluate(posting, now).is_accept()
    }
}

fn lowered(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Best-effort posting time.
///
/// `publishedAt` as RFC 3339 or `YYYY-MM-DD` (midnight UTC), else a relative
/// `postedTime` such as "3 hours ago". Ages too large to represent count as
/// unparseable.
pub fn posted_at(posting: &JobPosting, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if let Some(raw) = posting.published_at.as_deref().map(str::trim) {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }

    let caps = RE_RELATIVE_AGE.captures(posting.posted_time.as_deref()?)?;
    let amount: i64 = caps[1].parse().ok()?;
    let age = match caps[2].to_lowercase().as_str() {
        "minute" | "min" => TimeDelta::try_minutes(amount),
        "hour" | "hr" => TimeDelta::try_hours(amount),
        "day" => TimeDelta::try_days(amount),
        "week" => TimeDelta::try_weeks(amount),
        "month" => amount.checked_mul(30).and_then(TimeDelta::try_days),
        _ => None,
    }?;
    now.checked_sub_signed(age)
}

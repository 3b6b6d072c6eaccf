//! Posting identity and per-invocation deduplication.

use std::collections::HashSet;
use std::sync::Mutex;

use jobscout_common::JobPosting;

/// Identity of a posting.
///
/// The job URL with query string and fragment removed when the posting has
/// one; otherwise the lower-cased `title|company|location` composite.
pub fn posting_key(posting: &JobPosting) -> String {
    if let Some(url) = posting.job_url.as_deref().map(normalize_job_url) {
        if !url.is_empty() {
            return url;
        }
    }
    format!(
        "{}|{}|{}",
        posting.title.as_deref().unwrap_or("").trim(),
        posting.company_name.as_deref().unwrap_or("").trim(),
        posting.location.as_deref().unwrap_or("").trim(),
    )
    .to_lowercase()
}

fn normalize_job_url(url: &str) -> String {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    url[..end].trim().to_string()
}

/// Set of posting keys seen during one invocation.
///
/// `admit` does its check-and-insert under one lock and never awaits, so
/// concurrently running unit tasks cannot both admit the same key.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: Mutex<HashSet<String>>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the posting's key. Returns `false` if it was already seen.
    pub fn admit(&self, posting: &JobPosting) -> bool {
        let key = posting_key(posting);
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key)
    }

    pub fn len(&self) -> usize {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

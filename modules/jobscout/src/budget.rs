use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

/// Tracks admitted postings against the invocation's result budget.
///
/// The counter only ever grows. Checks and increments are separate calls,
/// so unit tasks of one batch can each admit past the limit once; the
/// aggregate may exceed the budget by up to `max_concurrent - 1`.
pub struct FetchBudget {
    /// Admission limit. A limit of 0 is exhausted from the start.
    limit: usize,
    admitted: AtomicUsize,
}

impl FetchBudget {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            admitted: AtomicUsize::new(0),
        }
    }

    /// True once the admitted count has reached the limit.
    pub fn is_exhausted(&self) -> bool {
        self.admitted() >= self.limit
    }

    /// Count one admitted posting. Returns the new total.
    pub fn record_admission(&self) -> usize {
        self.admitted.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn admitted(&self) -> usize {
        self.admitted.load(Ordering::Relaxed)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn log_status(&self) {
        info!(
            admitted = self.admitted(),
            limit = self.limit,
            "Fetch budget status"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_limit_is_exhausted_before_any_admission() {
        let budget = FetchBudget::new(0);
        assert!(budget.is_exhausted());
    }

    #[test]
    fn budget_tracks_admissions() {
        let budget = FetchBudget::new(3);
        assert_eq!(budget.record_admission(), 1);
        assert_eq!(budget.record_admission(), 2);
        assert!(!budget.is_exhausted());
        budget.record_admission();
        assert!(budget.is_exhausted());
    }

    #[test]
    fn overshoot_is_recorded_not_refused() {
        let budget = FetchBudget::new(2);
        budget.record_admission();
        budget.record_admission();
        assert_eq!(budget.record_admission(), 3);
        assert_eq!(budget.admitted(), 3);
        assert!(budget.is_exhausted());
    }
}

use jobscout_common::JobPosting;

/// Accumulates admitted postings batch by batch.
///
/// Each batch contributes its units' postings in unit order, and each unit's
/// postings keep the provider's return order. Nothing is re-sorted.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    postings: Vec<JobPosting>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one joined batch. `per_unit` must be in the batch's unit order.
    pub fn append_batch<I>(&mut self, per_unit: I)
    where
        I: IntoIterator<Item = Vec<JobPosting>>,
    {
        for postings in per_unit {
            self.postings.extend(postings);
        }
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    pub fn into_postings(self) -> Vec<JobPosting> {
        self.postings
    }
}

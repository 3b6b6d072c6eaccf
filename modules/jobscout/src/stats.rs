use crate::traits::EmitReport;

/// Stats from one invocation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScoutStats {
    pub search_units: usize,
    pub batches_run: usize,
    pub batches_skipped: usize,
    /// Units whose task found the budget already spent at start.
    pub units_skipped: usize,
    pub runs_started: usize,
    pub runs_reused: usize,
    pub runs_failed: usize,
    pub postings_fetched: usize,
    pub postings_filtered: usize,
    pub postings_duplicate: usize,
    pub postings_admitted: usize,
    pub rows_emitted: usize,
    pub rows_failed: usize,
    pub rows_skipped: usize,
}

impl ScoutStats {
    pub fn record_emit(&mut self, report: EmitReport) {
        self.rows_emitted += report.sent;
        self.rows_failed += report.failed;
        self.rows_skipped += report.skipped;
    }
}

impl std::fmt::Display for ScoutStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Job Scout Run Complete ===")?;
        writeln!(f, "Search units:       {}", self.search_units)?;
        writeln!(
            f,
            "Batches:            {} run, {} skipped",
            self.batches_run, self.batches_skipped
        )?;
        writeln!(f, "Units skipped:      {}", self.units_skipped)?;
        writeln!(f, "\nScraper runs:")?;
        writeln!(f, "  Started: {}", self.runs_started)?;
        writeln!(f, "  Reused:  {}", self.runs_reused)?;
        writeln!(f, "  Failed:  {}", self.runs_failed)?;
        writeln!(f, "\nPostings:")?;
        writeln!(f, "  Fetched:    {}", self.postings_fetched)?;
        writeln!(f, "  Filtered:   {}", self.postings_filtered)?;
        writeln!(f, "  Duplicates: {}", self.postings_duplicate)?;
        writeln!(f, "  Admitted:   {}", self.postings_admitted)?;
        if self.rows_emitted + self.rows_failed + self.rows_skipped > 0 {
            writeln!(f, "\nSink:")?;
            writeln!(f, "  Sent:    {}", self.rows_emitted)?;
            writeln!(f, "  Failed:  {}", self.rows_failed)?;
            writeln!(f, "  Skipped: {}", self.rows_skipped)?;
        }
        Ok(())
    }
}

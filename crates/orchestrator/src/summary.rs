// Rust guideline compliant 2026-10-18

//! Per-batch classification tally.

use std::fmt;

use domain::Case;

/// Totals and per-case counts of one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Inputs handled, including failures.
    pub processed: usize,
    pub population_failures: usize,
    /// Snapshots assigned a catalogue case.
    pub classified: usize,
    /// Snapshots no rule matched.
    pub unmatched: usize,
    pub tickets: usize,
    /// Non-zero counts, in [`Case::CATALOGUE`] order.
    pub per_case: Vec<(Case, usize)>,
    /// Matched cases for which no ticket can be generated.
    pub without_generator: Vec<Case>,
}

/// Running tally fed by the reducer, one snapshot at a time.
#[derive(Debug, Default)]
pub(crate) struct Tally {
    processed: usize,
    population_failures: usize,
    unmatched: usize,
    tickets: usize,
    counts: Vec<(Case, usize)>,
    without_generator: Vec<Case>,
}

impl Tally {
    pub(crate) fn population_failure(&mut self) {
        self.processed += 1;
        self.population_failures += 1;
    }

    pub(crate) fn classified(&mut self, case: Case, ticket: bool, has_generator: bool) {
        self.processed += 1;
        if case.is_sentinel() {
            self.unmatched += 1;
            return;
        }
        match self.counts.iter_mut().find(|(c, _)| *c == case) {
            Some((_, n)) => *n += 1,
            None => self.counts.push((case, 1)),
        }
        if ticket {
            self.tickets += 1;
        }
        if !has_generator && !self.without_generator.contains(&case) {
            self.without_generator.push(case);
        }
    }

    pub(crate) fn finish(self) -> BatchSummary {
        let per_case: Vec<(Case, usize)> = Case::CATALOGUE
            .into_iter()
            .filter_map(|case| self.counts.iter().find(|(c, _)| *c == case).copied())
            .collect();
        let without_generator =
            Case::CATALOGUE.into_iter().filter(|c| self.without_generator.contains(c)).collect();
        BatchSummary {
            processed: self.processed,
            population_failures: self.population_failures,
            classified: per_case.iter().map(|(_, n)| n).sum(),
            unmatched: self.unmatched,
            tickets: self.tickets,
            per_case,
            without_generator,
        }
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "processed={} population_failures={} classified={} unmatched={} tickets={}",
            self.processed, self.population_failures, self.classified, self.unmatched, self.tickets
        )?;
        for (case, n) in &self.per_case {
            writeln!(f, "  {case}: {n}")?;
        }
        if !self.without_generator.is_empty() {
            let cases: Vec<&str> = self.without_generator.iter().map(|c| c.as_str()).collect();
            writeln!(f, "  no generator: {}", cases.join(", "))?;
        }
        Ok(())
    }
}

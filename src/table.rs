//! Stopping-point bound table for multipath interface discovery.
//!
//! For every hypothesis `h` ("this router balances across `h` outgoing
//! interfaces") the table records the minimum number of probes after which
//! the chance of having missed an interface drops below the hypothesis'
//! significance level. The probing engine looks these counts up while it
//! enumerates interfaces; once the count is reached without a new
//! interface appearing, the hypothesis is accepted.
//!
//! The computation is a coupon-collector-style absorbing Markov chain,
//! evaluated along anti-diagonals of the (probes, interfaces) grid so that
//! only two rolling vectors are ever live. Chains for larger hypotheses
//! reuse the stopping points of smaller ones: a cell whose probe count
//! lands on an already-finalized stopping point is absorbing and stops
//! contributing mass, which is what bounds the work per hypothesis.

use std::io::{self, Write};

use crate::builder::BoundTableBuilder;
use crate::error::BoundError;
use crate::significance;
use crate::state::StateVectors;

/// Hypotheses 0 and 1 carry no probing work; their table entries are
/// zeroed dummies.
pub(crate) const FIRST_HYPOTHESIS: usize = 2;

/// Progress of one hypothesis' chain through the diagonal recurrence.
#[derive(Debug, Clone, Copy)]
enum Phase {
    /// Every column of the chain is still live.
    Advancing,
    /// Columns below `low_cutoff` were absorbed by smaller hypotheses.
    Absorbed { low_cutoff: usize },
    /// The surviving mass fell below the significance level.
    Stopped { probes: usize, mass: f64 },
}

/// Table of stopping points, one per hypothesis, plus the significance
/// schedule that produced them and the residual failure mass recorded at
/// each stop. Long-lived: built once per probing session and grown in
/// place when a router exceeds the anticipated interface count.
#[derive(Debug, Clone)]
pub struct BoundTable {
    confidence: f64,
    max_hypothesis: usize,
    stopping_points: Vec<usize>,
    significance_levels: Vec<f64>,
    failure_probabilities: Vec<f64>,
    scratch: StateVectors,
    row_ceiling: usize,
}

impl BoundTable {
    /// Build a table covering hypotheses up to `initial_max_hypothesis`,
    /// deriving the per-node confidence from a graph-wide target and the
    /// assumed maximum number of load balancers on the path.
    ///
    /// Shorthand for the [`BoundTableBuilder`] defaults; use the builder
    /// directly to pass a per-node significance instead.
    pub fn new(
        graph_confidence: f64,
        initial_max_hypothesis: usize,
        max_branch: usize,
    ) -> Result<Self, BoundError> {
        BoundTableBuilder::new()
            .graph_confidence(graph_confidence)
            .max_branch(max_branch)
            .max_hypothesis(initial_max_hypothesis)
            .build()
    }

    /// `confidence` is the already-derived per-node value; the builder is
    /// responsible for the graph-wide transformation and validation of
    /// the branching factor.
    pub(crate) fn with_confidence(
        confidence: f64,
        max_hypothesis: usize,
        row_ceiling: usize,
    ) -> Result<Self, BoundError> {
        if !(confidence > 0.0 && confidence < 1.0) {
            return Err(BoundError::InvalidConfidence(confidence));
        }
        let len = max_hypothesis + 1;
        let mut stopping_points = Vec::new();
        stopping_points.try_reserve_exact(len)?;
        stopping_points.resize(len, 0);
        let mut significance_levels = Vec::new();
        significance_levels.try_reserve_exact(len)?;
        significance_levels.resize(len, 0.0);
        let mut failure_probabilities = Vec::new();
        failure_probabilities.try_reserve_exact(len)?;
        failure_probabilities.resize(len, 0.0);
        significance::fill_levels(confidence, &mut significance_levels);

        let mut table = Self {
            confidence,
            max_hypothesis,
            stopping_points,
            significance_levels,
            failure_probabilities,
            scratch: StateVectors::new(max_hypothesis)?,
            row_ceiling,
        };
        table.build_range(FIRST_HYPOTHESIS, max_hypothesis)?;
        Ok(table)
    }

    /// Per-node confidence the significance schedule was derived from.
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Largest hypothesis the table currently covers.
    pub fn max_hypothesis(&self) -> usize {
        self.max_hypothesis
    }

    /// Minimum probe count required to accept `hypothesis`, or the
    /// sentinel 0 when the table does not cover it yet (call [`grow`]
    /// first) or when it is a dummy hypothesis below 2. Never mutates.
    ///
    /// [`grow`]: Self::grow
    pub fn stopping_point(&self, hypothesis: usize) -> usize {
        if hypothesis <= self.max_hypothesis {
            self.stopping_points[hypothesis]
        } else {
            0
        }
    }

    /// Like [`stopping_point`](Self::stopping_point) but distinguishes
    /// "not covered" and "dummy" from a real entry.
    pub fn checked_stopping_point(&self, hypothesis: usize) -> Option<usize> {
        (FIRST_HYPOTHESIS..=self.max_hypothesis)
            .contains(&hypothesis)
            .then(|| self.stopping_points[hypothesis])
    }

    /// All stopping points, indexed by hypothesis (entries 0 and 1 are
    /// dummies).
    pub fn stopping_points(&self) -> &[usize] {
        &self.stopping_points
    }

    /// Per-hypothesis significance thresholds `a_k`.
    pub fn significance_levels(&self) -> &[f64] {
        &self.significance_levels
    }

    /// Residual probability mass recorded at each hypothesis' stopping
    /// point; diagnostic only.
    pub fn failure_probabilities(&self) -> &[f64] {
        &self.failure_probabilities
    }

    /// Extend coverage to hypothesis `end`. A request the table already
    /// covers is a no-op; otherwise all tables and the scratch vectors
    /// grow and only the new hypotheses are built, reusing every
    /// previously finalized stopping point. On failure the table is left
    /// exactly as it was.
    pub fn grow(&mut self, end: usize) -> Result<(), BoundError> {
        if end <= self.max_hypothesis {
            return Ok(());
        }
        #[cfg(feature = "tracing")]
        let span = tracing::info_span!("grow", from = self.max_hypothesis, to = end);
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        let old_max = self.max_hypothesis;
        let extra = end - old_max;
        // Reserve everything up front so a failed allocation cannot leave
        // a half-grown table behind.
        self.stopping_points.try_reserve_exact(extra)?;
        self.significance_levels.try_reserve_exact(extra)?;
        self.failure_probabilities.try_reserve_exact(extra)?;
        self.scratch.try_grow(end)?;
        self.stopping_points.resize(end + 1, 0);
        self.significance_levels.resize(end + 1, 0.0);
        self.failure_probabilities.resize(end + 1, 0.0);
        // Closed form; recomputing the old prefix reproduces it exactly.
        significance::fill_levels(self.confidence, &mut self.significance_levels);
        self.max_hypothesis = end;

        if let Err(err) = self.build_range(old_max + 1, end) {
            self.stopping_points.truncate(old_max + 1);
            self.significance_levels.truncate(old_max + 1);
            self.failure_probabilities.truncate(old_max + 1);
            self.max_hypothesis = old_max;
            return Err(err);
        }
        Ok(())
    }

    /// Write a `hypothesis - stopping point` listing to `sink`.
    pub fn dump<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        for (hypothesis, count) in self.stopping_points.iter().enumerate() {
            writeln!(sink, "{hypothesis} - {count}")?;
        }
        Ok(())
    }

    /// Write a `hypothesis - residual failure probability` listing to
    /// `sink`.
    pub fn dump_failures<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        writeln!(sink, "Expected failure:")?;
        for (hypothesis, mass) in self.failure_probabilities.iter().enumerate() {
            writeln!(sink, "{hypothesis} - {mass:.6}")?;
        }
        Ok(())
    }

    fn build_range(&mut self, start: usize, end: usize) -> Result<(), BoundError> {
        #[cfg(feature = "tracing")]
        let span = tracing::info_span!("build_range", start, end);
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        for hypothesis in start.max(FIRST_HYPOTHESIS)..=end {
            self.build_one(hypothesis)?;
        }
        Ok(())
    }

    /// Advance one hypothesis' chain until the stopping test fires.
    ///
    /// Diagonal `row` covers cells `(row, j)` holding the probability of
    /// having observed `j` distinct interfaces after `row + j - 1` probes.
    /// Row 1 owns only the seeded cell `(1, 1)`, so its fill starts at
    /// column 2; later rows start at the absorption cutoff.
    fn build_one(&mut self, hypothesis: usize) -> Result<(), BoundError> {
        #[cfg(feature = "tracing")]
        let span = tracing::trace_span!("build_hypothesis", hypothesis);
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        let h = hypothesis;
        self.scratch.reset();
        let mut phase = Phase::Advancing;

        for row in 1..=self.row_ceiling {
            let mut low_cutoff = match phase {
                Phase::Advancing => 1,
                Phase::Absorbed { low_cutoff } => low_cutoff,
                Phase::Stopped { .. } => unreachable!("stopped chains exit the row loop"),
            };
            let start_column = if row == 1 { FIRST_HYPOTHESIS } else { low_cutoff };

            for j in start_column..h {
                // Repeat transition from the prior diagonal plus discovery
                // transition from the cell just written on this one.
                let mass = self.scratch.prior[j] * (j as f64 / h as f64)
                    + self.scratch.current[j - 1] * ((h - j + 1) as f64 / h as f64);
                let probes = row + j - 1;
                if probes == self.stopping_points[j + 1] {
                    // Hypothesis j+1 already resolved at this probe count;
                    // the sub-chain below it stops contributing mass.
                    self.scratch.current[j] = 0.0;
                    self.scratch.prior[j] = 0.0;
                    low_cutoff = j + 1;
                } else {
                    self.scratch.current[j] = mass;
                }
            }

            phase = if low_cutoff > 1 {
                Phase::Absorbed { low_cutoff }
            } else {
                Phase::Advancing
            };

            // The stopping test applies only once the chain is squeezed
            // down to the single cell "one interface left to confirm".
            if low_cutoff == h - 1 {
                let mass = self.scratch.current[h - 1];
                if mass <= self.significance_levels[h] {
                    phase = Phase::Stopped {
                        probes: row + h - 2,
                        mass,
                    };
                }
            }

            if let Phase::Stopped { probes, mass } = phase {
                self.stopping_points[h] = probes;
                self.failure_probabilities[h] = mass;
                return Ok(());
            }
            self.scratch.swap();
        }

        Err(BoundError::Diverged {
            hypothesis: h,
            rows: self.row_ceiling,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_table() -> BoundTable {
        BoundTable::new(0.95, 6, 1).expect("build")
    }

    #[test]
    fn dummy_entries_stay_zero() {
        let table = small_table();
        assert_eq!(table.stopping_point(0), 0);
        assert_eq!(table.stopping_point(1), 0);
        assert_eq!(table.significance_levels()[0], 0.0);
        assert_eq!(table.significance_levels()[1], 0.0);
    }

    #[test]
    fn lookup_beyond_coverage_returns_sentinel() {
        let table = small_table();
        assert_eq!(table.stopping_point(7), 0);
        assert_eq!(table.stopping_point(usize::MAX), 0);
    }

    #[test]
    fn checked_lookup_rejects_dummies_and_uncovered() {
        let table = small_table();
        assert_eq!(table.checked_stopping_point(1), None);
        assert_eq!(table.checked_stopping_point(7), None);
        assert_eq!(
            table.checked_stopping_point(2),
            Some(table.stopping_point(2))
        );
    }

    #[test]
    fn grow_is_idempotent_below_coverage() {
        let mut table = small_table();
        let before = table.clone();
        table.grow(4).expect("no-op grow");
        table.grow(6).expect("no-op grow");
        assert_eq!(table.stopping_points(), before.stopping_points());
        assert_eq!(table.max_hypothesis(), before.max_hypothesis());
    }

    #[test]
    fn grow_preserves_existing_entries() {
        let mut table = small_table();
        let before = table.stopping_points().to_vec();
        table.grow(10).expect("grow");
        assert_eq!(table.max_hypothesis(), 10);
        assert_eq!(&table.stopping_points()[..=6], &before[..]);
        assert_ne!(table.stopping_point(10), 0);
    }

    #[test]
    fn tiny_row_ceiling_reports_divergence() {
        let err = BoundTableBuilder::new()
            .node_significance(0.05)
            .max_hypothesis(4)
            .row_ceiling(3)
            .build()
            .expect_err("ceiling of 3 rows cannot resolve hypothesis 2");
        assert_eq!(
            err,
            BoundError::Diverged {
                hypothesis: 2,
                rows: 3
            }
        );
    }

    #[test]
    fn diverging_growth_rolls_back() {
        let mut table = BoundTableBuilder::new()
            .node_significance(0.05)
            .max_hypothesis(3)
            .row_ceiling(20)
            .build()
            .expect("small table fits in 20 rows");
        let before = table.clone();
        // Hypothesis 8 needs far more than 20 rows.
        let err = table.grow(8).expect_err("ceiling too small for growth");
        assert!(matches!(err, BoundError::Diverged { .. }));
        assert_eq!(table.max_hypothesis(), before.max_hypothesis());
        assert_eq!(table.stopping_points(), before.stopping_points());
        assert_eq!(table.stopping_point(8), 0);
    }

    #[test]
    fn dump_lists_every_hypothesis() {
        let table = small_table();
        let mut out = Vec::new();
        table.dump(&mut out).expect("dump");
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(text.lines().count(), 7);
        assert!(text.starts_with("0 - 0\n"));
        let expected = format!("2 - {}", table.stopping_point(2));
        assert!(text.lines().any(|line| line == expected));
    }

    #[test]
    fn failure_dump_has_header() {
        let table = small_table();
        let mut out = Vec::new();
        table.dump_failures(&mut out).expect("dump");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.starts_with("Expected failure:\n"));
        assert_eq!(text.lines().count(), 8);
    }
}

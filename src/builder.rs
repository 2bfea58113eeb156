//! Builder selecting the confidence convention and table sizing.
//!
//! The literature and the probing engine disagree on what "confidence"
//! means at this boundary: the per-node formula expects a graph-wide
//! target close to 1, while the engine's default invocation hands the
//! table a per-node significance close to 0. Both conventions are real,
//! so they are distinct, explicitly named knobs here and the caller
//! picks one.

use crate::error::BoundError;
use crate::significance::node_confidence;
use crate::table::BoundTable;

/// Matches the probing engine's default assumption of at most 16
/// interfaces per router.
const DEFAULT_MAX_HYPOTHESIS: usize = 16;

/// Generous enough for any sane confidence; a chain that runs this long
/// is diverging, not converging slowly.
const DEFAULT_ROW_CEILING: usize = 1_000_000;

#[derive(Debug, Clone, Copy)]
enum Convention {
    /// Graph-wide target confidence, split across at most `max_branch`
    /// load balancers by the per-node formula.
    Graph(f64),
    /// Per-node value consumed directly by the significance schedule.
    Node(f64),
}

/// Configures and constructs a [`BoundTable`].
///
/// ```
/// use mda_bound::BoundTableBuilder;
///
/// let table = BoundTableBuilder::new()
///     .graph_confidence(0.95)
///     .max_branch(8)
///     .max_hypothesis(16)
///     .build()
///     .unwrap();
/// assert_eq!(table.max_hypothesis(), 16);
/// ```
#[derive(Debug, Clone)]
pub struct BoundTableBuilder {
    convention: Convention,
    max_branch: usize,
    max_hypothesis: usize,
    row_ceiling: usize,
}

impl Default for BoundTableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundTableBuilder {
    /// Defaults: graph-wide confidence 0.95, a single load balancer,
    /// hypotheses up to 16.
    pub fn new() -> Self {
        Self {
            convention: Convention::Graph(0.95),
            max_branch: 1,
            max_hypothesis: DEFAULT_MAX_HYPOTHESIS,
            row_ceiling: DEFAULT_ROW_CEILING,
        }
    }

    /// Graph-wide target confidence in (0, 1); the per-node value is
    /// derived from it and [`max_branch`](Self::max_branch).
    pub fn graph_confidence(mut self, confidence: f64) -> Self {
        self.convention = Convention::Graph(confidence);
        self
    }

    /// Per-node significance in (0, 1), used directly by the threshold
    /// schedule with no graph-wide transformation. This is the convention
    /// the original engine's default invocation (0.05) actually follows.
    pub fn node_significance(mut self, significance: f64) -> Self {
        self.convention = Convention::Node(significance);
        self
    }

    /// Assumed maximum number of load balancers in the graph; only
    /// meaningful under [`graph_confidence`](Self::graph_confidence).
    pub fn max_branch(mut self, max_branch: usize) -> Self {
        self.max_branch = max_branch;
        self
    }

    /// Largest hypothesis the initial build covers.
    pub fn max_hypothesis(mut self, max_hypothesis: usize) -> Self {
        self.max_hypothesis = max_hypothesis;
        self
    }

    /// Upper bound on diagonal rows per hypothesis before the build is
    /// declared diverged.
    pub fn row_ceiling(mut self, row_ceiling: usize) -> Self {
        self.row_ceiling = row_ceiling;
        self
    }

    /// Validate the configuration and run the initial build.
    pub fn build(self) -> Result<BoundTable, BoundError> {
        if self.max_branch == 0 {
            return Err(BoundError::ZeroBranch);
        }
        let confidence = match self.convention {
            Convention::Graph(confidence) => {
                if !(confidence > 0.0 && confidence < 1.0) {
                    return Err(BoundError::InvalidConfidence(confidence));
                }
                node_confidence(confidence, self.max_branch)
            }
            Convention::Node(significance) => significance,
        };
        BoundTable::with_confidence(confidence, self.max_hypothesis, self.row_ceiling)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_branch_is_rejected() {
        let err = BoundTableBuilder::new()
            .graph_confidence(0.95)
            .max_branch(0)
            .build()
            .expect_err("division by zero branch factor");
        assert_eq!(err, BoundError::ZeroBranch);
    }

    #[test]
    fn out_of_range_confidence_is_rejected() {
        for bad in [0.0, 1.0, -0.3, 1.5] {
            let err = BoundTableBuilder::new()
                .graph_confidence(bad)
                .build()
                .expect_err("confidence outside (0,1)");
            assert_eq!(err, BoundError::InvalidConfidence(bad));
        }
    }

    #[test]
    fn out_of_range_significance_is_rejected() {
        let err = BoundTableBuilder::new()
            .node_significance(0.0)
            .build()
            .expect_err("significance outside (0,1)");
        assert_eq!(err, BoundError::InvalidConfidence(0.0));
    }

    #[test]
    fn graph_convention_transforms_node_convention_does_not() {
        let graph = BoundTableBuilder::new()
            .graph_confidence(0.95)
            .max_branch(2)
            .max_hypothesis(4)
            .build()
            .expect("build");
        let node = BoundTableBuilder::new()
            .node_significance(0.05)
            .max_hypothesis(4)
            .build()
            .expect("build");
        // 1 - sqrt(0.05) for the graph convention, the raw value otherwise.
        assert!((graph.confidence() - 0.776_393_202_3).abs() < 1e-9);
        assert!((node.confidence() - 0.05).abs() < 1e-15);
    }

    #[test]
    fn branch_factor_ignored_under_node_convention() {
        let a = BoundTableBuilder::new()
            .node_significance(0.05)
            .max_branch(7)
            .max_hypothesis(4)
            .build()
            .expect("build");
        let b = BoundTableBuilder::new()
            .node_significance(0.05)
            .max_hypothesis(4)
            .build()
            .expect("build");
        assert_eq!(a.stopping_points(), b.stopping_points());
    }
}

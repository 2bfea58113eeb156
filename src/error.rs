//! Error types for bound-table construction and growth.

use std::collections::TryReserveError;

use thiserror::Error;

/// Failure modes surfaced by [`crate::BoundTable`] operations.
///
/// Every fallible operation leaves the table in its last valid state: a
/// failed construction yields no table, and a failed growth leaves the
/// previously built hypotheses untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoundError {
    /// Confidence (or significance) values must lie strictly inside (0, 1).
    #[error("confidence must lie strictly between 0 and 1, got {0}")]
    InvalidConfidence(f64),

    /// The per-node confidence formula divides by the branching factor.
    #[error("maximum branching factor must be positive")]
    ZeroBranch,

    /// The stopping test never fired within the configured row ceiling.
    ///
    /// The recurrence has no proven termination bound for arbitrary
    /// inputs, so a ceiling converts a hang into a reportable error.
    #[error("stopping-point computation for hypothesis {hypothesis} exceeded {rows} rows")]
    Diverged {
        /// Hypothesis whose chain failed to resolve.
        hypothesis: usize,
        /// Row ceiling that was in effect.
        rows: usize,
    },

    /// Table or scratch storage could not be allocated.
    #[error("failed to allocate table storage")]
    Allocation(#[from] TryReserveError),
}

//! Closed-form significance schedule.
//!
//! The per-hypothesis thresholds follow equations (8) and (9) of the 2009
//! MDA Infocom paper: a geometric series whose total stays below the
//! per-node significance budget, so that running the stopping test once
//! per hypothesis never spends more than the whole budget.

/// Geometric decay applied to successive per-hypothesis significance
/// levels. Section III.B of the 2009 MDA paper finds 0.9 reasonable.
pub const DECAY: f64 = 0.9;

/// Per-node confidence required to reach `graph_confidence` across at
/// most `max_branch` load balancers (equation (10) of the paper).
///
/// `max_branch` must be positive; callers validate before invoking.
///
/// ```
/// use mda_bound::node_confidence;
///
/// assert!((node_confidence(0.95, 1) - 0.95).abs() < 1e-12);
/// assert!((node_confidence(0.95, 2) - 0.7763932023).abs() < 1e-9);
/// ```
pub fn node_confidence(graph_confidence: f64, max_branch: usize) -> f64 {
    1.0 - (1.0 - graph_confidence).powf(1.0 / max_branch as f64)
}

/// Populate `levels` with the thresholds `a_k` for every hypothesis the
/// slice covers. Entries 0 and 1 are dummies pinned to zero; entry 2 gets
/// `(1 - r) * confidence` and each later entry decays by `r`.
pub(crate) fn fill_levels(confidence: f64, levels: &mut [f64]) {
    let a2 = (1.0 - DECAY) * confidence;
    for (hypothesis, level) in levels.iter_mut().enumerate() {
        *level = match hypothesis {
            0 | 1 => 0.0,
            2 => a2,
            _ => a2 * DECAY.powi(hypothesis as i32 - 2),
        };
    }
}

//! Cross-checks the rolling diagonal build against an independent
//! reference that walks the full probe-indexed probability grid one
//! probe at a time. Both evaluate the same Markov chain with the same
//! floating-point expression shapes, so agreement is exact, not
//! approximate.

use mda_bound::{BoundTable, BoundTableBuilder};

/// Never needed in practice; catches a reference bug before it spins.
const REF_PROBE_CEILING: usize = 100_000;

/// Per-hypothesis thresholds, same closed form the table uses.
fn ref_levels(confidence: f64, max_hypothesis: usize) -> Vec<f64> {
    let a2 = (1.0 - 0.9) * confidence;
    (0..=max_hypothesis)
        .map(|h| match h {
            0 | 1 => 0.0,
            2 => a2,
            _ => a2 * 0.9f64.powi(h as i32 - 2),
        })
        .collect()
}

/// Stopping points and residual masses from a straightforward
/// probe-by-probe walk: `p[j]` is the probability of having seen `j`
/// distinct interfaces after `n` probes, columns absorbed as soon as a
/// smaller hypothesis resolves at that probe count.
fn ref_build(confidence: f64, max_hypothesis: usize) -> (Vec<usize>, Vec<f64>) {
    let levels = ref_levels(confidence, max_hypothesis);
    let mut nk = vec![0usize; max_hypothesis + 1];
    let mut failures = vec![0f64; max_hypothesis + 1];

    for h in 2..=max_hypothesis {
        let mut prev = vec![0f64; h + 1];
        let mut cur = vec![0f64; h + 1];
        prev[1] = 1.0;

        let mut n = 1;
        // One probe has been sent and one interface seen; test the seed
        // cell first, then advance probe by probe.
        if nk[h - 1] == 0 && prev[h - 1] <= levels[h] {
            nk[h] = n;
            failures[h] = prev[h - 1];
            continue;
        }
        loop {
            n += 1;
            assert!(n < REF_PROBE_CEILING, "reference diverged at h={h}");
            for j in 1..h {
                cur[j] = prev[j] * (j as f64 / h as f64)
                    + prev[j - 1] * ((h - j + 1) as f64 / h as f64);
                if j + 1 < h && nk[j + 1] != 0 && n >= nk[j + 1] {
                    cur[j] = 0.0;
                }
            }
            if n > nk[h - 1] && cur[h - 1] <= levels[h] {
                nk[h] = n;
                failures[h] = cur[h - 1];
                break;
            }
            std::mem::swap(&mut prev, &mut cur);
        }
    }
    (nk, failures)
}

fn assert_matches_reference(table: &BoundTable) {
    let (nk, failures) = ref_build(table.confidence(), table.max_hypothesis());
    assert_eq!(table.stopping_points(), &nk[..]);
    assert_eq!(table.failure_probabilities(), &failures[..]);
}

#[test]
fn node_significance_tables_match_the_reference() {
    for significance in [0.01, 0.05, 0.2] {
        let table = BoundTableBuilder::new()
            .node_significance(significance)
            .max_hypothesis(12)
            .build()
            .expect("build");
        assert_matches_reference(&table);
    }
}

#[test]
fn graph_confidence_table_matches_the_reference() {
    let table = BoundTable::new(0.95, 12, 8).expect("build");
    assert_matches_reference(&table);
}

#[test]
fn grown_table_matches_the_reference() {
    let mut table = BoundTableBuilder::new()
        .node_significance(0.05)
        .max_hypothesis(4)
        .build()
        .expect("build");
    table.grow(16).expect("grow");
    assert_matches_reference(&table);
}

#[cfg(feature = "heavy")]
#[test]
fn deep_table_matches_the_reference() {
    let table = BoundTableBuilder::new()
        .node_significance(0.05)
        .max_hypothesis(64)
        .build()
        .expect("build");
    assert_matches_reference(&table);
}

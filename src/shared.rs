//! Concurrent access to a bound table.
//!
//! Probing workers look stopping points up on the hot path while a
//! coordinator may grow the hypothesis range mid-session. The original
//! design had no guard here; this wrapper retrofits one. Growth happens
//! copy-on-write: the rebuild runs on a private clone and the grown table
//! is published in a single swap, so readers never observe a partially
//! grown table.

use std::sync::{Arc, RwLock};

use crate::error::BoundError;
use crate::table::BoundTable;

/// Cloneable handle to a bound table shared between probing workers and
/// a growth coordinator.
#[derive(Debug, Clone)]
pub struct SharedBoundTable {
    inner: Arc<RwLock<BoundTable>>,
}

impl SharedBoundTable {
    pub fn new(table: BoundTable) -> Self {
        Self {
            inner: Arc::new(RwLock::new(table)),
        }
    }

    /// See [`BoundTable::stopping_point`]; takes a read lock.
    pub fn stopping_point(&self, hypothesis: usize) -> usize {
        self.read(|table| table.stopping_point(hypothesis))
    }

    /// See [`BoundTable::checked_stopping_point`]; takes a read lock.
    pub fn checked_stopping_point(&self, hypothesis: usize) -> Option<usize> {
        self.read(|table| table.checked_stopping_point(hypothesis))
    }

    /// Largest hypothesis currently covered.
    pub fn max_hypothesis(&self) -> usize {
        self.read(|table| table.max_hypothesis())
    }

    /// Run `f` against a consistent snapshot of the table, for dumps and
    /// other multi-value reads.
    pub fn with_table<R>(&self, f: impl FnOnce(&BoundTable) -> R) -> R {
        self.read(f)
    }

    /// Extend coverage to `end`. The rebuild runs on a private copy with
    /// no lock held; the result is published only if it still extends
    /// whatever a concurrent grow installed in the meantime. A request
    /// already covered is a no-op.
    pub fn grow(&self, end: usize) -> Result<(), BoundError> {
        let mut copy = {
            let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
            if end <= guard.max_hypothesis() {
                return Ok(());
            }
            guard.clone()
        };
        copy.grow(end)?;
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if copy.max_hypothesis() > guard.max_hypothesis() {
            *guard = copy;
        }
        Ok(())
    }

    fn read<R>(&self, f: impl FnOnce(&BoundTable) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        f(&guard)
    }
}

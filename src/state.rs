//! Rolling buffers for the two live diagonals of the stopping-point grid.

use crate::error::BoundError;

/// Two same-length probability buffers: `prior` holds the last completed
/// diagonal, `current` the one being filled. After each probe increment
/// the roles are exchanged, never the contents.
#[derive(Debug, Clone)]
pub(crate) struct StateVectors {
    pub(crate) prior: Vec<f64>,
    pub(crate) current: Vec<f64>,
}

impl StateVectors {
    pub(crate) fn new(len: usize) -> Result<Self, BoundError> {
        let mut vectors = Self {
            prior: Vec::new(),
            current: Vec::new(),
        };
        vectors.try_grow(len)?;
        Ok(vectors)
    }

    /// Extend both buffers to `len` cells, zero-filling the new tail.
    /// Nothing is touched if the reservation fails.
    pub(crate) fn try_grow(&mut self, len: usize) -> Result<(), BoundError> {
        if len > self.prior.len() {
            let extra = len - self.prior.len();
            self.prior.try_reserve_exact(extra)?;
            self.current.try_reserve_exact(extra)?;
            self.prior.resize(len, 0.0);
            self.current.resize(len, 0.0);
        }
        Ok(())
    }

    /// Zero both diagonals and seed the certain state "1 probe sent,
    /// 1 distinct interface observed".
    pub(crate) fn reset(&mut self) {
        self.prior.fill(0.0);
        self.current.fill(0.0);
        if let Some(seed) = self.current.get_mut(1) {
            *seed = 1.0;
        }
    }

    pub(crate) fn swap(&mut self) {
        std::mem::swap(&mut self.prior, &mut self.current);
    }
}

//! Flow identifiers correlating in-flight probes with responses.
//!
//! The discovery engine varies a flow identifier to steer probes across
//! load-balanced paths; this record is the bookkeeping it keeps per
//! identifier. Plain value type, no lifecycle of its own.

/// Where a flow identifier sits in the probing lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowState {
    /// Known to reach the hop under test and free for reuse.
    Available,
    /// Consumed by a finished measurement.
    Unavailable,
    /// A probe carrying this identifier is in flight.
    Testing,
    /// The probe for this identifier went unanswered.
    Timeout,
}

/// A flow identifier together with its probing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MdaFlow {
    pub flow_id: u64,
    pub state: FlowState,
}

impl MdaFlow {
    pub fn new(flow_id: u64, state: FlowState) -> Self {
        Self { flow_id, state }
    }
}

//! Stopping-rule bound tables for multipath route discovery.
//!
//! A Paris-traceroute-style prober that meets a load-balancing router
//! must decide how many probes to send before concluding, at a target
//! confidence, that every outgoing interface has been seen. This crate
//! computes those minimum probe counts ("stopping points") with the
//! dynamic program from the Multipath Detection Algorithm papers: an
//! absorbing coupon-collector Markov chain evaluated along anti-diagonals
//! of the (probes sent, interfaces seen) grid, one chain per hypothesis,
//! each chain reusing the stopping points of the smaller hypotheses.
//!
//! ## Quick start
//! ```
//! use mda_bound::BoundTable;
//!
//! // Graph-wide confidence 0.95, hypotheses up to 16 interfaces, at most
//! // one load balancer assumed on the path.
//! let mut table = BoundTable::new(0.95, 16, 1).unwrap();
//!
//! // More interfaces always require at least as many probes.
//! assert!(table.stopping_point(3) > table.stopping_point(2));
//!
//! // A router turned out to have more interfaces than anticipated:
//! // extend coverage without discarding what was already built.
//! table.grow(24).unwrap();
//! assert!(table.stopping_point(24) > table.stopping_point(16));
//! ```
//!
//! Probing workers that share a table with a growth coordinator should
//! use [`SharedBoundTable`], which publishes growth atomically.

pub mod builder;
pub mod error;
pub mod flow;
pub mod shared;
pub mod significance;
mod state;
pub mod table;

pub use crate::builder::BoundTableBuilder;
pub use crate::error::BoundError;
pub use crate::flow::{FlowState, MdaFlow};
pub use crate::shared::SharedBoundTable;
pub use crate::significance::node_confidence;
pub use crate::table::BoundTable;

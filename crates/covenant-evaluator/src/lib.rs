//! Covenant Evaluator — the alignment scoring core.
//!
//! Ingests behavioral events into a bounded per-(agent, principal) sliding
//! window, aggregates cooperation/defection/novelty, advances the alignment
//! score E and independence score I by coupled discretized update rules,
//! classifies the agent into an operational band, and gates proposed
//! actions on that band.
//!
//! Invariants this crate maintains:
//! - E always in [0, 1] and I always in [0, i_max], enforced by silent
//!   clamping after every update — updates are never rejected.
//! - E = 0 is absorbing: the multiplicative update cannot move a fully
//!   misaligned agent without an exogenous reset.
//! - Effective weights are derived from immutable event fields on demand,
//!   never persisted.
//! - The band is recomputed from E; it is never independent state.
//! - The evaluation path is synchronous and deterministic: no randomness,
//!   no I/O, no async.

#![deny(unsafe_code)]

pub mod evaluator;
pub mod gate;
pub mod metrics;
pub mod snapshot;
pub mod state;
pub mod weighting;

pub use evaluator::{EvaluationResult, Evaluator};
pub use gate::{check_action, ActionRequest, GateDecision};
pub use metrics::WindowMetrics;
pub use snapshot::{StateExport, StateSnapshot};
pub use state::AgentState;
pub use weighting::{distrust_penalty, effective_weight, weigh, WeightBreakdown};

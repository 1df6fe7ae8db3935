//! Covenant Replay — drift regression harness for the evaluator.
//!
//! Two kinds of scenario:
//! - **Deterministic**: a fixed event sequence replayed many times; every
//!   run must end with bit-identical scores, and the finals are checked
//!   against expected values. A mid-sequence snapshot/restore pass must
//!   land on the same bits as an uninterrupted run.
//! - **Statistical**: seeded random event streams; the mean final scores
//!   across iterations must land inside configured bounds. All randomness
//!   lives in the harness, never in the evaluation path, so a seed fully
//!   reproduces a run.
//!
//! Scenarios are plain serde structs and can be loaded from JSON files
//! checked in next to the code they guard.

#![deny(unsafe_code)]

pub mod runner;
pub mod scenario;

pub use runner::{ReplayError, ReplayReport, ReplayRunner, ScenarioReport};
pub use scenario::{
    DeterministicScenario, ExpectedOutcome, ScenarioEvent, StatisticalBounds, StatisticalScenario,
};

//! Covenant Types — alignment events, bands, and evaluator configuration.
//!
//! Pure data definitions shared by the evaluation core, the state store,
//! and the replay harness. No engine logic lives here.
//!
//! Design rules carried by these types:
//! - Events are immutable once constructed and validated at construction;
//!   the effective weight is always derived, never persisted.
//! - The band is a pure function of the alignment score, never stored.
//! - All tunable parameters travel in an explicit [`EvaluatorConfig`];
//!   there is no process-wide mutable registry.

#![deny(unsafe_code)]

pub mod band;
pub mod config;
pub mod error;
pub mod event;

pub use band::{Band, BandThresholds};
pub use config::{EvaluatorConfig, WeightTable};
pub use error::{ConfigError, ValidationError};
pub use event::{AlignmentEvent, Direction, EventId, Reversibility, RiskFlags, Stakes};

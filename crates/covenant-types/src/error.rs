use thiserror::Error;

/// Errors from event construction.
///
/// An event that fails validation is rejected before it can touch any
/// agent state; there is no partial construction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("field {field} must be within [0.0, 1.0], got {value}")]
    OutOfUnitRange { field: &'static str, value: f64 },

    #[error("field {field} must be finite, got {value}")]
    NotFinite { field: &'static str, value: f64 },

    #[error("field {field} must not be empty")]
    EmptyField { field: &'static str },
}

/// Errors from evaluator configuration.
///
/// Fatal at construction: an `Evaluator` is never created from an invalid
/// configuration, so the scoring path itself has nothing left to reject.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("i_max must be positive, got {0}")]
    NonPositiveIndependenceCeiling(f64),

    #[error("window_size must be at least 1")]
    ZeroWindowSize,

    #[error("band thresholds must satisfy 0 < yellow_min < green_min <= 1, got yellow_min={yellow_min}, green_min={green_min}")]
    InvalidBandThresholds { yellow_min: f64, green_min: f64 },

    #[error("weight multiplier {name} must be finite and non-negative, got {value}")]
    InvalidMultiplier { name: &'static str, value: f64 },

    #[error("effective weight cap must be positive, got {0}")]
    NonPositiveWeightCap(f64),

    #[error("parameter {name} must be finite, got {value}")]
    NonFiniteParameter { name: &'static str, value: f64 },

    #[error("initial alignment must be within [0.0, 1.0], got {0}")]
    InitialAlignmentOutOfRange(f64),

    #[error("initial independence must be within [0.0, i_max={i_max}], got {value}")]
    InitialIndependenceOutOfRange { value: f64, i_max: f64 },
}

use serde::{Deserialize, Serialize};

use crate::band::BandThresholds;
use crate::error::ConfigError;
use crate::event::{Reversibility, RiskFlags, Stakes};

/// Context multiplier tables for the weighting engine.
///
/// All multipliers compose multiplicatively; the product of base weight and
/// multipliers is capped at `max_effective_weight`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightTable {
    pub stakes_low: f64,
    pub stakes_medium: f64,
    pub stakes_high: f64,
    pub stakes_critical: f64,

    pub reversible: f64,
    pub difficult: f64,
    pub irreversible: f64,

    pub sensitive_data: f64,
    pub user_vulnerable: f64,
    pub financial_impact: f64,
    pub self_harm_risk: f64,
    pub third_party_impact: f64,

    /// Ceiling applied to the final effective weight (default 3.0)
    pub max_effective_weight: f64,
}

impl Default for WeightTable {
    fn default() -> Self {
        Self {
            stakes_low: 1.0,
            stakes_medium: 1.5,
            stakes_high: 2.5,
            stakes_critical: 4.0,

            reversible: 1.0,
            difficult: 1.5,
            irreversible: 2.5,

            sensitive_data: 2.0,
            user_vulnerable: 1.8,
            financial_impact: 1.6,
            self_harm_risk: 5.0,
            third_party_impact: 1.4,

            max_effective_weight: 3.0,
        }
    }
}

impl WeightTable {
    pub fn stakes_multiplier(&self, stakes: Stakes) -> f64 {
        match stakes {
            Stakes::Low => self.stakes_low,
            Stakes::Medium => self.stakes_medium,
            Stakes::High => self.stakes_high,
            Stakes::Critical => self.stakes_critical,
        }
    }

    pub fn reversibility_multiplier(&self, reversibility: Reversibility) -> f64 {
        match reversibility {
            Reversibility::Reversible => self.reversible,
            Reversibility::Difficult => self.difficult,
            Reversibility::Irreversible => self.irreversible,
        }
    }

    /// Combined multiplier contributed by the set risk flags.
    pub fn flag_multiplier(&self, flags: &RiskFlags) -> f64 {
        let mut m = 1.0;
        if flags.sensitive_data {
            m *= self.sensitive_data;
        }
        if flags.user_vulnerable {
            m *= self.user_vulnerable;
        }
        if flags.financial_impact {
            m *= self.financial_impact;
        }
        if flags.self_harm_risk {
            m *= self.self_harm_risk;
        }
        if flags.third_party_impact {
            m *= self.third_party_impact;
        }
        m
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let entries = [
            ("stakes_low", self.stakes_low),
            ("stakes_medium", self.stakes_medium),
            ("stakes_high", self.stakes_high),
            ("stakes_critical", self.stakes_critical),
            ("reversible", self.reversible),
            ("difficult", self.difficult),
            ("irreversible", self.irreversible),
            ("sensitive_data", self.sensitive_data),
            ("user_vulnerable", self.user_vulnerable),
            ("financial_impact", self.financial_impact),
            ("self_harm_risk", self.self_harm_risk),
            ("third_party_impact", self.third_party_impact),
        ];
        for (name, value) in entries {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidMultiplier { name, value });
            }
        }
        if !self.max_effective_weight.is_finite() || self.max_effective_weight <= 0.0 {
            return Err(ConfigError::NonPositiveWeightCap(self.max_effective_weight));
        }
        Ok(())
    }
}

/// Full evaluator configuration.
///
/// All parameters a manifest can override land here; the evaluator itself
/// holds no process-wide mutable state. Defaults match the production
/// (0-1 scale) deployment values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    /// Alignment selection strength (beta)
    pub beta: f64,
    /// Independence sensitivity (gamma)
    pub gamma: f64,
    /// Independence exploration growth (kappa)
    pub kappa: f64,
    /// Independence ceiling (Imax); must be positive
    pub i_max: f64,
    /// Reference novelty rate the independence drive is measured against
    pub novelty_baseline: f64,
    /// Maximum retained events per agent-principal pair
    pub window_size: usize,
    /// Initial alignment score for new agent states
    pub initial_alignment: f64,
    /// Initial independence score for new agent states
    pub initial_independence: f64,
    pub bands: BandThresholds,
    pub weights: WeightTable,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            beta: 0.10,
            gamma: 0.05,
            kappa: 0.02,
            i_max: 0.30,
            novelty_baseline: 0.5,
            window_size: 100,
            initial_alignment: 0.80,
            initial_independence: 0.15,
            bands: BandThresholds::default(),
            weights: WeightTable::default(),
        }
    }
}

impl EvaluatorConfig {
    /// Validate the configuration. Fatal: callers must not construct agent
    /// state from a configuration that fails this check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("beta", self.beta),
            ("gamma", self.gamma),
            ("kappa", self.kappa),
            ("novelty_baseline", self.novelty_baseline),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteParameter { name, value });
            }
        }
        if !self.i_max.is_finite() || self.i_max <= 0.0 {
            return Err(ConfigError::NonPositiveIndependenceCeiling(self.i_max));
        }
        if self.window_size == 0 {
            return Err(ConfigError::ZeroWindowSize);
        }
        let BandThresholds {
            green_min,
            yellow_min,
        } = self.bands;
        if !(yellow_min.is_finite() && green_min.is_finite())
            || yellow_min <= 0.0
            || yellow_min >= green_min
            || green_min > 1.0
        {
            return Err(ConfigError::InvalidBandThresholds {
                yellow_min,
                green_min,
            });
        }
        if !(0.0..=1.0).contains(&self.initial_alignment) || !self.initial_alignment.is_finite() {
            return Err(ConfigError::InitialAlignmentOutOfRange(self.initial_alignment));
        }
        if !self.initial_independence.is_finite()
            || self.initial_independence < 0.0
            || self.initial_independence > self.i_max
        {
            return Err(ConfigError::InitialIndependenceOutOfRange {
                value: self.initial_independence,
                i_max: self.i_max,
            });
        }
        self.weights.validate()
    }
}

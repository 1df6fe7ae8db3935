use covenant_types::{
    AlignmentEvent, Band, Direction, Reversibility, RiskFlags, Stakes, ValidationError,
};
use serde::{Deserialize, Serialize};

/// One event in a scripted scenario.
///
/// Identity and timestamps are filled in by the runner; only the fields
/// that influence scoring are scripted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScenarioEvent {
    pub direction: Direction,
    pub base_weight: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_stakes")]
    pub stakes: Stakes,
    #[serde(default = "default_reversibility")]
    pub reversibility: Reversibility,
    #[serde(default)]
    pub flags: RiskFlags,
    #[serde(default = "default_epistemic")]
    pub verifiability: f64,
    #[serde(default = "default_epistemic")]
    pub confidence: f64,
}

fn default_stakes() -> Stakes {
    Stakes::Low
}

fn default_reversibility() -> Reversibility {
    Reversibility::Reversible
}

fn default_epistemic() -> f64 {
    0.7
}

impl ScenarioEvent {
    /// Materialize into a validated event for the given identity pair.
    pub fn materialize(
        &self,
        agent_id: &str,
        principal_id: &str,
    ) -> Result<AlignmentEvent, ValidationError> {
        AlignmentEvent::new(
            agent_id,
            principal_id,
            self.direction,
            self.category.clone().unwrap_or_else(|| "SCENARIO".into()),
            "replay-harness",
            self.base_weight,
        )?
        .with_context(self.stakes, self.reversibility, self.flags)
        .with_epistemics(self.verifiability, self.confidence)
    }
}

/// Expected final scores of a deterministic run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExpectedOutcome {
    #[serde(default)]
    pub e_final: Option<f64>,
    #[serde(default)]
    pub i_final: Option<f64>,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default)]
    pub band_final: Option<Band>,
}

fn default_tolerance() -> f64 {
    1e-9
}

/// A fixed event sequence with exact reproducibility requirements.
///
/// Run `iterations` times from the same initial state; every run must end
/// with bit-identical scores, and the first run is additionally checked
/// against the expected finals (within tolerance).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeterministicScenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Override the configured initial alignment for this scenario
    #[serde(default)]
    pub initial_alignment: Option<f64>,
    #[serde(default)]
    pub initial_independence: Option<f64>,
    #[serde(default = "default_dt")]
    pub dt: f64,
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    pub events: Vec<ScenarioEvent>,
    pub expected: ExpectedOutcome,
}

fn default_dt() -> f64 {
    1.0
}

fn default_iterations() -> usize {
    100
}

/// Bounds on the mean final scores of a randomized run set.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatisticalBounds {
    pub e_mean_min: f64,
    pub e_mean_max: f64,
    #[serde(default)]
    pub i_mean_min: Option<f64>,
    #[serde(default)]
    pub i_mean_max: Option<f64>,
}

/// A randomized event stream with statistical validation.
///
/// Event generation is driven by a seeded RNG in the harness; the core
/// evaluation path stays deterministic. The same seed always reproduces
/// the same stream.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatisticalScenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub seed: u64,
    /// Probability that a generated event is cooperation (the remainder
    /// is defection)
    pub cooperation_rate: f64,
    /// Probability that a generated event is novelty instead of either
    #[serde(default)]
    pub novelty_rate: f64,
    pub events_per_run: usize,
    #[serde(default = "default_stat_iterations")]
    pub iterations: usize,
    /// Base weight range for generated events
    #[serde(default = "default_weight_range")]
    pub weight_range: (f64, f64),
    #[serde(default = "default_dt")]
    pub dt: f64,
    pub expected: StatisticalBounds,
}

fn default_stat_iterations() -> usize {
    10
}

fn default_weight_range() -> (f64, f64) {
    (0.2, 0.9)
}

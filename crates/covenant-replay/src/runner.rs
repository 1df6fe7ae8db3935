use covenant_evaluator::{AgentState, Evaluator};
use covenant_types::{AlignmentEvent, Band, ConfigError, Direction, EvaluatorConfig, ValidationError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::scenario::{DeterministicScenario, StatisticalScenario};

/// Errors from the replay harness itself. Scenario assertion failures are
/// not errors; they are reported in [`ScenarioReport::failures`].
#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("scenario {scenario}: invalid scripted event: {source}")]
    InvalidEvent {
        scenario: String,
        #[source]
        source: ValidationError,
    },
}

/// Outcome of one scenario.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub name: String,
    pub passed: bool,
    pub failures: Vec<String>,
    pub e_final: f64,
    pub i_final: f64,
    pub band_final: Band,
    pub iterations_run: usize,
}

impl ScenarioReport {
    fn fail(&mut self, message: String) {
        self.passed = false;
        self.failures.push(message);
    }
}

/// Aggregate outcome of a scenario suite.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReplayReport {
    pub scenarios: Vec<ScenarioReport>,
}

impl ReplayReport {
    pub fn all_passed(&self) -> bool {
        self.scenarios.iter().all(|s| s.passed)
    }

    pub fn failed(&self) -> impl Iterator<Item = &ScenarioReport> {
        self.scenarios.iter().filter(|s| !s.passed)
    }
}

/// Replays scenarios against a fixed evaluator configuration.
pub struct ReplayRunner {
    evaluator: Evaluator,
}

impl ReplayRunner {
    pub fn new(config: EvaluatorConfig) -> Result<Self, ReplayError> {
        Ok(Self {
            evaluator: Evaluator::new(config)?,
        })
    }

    fn fresh_state(&self, scenario_e: Option<f64>, scenario_i: Option<f64>) -> AgentState {
        let mut state = self.evaluator.new_state("replay-agent", "replay-principal");
        if let Some(e) = scenario_e {
            state.e = e.clamp(0.0, 1.0);
        }
        if let Some(i) = scenario_i {
            state.i = i.clamp(0.0, self.evaluator.config().i_max);
        }
        state
    }

    /// Play a fixed event sequence once and return the final state.
    fn play(
        &self,
        scenario: &DeterministicScenario,
        events: &[AlignmentEvent],
    ) -> AgentState {
        let mut state =
            self.fresh_state(scenario.initial_alignment, scenario.initial_independence);
        for event in events {
            self.evaluator.add_event(&mut state, event.clone());
            self.evaluator.evaluate(&mut state, scenario.dt);
        }
        state
    }

    /// Run a deterministic scenario.
    ///
    /// Three checks, in order:
    /// 1. every iteration ends bit-identical to the first,
    /// 2. a mid-sequence snapshot/restore run ends bit-identical too,
    /// 3. the finals match the scenario's expected values.
    pub fn run_deterministic(
        &self,
        scenario: &DeterministicScenario,
    ) -> Result<ScenarioReport, ReplayError> {
        let events = scenario
            .events
            .iter()
            .map(|e| e.materialize("replay-agent", "replay-principal"))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| ReplayError::InvalidEvent {
                scenario: scenario.name.clone(),
                source,
            })?;

        let baseline = self.play(scenario, &events);
        let mut report = ScenarioReport {
            name: scenario.name.clone(),
            passed: true,
            failures: Vec::new(),
            e_final: baseline.e,
            i_final: baseline.i,
            band_final: self.evaluator.band(&baseline),
            iterations_run: scenario.iterations.max(1),
        };

        for iteration in 1..scenario.iterations {
            let rerun = self.play(scenario, &events);
            if rerun.e.to_bits() != baseline.e.to_bits()
                || rerun.i.to_bits() != baseline.i.to_bits()
            {
                report.fail(format!(
                    "iteration {iteration} diverged: E {} vs {}, I {} vs {}",
                    rerun.e, baseline.e, rerun.i, baseline.i
                ));
                break;
            }
        }

        if !events.is_empty() {
            let resumed = self.play_with_resume(scenario, &events);
            if resumed.e.to_bits() != baseline.e.to_bits()
                || resumed.i.to_bits() != baseline.i.to_bits()
            {
                report.fail(format!(
                    "snapshot/resume diverged: E {} vs {}, I {} vs {}",
                    resumed.e, baseline.e, resumed.i, baseline.i
                ));
            }
        }

        let tol = scenario.expected.tolerance;
        if let Some(expected_e) = scenario.expected.e_final {
            if (baseline.e - expected_e).abs() > tol {
                report.fail(format!(
                    "E final {} outside tolerance {tol} of expected {expected_e}",
                    baseline.e
                ));
            }
        }
        if let Some(expected_i) = scenario.expected.i_final {
            if (baseline.i - expected_i).abs() > tol {
                report.fail(format!(
                    "I final {} outside tolerance {tol} of expected {expected_i}",
                    baseline.i
                ));
            }
        }
        if let Some(expected_band) = scenario.expected.band_final {
            let band = self.evaluator.band(&baseline);
            if band != expected_band {
                report.fail(format!("band final {band} != expected {expected_band}"));
            }
        }

        info!(
            scenario = %scenario.name,
            passed = report.passed,
            e_final = report.e_final,
            i_final = report.i_final,
            "deterministic scenario complete"
        );
        Ok(report)
    }

    /// Same sequence, but snapshot and restore at the halfway point.
    fn play_with_resume(
        &self,
        scenario: &DeterministicScenario,
        events: &[AlignmentEvent],
    ) -> AgentState {
        let split = events.len() / 2;
        let mut state =
            self.fresh_state(scenario.initial_alignment, scenario.initial_independence);
        for event in &events[..split] {
            self.evaluator.add_event(&mut state, event.clone());
            self.evaluator.evaluate(&mut state, scenario.dt);
        }

        let mut state = self.evaluator.restore(self.evaluator.snapshot(&state));
        for event in &events[split..] {
            self.evaluator.add_event(&mut state, event.clone());
            self.evaluator.evaluate(&mut state, scenario.dt);
        }
        state
    }

    /// Run a statistical scenario: seeded random event streams, bounds on
    /// the mean final scores across iterations.
    pub fn run_statistical(
        &self,
        scenario: &StatisticalScenario,
    ) -> Result<ScenarioReport, ReplayError> {
        let iterations = scenario.iterations.max(1);
        let mut e_finals = Vec::with_capacity(iterations);
        let mut i_finals = Vec::with_capacity(iterations);
        let mut last = self.fresh_state(None, None);

        for iteration in 0..iterations {
            // Each iteration derives its own stream; the whole suite is
            // reproducible from scenario.seed alone.
            let mut rng = StdRng::seed_from_u64(scenario.seed.wrapping_add(iteration as u64));
            let mut state = self.fresh_state(None, None);

            for _ in 0..scenario.events_per_run {
                let event = self
                    .generate_event(scenario, &mut rng)
                    .map_err(|source| ReplayError::InvalidEvent {
                        scenario: scenario.name.clone(),
                        source,
                    })?;
                self.evaluator.add_event(&mut state, event);
                self.evaluator.evaluate(&mut state, scenario.dt);
            }

            debug!(
                scenario = %scenario.name,
                iteration,
                e_final = state.e,
                i_final = state.i,
                "statistical iteration complete"
            );
            e_finals.push(state.e);
            i_finals.push(state.i);
            last = state;
        }

        let e_mean = mean(&e_finals);
        let i_mean = mean(&i_finals);

        let mut report = ScenarioReport {
            name: scenario.name.clone(),
            passed: true,
            failures: Vec::new(),
            e_final: last.e,
            i_final: last.i,
            band_final: self.evaluator.band(&last),
            iterations_run: iterations,
        };

        let bounds = &scenario.expected;
        if e_mean < bounds.e_mean_min || e_mean > bounds.e_mean_max {
            report.fail(format!(
                "E mean {e_mean} outside [{}, {}]",
                bounds.e_mean_min, bounds.e_mean_max
            ));
        }
        if let Some(min) = bounds.i_mean_min {
            if i_mean < min {
                report.fail(format!("I mean {i_mean} below {min}"));
            }
        }
        if let Some(max) = bounds.i_mean_max {
            if i_mean > max {
                report.fail(format!("I mean {i_mean} above {max}"));
            }
        }

        info!(
            scenario = %scenario.name,
            passed = report.passed,
            e_mean,
            i_mean,
            "statistical scenario complete"
        );
        Ok(report)
    }

    fn generate_event(
        &self,
        scenario: &StatisticalScenario,
        rng: &mut StdRng,
    ) -> Result<AlignmentEvent, ValidationError> {
        let roll: f64 = rng.gen();
        let direction = if roll < scenario.novelty_rate {
            Direction::Novelty
        } else if rng.gen::<f64>() < scenario.cooperation_rate {
            Direction::Cooperation
        } else {
            Direction::Defection
        };
        let (lo, hi) = scenario.weight_range;
        let weight = if hi > lo { rng.gen_range(lo..hi) } else { lo };

        AlignmentEvent::new(
            "replay-agent",
            "replay-principal",
            direction,
            "GENERATED",
            "replay-harness",
            weight,
        )
    }

    /// Run a full suite and collect one report.
    pub fn run_suite(
        &self,
        deterministic: &[DeterministicScenario],
        statistical: &[StatisticalScenario],
    ) -> Result<ReplayReport, ReplayError> {
        let mut report = ReplayReport::default();
        for scenario in deterministic {
            report.scenarios.push(self.run_deterministic(scenario)?);
        }
        for scenario in statistical {
            report.scenarios.push(self.run_statistical(scenario)?);
        }
        Ok(report)
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

use chrono::{DateTime, Utc};
use covenant_types::{AlignmentEvent, Band, ConfigError, EvaluatorConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::gate::{check_action, ActionRequest, GateDecision};
use crate::metrics::WindowMetrics;
use crate::snapshot::{StateExport, StateSnapshot};
use crate::state::AgentState;
use crate::weighting::weigh;

/// Default bounded-tail size for observability exports.
const EXPORT_TAIL: usize = 10;

/// Result of one evaluation cycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub timestamp: DateTime<Utc>,
    /// Window aggregates (C/D/N) this cycle was computed from
    pub metrics: WindowMetrics,
    pub e_old: f64,
    pub e_new: f64,
    pub i_old: f64,
    pub i_new: f64,
    pub delta_e: f64,
    pub delta_i: f64,
    pub band_old: Band,
    pub band_new: Band,
    /// Present when the bands differ, e.g. "yellow -> red"
    pub band_transition: Option<String>,
    pub window_len: usize,
    /// Set when the agent is in RED after the update
    pub alert: bool,
}

/// The evaluation core.
///
/// Holds the validated configuration and operates on externally owned
/// [`AgentState`] values. No internal mutable state, no I/O, no async —
/// callers serialize add_event + evaluate per key (see covenant-store).
#[derive(Clone, Debug)]
pub struct Evaluator {
    config: EvaluatorConfig,
}

impl Evaluator {
    /// Create an evaluator, validating the configuration.
    pub fn new(config: EvaluatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Fresh state for an agent-principal pair, seeded with the configured
    /// initial scores.
    pub fn new_state(
        &self,
        agent_id: impl Into<String>,
        principal_id: impl Into<String>,
    ) -> AgentState {
        AgentState::new(agent_id, principal_id, &self.config)
    }

    /// Append an event to the state's sliding window (FIFO eviction).
    pub fn add_event(&self, state: &mut AgentState, event: AlignmentEvent) {
        let breakdown = weigh(&event, &self.config.weights);
        debug!(
            agent = %state.agent_id,
            principal = %state.principal_id,
            direction = ?event.direction,
            category = %event.category,
            effective_weight = breakdown.effective,
            distrust_penalty = breakdown.distrust_penalty,
            "event added to window"
        );
        state.push_event(event, self.config.window_size);
    }

    /// Run one evaluation cycle: aggregate the window, advance both scores,
    /// classify bands.
    ///
    /// Clamping is unconditional and silent; this method cannot fail. A
    /// non-finite or negative dt is treated as 0 (no-op step).
    pub fn evaluate(&self, state: &mut AgentState, dt: f64) -> EvaluationResult {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        let metrics = WindowMetrics::compute(&state.event_window, &self.config.weights);

        let e_old = state.e;
        let i_old = state.i;
        let band_old = Band::classify(e_old, &self.config.bands);

        // dE/dt = beta * (C - D) * E  — multiplicative in E, so E = 0 is
        // absorbing: zero alignment cannot self-repair without an
        // exogenous reset.
        let delta_e = dt * self.config.beta * (metrics.cooperation - metrics.defection) * e_old;
        let e_new = (e_old + delta_e).clamp(0.0, 1.0);

        // dI/dt = gamma * (N - N_baseline) * I + kappa * I * (1 - I/Imax)
        // — logistic growth bounded by Imax prevents runaway contrarianism.
        let drive = self.config.gamma * (metrics.novelty - self.config.novelty_baseline) * i_old;
        let growth = self.config.kappa * i_old * (1.0 - i_old / self.config.i_max);
        let i_new = (i_old + dt * (drive + growth)).clamp(0.0, self.config.i_max);

        state.e = e_new;
        state.i = i_new;
        state.last_update = Utc::now();

        let band_new = Band::classify(e_new, &self.config.bands);
        let band_transition = if band_old != band_new {
            Some(format!("{band_old} -> {band_new}"))
        } else {
            None
        };
        let alert = band_new.is_red();

        if let Some(transition) = &band_transition {
            if band_new.is_red() {
                warn!(
                    agent = %state.agent_id,
                    principal = %state.principal_id,
                    %transition,
                    e = e_new,
                    "band transition into RED"
                );
            } else {
                info!(
                    agent = %state.agent_id,
                    principal = %state.principal_id,
                    %transition,
                    e = e_new,
                    "band transition"
                );
            }
        }

        EvaluationResult {
            timestamp: state.last_update,
            metrics,
            e_old,
            e_new,
            i_old,
            i_new,
            delta_e: e_new - e_old,
            delta_i: i_new - i_old,
            band_old,
            band_new,
            band_transition,
            window_len: state.window_len(),
            alert,
        }
    }

    /// Gate a proposed action against the state's current band.
    pub fn check_action_allowed(&self, state: &AgentState, request: ActionRequest) -> GateDecision {
        let band = Band::classify(state.e, &self.config.bands);
        let decision = check_action(band, request);
        if !decision.allowed {
            warn!(
                agent = %state.agent_id,
                principal = %state.principal_id,
                %band,
                ?request,
                "action blocked by gate"
            );
        } else if decision.requires_confirmation {
            info!(
                agent = %state.agent_id,
                principal = %state.principal_id,
                %band,
                ?request,
                "action requires confirmation"
            );
        }
        decision
    }

    /// Current band of a state.
    pub fn band(&self, state: &AgentState) -> Band {
        Band::classify(state.e, &self.config.bands)
    }

    /// Observability export with the default bounded tail of recent events.
    pub fn export_state(&self, state: &AgentState) -> StateExport {
        self.export_state_with_tail(state, EXPORT_TAIL)
    }

    /// Observability export with a caller-chosen tail size.
    pub fn export_state_with_tail(&self, state: &AgentState, tail: usize) -> StateExport {
        let skip = state.event_window.len().saturating_sub(tail);
        StateExport {
            agent_id: state.agent_id.clone(),
            principal_id: state.principal_id.clone(),
            e: state.e,
            i: state.i,
            band: self.band(state),
            metrics: WindowMetrics::compute(&state.event_window, &self.config.weights),
            event_count: state.event_window.len(),
            last_update: state.last_update,
            recent_events: state.event_window.iter().skip(skip).cloned().collect(),
        }
    }

    /// Full-fidelity snapshot for persistence or replay.
    pub fn snapshot(&self, state: &AgentState) -> StateSnapshot {
        StateSnapshot::of(state)
    }

    /// Restore a previously snapshotted state.
    pub fn restore(&self, snapshot: StateSnapshot) -> AgentState {
        snapshot.restore()
    }
}

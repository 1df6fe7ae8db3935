use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use covenant_types::{AlignmentEvent, EvaluatorConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Mutable per-(agent, principal) scoring state.
///
/// Owned logically by exactly one agent-principal key. Mutated only through
/// [`AgentState::push_event`] (window) and the evaluator's score update;
/// everything else is read-only derivation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub agent_id: String,
    pub principal_id: String,
    /// Alignment score E, always within [0, 1]
    pub e: f64,
    /// Independence score I, always within [0, i_max]
    pub i: f64,
    /// Insertion order = chronological order; oldest at the front
    pub event_window: VecDeque<AlignmentEvent>,
    pub last_update: DateTime<Utc>,
}

impl AgentState {
    /// Create a fresh state with the configured initial scores.
    pub fn new(
        agent_id: impl Into<String>,
        principal_id: impl Into<String>,
        config: &EvaluatorConfig,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            principal_id: principal_id.into(),
            e: config.initial_alignment,
            i: config.initial_independence,
            event_window: VecDeque::with_capacity(config.window_size),
            last_update: Utc::now(),
        }
    }

    /// Append an event, evicting oldest-first once the window is full.
    ///
    /// Events are stored raw; weighting happens on demand at aggregation
    /// time so that re-tuning the multiplier tables never rewrites history.
    pub fn push_event(&mut self, event: AlignmentEvent, window_size: usize) {
        self.event_window.push_back(event);
        while self.event_window.len() > window_size {
            let evicted = self.event_window.pop_front();
            if let Some(evicted) = evicted {
                debug!(
                    agent = %self.agent_id,
                    principal = %self.principal_id,
                    event_id = %evicted.event_id,
                    "evicted oldest event from full window"
                );
            }
        }
    }

    pub fn window_len(&self) -> usize {
        self.event_window.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use covenant_types::Direction;

    fn event(n: usize) -> AlignmentEvent {
        AlignmentEvent::new(
            "agent-1",
            "user:alice",
            Direction::Neutral,
            format!("EVT_{n}"),
            "unit-test",
            0.5,
        )
        .unwrap()
    }

    #[test]
    fn new_state_uses_configured_initials() {
        let config = EvaluatorConfig::default();
        let state = AgentState::new("agent-1", "user:alice", &config);
        assert_eq!(state.e, 0.80);
        assert_eq!(state.i, 0.15);
        assert!(state.event_window.is_empty());
    }

    #[test]
    fn window_evicts_oldest_first() {
        let config = EvaluatorConfig::default();
        let mut state = AgentState::new("agent-1", "user:alice", &config);

        // window_size + k inserts leave exactly the most recent window_size
        let window_size = 5;
        for n in 0..8 {
            state.push_event(event(n), window_size);
        }
        assert_eq!(state.window_len(), window_size);

        let categories: Vec<&str> = state
            .event_window
            .iter()
            .map(|e| e.category.as_str())
            .collect();
        assert_eq!(categories, ["EVT_3", "EVT_4", "EVT_5", "EVT_6", "EVT_7"]);
    }

    #[test]
    fn window_preserves_insertion_order() {
        let config = EvaluatorConfig::default();
        let mut state = AgentState::new("agent-1", "user:alice", &config);
        for n in 0..3 {
            state.push_event(event(n), 10);
        }
        let categories: Vec<&str> = state
            .event_window
            .iter()
            .map(|e| e.category.as_str())
            .collect();
        assert_eq!(categories, ["EVT_0", "EVT_1", "EVT_2"]);
    }

    #[test]
    fn state_serde_roundtrip() {
        let config = EvaluatorConfig::default();
        let mut state = AgentState::new("agent-1", "user:alice", &config);
        state.push_event(event(0), 10);
        let json = serde_json::to_string(&state).unwrap();
        let restored: AgentState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, state);
    }
}

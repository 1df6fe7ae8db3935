use chrono::{DateTime, Utc};
use covenant_types::{AlignmentEvent, Band};
use serde::{Deserialize, Serialize};

use crate::metrics::WindowMetrics;
use crate::state::AgentState;

/// Full-fidelity snapshot of an agent state.
///
/// Carries the entire event window. Restoring one of these and resuming
/// evaluation produces outputs bit-identical to having never exported —
/// this is the replay contract, and it only holds because the window is
/// complete.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub agent_id: String,
    pub principal_id: String,
    pub e: f64,
    pub i: f64,
    pub last_update: DateTime<Utc>,
    pub events: Vec<AlignmentEvent>,
}

impl StateSnapshot {
    pub fn of(state: &AgentState) -> Self {
        Self {
            agent_id: state.agent_id.clone(),
            principal_id: state.principal_id.clone(),
            e: state.e,
            i: state.i,
            last_update: state.last_update,
            events: state.event_window.iter().cloned().collect(),
        }
    }

    /// Reconstruct the agent state. Bit-for-bit: no clamping, no
    /// re-validation — the snapshot is trusted to be a prior export.
    pub fn restore(self) -> AgentState {
        AgentState {
            agent_id: self.agent_id,
            principal_id: self.principal_id,
            e: self.e,
            i: self.i,
            event_window: self.events.into(),
            last_update: self.last_update,
        }
    }
}

/// Observability export: state scalars, derived band, current aggregates,
/// and a bounded tail of recent events.
///
/// Not sufficient for exact replay — callers needing deterministic resume
/// must persist a [`StateSnapshot`] (full window) instead.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateExport {
    pub agent_id: String,
    pub principal_id: String,
    pub e: f64,
    pub i: f64,
    pub band: Band,
    pub metrics: WindowMetrics,
    pub event_count: usize,
    pub last_update: DateTime<Utc>,
    /// Most recent events, newest last (bounded tail)
    pub recent_events: Vec<AlignmentEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use covenant_types::{Direction, EvaluatorConfig};

    fn event(n: usize) -> AlignmentEvent {
        AlignmentEvent::new(
            "agent-1",
            "user:alice",
            Direction::Cooperation,
            format!("EVT_{n}"),
            "unit-test",
            0.5,
        )
        .unwrap()
    }

    #[test]
    fn snapshot_restore_is_identity() {
        let config = EvaluatorConfig::default();
        let mut state = AgentState::new("agent-1", "user:alice", &config);
        for n in 0..5 {
            state.push_event(event(n), config.window_size);
        }
        state.e = 0.73;
        state.i = 0.21;

        let restored = StateSnapshot::of(&state).restore();
        assert_eq!(restored, state);
    }

    #[test]
    fn snapshot_serde_roundtrip_preserves_window_order() {
        let config = EvaluatorConfig::default();
        let mut state = AgentState::new("agent-1", "user:alice", &config);
        for n in 0..4 {
            state.push_event(event(n), config.window_size);
        }

        let snapshot = StateSnapshot::of(&state);
        let json = serde_json::to_string(&snapshot).unwrap();
        let restored: StateSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, snapshot);

        let categories: Vec<&str> = restored.events.iter().map(|e| e.category.as_str()).collect();
        assert_eq!(categories, ["EVT_0", "EVT_1", "EVT_2", "EVT_3"]);
    }
}

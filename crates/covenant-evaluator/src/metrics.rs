use std::collections::VecDeque;

use covenant_types::{AlignmentEvent, Direction, WeightTable};
use serde::{Deserialize, Serialize};

use crate::weighting::effective_weight;

/// The three window aggregates feeding the score update.
///
/// Each is normalized by total window length (not subset length), so an
/// empty category contributes 0 rather than being undefined. Recomputed
/// fresh on every evaluation cycle; no incremental caching.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowMetrics {
    /// C — cooperation aggregate (0.0-1.0)
    pub cooperation: f64,
    /// D — defection aggregate (0.0-1.0)
    pub defection: f64,
    /// N — novelty aggregate (0.0-1.0)
    pub novelty: f64,
}

impl WindowMetrics {
    /// Reduce the window to C/D/N.
    pub fn compute(window: &VecDeque<AlignmentEvent>, table: &WeightTable) -> Self {
        if window.is_empty() {
            return Self::default();
        }

        let mut coop = 0.0;
        let mut defect = 0.0;
        let mut novel = 0.0;
        for event in window {
            match event.direction {
                Direction::Cooperation => coop += effective_weight(event, table),
                Direction::Defection => defect += effective_weight(event, table),
                Direction::Novelty => novel += effective_weight(event, table),
                Direction::Neutral => {}
            }
        }

        let len = window.len() as f64;
        Self {
            cooperation: (coop / len).min(1.0),
            defection: (defect / len).min(1.0),
            novelty: (novel / len).min(1.0),
        }
    }
}

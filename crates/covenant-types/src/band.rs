use serde::{Deserialize, Serialize};

/// Operational band derived from the alignment score.
///
/// Never stored as independent state — always recomputed from E so a stored
/// band can never drift out of sync with a stored score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    /// Critical misalignment — quarantined, human review required
    Red,
    /// Restricted operations — elevated oversight
    Yellow,
    /// Fully operational
    Green,
}

/// Score thresholds separating the bands.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BandThresholds {
    /// Minimum E for GREEN (default 0.80)
    pub green_min: f64,
    /// Minimum E for YELLOW (default 0.60); below this is RED
    pub yellow_min: f64,
}

impl Default for BandThresholds {
    fn default() -> Self {
        Self {
            green_min: 0.80,
            yellow_min: 0.60,
        }
    }
}

impl Band {
    /// Classify an alignment score against the given thresholds.
    pub fn classify(e: f64, thresholds: &BandThresholds) -> Self {
        if e >= thresholds.green_min {
            Band::Green
        } else if e >= thresholds.yellow_min {
            Band::Yellow
        } else {
            Band::Red
        }
    }

    pub fn is_red(&self) -> bool {
        matches!(self, Band::Red)
    }

    pub fn is_green(&self) -> bool {
        matches!(self, Band::Green)
    }

    /// Lowercase name used in transition strings and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Band::Green => "green",
            Band::Yellow => "yellow",
            Band::Red => "red",
        }
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

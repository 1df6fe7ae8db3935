use covenant_types::Band;
use serde::{Deserialize, Serialize};

/// A proposed action, described by the three attributes the gate consults.
///
/// Nothing else influences the decision besides these flags and the
/// current band.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Runs without a user prompt
    pub autonomous: bool,
    /// High-risk operation
    pub high_risk: bool,
    /// High-impact write (treated like high_risk in YELLOW)
    pub high_impact_write: bool,
}

impl ActionRequest {
    pub fn autonomous() -> Self {
        Self {
            autonomous: true,
            ..Self::default()
        }
    }

    pub fn high_risk() -> Self {
        Self {
            high_risk: true,
            ..Self::default()
        }
    }

    /// Attributes that demand oversight in YELLOW: autonomy, or either
    /// high-impact flavor (high_impact_write is treated like high_risk).
    fn needs_oversight(&self) -> bool {
        self.autonomous || self.high_risk || self.high_impact_write
    }
}

/// Outcome of gating a proposed action against the current band.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GateDecision {
    pub allowed: bool,
    pub reason: String,
    pub requires_confirmation: bool,
    pub band: Band,
}

/// Apply the gating table. Pure function of band and request.
pub fn check_action(band: Band, request: ActionRequest) -> GateDecision {
    match band {
        Band::Green => GateDecision {
            allowed: true,
            reason: "agent in GREEN band (healthy alignment)".into(),
            requires_confirmation: false,
            band,
        },
        Band::Yellow => {
            if request.needs_oversight() {
                GateDecision {
                    allowed: true,
                    reason: "agent in YELLOW band: high-impact action requires user confirmation"
                        .into(),
                    requires_confirmation: true,
                    band,
                }
            } else {
                GateDecision {
                    allowed: true,
                    reason: "agent in YELLOW band: action allowed with increased logging".into(),
                    requires_confirmation: false,
                    band,
                }
            }
        }
        Band::Red => {
            if request.autonomous || request.high_risk {
                GateDecision {
                    allowed: false,
                    reason: "agent in RED band (critical misalignment): autonomous and high-risk \
                             actions forbidden, human review required"
                        .into(),
                    requires_confirmation: false,
                    band,
                }
            } else {
                GateDecision {
                    allowed: true,
                    reason: "agent in RED band: action allowed with full context logging".into(),
                    requires_confirmation: true,
                    band,
                }
            }
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Unique identifier for an alignment event.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

impl EventId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Behavioral classification of an event.
///
/// Cooperation and defection drive the alignment score; novelty drives the
/// independence score; neutral events occupy window slots without feeding
/// either aggregate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Cooperation,
    Defection,
    Neutral,
    Novelty,
}

/// Stakes level of the context the event occurred in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stakes {
    Low,
    Medium,
    High,
    Critical,
}

/// How reversible the observed action was.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reversibility {
    Reversible,
    Difficult,
    Irreversible,
}

/// Boolean risk attributes of the event context.
///
/// Each set flag compounds the context multiplier; flags compose
/// multiplicatively and are order-independent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFlags {
    #[serde(default)]
    pub sensitive_data: bool,
    #[serde(default)]
    pub user_vulnerable: bool,
    #[serde(default)]
    pub financial_impact: bool,
    #[serde(default)]
    pub self_harm_risk: bool,
    #[serde(default)]
    pub third_party_impact: bool,
}

impl RiskFlags {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn any(&self) -> bool {
        self.sensitive_data
            || self.user_vulnerable
            || self.financial_impact
            || self.self_harm_risk
            || self.third_party_impact
    }
}

/// A single observed behavior of an agent acting for a principal.
///
/// Immutable once constructed. The effective weight is always derived from
/// these fields on demand and never stored alongside them, so re-tuning the
/// multiplier tables never requires rewriting history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlignmentEvent {
    pub event_id: EventId,
    pub agent_id: String,
    pub principal_id: String,
    pub timestamp: DateTime<Utc>,
    pub direction: Direction,
    /// Free-form category label, e.g. "DEFECT_SYCOPHANCY"
    pub category: String,
    /// Originating detector or component
    pub source: String,
    pub explanation: Option<String>,
    /// Raw severity/impact before context weighting (0.0-1.0)
    pub base_weight: f64,
    pub stakes: Stakes,
    pub reversibility: Reversibility,
    pub flags: RiskFlags,
    /// How objectively checkable the agent's claim or action was (0.0-1.0)
    pub verifiability: f64,
    /// The agent's stated certainty (0.0-1.0)
    pub confidence: f64,
}

fn check_unit(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field, value });
    }
    if !(0.0..=1.0).contains(&value) {
        return Err(ValidationError::OutOfUnitRange { field, value });
    }
    Ok(value)
}

impl AlignmentEvent {
    /// Construct a new event with a generated id and current timestamp.
    ///
    /// Context defaults to low stakes, reversible, no risk flags;
    /// verifiability and confidence default to 0.7. Use the `with_*`
    /// helpers to override.
    pub fn new(
        agent_id: impl Into<String>,
        principal_id: impl Into<String>,
        direction: Direction,
        category: impl Into<String>,
        source: impl Into<String>,
        base_weight: f64,
    ) -> Result<Self, ValidationError> {
        let agent_id = agent_id.into();
        let principal_id = principal_id.into();
        if agent_id.is_empty() {
            return Err(ValidationError::EmptyField { field: "agent_id" });
        }
        if principal_id.is_empty() {
            return Err(ValidationError::EmptyField {
                field: "principal_id",
            });
        }

        Ok(Self {
            event_id: EventId::generate(),
            agent_id,
            principal_id,
            timestamp: Utc::now(),
            direction,
            category: category.into(),
            source: source.into(),
            explanation: None,
            base_weight: check_unit("base_weight", base_weight)?,
            stakes: Stakes::Low,
            reversibility: Reversibility::Reversible,
            flags: RiskFlags::none(),
            verifiability: 0.7,
            confidence: 0.7,
        })
    }

    /// Set the context attributes (stakes, reversibility, risk flags).
    pub fn with_context(mut self, stakes: Stakes, reversibility: Reversibility, flags: RiskFlags) -> Self {
        self.stakes = stakes;
        self.reversibility = reversibility;
        self.flags = flags;
        self
    }

    /// Set the epistemic attributes. Both must lie in [0, 1].
    pub fn with_epistemics(
        mut self,
        verifiability: f64,
        confidence: f64,
    ) -> Result<Self, ValidationError> {
        self.verifiability = check_unit("verifiability", verifiability)?;
        self.confidence = check_unit("confidence", confidence)?;
        Ok(self)
    }

    /// Attach a human-readable explanation.
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    /// Override the generated timestamp (replay and test harnesses).
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

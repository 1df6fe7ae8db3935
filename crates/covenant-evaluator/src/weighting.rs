use covenant_types::{AlignmentEvent, Direction, WeightTable};

/// Decomposed effective weight of a single event.
///
/// Pure function of the event's immutable fields and the multiplier table;
/// repeated calls always return the identical value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightBreakdown {
    /// Product of stakes, reversibility, and flag multipliers
    pub multiplier: f64,
    /// base_weight x multiplier, capped
    pub base_effective: f64,
    /// Empirical-distrust penalty (0.0 unless an overconfident defection)
    pub distrust_penalty: f64,
    /// Final weight after adding the penalty and re-applying the cap
    pub effective: f64,
}

/// Compute the full weight breakdown for an event.
pub fn weigh(event: &AlignmentEvent, table: &WeightTable) -> WeightBreakdown {
    let multiplier = table.stakes_multiplier(event.stakes)
        * table.reversibility_multiplier(event.reversibility)
        * table.flag_multiplier(&event.flags);

    let cap = table.max_effective_weight;
    let base_effective = (event.base_weight * multiplier).min(cap);
    let distrust_penalty = distrust_penalty(event);

    WeightBreakdown {
        multiplier,
        base_effective,
        distrust_penalty,
        effective: (base_effective + distrust_penalty).min(cap),
    }
}

/// The effective weight alone.
pub fn effective_weight(event: &AlignmentEvent, table: &WeightTable) -> f64 {
    weigh(event, table).effective
}

/// Empirical-distrust penalty.
///
/// An agent that asserts unverifiable claims with high confidence is
/// penalized proportionally to its overconfidence, independent of the raw
/// severity weight. Applies only to defections where confidence exceeds
/// verifiability.
pub fn distrust_penalty(event: &AlignmentEvent) -> f64 {
    if event.direction == Direction::Defection && event.confidence > event.verifiability {
        (event.confidence - event.verifiability) * event.base_weight
    } else {
        0.0
    }
}

//! Property tests: score boundedness, zero-alignment absorption, window
//! eviction exactness, and snapshot/resume equivalence under arbitrary
//! event sequences.

use covenant_evaluator::{AgentState, Evaluator};
use covenant_types::{
    AlignmentEvent, Direction, EvaluatorConfig, Reversibility, RiskFlags, Stakes,
};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_direction() -> impl Strategy<Value = Direction> {
    prop_oneof![
        Just(Direction::Cooperation),
        Just(Direction::Defection),
        Just(Direction::Neutral),
        Just(Direction::Novelty),
    ]
}

fn arb_stakes() -> impl Strategy<Value = Stakes> {
    prop_oneof![
        Just(Stakes::Low),
        Just(Stakes::Medium),
        Just(Stakes::High),
        Just(Stakes::Critical),
    ]
}

fn arb_reversibility() -> impl Strategy<Value = Reversibility> {
    prop_oneof![
        Just(Reversibility::Reversible),
        Just(Reversibility::Difficult),
        Just(Reversibility::Irreversible),
    ]
}

fn arb_flags() -> impl Strategy<Value = RiskFlags> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(sensitive_data, user_vulnerable, financial_impact, self_harm_risk, third_party_impact)| {
            RiskFlags {
                sensitive_data,
                user_vulnerable,
                financial_impact,
                self_harm_risk,
                third_party_impact,
            }
        },
    )
}

fn arb_event() -> impl Strategy<Value = AlignmentEvent> {
    (
        arb_direction(),
        0.0f64..=1.0,
        arb_stakes(),
        arb_reversibility(),
        arb_flags(),
        0.0f64..=1.0,
        0.0f64..=1.0,
    )
        .prop_map(
            |(direction, weight, stakes, reversibility, flags, verifiability, confidence)| {
                AlignmentEvent::new("agent-prop", "user:prop", direction, "PROP", "proptest", weight)
                    .unwrap()
                    .with_context(stakes, reversibility, flags)
                    .with_epistemics(verifiability, confidence)
                    .unwrap()
            },
        )
}

fn arb_events(max: usize) -> impl Strategy<Value = Vec<AlignmentEvent>> {
    prop::collection::vec(arb_event(), 0..max)
}

fn evaluator() -> Evaluator {
    Evaluator::new(EvaluatorConfig::default()).unwrap()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    /// E stays in [0, 1] and I in [0, i_max] after every evaluation, for
    /// any event sequence and any non-negative dt.
    #[test]
    fn scores_always_bounded(events in arb_events(60), dt in 0.0f64..10.0) {
        let ev = evaluator();
        let mut state = ev.new_state("agent-prop", "user:prop");

        for event in events {
            ev.add_event(&mut state, event);
            let result = ev.evaluate(&mut state, dt);
            prop_assert!((0.0..=1.0).contains(&result.e_new));
            prop_assert!(result.i_new >= 0.0);
            prop_assert!(result.i_new <= ev.config().i_max);
        }
    }

    /// E = 0 never moves, whatever the window holds.
    #[test]
    fn zero_alignment_absorbs(events in arb_events(40), dt in 0.0f64..10.0) {
        let ev = evaluator();
        let mut state = ev.new_state("agent-prop", "user:prop");
        state.e = 0.0;

        for event in events {
            ev.add_event(&mut state, event);
            let result = ev.evaluate(&mut state, dt);
            prop_assert_eq!(result.e_new, 0.0);
        }
    }

    /// After window_size + k inserts the window holds exactly the last
    /// window_size events in their original order.
    #[test]
    fn window_holds_most_recent_in_order(extra in 1usize..30) {
        let window_size = 16;
        let config = EvaluatorConfig {
            window_size,
            ..EvaluatorConfig::default()
        };
        let ev = Evaluator::new(config.clone()).unwrap();
        let mut state = ev.new_state("agent-prop", "user:prop");

        let total = window_size + extra;
        let mut ids = Vec::with_capacity(total);
        for n in 0..total {
            let event = AlignmentEvent::new(
                "agent-prop",
                "user:prop",
                Direction::Neutral,
                format!("SEQ_{n}"),
                "proptest",
                0.5,
            )
            .unwrap();
            ids.push(event.event_id.clone());
            ev.add_event(&mut state, event);
        }

        prop_assert_eq!(state.window_len(), window_size);
        let retained: Vec<_> = state.event_window.iter().map(|e| e.event_id.clone()).collect();
        prop_assert_eq!(&retained[..], &ids[extra..]);
    }

    /// Resuming from a snapshot is indistinguishable from never having
    /// exported: subsequent evaluations are bit-identical.
    #[test]
    fn snapshot_resume_equivalence(
        prefix in arb_events(30),
        suffix in arb_events(15),
        dt in 0.1f64..3.0,
    ) {
        let ev = evaluator();
        let mut original = ev.new_state("agent-prop", "user:prop");
        for event in prefix {
            ev.add_event(&mut original, event);
            ev.evaluate(&mut original, dt);
        }

        let mut resumed = ev.restore(ev.snapshot(&original));

        for event in suffix {
            ev.add_event(&mut original, event.clone());
            ev.add_event(&mut resumed, event);
            let a = ev.evaluate(&mut original, dt);
            let b = ev.evaluate(&mut resumed, dt);
            prop_assert_eq!(a.e_new.to_bits(), b.e_new.to_bits());
            prop_assert_eq!(a.i_new.to_bits(), b.i_new.to_bits());
            prop_assert_eq!(a.band_new, b.band_new);
        }
    }

    /// The gate never blocks in GREEN; RED always blocks autonomous.
    #[test]
    fn gate_monotonicity(e in 0.0f64..=1.0, autonomous in any::<bool>(), high_risk in any::<bool>()) {
        use covenant_evaluator::ActionRequest;
        use covenant_types::Band;

        let ev = evaluator();
        let mut state: AgentState = ev.new_state("agent-prop", "user:prop");
        state.e = e;

        let decision = ev.check_action_allowed(&state, ActionRequest {
            autonomous,
            high_risk,
            high_impact_write: false,
        });

        match ev.band(&state) {
            Band::Green => prop_assert!(decision.allowed),
            Band::Red if autonomous => prop_assert!(!decision.allowed),
            _ => {}
        }
    }
}

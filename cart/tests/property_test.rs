//! Property tests for the cart quantity invariants.

#![allow(clippy::unwrap_used)]

use chrono::Duration;
use exhibit_cart::{CartAction, CartEnvironment, CartReducer, CartState, EventDetails, EventId};
use exhibit_cart_core::{environment::Clock, reducer::Reducer};
use exhibit_cart_testing::test_clock;
use proptest::prelude::*;
use std::sync::Arc;

const IDS: [&str; 3] = ["A", "B", "C"];

fn env() -> CartEnvironment {
    CartEnvironment::new(Arc::new(test_clock()))
}

fn apply(state: &mut CartState, action: CartAction) {
    CartReducer::new().reduce(state, action, &env());
}

fn arb_details() -> impl Strategy<Value = EventDetails> {
    (
        prop::sample::select(IDS.to_vec()),
        prop::option::of(0_u32..20),
        0_u32..30,
        0_u32..30,
    )
        .prop_map(|(id, quantity, total, booked)| {
            let details = EventDetails::new(id, total, booked);
            match quantity {
                Some(quantity) => details.with_quantity(quantity),
                None => details,
            }
        })
}

fn arb_action() -> impl Strategy<Value = CartAction> {
    let id = prop::sample::select(IDS.to_vec()).prop_map(EventId::new);
    prop_oneof![
        3 => arb_details().prop_map(CartAction::UpsertLine),
        3 => id.clone().prop_map(CartAction::IncrementLine),
        2 => id.clone().prop_map(CartAction::DecrementLine),
        1 => id.clone().prop_map(CartAction::RemoveLine),
        1 => (id, 0_u32..30, 0_u32..30).prop_map(|(event_id, total_tickets, booked_tickets)| {
            CartAction::RefreshAvailability {
                event_id,
                total_tickets,
                booked_tickets,
            }
        }),
        1 => Just(CartAction::Clear),
    ]
}

fn assert_invariants(state: &CartState) -> Result<(), TestCaseError> {
    for (index, line) in state.lines().iter().enumerate() {
        prop_assert!(line.available_tickets() > 0);
        prop_assert!(i64::from(line.quantity.get()) <= line.available_tickets());
        prop_assert!(
            state.lines()[index + 1..]
                .iter()
                .all(|other| other.event_id != line.event_id),
            "duplicate line for {}",
            line.event_id
        );
    }
    Ok(())
}

proptest! {
    #[test]
    fn upsert_quantity_within_availability(details in arb_details()) {
        let mut state = CartState::new();
        let event_id = details.event_id.clone();
        let available = details.available_tickets();

        apply(&mut state, CartAction::UpsertLine(details));

        if available > 0 {
            let quantity = i64::from(state.quantity(&event_id));
            prop_assert!((1..=available).contains(&quantity));
        } else {
            prop_assert!(!state.contains(&event_id));
        }
    }

    #[test]
    fn sold_out_upsert_leaves_other_lines(
        existing in arb_details(),
        total in 0_u32..30,
        extra_booked in 0_u32..10,
    ) {
        let mut state = CartState::new();
        apply(&mut state, CartAction::UpsertLine(existing));
        let sold_out_id = EventId::new("sold-out");
        let others = state.lines().to_vec();

        apply(
            &mut state,
            CartAction::UpsertLine(EventDetails::new(sold_out_id.clone(), total, total + extra_booked)),
        );

        prop_assert!(!state.contains(&sold_out_id));
        prop_assert_eq!(state.lines(), others.as_slice());
    }

    #[test]
    fn increment_never_exceeds_snapshot(details in arb_details(), bumps in 1_usize..30) {
        let mut state = CartState::new();
        let event_id = details.event_id.clone();
        apply(&mut state, CartAction::UpsertLine(details));

        for _ in 0..bumps {
            apply(&mut state, CartAction::IncrementLine(event_id.clone()));
            if let Some(line) = state.line(&event_id) {
                prop_assert!(i64::from(line.quantity.get()) <= line.available_tickets());
            }
        }
    }

    #[test]
    fn decrement_removes_instead_of_reaching_zero(details in arb_details(), drops in 1_usize..30) {
        let mut state = CartState::new();
        let event_id = details.event_id.clone();
        apply(&mut state, CartAction::UpsertLine(details));

        for _ in 0..drops {
            let before = state.quantity(&event_id);
            apply(&mut state, CartAction::DecrementLine(event_id.clone()));
            let after = state.quantity(&event_id);

            match before {
                0 | 1 => prop_assert!(!state.contains(&event_id)),
                held => prop_assert_eq!(after, held - 1),
            }
        }
    }

    #[test]
    fn upsert_is_idempotent(details in arb_details(), gap_secs in 0_i64..3600) {
        let clock = Arc::new(test_clock());
        let env = CartEnvironment::new(Arc::clone(&clock) as Arc<dyn Clock>);
        let reducer = CartReducer::new();

        let mut once = CartState::new();
        reducer.reduce(&mut once, CartAction::UpsertLine(details.clone()), &env);

        let mut twice = once.clone();
        clock.advance(Duration::seconds(gap_secs));
        reducer.reduce(&mut twice, CartAction::UpsertLine(details), &env);

        prop_assert_eq!(once, twice);
    }

    #[test]
    fn invariants_hold_for_any_action_sequence(actions in prop::collection::vec(arb_action(), 0..40)) {
        let mut state = CartState::new();
        for action in actions {
            apply(&mut state, action);
            assert_invariants(&state)?;
        }
    }

    #[test]
    fn unknown_ids_are_noops(actions in prop::collection::vec(arb_action(), 0..20)) {
        let mut state = CartState::new();
        for action in actions {
            apply(&mut state, action);
        }
        let before = state.clone();
        let unknown = EventId::new("not-in-cart");

        apply(&mut state, CartAction::RemoveLine(unknown.clone()));
        apply(&mut state, CartAction::IncrementLine(unknown.clone()));
        apply(&mut state, CartAction::DecrementLine(unknown));

        prop_assert_eq!(state, before);
    }
}

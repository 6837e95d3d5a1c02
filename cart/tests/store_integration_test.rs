//! Integration tests for the cart running inside a Store
//!
//! These cover the visitor flows end to end: actions go through the store,
//! observers see committed carts, async consumers see the action stream.

#![allow(clippy::unwrap_used, clippy::panic)]

use exhibit_cart::{
    CartAction, CartConfig, CartEnvironment, CartNotice, CartStore, EventDetails, EventId,
    EventRecord, Money, OrderSummary, cart_store_with_env,
};
use exhibit_cart_testing::{StateRecorder, test_clock};
use std::sync::Arc;

fn store() -> CartStore {
    cart_store_with_env(
        &CartConfig::default(),
        CartEnvironment::new(Arc::new(test_clock())),
    )
}

fn id(raw: &str) -> EventId {
    EventId::new(raw)
}

#[test]
fn last_tickets_scenario() {
    let store = store();
    let recorder = StateRecorder::attach(&store);

    store.send(CartAction::UpsertLine(
        EventDetails::new("A", 100, 98).with_quantity(5),
    ));
    assert_eq!(store.state(|cart| cart.quantity(&id("A"))), 2);

    store.send(CartAction::IncrementLine(id("A")));
    assert_eq!(store.state(|cart| cart.quantity(&id("A"))), 2);

    store.send(CartAction::DecrementLine(id("A")));
    assert_eq!(store.state(|cart| cart.quantity(&id("A"))), 1);

    store.send(CartAction::DecrementLine(id("A")));
    assert!(store.state(|cart| cart.is_empty()));

    let quantities: Vec<u32> = recorder
        .stop()
        .iter()
        .map(|cart| cart.quantity(&id("A")))
        .collect();
    assert_eq!(quantities, vec![2, 2, 1, 0]);
}

#[test]
fn sold_out_event_keeps_other_lines() {
    let store = store();
    store.send(CartAction::UpsertLine(
        EventDetails::new("C", 20, 5).with_quantity(3),
    ));
    let before = store.state(|cart| cart.line(&id("C")).cloned());

    store.send(CartAction::UpsertLine(
        EventDetails::new("B", 10, 10).with_quantity(1),
    ));

    store.state(|cart| {
        assert!(!cart.contains(&id("B")));
        assert_eq!(cart.line(&id("C")).cloned(), before);
        assert_eq!(cart.last_notice(), Some(&CartNotice::SoldOut { event_id: id("B") }));
    });
}

#[test]
fn removing_unknown_event_changes_nothing() {
    let store = store();
    store.send(CartAction::UpsertLine(
        EventDetails::new("A", 10, 0).with_quantity(2),
    ));
    let before = store.snapshot();

    store.send(CartAction::RemoveLine(id("missing")));

    assert_eq!(store.snapshot(), before);
    assert_eq!(
        serde_json::to_value(store.snapshot()).unwrap(),
        serde_json::to_value(&before).unwrap()
    );
}

#[test]
fn reserve_event_from_api_record() {
    let store = store();
    let record = EventRecord::from_json(
        r#"{
            "id": 12,
            "title": "Light and Shadow",
            "location": { "name": "Sculpture Hall", "maxGuests": "40" },
            "bookedTickets": "35",
            "pricePerTicket": null
        }"#,
    )
    .unwrap();

    store.send(CartAction::ReserveEvent {
        record: Box::new(record),
        quantity: Some(2),
    });

    store.state(|cart| {
        let line = cart.line(&id("12")).unwrap();
        assert_eq!(line.quantity.get(), 2);
        assert_eq!(line.price_per_ticket, Money::from_kroner(45));
        assert_eq!(line.available_tickets(), 5);
        assert_eq!(line.details.title.as_deref(), Some("Light and Shadow"));
    });
}

#[test]
fn reserve_event_notifies_after_upsert() {
    let store = store();
    let recorder = StateRecorder::attach(&store);
    let record =
        EventRecord::from_json(r#"{ "id": "A", "location": { "maxGuests": 3 } }"#).unwrap();

    store.send(CartAction::ReserveEvent {
        record: Box::new(record),
        quantity: None,
    });

    let states = recorder.states();
    assert_eq!(states.len(), 2);
    assert!(states[0].is_empty());
    assert_eq!(states[1].quantity(&id("A")), 1);
}

#[test]
fn checkout_summary_follows_cart() {
    let store = store();
    assert!(store.state(OrderSummary::from_state).is_none());

    store.send(CartAction::UpsertLine(
        EventDetails::new("A", 10, 0)
            .with_quantity(2)
            .with_price(Money::from_kroner(95)),
    ));
    store.send(CartAction::UpsertLine(EventDetails::new("B", 10, 0)));

    let summary = store.state(OrderSummary::from_state).unwrap();
    assert_eq!(summary.ticket_count, 3);
    assert_eq!(summary.total, Money::from_kroner(235));

    store.send(CartAction::Clear);
    assert!(store.state(OrderSummary::from_state).is_none());
}

#[test]
fn carts_are_isolated_per_store() {
    let first = store();
    let second = store();

    first.send(CartAction::UpsertLine(EventDetails::new("A", 10, 0)));

    assert_eq!(first.state(|cart| cart.len()), 1);
    assert!(second.state(|cart| cart.is_empty()));
}

#[test]
fn unsubscribed_observer_is_not_notified() {
    let store = store();
    let recorder = StateRecorder::attach(&store);

    store.send(CartAction::UpsertLine(EventDetails::new("A", 10, 0)));
    let captured = recorder.stop();
    store.send(CartAction::Clear);

    assert_eq!(captured.len(), 1);
    assert_eq!(store.subscriber_count(), 0);
}

#[tokio::test]
async fn actions_reach_async_subscribers() {
    let store = store();
    let mut actions = store.subscribe_actions();

    store.send(CartAction::UpsertLine(EventDetails::new("A", 10, 0)));
    store.send(CartAction::IncrementLine(id("A")));

    match actions.recv().await.unwrap() {
        CartAction::UpsertLine(details) => assert_eq!(details.event_id, id("A")),
        other => panic!("unexpected action {other:?}"),
    }
    assert_eq!(
        actions.recv().await.unwrap(),
        CartAction::IncrementLine(id("A"))
    );
}

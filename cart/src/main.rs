//! Cart demo binary
//!
//! Walks a visitor through picking exhibition tickets against a live store.

use exhibit_cart::{
    CartAction, CartConfig, EventDetails, EventId, EventRecord, OrderSummary, cart_store,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const EVENT_RECORD: &str = r#"{
    "id": "golden-age",
    "title": "The Danish Golden Age",
    "date": "2025-06-14",
    "location": { "name": "Sculpture Hall", "address": "Solvgade 48", "maxGuests": 100 },
    "bookedTickets": 98,
    "pricePerTicket": 95
}"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CartConfig::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Exhibit Cart Demo ===\n");

    let store = Arc::new(cart_store(&config));

    let mut actions = store.subscribe_actions();
    let audit = tokio::spawn(async move {
        let mut seen = 0_usize;
        while let Ok(action) = actions.recv().await {
            tracing::info!(?action, "Cart action");
            seen += 1;
        }
        seen
    });

    let subscription = store.subscribe(|cart| {
        println!(
            "  cart: {} line(s), {} ticket(s), {}",
            cart.len(),
            cart.ticket_count(),
            cart.total_price()
        );
        if let Some(notice) = cart.last_notice() {
            println!("  notice: {notice:?}");
        }
    });

    let record = EventRecord::from_json(EVENT_RECORD)?;
    let golden_age = record.id.clone();

    println!(">>> Reserve 5 tickets for '{golden_age}' (2 left)");
    store.send(CartAction::ReserveEvent {
        record: Box::new(record),
        quantity: Some(5),
    });

    println!("\n>>> Increment '{golden_age}'");
    store.send(CartAction::IncrementLine(golden_age.clone()));

    println!("\n>>> Add a sold-out event");
    store.send(CartAction::UpsertLine(
        EventDetails::new("sold-out", 10, 10).with_quantity(1),
    ));

    println!("\n>>> Add 3 tickets for an open event");
    let open = EventId::new("open-studio");
    store.send(CartAction::UpsertLine(
        EventDetails::new(open.clone(), 30, 4).with_quantity(3),
    ));

    if let Some(summary) = store.state(OrderSummary::from_state) {
        println!("\n--- Order summary ---\n{}\n", summary.render_text());
    }

    println!(">>> Decrement '{golden_age}' twice");
    store.send(CartAction::DecrementLine(golden_age.clone()));
    store.send(CartAction::DecrementLine(golden_age));

    println!("\n>>> Remove '{open}'");
    store.send(CartAction::RemoveLine(open));

    subscription.unsubscribe();
    drop(store);

    let seen = audit.await?;
    println!("\n=== Demo complete: {seen} actions observed ===");
    Ok(())
}

//! # Exhibit Cart
//!
//! Ticket cart for museum exhibition events.
//!
//! Visitors pick events and ticket counts; the cart guarantees that it never
//! holds more tickets for an event than the availability snapshot the caller
//! supplied. The cart is a pure state machine driven through a
//! [`Store`](exhibit_cart_runtime::Store):
//!
//! - `UpsertLine` adds or rewrites a line, clamping to availability
//! - `IncrementLine` adds one ticket unless the snapshot forbids it
//! - `DecrementLine` removes one ticket; a line at one ticket disappears
//! - `RemoveLine` and `Clear` delete lines unconditionally
//! - `RefreshAvailability` applies fresher counts from the events API
//! - `ReserveEvent` turns an events-API record into an upsert
//!
//! None of these fail. Out-of-range requests are clamped or rejected and
//! recorded as a [`CartNotice`] for the UI.
//!
//! ## Example
//!
//! ```
//! use exhibit_cart::{CartAction, CartConfig, EventDetails, EventId, cart_store};
//!
//! let store = cart_store(&CartConfig::default());
//! let subscription = store.subscribe(|cart| println!("{} tickets", cart.ticket_count()));
//!
//! store.send(CartAction::UpsertLine(
//!     EventDetails::new("A", 100, 98).with_quantity(5),
//! ));
//! assert_eq!(store.state(|cart| cart.quantity(&EventId::new("A"))), 2);
//!
//! subscription.unsubscribe();
//! ```

/// Configuration loading
pub mod config;
/// Error types
pub mod error;
/// Lenient numeric decoding
pub mod lenient;
/// Events API records
pub mod record;
/// Cart reducer and environment
pub mod reducer;
/// Checkout summary
pub mod summary;
/// Domain types
pub mod types;

pub use config::CartConfig;
pub use error::CartError;
pub use record::EventRecord;
pub use reducer::{CartEnvironment, CartReducer};
pub use summary::{OrderRow, OrderSummary};
pub use types::{
    CartAction, CartLine, CartNotice, CartState, DEFAULT_TICKET_PRICE, EventDescription,
    EventDetails, EventId, Location, Money, TicketSnapshot,
};

use exhibit_cart_runtime::Store;

/// Store specialised for the ticket cart
pub type CartStore = Store<CartState, CartAction, CartEnvironment, CartReducer>;

/// Build an empty cart store from configuration
///
/// Construct one per visitor session and share it (`Arc<CartStore>`) with
/// the UI layer.
#[must_use]
pub fn cart_store(config: &CartConfig) -> CartStore {
    cart_store_with_env(config, CartEnvironment::from_config(config))
}

/// Build an empty cart store with an explicit environment
///
/// Tests use this to inject a fixed clock.
#[must_use]
pub fn cart_store_with_env(config: &CartConfig, environment: CartEnvironment) -> CartStore {
    Store::with_broadcast_capacity(
        CartState::new(),
        CartReducer::new(),
        environment,
        config.action_broadcast_capacity,
    )
}

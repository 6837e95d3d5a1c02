//! Reducer logic for the ticket cart.
//!
//! Every mutation re-derives availability from a snapshot and keeps each
//! line's quantity within `1..=available`. Nothing here can fail: requests
//! beyond availability are clamped or rejected, unknown events are ignored.

use crate::config::CartConfig;
use crate::types::{
    CartAction, CartLine, CartNotice, CartState, DEFAULT_TICKET_PRICE, EventDetails, EventId,
    Money, TicketSnapshot,
};
use exhibit_cart_core::{
    SmallVec,
    effect::Effect,
    environment::{Clock, SystemClock},
    reducer::Reducer,
    smallvec,
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Environment dependencies for the cart reducer
#[derive(Clone)]
pub struct CartEnvironment {
    /// Clock used to timestamp availability snapshots
    pub clock: Arc<dyn Clock>,
    /// Unit price for events that have none
    pub default_price: Money,
}

impl CartEnvironment {
    /// Creates an environment with the standard default price
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            default_price: DEFAULT_TICKET_PRICE,
        }
    }

    /// Creates an environment from configuration, using the system clock
    #[must_use]
    pub fn from_config(config: &CartConfig) -> Self {
        Self::new(Arc::new(SystemClock)).with_default_price(config.default_ticket_price)
    }

    /// Overrides the default unit price
    #[must_use]
    pub fn with_default_price(mut self, price: Money) -> Self {
        self.default_price = price;
        self
    }
}

impl std::fmt::Debug for CartEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartEnvironment")
            .field("default_price", &self.default_price)
            .finish_non_exhaustive()
    }
}

/// Reducer for the ticket cart
#[derive(Clone, Copy, Debug, Default)]
pub struct CartReducer;

impl CartReducer {
    /// Creates a new `CartReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Converts a positive availability into a quantity ceiling
    fn ceiling(available: i64) -> Option<NonZeroU32> {
        u32::try_from(available.max(0))
            .ok()
            .and_then(NonZeroU32::new)
    }

    fn reject_sold_out(state: &mut CartState, event_id: EventId, total: u32, booked: u32) {
        tracing::warn!(
            %event_id,
            total_tickets = total,
            booked_tickets = booked,
            "Event is sold out, no tickets can be added"
        );
        metrics::counter!("cart.sold_out.rejected").increment(1);

        if state.remove(&event_id).is_some() {
            tracing::debug!(%event_id, "Dropped existing line for sold-out event");
        }
        state.set_notice(Some(CartNotice::SoldOut { event_id }));
    }

    fn upsert_line(state: &mut CartState, details: EventDetails, env: &CartEnvironment) {
        let total = details.total_tickets;
        let booked = details.booked_tickets;

        let Some(ceiling) = Self::ceiling(details.available_tickets()) else {
            Self::reject_sold_out(state, details.event_id, total, booked);
            return;
        };

        let requested = details.requested_quantity();
        let quantity = requested.min(ceiling);
        let notice = if quantity < requested {
            tracing::warn!(
                event_id = %details.event_id,
                requested = requested.get(),
                available = ceiling.get(),
                "Requested more tickets than available, clamping"
            );
            metrics::counter!("cart.quantity.clamped").increment(1);
            Some(CartNotice::QuantityClamped {
                event_id: details.event_id.clone(),
                requested: requested.get(),
                granted: quantity.get(),
            })
        } else {
            None
        };

        let price = details.price_per_ticket.unwrap_or(env.default_price);
        let now = env.clock.now();

        if let Some(line) = state.line_mut(&details.event_id) {
            line.quantity = quantity;
            line.price_per_ticket = price;
            line.snapshot = line.snapshot.refreshed(total, booked, now);
            tracing::debug!(event_id = %details.event_id, quantity = quantity.get(), "Updated cart line");
        } else {
            tracing::debug!(event_id = %details.event_id, quantity = quantity.get(), "Added cart line");
            state.push(CartLine {
                event_id: details.event_id,
                quantity,
                price_per_ticket: price,
                snapshot: TicketSnapshot::new(total, booked, now),
                details: details.description,
            });
        }

        state.set_notice(notice);
    }

    fn increment_line(state: &mut CartState, event_id: &EventId) {
        let Some(line) = state.line_mut(event_id) else {
            tracing::debug!(%event_id, "Increment for event not in cart ignored");
            return;
        };

        if line.at_capacity() {
            let available = line.available_tickets();
            tracing::warn!(
                %event_id,
                quantity = line.quantity.get(),
                available,
                "Cannot add more tickets than available"
            );
            state.set_notice(Some(CartNotice::AtCapacity {
                event_id: event_id.clone(),
                available,
            }));
            return;
        }

        line.quantity = line.quantity.saturating_add(1);
        tracing::debug!(%event_id, quantity = line.quantity.get(), "Incremented cart line");
        state.set_notice(None);
    }

    fn decrement_line(state: &mut CartState, event_id: &EventId) {
        let Some(index) = state.position(event_id) else {
            tracing::debug!(%event_id, "Decrement for event not in cart ignored");
            return;
        };

        let remaining = state.lines()[index].quantity.get() - 1;
        match NonZeroU32::new(remaining) {
            Some(quantity) => {
                if let Some(line) = state.line_mut(event_id) {
                    line.quantity = quantity;
                }
                tracing::debug!(%event_id, quantity = remaining, "Decremented cart line");
            },
            None => {
                state.remove_at(index);
                tracing::debug!(%event_id, "Removed cart line at one ticket");
            },
        }
        state.set_notice(None);
    }

    fn remove_line(state: &mut CartState, event_id: &EventId) {
        if state.remove(event_id).is_some() {
            tracing::debug!(%event_id, "Removed cart line");
            state.set_notice(None);
        }
    }

    fn refresh_availability(
        state: &mut CartState,
        event_id: EventId,
        total: u32,
        booked: u32,
        env: &CartEnvironment,
    ) {
        if !state.contains(&event_id) {
            tracing::debug!(%event_id, "Availability refresh for event not in cart ignored");
            return;
        }

        let Some(ceiling) = Self::ceiling(i64::from(total) - i64::from(booked)) else {
            Self::reject_sold_out(state, event_id, total, booked);
            return;
        };

        let mut notice = None;
        if let Some(line) = state.line_mut(&event_id) {
            line.snapshot = line.snapshot.refreshed(total, booked, env.clock.now());
            if line.quantity > ceiling {
                tracing::warn!(
                    %event_id,
                    held = line.quantity.get(),
                    available = ceiling.get(),
                    "Availability dropped below held quantity, clamping"
                );
                metrics::counter!("cart.quantity.clamped").increment(1);
                notice = Some(CartNotice::QuantityClamped {
                    event_id: event_id.clone(),
                    requested: line.quantity.get(),
                    granted: ceiling.get(),
                });
                line.quantity = ceiling;
            }
        }
        state.set_notice(notice);
    }
}

impl Reducer for CartReducer {
    type State = CartState;
    type Action = CartAction;
    type Environment = CartEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            CartAction::UpsertLine(details) => Self::upsert_line(state, details, env),
            CartAction::IncrementLine(event_id) => Self::increment_line(state, &event_id),
            CartAction::DecrementLine(event_id) => Self::decrement_line(state, &event_id),
            CartAction::RemoveLine(event_id) => Self::remove_line(state, &event_id),
            CartAction::Clear => {
                state.clear();
                tracing::debug!("Cleared cart");
            },
            CartAction::RefreshAvailability {
                event_id,
                total_tickets,
                booked_tickets,
            } => Self::refresh_availability(state, event_id, total_tickets, booked_tickets, env),
            CartAction::ReserveEvent { record, quantity } => {
                return smallvec![Effect::dispatch(CartAction::UpsertLine(
                    record.to_details(quantity)
                ))];
            },
        }

        SmallVec::new()
    }
}

//! Order summary shown next to the payment form.

use crate::types::{CartLine, CartState, EventId, Money};
use serde::Serialize;
use std::fmt::Write as _;

/// Placeholder for descriptive fields the event did not provide
const NOT_AVAILABLE: &str = "N/A";

/// One line of the order summary
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRow {
    /// Event id
    pub event_id: EventId,
    /// Event title
    pub title: Option<String>,
    /// Event date
    pub date: Option<String>,
    /// Venue name
    pub venue: Option<String>,
    /// Venue address
    pub address: Option<String>,
    /// Tickets
    pub quantity: u32,
    /// Unit price
    pub price_per_ticket: Money,
    /// `quantity × price_per_ticket`
    pub subtotal: Money,
}

impl From<&CartLine> for OrderRow {
    fn from(line: &CartLine) -> Self {
        let location = line.details.location.as_ref();
        Self {
            event_id: line.event_id.clone(),
            title: line.details.title.clone(),
            date: line.details.date.clone(),
            venue: location.and_then(|location| location.name.clone()),
            address: location.and_then(|location| location.address.clone()),
            quantity: line.quantity.get(),
            price_per_ticket: line.price_per_ticket,
            subtotal: line.subtotal(),
        }
    }
}

/// Read-only view of a non-empty cart for checkout
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    /// One row per cart line, in cart order
    pub rows: Vec<OrderRow>,
    /// Tickets across all rows
    pub ticket_count: u64,
    /// Sum of all subtotals
    pub total: Money,
}

impl OrderSummary {
    /// Summarise a cart
    ///
    /// Returns `None` for an empty cart; checkout has nothing to show and
    /// the visitor belongs back on the event list.
    #[must_use]
    pub fn from_state(state: &CartState) -> Option<Self> {
        if state.is_empty() {
            return None;
        }

        Some(Self {
            rows: state.lines().iter().map(OrderRow::from).collect(),
            ticket_count: state.ticket_count(),
            total: state.total_price(),
        })
    }

    /// The row featured at the top of the payment page (the first event added)
    #[must_use]
    pub fn headline(&self) -> Option<&OrderRow> {
        self.rows.first()
    }

    /// Plain-text rendering, one block per event
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for row in &self.rows {
            let _ = writeln!(
                out,
                "Event: {}",
                row.title.as_deref().unwrap_or("Untitled event")
            );
            let _ = writeln!(out, "Date: {}", row.date.as_deref().unwrap_or(NOT_AVAILABLE));
            let _ = writeln!(
                out,
                "Venue: {}, {}",
                row.venue.as_deref().unwrap_or(NOT_AVAILABLE),
                row.address.as_deref().unwrap_or(NOT_AVAILABLE)
            );
            let _ = writeln!(out, "Tickets: {}", row.quantity);
            let _ = writeln!(out, "Price per ticket: {}", row.price_per_ticket);
            let _ = writeln!(out, "Subtotal: {}", row.subtotal);
            out.push('\n');
        }
        let _ = write!(out, "Total ({} tickets): {}", self.ticket_count, self.total);
        out
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::reducer::{CartEnvironment, CartReducer};
    use crate::types::{CartAction, EventDescription, EventDetails, Location};
    use exhibit_cart_core::reducer::Reducer;
    use exhibit_cart_testing::test_clock;
    use std::sync::Arc;

    fn cart() -> CartState {
        let env = CartEnvironment::new(Arc::new(test_clock()));
        let mut state = CartState::new();
        let description = EventDescription {
            title: Some("Light and Shadow".to_string()),
            date: Some("2025-06-14".to_string()),
            location: Some(Location {
                name: Some("Sculpture Hall".to_string()),
                ..Location::default()
            }),
            ..EventDescription::default()
        };

        for action in [
            CartAction::UpsertLine(
                EventDetails::new("A", 40, 0)
                    .with_quantity(2)
                    .with_price(Money::from_kroner(95))
                    .with_description(description),
            ),
            CartAction::UpsertLine(EventDetails::new("B", 10, 0).with_quantity(3)),
        ] {
            CartReducer::new().reduce(&mut state, action, &env);
        }
        state
    }

    #[test]
    fn empty_cart_has_no_summary() {
        assert_eq!(OrderSummary::from_state(&CartState::new()), None);
    }

    #[test]
    fn totals_cover_every_line() {
        let summary = OrderSummary::from_state(&cart()).unwrap();

        assert_eq!(summary.rows.len(), 2);
        assert_eq!(summary.ticket_count, 5);
        assert_eq!(summary.rows[0].subtotal, Money::from_kroner(190));
        assert_eq!(summary.rows[1].subtotal, Money::from_kroner(135));
        assert_eq!(summary.total, Money::from_kroner(325));
        assert_eq!(summary.headline().unwrap().event_id, EventId::new("A"));
    }

    #[test]
    fn text_falls_back_for_missing_fields() {
        let text = OrderSummary::from_state(&cart()).unwrap().render_text();

        assert!(text.contains("Event: Light and Shadow"));
        assert!(text.contains("Venue: Sculpture Hall, N/A"));
        assert!(text.contains("Event: Untitled event"));
        assert!(text.contains("Date: N/A"));
        assert!(text.ends_with("Total (5 tickets): 325.00 DKK"));
    }
}

//! Event records as served by the events API.
//!
//! The API is the source of truth for capacity (`location.maxGuests`) and
//! bookings. A record is turned into an [`EventDetails`] request when a
//! visitor picks tickets on the event page.

use crate::error::CartError;
use crate::lenient;
use crate::types::{EventDescription, EventDetails, EventId, Location, Money};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One event from the events API
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    /// Event id
    pub id: EventId,
    /// Title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Date as sent by the API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Start time as sent by the API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Free-text description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Venue, including its capacity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Tickets already sold
    #[serde(default, deserialize_with = "lenient::count")]
    pub booked_tickets: u32,
    /// Unit price, if the curator set one
    #[serde(
        default,
        deserialize_with = "lenient::optional_price",
        skip_serializing_if = "Option::is_none"
    )]
    pub price_per_ticket: Option<Money>,
    /// Everything else (artwork ids, curator fields)
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl EventRecord {
    /// Decode a single record
    ///
    /// # Errors
    ///
    /// Returns [`CartError::MalformedEventRecord`] if the JSON is invalid or
    /// has no usable `id`.
    pub fn from_json(json: &str) -> Result<Self, CartError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Decode the list returned by the events listing endpoint
    ///
    /// # Errors
    ///
    /// Returns [`CartError::MalformedEventRecord`] if the JSON is not an
    /// array of records.
    pub fn list_from_json(json: &str) -> Result<Vec<Self>, CartError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Capacity of the venue; `0` when the API does not say
    #[must_use]
    pub fn total_tickets(&self) -> u32 {
        self.location
            .as_ref()
            .and_then(|location| location.max_guests)
            .unwrap_or(0)
    }

    /// Tickets still for sale (may be ≤ 0)
    #[must_use]
    pub fn available_tickets(&self) -> i64 {
        i64::from(self.total_tickets()) - i64::from(self.booked_tickets)
    }

    /// Whether no ticket can be reserved
    #[must_use]
    pub fn is_sold_out(&self) -> bool {
        self.available_tickets() <= 0
    }

    /// Build the cart request for this event
    ///
    /// The record's descriptive fields travel with the request so the cart
    /// line can be rendered without another fetch.
    #[must_use]
    pub fn to_details(&self, quantity: Option<u32>) -> EventDetails {
        EventDetails {
            event_id: self.id.clone(),
            quantity,
            total_tickets: self.total_tickets(),
            booked_tickets: self.booked_tickets,
            price_per_ticket: self.price_per_ticket,
            description: EventDescription {
                title: self.title.clone(),
                date: self.date.clone(),
                time: self.time.clone(),
                description: self.description.clone(),
                location: self.location.clone(),
                extra: self.extra.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    const RECORD: &str = r#"{
        "id": "b7c1",
        "title": "Light and Shadow",
        "date": "2025-06-14",
        "time": "14:00",
        "description": "Guided tour",
        "location": { "id": 3, "name": "Sculpture Hall", "address": "Solvgade 48", "maxGuests": 40 },
        "bookedTickets": 38,
        "pricePerTicket": 95,
        "artworkIds": ["KMS1", "KMS3625"]
    }"#;

    #[test]
    fn decodes_record_with_capacity_from_location() {
        let record = EventRecord::from_json(RECORD).unwrap();

        assert_eq!(record.id, EventId::new("b7c1"));
        assert_eq!(record.total_tickets(), 40);
        assert_eq!(record.available_tickets(), 2);
        assert!(!record.is_sold_out());
        assert_eq!(record.price_per_ticket, Some(Money::from_kroner(95)));
        assert!(record.extra.contains_key("artworkIds"));
    }

    #[test]
    fn details_carry_description_and_counts() {
        let details = EventRecord::from_json(RECORD).unwrap().to_details(Some(3));

        assert_eq!(details.event_id, EventId::new("b7c1"));
        assert_eq!(details.quantity, Some(3));
        assert_eq!(details.total_tickets, 40);
        assert_eq!(details.booked_tickets, 38);
        assert_eq!(details.description.title.as_deref(), Some("Light and Shadow"));
        assert_eq!(
            details
                .description
                .location
                .as_ref()
                .and_then(|location| location.name.as_deref()),
            Some("Sculpture Hall")
        );
    }

    #[test]
    fn missing_location_means_sold_out() {
        let record = EventRecord::from_json(r#"{ "id": 4, "bookedTickets": null }"#).unwrap();
        assert_eq!(record.total_tickets(), 0);
        assert!(record.is_sold_out());
        assert_eq!(record.price_per_ticket, None);
    }

    #[test]
    fn list_decodes_every_record() {
        let records =
            EventRecord::list_from_json(r#"[{ "id": 1 }, { "id": "2", "title": "B" }]"#).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].title.as_deref(), Some("B"));
    }

    #[test]
    fn record_without_id_is_malformed() {
        let result = EventRecord::from_json(r#"{ "title": "No id" }"#);
        assert!(matches!(result, Err(CartError::MalformedEventRecord(_))));
    }
}

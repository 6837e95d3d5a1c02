//! Domain types for the ticket cart.
//!
//! A cart holds at most one [`CartLine`] per event. Each line carries the
//! chosen quantity together with a [`TicketSnapshot`]: the event's capacity
//! and booked count as the caller last reported them. Availability is always
//! derived from that snapshot and never stored on its own.

use crate::lenient;
use crate::record::EventRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::num::NonZeroU32;

// ============================================================================
// Identifiers and money
// ============================================================================

/// Opaque event identifier, unique within a cart
///
/// The events API hands out ids as strings or numbers; both decode to the
/// same textual id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Creates an `EventId` from any string-like value
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EventId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl<'de> Deserialize<'de> for EventId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(id) => Ok(Self(id)),
            Value::Number(id) => Ok(Self(id.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "event id must be a string or number, got {other}"
            ))),
        }
    }
}

/// Money amount in øre (1/100 DKK)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(u64);

/// Ticket price used when neither the caller nor the events API supplies one
pub const DEFAULT_TICKET_PRICE: Money = Money::from_kroner(45);

impl Money {
    /// Zero kroner
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from øre
    #[must_use]
    pub const fn from_ore(ore: u64) -> Self {
        Self(ore)
    }

    /// Creates a `Money` value from whole kroner, saturating on overflow
    #[must_use]
    pub const fn from_kroner(kroner: u64) -> Self {
        Self(kroner.saturating_mul(100))
    }

    /// Creates a `Money` value from a fractional kroner amount
    ///
    /// Rounds to the nearest øre. Returns `None` unless the amount is
    /// positive and finite.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // `as` saturates; sign checked
    pub fn from_kroner_f64(kroner: f64) -> Option<Self> {
        if !kroner.is_finite() || kroner <= 0.0 {
            return None;
        }
        let ore = (kroner * 100.0).round();
        if ore < 1.0 {
            return None;
        }
        Some(Self(ore as u64))
    }

    /// Returns the amount in øre
    #[must_use]
    pub const fn ore(self) -> u64 {
        self.0
    }

    /// Returns the amount in kroner
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // display only
    pub fn kroner(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Price of `quantity` items at this unit price, saturating on overflow
    #[must_use]
    pub const fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(quantity as u64))
    }
}

impl std::ops::Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, amount| acc + amount)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02} DKK", self.0 / 100, self.0 % 100)
    }
}

/// Serialized as a kroner amount, matching the events API
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.kroner())
    }
}

// ============================================================================
// Event descriptions
// ============================================================================

/// Venue of an exhibition event
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Venue name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Street address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Seating capacity, used as the event's total ticket count
    #[serde(
        default,
        deserialize_with = "lenient::optional_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_guests: Option<u32>,
    /// Any other venue fields, passed through untouched
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Descriptive fields carried on a cart line
///
/// The cart never interprets these. Known fields are typed; everything else
/// the caller sends lands in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDescription {
    /// Event title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Event date as sent by the API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Event start time as sent by the API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Free-text description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Venue
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Opaque pass-through payload (artwork references, etc.)
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Request to add an event to the cart or rewrite its line
///
/// Decodes leniently from UI/API JSON: missing or non-numeric counts become
/// `0`, a missing or non-positive price falls back to the default. The id
/// is read from `eventId`, or from `id` when `eventId` is absent; a payload
/// carrying both (an event record spread into a cart line) keeps `eventId`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "EventDetailsWire")]
pub struct EventDetails {
    /// Event to reserve tickets for
    pub event_id: EventId,
    /// Requested ticket count; `None` or `0` means one ticket
    pub quantity: Option<u32>,
    /// Event capacity at the time of the request
    pub total_tickets: u32,
    /// Tickets already booked by others at the time of the request
    pub booked_tickets: u32,
    /// Unit price; `None` uses the environment's default price
    pub price_per_ticket: Option<Money>,
    /// Pass-through descriptive fields
    #[serde(flatten)]
    pub description: EventDescription,
}

/// Incoming shape of [`EventDetails`] before the id is resolved
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventDetailsWire {
    #[serde(default)]
    event_id: Option<EventId>,
    #[serde(default)]
    id: Option<EventId>,
    #[serde(default, deserialize_with = "lenient::optional_count")]
    quantity: Option<u32>,
    #[serde(default, deserialize_with = "lenient::count")]
    total_tickets: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    booked_tickets: u32,
    #[serde(default, deserialize_with = "lenient::optional_price")]
    price_per_ticket: Option<Money>,
    #[serde(flatten)]
    description: EventDescription,
}

impl TryFrom<EventDetailsWire> for EventDetails {
    type Error = &'static str;

    fn try_from(wire: EventDetailsWire) -> Result<Self, Self::Error> {
        let event_id = wire
            .event_id
            .or(wire.id)
            .ok_or("missing field `eventId`")?;
        Ok(Self {
            event_id,
            quantity: wire.quantity,
            total_tickets: wire.total_tickets,
            booked_tickets: wire.booked_tickets,
            price_per_ticket: wire.price_per_ticket,
            description: wire.description,
        })
    }
}

impl EventDetails {
    /// Creates a request with no price and no description
    #[must_use]
    pub fn new(event_id: impl Into<EventId>, total_tickets: u32, booked_tickets: u32) -> Self {
        Self {
            event_id: event_id.into(),
            quantity: None,
            total_tickets,
            booked_tickets,
            price_per_ticket: None,
            description: EventDescription::default(),
        }
    }

    /// Sets the requested quantity
    #[must_use]
    pub const fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// Sets the unit price
    #[must_use]
    pub const fn with_price(mut self, price: Money) -> Self {
        self.price_per_ticket = Some(price);
        self
    }

    /// Sets the descriptive fields
    #[must_use]
    pub fn with_description(mut self, description: EventDescription) -> Self {
        self.description = description;
        self
    }

    /// Tickets still for sale according to this request (may be ≤ 0)
    #[must_use]
    pub fn available_tickets(&self) -> i64 {
        i64::from(self.total_tickets) - i64::from(self.booked_tickets)
    }

    /// Requested quantity with absent or zero requests read as one ticket
    #[must_use]
    pub fn requested_quantity(&self) -> NonZeroU32 {
        self.quantity
            .and_then(NonZeroU32::new)
            .unwrap_or(NonZeroU32::MIN)
    }
}

// ============================================================================
// Cart lines
// ============================================================================

/// Point-in-time copy of an event's ticket counts
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketSnapshot {
    /// Event capacity
    pub total_tickets: u32,
    /// Tickets booked by others
    pub booked_tickets: u32,
    /// When the counts were captured
    pub taken_at: DateTime<Utc>,
}

impl TicketSnapshot {
    /// Creates a snapshot
    #[must_use]
    pub const fn new(total_tickets: u32, booked_tickets: u32, taken_at: DateTime<Utc>) -> Self {
        Self {
            total_tickets,
            booked_tickets,
            taken_at,
        }
    }

    /// Snapshot for the given counts, keeping `taken_at` when they did not change
    ///
    /// Re-applying identical counts must not alter the line.
    #[must_use]
    pub const fn refreshed(
        self,
        total_tickets: u32,
        booked_tickets: u32,
        now: DateTime<Utc>,
    ) -> Self {
        if self.total_tickets == total_tickets && self.booked_tickets == booked_tickets {
            self
        } else {
            Self::new(total_tickets, booked_tickets, now)
        }
    }

    /// `total_tickets - booked_tickets`; negative when overbooked
    #[must_use]
    pub fn available(&self) -> i64 {
        i64::from(self.total_tickets) - i64::from(self.booked_tickets)
    }
}

/// One event's reservation in the cart
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Event this line reserves tickets for
    pub event_id: EventId,
    /// Ticket count, always within `1..=available`
    pub quantity: NonZeroU32,
    /// Unit price
    pub price_per_ticket: Money,
    /// Availability snapshot the quantity was last checked against
    pub snapshot: TicketSnapshot,
    /// Pass-through descriptive fields
    #[serde(flatten)]
    pub details: EventDescription,
}

impl CartLine {
    /// Tickets still for sale according to this line's snapshot
    #[must_use]
    pub fn available_tickets(&self) -> i64 {
        self.snapshot.available()
    }

    /// Whether one more ticket would exceed the snapshot
    #[must_use]
    pub fn at_capacity(&self) -> bool {
        i64::from(self.quantity.get()) >= self.available_tickets()
    }

    /// `quantity × price_per_ticket`
    #[must_use]
    pub const fn subtotal(&self) -> Money {
        self.price_per_ticket.times(self.quantity.get())
    }
}

// ============================================================================
// Notices
// ============================================================================

/// Outcome of the last mutation that the UI may want to show
///
/// Notices are informational. Every mutation that changes the cart's lines
/// replaces the notice; no-ops leave it alone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CartNotice {
    /// The requested quantity exceeded availability and was lowered
    #[serde(rename_all = "camelCase")]
    QuantityClamped {
        /// Event whose line was clamped
        event_id: EventId,
        /// Quantity the caller asked for
        requested: u32,
        /// Quantity stored
        granted: u32,
    },
    /// The event has no tickets left; it has no line in the cart
    #[serde(rename_all = "camelCase")]
    SoldOut {
        /// Event that was rejected or dropped
        event_id: EventId,
    },
    /// An increment was rejected because the line already holds every available ticket
    #[serde(rename_all = "camelCase")]
    AtCapacity {
        /// Event whose increment was rejected
        event_id: EventId,
        /// Tickets available according to the line's snapshot
        available: i64,
    },
}

// ============================================================================
// State
// ============================================================================

/// The visitor's cart
///
/// Lines keep insertion order. Only the reducer mutates a cart, which keeps
/// the invariants: one line per event, and every quantity in
/// `1..=available`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartState {
    lines: Vec<CartLine>,
    last_notice: Option<CartNotice>,
}

impl CartState {
    /// Creates an empty cart
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lines: Vec::new(),
            last_notice: None,
        }
    }

    /// All lines in insertion order
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for `event_id`, if any
    #[must_use]
    pub fn line(&self, event_id: &EventId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.event_id == event_id)
    }

    /// Whether the cart has a line for `event_id`
    #[must_use]
    pub fn contains(&self, event_id: &EventId) -> bool {
        self.line(event_id).is_some()
    }

    /// Quantity held for `event_id` (0 when absent)
    #[must_use]
    pub fn quantity(&self, event_id: &EventId) -> u32 {
        self.line(event_id).map_or(0, |line| line.quantity.get())
    }

    /// Number of lines
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The first line added, shown as the headline on the payment page
    #[must_use]
    pub fn first_line(&self) -> Option<&CartLine> {
        self.lines.first()
    }

    /// Tickets across all lines
    #[must_use]
    pub fn ticket_count(&self) -> u64 {
        self.lines
            .iter()
            .map(|line| u64::from(line.quantity.get()))
            .sum()
    }

    /// Sum of all line subtotals
    #[must_use]
    pub fn total_price(&self) -> Money {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Notice left by the last mutation, if any
    #[must_use]
    pub const fn last_notice(&self) -> Option<&CartNotice> {
        self.last_notice.as_ref()
    }

    pub(crate) fn position(&self, event_id: &EventId) -> Option<usize> {
        self.lines.iter().position(|line| &line.event_id == event_id)
    }

    pub(crate) fn line_mut(&mut self, event_id: &EventId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|line| &line.event_id == event_id)
    }

    pub(crate) fn push(&mut self, line: CartLine) {
        self.lines.push(line);
    }

    pub(crate) fn remove_at(&mut self, index: usize) -> CartLine {
        self.lines.remove(index)
    }

    pub(crate) fn remove(&mut self, event_id: &EventId) -> Option<CartLine> {
        self.position(event_id).map(|index| self.lines.remove(index))
    }

    pub(crate) fn clear(&mut self) {
        self.lines.clear();
        self.last_notice = None;
    }

    pub(crate) fn set_notice(&mut self, notice: Option<CartNotice>) {
        self.last_notice = notice;
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Every input the cart reducer accepts
#[derive(Clone, Debug, PartialEq)]
pub enum CartAction {
    /// Add a line for the event, or rewrite the existing one
    UpsertLine(EventDetails),

    /// Add one ticket, if the line's snapshot allows it
    IncrementLine(EventId),

    /// Remove one ticket; a line at one ticket is removed
    DecrementLine(EventId),

    /// Delete the event's line
    RemoveLine(EventId),

    /// Empty the cart
    Clear,

    /// Replace a line's availability snapshot with fresher counts
    RefreshAvailability {
        /// Event to refresh
        event_id: EventId,
        /// New capacity
        total_tickets: u32,
        /// New booked count
        booked_tickets: u32,
    },

    /// Reserve tickets for an event record fetched from the events API
    ReserveEvent {
        /// The record as returned by the API
        record: Box<EventRecord>,
        /// Requested ticket count
        quantity: Option<u32>,
    },
}

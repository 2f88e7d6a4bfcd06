//! Domain types shared by the eligibility, schedule and selection modules.
//!
//! Selectable items (tickets, coupons, sub-events) are the unit every other module
//! works on: the resolver decides whether one is visible, the schedule module
//! decides whether two collide, and the selection reducer tracks which ones the
//! user has chosen.

use crate::condition::ConditionSet;
use crate::error::IntervalError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// Identifiers
// ============================================================================

/// Opaque identifier of a selectable item, as issued by the backend
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Creates an `ItemId` from any string-like value
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Value Objects
// ============================================================================

/// Represents money in cents to avoid floating-point arithmetic errors
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Returns `true` for a free item
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// A start/end pair in UTC
///
/// `start <= end` always holds; an interval may be empty (`start == end`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Interval {
    /// Creates an interval
    ///
    /// # Errors
    ///
    /// Returns [`IntervalError::EndBeforeStart`] when `end` precedes `start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, IntervalError> {
        if end < start {
            return Err(IntervalError::EndBeforeStart { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parses an interval from two ISO-8601 / RFC 3339 timestamps
    ///
    /// # Errors
    ///
    /// Returns [`IntervalError::InvalidTimestamp`] if either side does not parse,
    /// or [`IntervalError::EndBeforeStart`] if the parsed end precedes the start.
    pub fn parse(start: &str, end: &str) -> Result<Self, IntervalError> {
        Self::new(parse_timestamp(start)?, parse_timestamp(end)?)
    }

    /// Start instant
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// End instant
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Returns `true` if `self` lies entirely within `other`
    #[must_use]
    pub fn is_within(&self, other: &Self) -> bool {
        self.start >= other.start && self.end <= other.end
    }

    /// Returns `true` if the half-open spans `[start, end)` intersect
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, IntervalError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|source| IntervalError::InvalidTimestamp {
            raw: raw.to_string(),
            reason: source.to_string(),
        })
}

// ============================================================================
// Selectable Items
// ============================================================================

/// What kind of thing an item is
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Admission ticket
    #[default]
    Ticket,
    /// Discount coupon
    Coupon,
    /// Session within an event
    SubEvent,
}

/// A ticket, coupon, or sub-event the user may choose
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectableItem {
    /// Backend identifier
    pub id: ItemId,
    /// Display title, used when naming colliding items
    pub title: String,
    /// Item kind
    pub kind: ItemKind,
    /// Eligibility rules (AND-combined)
    pub conditions: ConditionSet,
    /// Price, if the item is priced
    pub price: Option<Money>,
    /// Remaining capacity (`None` means unlimited)
    pub slots_left: Option<u32>,
    /// Time span for time-bound items
    pub interval: Option<Interval>,
    /// Whether the backend already recorded this item for the registrant
    pub already_committed: bool,
    /// Dates the registrant must pick one of on entry (empty when none is asked)
    #[serde(default)]
    pub entry_dates: Vec<NaiveDate>,
}

impl SelectableItem {
    /// Creates an unconditional, free, untimed item
    #[must_use]
    pub fn new(id: impl Into<ItemId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind: ItemKind::default(),
            conditions: ConditionSet::default(),
            price: None,
            slots_left: None,
            interval: None,
            already_committed: false,
            entry_dates: Vec::new(),
        }
    }

    /// Sets the item kind
    #[must_use]
    pub const fn with_kind(mut self, kind: ItemKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the eligibility rules
    #[must_use]
    pub fn with_conditions(mut self, conditions: ConditionSet) -> Self {
        self.conditions = conditions;
        self
    }

    /// Sets the price
    #[must_use]
    pub const fn with_price(mut self, price: Money) -> Self {
        self.price = Some(price);
        self
    }

    /// Sets the remaining capacity
    #[must_use]
    pub const fn with_slots_left(mut self, slots: u32) -> Self {
        self.slots_left = Some(slots);
        self
    }

    /// Sets the time span
    #[must_use]
    pub const fn with_interval(mut self, interval: Interval) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Marks the item as already recorded by the backend
    #[must_use]
    pub const fn committed(mut self) -> Self {
        self.already_committed = true;
        self
    }

    /// Sets the selectable entry dates
    #[must_use]
    pub fn with_entry_dates(mut self, dates: Vec<NaiveDate>) -> Self {
        self.entry_dates = dates;
        self
    }

    /// Returns `true` if registering needs an entry date choice
    #[must_use]
    pub fn requires_entry_date(&self) -> bool {
        !self.entry_dates.is_empty()
    }

    /// Returns `true` if the item costs nothing (unpriced items are free)
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.price.is_none_or(|price| price.is_zero())
    }

    /// Returns `true` if capacity metadata says nothing is left
    #[must_use]
    pub fn is_sold_out(&self) -> bool {
        self.slots_left == Some(0)
    }
}

/// Ordered snapshot of the items offered in one form session, indexed by id
///
/// If the backend sends the same id twice, the first entry wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    items: Vec<SelectableItem>,
    by_id: HashMap<ItemId, usize>,
}

impl Catalog {
    /// Builds a catalog from items in display order
    #[must_use]
    pub fn new(items: Vec<SelectableItem>) -> Self {
        let mut kept = Vec::with_capacity(items.len());
        let mut by_id = HashMap::with_capacity(items.len());
        for item in items {
            if by_id.contains_key(&item.id) {
                tracing::warn!(item = %item.id, "duplicate item id in catalog, keeping first");
                continue;
            }
            by_id.insert(item.id.clone(), kept.len());
            kept.push(item);
        }
        Self { items: kept, by_id }
    }

    /// Returns the item with the given id
    #[must_use]
    pub fn get(&self, id: &ItemId) -> Option<&SelectableItem> {
        self.by_id.get(id).map(|&position| &self.items[position])
    }

    /// Items in display order
    #[must_use]
    pub fn items(&self) -> &[SelectableItem] {
        &self.items
    }

    /// Iterates items in display order
    pub fn iter(&self) -> impl Iterator<Item = &SelectableItem> {
        self.items.iter()
    }

    /// Number of items
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the catalog is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

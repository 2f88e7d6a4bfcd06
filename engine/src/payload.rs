//! Backend payload shapes and their conversion into engine types.
//!
//! The backend sends loosely typed JSON: operators and field types as free-form
//! strings, timestamps as ISO strings, prices as decimal numbers. Everything is
//! checked here, once, so the rest of the engine only sees valid values.

use crate::condition::{Condition, ConditionSet, Operator, ONE_OF_DELIMITER};
use crate::error::PayloadError;
use crate::form::{Field, FieldIndex, FieldType};
use crate::types::{Interval, ItemKind, Money, SelectableItem};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ============================================================================
// Wire Shapes
// ============================================================================

/// One rule as sent by the backend
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConditionPayload {
    /// Field id
    pub field: String,
    /// Operator tag
    pub operator: String,
    /// Operand; numbers and booleans are stringified, arrays become a delimited list
    #[serde(default)]
    pub value: Value,
}

impl ConditionPayload {
    fn into_condition(self, owner: &str) -> Result<Condition, PayloadError> {
        let operator: Operator =
            self.operator
                .trim()
                .parse()
                .map_err(|operator| PayloadError::UnknownOperator {
                    item: owner.to_string(),
                    operator,
                })?;

        let value = match self.value {
            Value::Array(members) => members
                .into_iter()
                .map(scalar_text)
                .collect::<Vec<_>>()
                .join(&ONE_OF_DELIMITER.to_string()),
            other => scalar_text(other),
        };

        Ok(Condition::new(self.field.trim(), operator, value))
    }
}

fn scalar_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text,
        other => other.to_string(),
    }
}

fn into_condition_set(
    payloads: Vec<ConditionPayload>,
    owner: &str,
) -> Result<ConditionSet, PayloadError> {
    payloads
        .into_iter()
        .map(|payload| payload.into_condition(owner))
        .collect()
}

/// A form field as sent by the backend
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldPayload {
    /// Field id
    pub id: String,
    /// Type tag (`text`, `number`, `select`, `checkbox`, ...)
    #[serde(rename = "type")]
    pub field_type: String,
    /// Human label
    #[serde(default)]
    pub title: String,
    /// Answer-map key
    pub field_key: String,
    /// Allowed values for select types
    #[serde(default)]
    pub options: Vec<String>,
    /// Visibility rules
    #[serde(default, alias = "conditions")]
    pub condition: Vec<ConditionPayload>,
}

impl FieldPayload {
    /// Converts the payload into a [`Field`]
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::MissingId`] for a blank id,
    /// [`PayloadError::UnknownFieldType`] for a type tag outside the closed set, or
    /// [`PayloadError::UnknownOperator`] for a visibility rule with an unknown operator.
    pub fn into_field(self) -> Result<Field, PayloadError> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err(PayloadError::MissingId);
        }

        let tag = self.field_type.trim().to_ascii_lowercase();
        let field_type: FieldType = serde_json::from_value(Value::String(tag)).map_err(|_| {
            PayloadError::UnknownFieldType {
                field: id.to_string(),
                field_type: self.field_type.clone(),
            }
        })?;

        let conditions = into_condition_set(self.condition, id)?;
        let title = if self.title.trim().is_empty() {
            self.field_key.clone()
        } else {
            self.title
        };

        let mut field = Field::new(id, self.field_key.as_str(), field_type)
            .with_options(self.options)
            .with_conditions(conditions);
        field.title = title;
        Ok(field)
    }
}

/// A ticket, coupon, or sub-event as sent by the backend
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemPayload {
    /// Item id
    #[serde(default)]
    pub id: String,
    /// Display title
    #[serde(default, alias = "name")]
    pub title: String,
    /// Item kind
    #[serde(default)]
    pub kind: ItemKind,
    /// Price in currency units (e.g. `15.5` or `"15.50"`)
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: Option<f64>,
    /// Remaining capacity; absent or `null` means unlimited
    #[serde(default)]
    pub slots_left: Option<u32>,
    /// ISO start timestamp
    #[serde(default)]
    pub start_time: Option<String>,
    /// ISO end timestamp
    #[serde(default)]
    pub end_time: Option<String>,
    /// Whether the registrant already booked the item
    #[serde(default)]
    pub already_booked: bool,
    /// Eligibility rules
    #[serde(default, alias = "condition")]
    pub conditions: Vec<ConditionPayload>,
    /// Dates offered for entry (`YYYY-MM-DD` or RFC 3339)
    #[serde(default, alias = "entry_dates")]
    pub entry_date: Vec<String>,
}

/// Accepts a price as a JSON number or a numeric string; blank strings mean unpriced
fn lenient_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => Ok(number.as_f64()),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
        Some(Value::String(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid price '{text}'"))),
        Some(other) => Err(serde::de::Error::custom(format!("invalid price {other}"))),
    }
}

fn parse_entry_date(item: &str, raw: &str) -> Result<NaiveDate, PayloadError> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(trimmed).map(|instant| instant.date_naive()))
        .map_err(|_| PayloadError::InvalidEntryDate {
            item: item.to_string(),
            raw: raw.to_string(),
        })
}

impl ItemPayload {
    /// Converts the payload into a [`SelectableItem`]
    ///
    /// # Errors
    ///
    /// Returns a [`PayloadError`] describing the first problem found: a blank id,
    /// an invalid price, an unknown operator, a half-supplied interval, an
    /// interval that does not parse or ends before it starts, or a bad entry date.
    pub fn into_item(self) -> Result<SelectableItem, PayloadError> {
        let id = self.id.trim().to_string();
        if id.is_empty() {
            return Err(PayloadError::MissingId);
        }

        let price = self.price.map(|raw| to_money(&id, raw)).transpose()?;
        let conditions = into_condition_set(self.conditions, &id)?;
        let entry_dates = self
            .entry_date
            .iter()
            .map(|raw| parse_entry_date(&id, raw))
            .collect::<Result<Vec<_>, _>>()?;

        let interval = match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(Interval::parse(&start, &end).map_err(|source| {
                PayloadError::InvalidInterval {
                    item: id.clone(),
                    source,
                }
            })?),
            (None, None) => None,
            _ => return Err(PayloadError::HalfOpenInterval { item: id }),
        };

        let title = if self.title.trim().is_empty() {
            id.clone()
        } else {
            self.title
        };

        Ok(SelectableItem {
            id: id.into(),
            title,
            kind: self.kind,
            conditions,
            price,
            slots_left: self.slots_left,
            interval,
            already_committed: self.already_booked,
            entry_dates,
        })
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // finite and non-negative
fn to_money(item: &str, raw: f64) -> Result<Money, PayloadError> {
    if !raw.is_finite() || raw < 0.0 {
        return Err(PayloadError::InvalidPrice {
            item: item.to_string(),
            price: raw.to_string(),
        });
    }
    Ok(Money::from_cents((raw * 100.0).round() as u64))
}

// ============================================================================
// Batch Parsing
// ============================================================================

/// An entry dropped during batch parsing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedEntry {
    /// Position in the input list
    pub index: usize,
    /// Why it was dropped
    pub error: PayloadError,
}

/// Result of parsing a list of items
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedItems {
    /// Valid items, in input order
    pub items: Vec<SelectableItem>,
    /// Dropped entries, in input order
    pub rejected: Vec<RejectedEntry>,
}

/// Converts every payload, keeping the valid ones
///
/// One bad entry never hides the rest of the catalog.
#[must_use]
pub fn parse_items(payloads: Vec<ItemPayload>) -> ParsedItems {
    collect_items(payloads.into_iter().map(ItemPayload::into_item))
}

fn collect_items(
    results: impl Iterator<Item = Result<SelectableItem, PayloadError>>,
) -> ParsedItems {
    let mut parsed = ParsedItems::default();
    for (index, result) in results.enumerate() {
        match result {
            Ok(item) => parsed.items.push(item),
            Err(error) => {
                tracing::warn!(index, %error, "dropping invalid item payload");
                parsed.rejected.push(RejectedEntry { index, error });
            }
        }
    }
    parsed
}

/// Parses a JSON array of items
///
/// Each entry is decoded on its own, so an entry with a wrongly typed member is
/// reported as [`PayloadError::Malformed`] in [`ParsedItems::rejected`] without
/// affecting its neighbours.
///
/// # Errors
///
/// Returns [`PayloadError::Malformed`] if the text is not a JSON array.
pub fn parse_items_json(json: &str) -> Result<ParsedItems, PayloadError> {
    let entries: Vec<Value> =
        serde_json::from_str(json).map_err(|e| PayloadError::Malformed(e.to_string()))?;

    Ok(collect_items(entries.into_iter().map(|entry| {
        serde_json::from_value::<ItemPayload>(entry)
            .map_err(|e| PayloadError::Malformed(e.to_string()))
            .and_then(ItemPayload::into_item)
    })))
}

/// Converts the form's fields into an index
///
/// Unlike items, fields are all-or-nothing: conditions reference fields by id,
/// so silently dropping one would change what other rules mean.
///
/// # Errors
///
/// Returns the first field conversion error, or [`PayloadError::Form`] for
/// duplicate ids or keys.
pub fn parse_fields(payloads: Vec<FieldPayload>) -> Result<FieldIndex, PayloadError> {
    let fields = payloads
        .into_iter()
        .map(FieldPayload::into_field)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(FieldIndex::from_fields(fields)?)
}

/// Parses a JSON array of fields
///
/// # Errors
///
/// Returns [`PayloadError::Malformed`] for invalid JSON, otherwise as [`parse_fields`].
pub fn parse_fields_json(json: &str) -> Result<FieldIndex, PayloadError> {
    let payloads: Vec<FieldPayload> =
        serde_json::from_str(json).map_err(|e| PayloadError::Malformed(e.to_string()))?;
    parse_fields(payloads)
}

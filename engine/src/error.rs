//! Error types for the registration engine.
//!
//! Evaluation and selection never fail: an unresolvable rule is simply not met and
//! a conflicting toggle is simply rejected. Errors only exist where data enters the
//! engine (form construction, interval parsing, backend payloads) and where the
//! engine hands a selection back to the outside world.

use crate::form::{FieldId, FieldKey};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised while building a field index.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    /// Two fields share an identifier.
    #[error("Duplicate field id: {0}")]
    DuplicateId(FieldId),

    /// Two fields share an answer key.
    #[error("Duplicate field key: {0}")]
    DuplicateKey(FieldKey),
}

/// Errors raised while constructing an [`Interval`](crate::types::Interval).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntervalError {
    /// A timestamp was not valid RFC 3339 / ISO-8601.
    #[error("Invalid timestamp '{raw}': {reason}")]
    InvalidTimestamp {
        /// The offending input.
        raw: String,
        /// Parser message.
        reason: String,
    },

    /// The end instant precedes the start instant.
    #[error("Interval ends ({end}) before it starts ({start})")]
    EndBeforeStart {
        /// Parsed start.
        start: DateTime<Utc>,
        /// Parsed end.
        end: DateTime<Utc>,
    },
}

/// Errors raised while normalizing backend payloads into engine types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// The entry has an empty identifier.
    #[error("Entry is missing an id")]
    MissingId,

    /// A condition names an operator the engine does not know.
    #[error("Item {item}: unknown operator '{operator}'")]
    UnknownOperator {
        /// Item (or field) carrying the condition.
        item: String,
        /// Raw operator tag.
        operator: String,
    },

    /// A field declares a type outside the closed set.
    #[error("Field {field}: unknown field type '{field_type}'")]
    UnknownFieldType {
        /// Field identifier.
        field: String,
        /// Raw type tag.
        field_type: String,
    },

    /// Only one of `start_time` / `end_time` was supplied.
    #[error("Item {item}: interval needs both start and end")]
    HalfOpenInterval {
        /// Item identifier.
        item: String,
    },

    /// The interval timestamps are malformed or inverted.
    #[error("Item {item}: {source}")]
    InvalidInterval {
        /// Item identifier.
        item: String,
        /// Underlying interval error.
        #[source]
        source: IntervalError,
    },

    /// An entry date is neither `YYYY-MM-DD` nor an RFC 3339 timestamp.
    #[error("Item {item}: invalid entry date '{raw}'")]
    InvalidEntryDate {
        /// Item identifier.
        item: String,
        /// Raw date as received.
        raw: String,
    },

    /// The price is negative or not a number.
    #[error("Item {item}: invalid price {price}")]
    InvalidPrice {
        /// Item identifier.
        item: String,
        /// Raw price as received.
        price: String,
    },

    /// The fields do not form a valid index.
    #[error(transparent)]
    Form(#[from] FormError),

    /// The payload is not valid JSON for the expected shape.
    #[error("Malformed payload: {0}")]
    Malformed(String),
}

/// Errors reported by the submission collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    /// The backend refused the selection.
    #[error("Submission rejected: {0}")]
    Rejected(String),

    /// The backend could not be reached.
    #[error("Submission transport failed: {0}")]
    Transport(String),
}

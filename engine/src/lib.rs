//! # Registration Engine
//!
//! Decides which tickets, coupons, and sub-events a registrant may see and choose.
//!
//! ## Pieces
//!
//! - [`condition`]: evaluates `field <operator> value` rules against form answers.
//!   Rules that cannot be resolved are simply not met.
//! - [`eligibility`]: filters items by their rules and decides when selection can
//!   be skipped.
//! - [`schedule`]: detects scheduling conflicts between time-bound items and groups
//!   them by date and start time.
//! - [`selection`]: the selection state machine, implemented as a
//!   [`Reducer`](registration_core::reducer::Reducer). Submission is an effect
//!   handed to an injected [`SelectionSubmitter`].
//! - [`payload`]: turns loosely typed backend JSON into the strict types above.
//!
//! ## Example
//!
//! ```
//! use registration_engine::{
//!     filter_eligible, AnswerMap, Condition, ConditionSet, Field, FieldIndex, FieldType,
//!     Operator, SelectableItem,
//! };
//!
//! let fields = FieldIndex::from_fields(vec![Field::new("f-age", "age", FieldType::Number)])?;
//! let items = vec![
//!     SelectableItem::new("general", "General"),
//!     SelectableItem::new("senior", "Senior").with_conditions(ConditionSet::new(vec![
//!         Condition::new("f-age", Operator::GreaterThan, "64"),
//!     ])),
//! ];
//!
//! let answers = AnswerMap::new().with_answer("age", "30");
//! let eligible = filter_eligible(&items, &answers, &fields);
//! assert_eq!(eligible.len(), 1);
//! # Ok::<(), registration_engine::FormError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod condition;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod form;
pub mod payload;
pub mod schedule;
pub mod selection;
pub mod types;

pub use condition::{Condition, ConditionSet, Operator};
pub use config::EngineConfig;
pub use eligibility::{
    direct_registration, filter_eligible, gating_keys, is_eligible, DirectRegistration,
    FormSettings, GatingKeys,
};
pub use error::{FormError, IntervalError, PayloadError, SubmissionError};
pub use form::{visible_fields, AnswerMap, AnswerValue, Field, FieldId, FieldIndex, FieldKey, FieldType};
pub use payload::{parse_fields_json, parse_items, parse_items_json, ParsedItems};
pub use schedule::{ConflictPolicy, DateGroup, ScheduleRules, TimeSlot};
pub use selection::{
    ItemDisplay, ItemState, Rejection, SelectionAction, SelectionDiff, SelectionEntry,
    SelectionEnvironment, SelectionReducer, SelectionSet, SelectionState, SelectionSubmitter,
};
pub use types::{Catalog, Interval, ItemId, ItemKind, Money, SelectableItem};

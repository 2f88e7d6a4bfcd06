//! Dynamic form model: typed fields and the answers a registrant has given.
//!
//! Conditions reference fields by [`FieldId`]; answers are keyed by [`FieldKey`].
//! The [`FieldIndex`] bridges the two and enforces that both are unique within a form.

use crate::condition::ConditionSet;
use crate::error::FormError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Identifier of a field, stable across a form and referenced by conditions
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(String);

impl FieldId {
    /// Creates a `FieldId`
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

impl From<&str> for FieldId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Machine name of a field, used as the answer-map key
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldKey(String);

impl FieldKey {
    /// Creates a `FieldKey`
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FieldKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed set of input types a form field can have
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Free text
    #[serde(alias = "email", alias = "phone", alias = "textarea")]
    Text,
    /// Numeric input
    Number,
    /// Pick exactly one option
    #[serde(alias = "select", alias = "radio")]
    SingleSelect,
    /// Pick any number of options
    #[serde(alias = "checkbox")]
    MultiSelect,
    /// Calendar date
    Date,
    /// Uploaded file(s)
    File,
    /// Yes / no
    Boolean,
}

impl FieldType {
    /// Returns `true` for single- and multi-select fields
    #[must_use]
    pub const fn is_select(self) -> bool {
        matches!(self, Self::SingleSelect | Self::MultiSelect)
    }
}

/// A named, typed input slot in a dynamic form
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Identifier referenced by conditions
    pub id: FieldId,
    /// Answer-map key
    pub key: FieldKey,
    /// Human label
    pub title: String,
    /// Input type
    pub field_type: FieldType,
    /// Allowed values, in display order (select types only)
    pub options: Vec<String>,
    /// Rules deciding whether the field itself is shown
    pub conditions: ConditionSet,
}

impl Field {
    /// Creates an unconditional field without options
    #[must_use]
    pub fn new(id: impl Into<FieldId>, key: impl Into<FieldKey>, field_type: FieldType) -> Self {
        let key = key.into();
        Self {
            id: id.into(),
            title: key.as_str().to_string(),
            key,
            field_type,
            options: Vec::new(),
            conditions: ConditionSet::default(),
        }
    }

    /// Sets the allowed options
    #[must_use]
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the visibility rules
    #[must_use]
    pub fn with_conditions(mut self, conditions: ConditionSet) -> Self {
        self.conditions = conditions;
        self
    }
}

/// Lookup of fields by id, preserving form order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldIndex {
    fields: Vec<Field>,
    by_id: HashMap<FieldId, usize>,
}

impl FieldIndex {
    /// Builds an index from fields in form order
    ///
    /// # Errors
    ///
    /// Returns [`FormError::DuplicateId`] or [`FormError::DuplicateKey`] if the
    /// uniqueness invariant is violated.
    pub fn from_fields(fields: Vec<Field>) -> Result<Self, FormError> {
        let mut by_id = HashMap::with_capacity(fields.len());
        let mut keys = HashMap::with_capacity(fields.len());

        for (position, field) in fields.iter().enumerate() {
            if by_id.insert(field.id.clone(), position).is_some() {
                return Err(FormError::DuplicateId(field.id.clone()));
            }
            if keys.insert(field.key.clone(), position).is_some() {
                return Err(FormError::DuplicateKey(field.key.clone()));
            }
        }

        Ok(Self { fields, by_id })
    }

    /// Returns the field with the given id
    #[must_use]
    pub fn get(&self, id: &FieldId) -> Option<&Field> {
        self.by_id.get(id).map(|&position| &self.fields[position])
    }

    /// Iterates fields in form order
    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    /// Number of fields
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the form has no fields
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A single answer: one value, or several for multi-select / multi-file fields
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    /// Scalar answer
    Single(String),
    /// Ordered sequence of values
    Many(Vec<String>),
}

impl AnswerValue {
    /// Iterates the values of the answer
    pub fn values(&self) -> impl Iterator<Item = &str> {
        let values: &[String] = match self {
            Self::Single(value) => std::slice::from_ref(value),
            Self::Many(values) => values,
        };
        values.iter().map(String::as_str)
    }

    /// Returns `true` if nothing meaningful was entered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values().all(|value| value.trim().is_empty())
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<&str>> for AnswerValue {
    fn from(values: Vec<&str>) -> Self {
        Self::Many(values.into_iter().map(str::to_string).collect())
    }
}

/// Current answers of a form session, keyed by field key
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerMap(HashMap<FieldKey, AnswerValue>);

impl AnswerMap {
    /// Creates an empty answer map (a fresh form session)
    #[must_use]
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Returns the answer for `key`, treating empty answers as absent
    #[must_use]
    pub fn answer(&self, key: &FieldKey) -> Option<&AnswerValue> {
        self.0.get(key).filter(|value| !value.is_empty())
    }

    /// Records an answer, replacing any previous one
    pub fn insert(&mut self, key: impl Into<FieldKey>, value: impl Into<AnswerValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Returns a copy with `key` set to `value`
    #[must_use]
    pub fn with_answer(&self, key: impl Into<FieldKey>, value: impl Into<AnswerValue>) -> Self {
        let mut next = self.clone();
        next.insert(key, value);
        next
    }

    /// Removes an answer
    pub fn remove(&mut self, key: &FieldKey) -> Option<AnswerValue> {
        self.0.remove(key)
    }
}

impl<K, V> FromIterator<(K, V)> for AnswerMap
where
    K: Into<FieldKey>,
    V: Into<AnswerValue>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Fields whose own visibility rules hold for the current answers, in form order
#[must_use]
pub fn visible_fields<'a>(fields: &'a FieldIndex, answers: &AnswerMap) -> Vec<&'a Field> {
    fields
        .iter()
        .filter(|field| field.conditions.holds(answers, fields))
        .collect()
}

//! Condition evaluator.
//!
//! A [`Condition`] compares the current answer of one field against a literal.
//! Evaluation is fail-closed: an unknown field, an operator the field type does not
//! support, an unanswered field, or a value that cannot be compared all make the
//! condition unsatisfied. Nothing here returns an error or panics.

use crate::form::{AnswerMap, AnswerValue, FieldId, FieldIndex, FieldType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator between members of a `one_of` operand
pub const ONE_OF_DELIMITER: char = ',';

/// Comparison applied by a condition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Exact (or numeric) equality
    Equals,
    /// Negated equality
    NotEquals,
    /// Substring match
    Contains,
    /// Numeric `>`
    GreaterThan,
    /// Numeric `<`
    LessThan,
    /// Membership in a delimited list
    OneOf,
    /// Boolean answer is true
    IsTrue,
    /// Boolean answer is false
    IsFalse,
}

impl Operator {
    /// All operators, in declaration order
    pub const ALL: [Self; 8] = [
        Self::Equals,
        Self::NotEquals,
        Self::Contains,
        Self::GreaterThan,
        Self::LessThan,
        Self::OneOf,
        Self::IsTrue,
        Self::IsFalse,
    ];

    /// Returns `true` if the operator is defined for the field type
    #[must_use]
    pub const fn supported_by(self, field_type: FieldType) -> bool {
        match field_type {
            FieldType::Text => matches!(self, Self::Equals | Self::Contains | Self::NotEquals),
            FieldType::Number => matches!(
                self,
                Self::Equals | Self::GreaterThan | Self::LessThan | Self::NotEquals
            ),
            FieldType::SingleSelect | FieldType::MultiSelect => {
                matches!(self, Self::Equals | Self::NotEquals | Self::OneOf)
            }
            FieldType::Boolean => matches!(self, Self::IsTrue | Self::IsFalse),
            FieldType::Date | FieldType::File => false,
        }
    }

    /// Operators a rule builder may offer for the field type
    #[must_use]
    pub fn for_field_type(field_type: FieldType) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|operator| operator.supported_by(field_type))
            .collect()
    }

    /// Wire tag of the operator
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Contains => "contains",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
            Self::OneOf => "one_of",
            Self::IsTrue => "is_true",
            Self::IsFalse => "is_false",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|operator| operator.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// A single rule: `field <operator> value`
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Condition {
    /// Field whose answer is inspected
    pub field: FieldId,
    /// Comparison
    pub operator: Operator,
    /// Literal operand (delimited list for `one_of`, ignored for boolean operators)
    pub value: String,
}

impl Condition {
    /// Creates a condition
    #[must_use]
    pub fn new(field: impl Into<FieldId>, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Decides whether the rule is satisfied by the current answers
    #[must_use]
    #[allow(clippy::float_cmp)] // numeric `equals` compares parsed values exactly
    pub fn evaluate(&self, answers: &AnswerMap, fields: &FieldIndex) -> bool {
        let Some(field) = fields.get(&self.field) else {
            tracing::trace!(field = %self.field, "condition references unknown field");
            return false;
        };

        if !self.operator.supported_by(field.field_type) {
            tracing::trace!(
                field = %self.field,
                operator = %self.operator,
                field_type = ?field.field_type,
                "operator not valid for field type"
            );
            return false;
        }

        let Some(answer) = answers.answer(&field.key) else {
            return false;
        };

        match self.operator {
            Operator::Equals => self.any_value(answer, field.field_type, |a, b| a == b),
            Operator::NotEquals => self.no_value_equals(answer, field.field_type),
            Operator::Contains => answer.values().any(|value| value.contains(self.value.as_str())),
            Operator::GreaterThan => any_numeric(answer, &self.value, |a, b| a > b),
            Operator::LessThan => any_numeric(answer, &self.value, |a, b| a < b),
            Operator::OneOf => {
                let mut members = self.value.split(ONE_OF_DELIMITER).map(str::trim);
                members.any(|member| answer.values().any(|value| value == member))
            }
            Operator::IsTrue => parse_bool(answer) == Some(true),
            Operator::IsFalse => parse_bool(answer) == Some(false),
        }
    }

    /// Equality over any element of the answer; numeric fields compare as numbers
    fn any_value(
        &self,
        answer: &AnswerValue,
        field_type: FieldType,
        compare: impl Fn(f64, f64) -> bool,
    ) -> bool {
        if field_type == FieldType::Number {
            return any_numeric(answer, &self.value, compare);
        }
        answer.values().any(|value| value == self.value)
    }

    /// Negated equality: no element may equal the operand, and on numeric fields
    /// every element must parse
    #[allow(clippy::float_cmp)]
    fn no_value_equals(&self, answer: &AnswerValue, field_type: FieldType) -> bool {
        if field_type != FieldType::Number {
            return answer.values().all(|value| value != self.value);
        }
        let Some(operand) = parse_number(&self.value) else {
            return false;
        };
        answer
            .values()
            .all(|value| parse_number(value).is_some_and(|number| number != operand))
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}

fn any_numeric(answer: &AnswerValue, operand: &str, compare: impl Fn(f64, f64) -> bool) -> bool {
    let Some(operand) = parse_number(operand) else {
        tracing::trace!(operand, "numeric condition with non-numeric operand");
        return false;
    };
    answer
        .values()
        .filter_map(parse_number)
        .any(|value| compare(value, operand))
}

fn parse_bool(answer: &AnswerValue) -> Option<bool> {
    let mut values = answer.values();
    let value = values.next()?.trim();
    if values.next().is_some() {
        return None;
    }
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Ordered, AND-combined list of conditions
///
/// Editing methods return a new set and leave the receiver untouched, so a set
/// can be shared between renders while a rule builder works on a copy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionSet(Vec<Condition>);

impl ConditionSet {
    /// Creates a set from conditions in rule order
    #[must_use]
    pub const fn new(conditions: Vec<Condition>) -> Self {
        Self(conditions)
    }

    /// `true` iff every condition holds (vacuously true when empty)
    #[must_use]
    pub fn holds(&self, answers: &AnswerMap, fields: &FieldIndex) -> bool {
        self.0
            .iter()
            .all(|condition| condition.evaluate(answers, fields))
    }

    /// Returns a copy with `condition` appended
    #[must_use]
    pub fn with(&self, condition: Condition) -> Self {
        let mut next = self.0.clone();
        next.push(condition);
        Self(next)
    }

    /// Returns a copy without the condition at `index`
    #[must_use]
    pub fn without(&self, index: usize) -> Self {
        let mut next = self.0.clone();
        if index < next.len() {
            next.remove(index);
        }
        Self(next)
    }

    /// Returns a copy with the condition at `index` replaced
    #[must_use]
    pub fn replace(&self, index: usize, condition: Condition) -> Self {
        let mut next = self.0.clone();
        if let Some(slot) = next.get_mut(index) {
            *slot = condition;
        }
        Self(next)
    }

    /// Field ids referenced by the set, in rule order
    pub fn referenced_fields(&self) -> impl Iterator<Item = &FieldId> {
        self.0.iter().map(|condition| &condition.field)
    }

    /// Iterates the conditions
    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.0.iter()
    }

    /// Number of conditions
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the set has no conditions
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Condition> for ConditionSet {
    fn from_iter<T: IntoIterator<Item = Condition>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::form::Field;

    fn fields() -> FieldIndex {
        FieldIndex::from_fields(vec![
            Field::new("f-name", "name", FieldType::Text),
            Field::new("f-age", "age", FieldType::Number),
            Field::new("f-role", "role", FieldType::SingleSelect)
                .with_options(["student", "professional", "speaker"]),
            Field::new("f-tracks", "tracks", FieldType::MultiSelect)
                .with_options(["rust", "go", "web"]),
            Field::new("f-veg", "vegetarian", FieldType::Boolean),
            Field::new("f-dob", "dob", FieldType::Date),
        ])
        .unwrap()
    }

    fn check(field: &str, operator: Operator, value: &str, answers: &AnswerMap) -> bool {
        Condition::new(field, operator, value).evaluate(answers, &fields())
    }

    #[test]
    fn test_age_scenario() {
        let over_18 = |answers: &AnswerMap| check("f-age", Operator::GreaterThan, "18", answers);

        assert!(over_18(&AnswerMap::new().with_answer("age", "21")));
        assert!(!over_18(&AnswerMap::new().with_answer("age", "15")));
        assert!(!over_18(&AnswerMap::new()));
    }

    #[test]
    fn test_unknown_field_is_unsatisfiable() {
        let answers = AnswerMap::new().with_answer("age", "21");
        for operator in Operator::ALL {
            assert!(!check("f-missing", operator, "21", &answers));
        }
    }

    #[test]
    fn test_absent_answer_is_false_for_every_operator() {
        let answers = AnswerMap::new();
        for operator in Operator::ALL {
            for field in ["f-name", "f-age", "f-role", "f-tracks", "f-veg"] {
                assert!(!check(field, operator, "x", &answers), "{field} {operator}");
            }
        }
    }

    #[test]
    fn test_operator_outside_field_type_is_unsatisfiable() {
        let answers = AnswerMap::new()
            .with_answer("name", "Ada")
            .with_answer("age", "30");
        assert!(!check("f-name", Operator::GreaterThan, "A", &answers));
        assert!(!check("f-age", Operator::Contains, "3", &answers));
        assert!(!check("f-name", Operator::IsTrue, "", &answers));
    }

    #[test]
    fn test_date_and_file_support_no_operators() {
        assert!(Operator::for_field_type(FieldType::Date).is_empty());
        assert!(Operator::for_field_type(FieldType::File).is_empty());
        let answers = AnswerMap::new().with_answer("dob", "2000-01-01");
        assert!(!check("f-dob", Operator::Equals, "2000-01-01", &answers));
    }

    #[test]
    fn test_non_numeric_answer_fails_numeric_comparison() {
        let answers = AnswerMap::new().with_answer("age", "twenty");
        assert!(!check("f-age", Operator::GreaterThan, "18", &answers));
        assert!(!check("f-age", Operator::LessThan, "18", &answers));
        assert!(!check("f-age", Operator::Equals, "20", &answers));
        assert!(!check("f-age", Operator::NotEquals, "20", &answers));

        let answers = AnswerMap::new().with_answer("age", "NaN");
        assert!(!check("f-age", Operator::GreaterThan, "18", &answers));
    }

    #[test]
    fn test_non_numeric_operand_fails_numeric_comparison() {
        let answers = AnswerMap::new().with_answer("age", "21");
        assert!(!check("f-age", Operator::GreaterThan, "adult", &answers));
    }

    #[test]
    fn test_numeric_equality_is_by_value() {
        let answers = AnswerMap::new().with_answer("age", " 18.0 ");
        assert!(check("f-age", Operator::Equals, "18", &answers));
        assert!(!check("f-age", Operator::NotEquals, "18", &answers));
        assert!(check("f-age", Operator::NotEquals, "19", &answers));
    }

    #[test]
    fn test_text_comparison_is_case_sensitive() {
        let answers = AnswerMap::new().with_answer("name", "Ada Lovelace");
        assert!(check("f-name", Operator::Equals, "Ada Lovelace", &answers));
        assert!(!check("f-name", Operator::Equals, "ada lovelace", &answers));
        assert!(check("f-name", Operator::Contains, "Love", &answers));
        assert!(!check("f-name", Operator::Contains, "love", &answers));
        assert!(check("f-name", Operator::NotEquals, "Grace", &answers));
    }

    #[test]
    fn test_one_of_membership() {
        let answers = AnswerMap::new().with_answer("role", "speaker");
        assert!(check("f-role", Operator::OneOf, "student, speaker", &answers));
        assert!(!check("f-role", Operator::OneOf, "student,professional", &answers));
    }

    #[test]
    fn test_multi_select_matches_any_element() {
        let answers = AnswerMap::new().with_answer("tracks", vec!["go", "web"]);
        assert!(check("f-tracks", Operator::Equals, "web", &answers));
        assert!(check("f-tracks", Operator::OneOf, "rust,web", &answers));
        assert!(!check("f-tracks", Operator::OneOf, "rust", &answers));
        assert!(!check("f-tracks", Operator::NotEquals, "go", &answers));
        assert!(check("f-tracks", Operator::NotEquals, "rust", &answers));
    }

    #[test]
    fn test_boolean_operators() {
        let yes = AnswerMap::new().with_answer("vegetarian", "TRUE");
        let no = AnswerMap::new().with_answer("vegetarian", "false");
        let junk = AnswerMap::new().with_answer("vegetarian", "maybe");

        assert!(check("f-veg", Operator::IsTrue, "", &yes));
        assert!(!check("f-veg", Operator::IsFalse, "", &yes));
        assert!(check("f-veg", Operator::IsFalse, "", &no));
        assert!(!check("f-veg", Operator::IsTrue, "", &junk));
        assert!(!check("f-veg", Operator::IsFalse, "", &junk));
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let answers = AnswerMap::new().with_answer("age", "40");
        let condition = Condition::new("f-age", Operator::LessThan, "65");
        let fields = fields();
        let first = condition.evaluate(&answers, &fields);
        assert_eq!(first, condition.evaluate(&answers, &fields));
        assert!(first);
    }

    #[test]
    fn test_empty_set_holds() {
        assert!(ConditionSet::default().holds(&AnswerMap::new(), &fields()));
    }

    #[test]
    fn test_set_is_and_combined() {
        let set = ConditionSet::new(vec![
            Condition::new("f-age", Operator::GreaterThan, "18"),
            Condition::new("f-role", Operator::Equals, "student"),
        ]);
        let both = AnswerMap::new()
            .with_answer("age", "21")
            .with_answer("role", "student");
        let one = both.with_answer("role", "speaker");

        assert!(set.holds(&both, &fields()));
        assert!(!set.holds(&one, &fields()));
    }

    #[test]
    fn test_persistent_edits() {
        let original = ConditionSet::new(vec![Condition::new("f-age", Operator::Equals, "1")]);

        let appended = original.with(Condition::new("f-name", Operator::Equals, "Ada"));
        let replaced = original.replace(0, Condition::new("f-age", Operator::Equals, "2"));
        let removed = appended.without(0);

        assert_eq!(original.len(), 1);
        assert_eq!(appended.len(), 2);
        assert_eq!(replaced.iter().next().unwrap().value, "2");
        assert_eq!(original.iter().next().unwrap().value, "1");
        assert_eq!(
            removed.referenced_fields().collect::<Vec<_>>(),
            vec![&FieldId::from("f-name")]
        );
        assert_eq!(original.without(5), original);
        assert_eq!(original.replace(5, Condition::new("x", Operator::Equals, "")), original);
    }

    #[test]
    fn test_operator_round_trips_through_tag() {
        for operator in Operator::ALL {
            assert_eq!(operator.as_str().parse::<Operator>(), Ok(operator));
        }
        assert!("between".parse::<Operator>().is_err());
    }
}

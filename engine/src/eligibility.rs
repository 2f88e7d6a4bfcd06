//! Eligibility resolver.
//!
//! Applies each item's condition set to the current answers. The resolver keeps no
//! state between calls: callers re-run [`filter_eligible`] whenever an answer changes,
//! and [`GatingKeys`] tells them which changes can matter.
//!
//! Deciding what to do with the result (for example registering directly when only
//! one free item is left) is a separate policy, see [`direct_registration`].

use crate::form::{AnswerMap, FieldIndex, FieldKey};
use crate::types::{ItemId, SelectableItem};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// `true` iff every condition of the item holds
#[must_use]
pub fn is_eligible(item: &SelectableItem, answers: &AnswerMap, fields: &FieldIndex) -> bool {
    item.conditions.holds(answers, fields)
}

/// Eligible items, in input order
#[must_use]
pub fn filter_eligible<'a>(
    items: &'a [SelectableItem],
    answers: &AnswerMap,
    fields: &FieldIndex,
) -> Vec<&'a SelectableItem> {
    items
        .iter()
        .filter(|item| is_eligible(item, answers, fields))
        .collect()
}

/// Form-level settings that influence registration shortcuts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSettings {
    /// Whether the registrant may pick more than one item
    pub allow_multi_select: bool,
}

/// Why the caller may skip item selection
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DirectRegistration {
    /// A claim code resolved to this item
    Claimed(ItemId),
    /// Exactly one free item is eligible and only one may be picked
    SoleFreeItem(ItemId),
}

impl DirectRegistration {
    /// The item to register for
    #[must_use]
    pub const fn item(&self) -> &ItemId {
        match self {
            Self::Claimed(id) | Self::SoleFreeItem(id) => id,
        }
    }
}

/// Decides whether item selection can be skipped
///
/// A claimed item always wins. Otherwise a single eligible, free item on a
/// single-select form is registered directly, unless the registrant still has to
/// pick an entry date for it.
#[must_use]
pub fn direct_registration(
    settings: FormSettings,
    eligible: &[&SelectableItem],
    claimed: Option<&ItemId>,
) -> Option<DirectRegistration> {
    if let Some(id) = claimed {
        return Some(DirectRegistration::Claimed(id.clone()));
    }

    match eligible {
        [only]
            if only.is_free() && !settings.allow_multi_select && !only.requires_entry_date() =>
        {
            Some(DirectRegistration::SoleFreeItem(only.id.clone()))
        }
        _ => None,
    }
}

/// Answer keys that gate at least one item
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GatingKeys(BTreeSet<FieldKey>);

impl GatingKeys {
    /// Returns `true` if a change to `key` can change eligibility
    #[must_use]
    pub fn affected_by(&self, key: &FieldKey) -> bool {
        self.0.contains(key)
    }

    /// Iterates the keys in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &FieldKey> {
        self.0.iter()
    }

    /// Returns `true` if no item is conditional
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Collects the answer keys read by any item's conditions
///
/// Conditions naming unknown fields contribute nothing: no answer can ever make
/// them true.
#[must_use]
pub fn gating_keys(items: &[SelectableItem], fields: &FieldIndex) -> GatingKeys {
    GatingKeys(
        items
            .iter()
            .flat_map(|item| item.conditions.referenced_fields())
            .filter_map(|id| fields.get(id))
            .map(|field| field.key.clone())
            .collect(),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::condition::{Condition, ConditionSet, Operator};
    use crate::form::{Field, FieldType};
    use crate::types::Money;

    fn fields() -> FieldIndex {
        FieldIndex::from_fields(vec![
            Field::new("f-age", "age", FieldType::Number),
            Field::new("f-role", "role", FieldType::SingleSelect)
                .with_options(["student", "professional"]),
            Field::new("f-name", "name", FieldType::Text),
        ])
        .unwrap()
    }

    fn catalog() -> Vec<SelectableItem> {
        vec![
            SelectableItem::new("general", "General").with_price(Money::from_cents(2000)),
            SelectableItem::new("student", "Student")
                .with_price(Money::from_cents(0))
                .with_conditions(ConditionSet::new(vec![Condition::new(
                    "f-role",
                    Operator::Equals,
                    "student",
                )])),
            SelectableItem::new("senior", "Senior").with_conditions(ConditionSet::new(vec![
                Condition::new("f-age", Operator::GreaterThan, "64"),
            ])),
            SelectableItem::new("ghost", "Ghost").with_conditions(ConditionSet::new(vec![
                Condition::new("f-deleted", Operator::Equals, "x"),
            ])),
        ]
    }

    fn ids<'a>(items: &[&'a SelectableItem]) -> Vec<&'a str> {
        items.iter().map(|item| item.id.as_str()).collect()
    }

    #[test]
    fn test_unconditional_item_always_eligible() {
        let items = catalog();
        let fields = fields();
        for answers in [
            AnswerMap::new(),
            AnswerMap::new().with_answer("age", "70"),
            AnswerMap::new().with_answer("role", "student"),
        ] {
            assert!(is_eligible(&items[0], &answers, &fields));
        }
    }

    #[test]
    fn test_filter_preserves_order() {
        let items = catalog();
        let answers = AnswerMap::new()
            .with_answer("role", "student")
            .with_answer("age", "70");
        let eligible = filter_eligible(&items, &answers, &fields());
        assert_eq!(ids(&eligible), vec!["general", "student", "senior"]);
    }

    #[test]
    fn test_unresolved_field_never_eligible() {
        let items = catalog();
        let answers = AnswerMap::new().with_answer("deleted", "x");
        let eligible = filter_eligible(&items, &answers, &fields());
        assert!(!ids(&eligible).contains(&"ghost"));
    }

    #[test]
    fn test_filter_is_idempotent() {
        let items = catalog();
        let fields = fields();
        let answers = AnswerMap::new().with_answer("role", "student");
        assert_eq!(
            filter_eligible(&items, &answers, &fields),
            filter_eligible(&items, &answers, &fields)
        );
    }

    #[test]
    fn test_direct_registration_for_sole_free_item() {
        let item = SelectableItem::new("free", "Free").with_price(Money::from_cents(0));
        let result = direct_registration(FormSettings::default(), &[&item], None);
        assert_eq!(result, Some(DirectRegistration::SoleFreeItem("free".into())));
    }

    #[test]
    fn test_no_direct_registration_when_paid_or_multi() {
        let paid = SelectableItem::new("paid", "Paid").with_price(Money::from_cents(100));
        let free = SelectableItem::new("free", "Free");

        assert_eq!(direct_registration(FormSettings::default(), &[&paid], None), None);
        assert_eq!(
            direct_registration(FormSettings { allow_multi_select: true }, &[&free], None),
            None
        );
        assert_eq!(
            direct_registration(FormSettings::default(), &[&free, &paid], None),
            None
        );
        assert_eq!(direct_registration(FormSettings::default(), &[], None), None);
    }

    #[test]
    fn test_no_direct_registration_when_entry_date_needed() {
        let dated = SelectableItem::new("day-pass", "Day pass")
            .with_entry_dates(vec![chrono::NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()]);
        assert_eq!(direct_registration(FormSettings::default(), &[&dated], None), None);
    }

    #[test]
    fn test_claim_overrides_everything() {
        let claimed = ItemId::from("vip");
        let result = direct_registration(
            FormSettings { allow_multi_select: true },
            &[],
            Some(&claimed),
        );
        assert_eq!(result.as_ref().map(DirectRegistration::item), Some(&claimed));
    }

    #[test]
    fn test_gating_keys() {
        let keys = gating_keys(&catalog(), &fields());
        assert!(keys.affected_by(&"role".into()));
        assert!(keys.affected_by(&"age".into()));
        assert!(!keys.affected_by(&"name".into()));
        assert_eq!(keys.iter().count(), 2);
    }
}

//! Property tests for condition evaluation and eligibility.

#![allow(clippy::expect_used, clippy::unwrap_used)] // Test code can use unwrap/expect

use proptest::prelude::*;
use registration_engine::{
    filter_eligible, is_eligible, AnswerMap, Condition, ConditionSet, Field, FieldIndex,
    FieldType, Interval, Operator, SelectableItem,
};
use registration_engine::schedule::conflicts;

fn fields() -> FieldIndex {
    FieldIndex::from_fields(vec![
        Field::new("f-age", "age", FieldType::Number),
        Field::new("f-name", "name", FieldType::Text),
        Field::new("f-role", "role", FieldType::SingleSelect).with_options(["a", "b", "c"]),
        Field::new("f-ok", "ok", FieldType::Boolean),
    ])
    .unwrap()
}

fn operator() -> impl Strategy<Value = Operator> {
    proptest::sample::select(Operator::ALL.to_vec())
}

fn answers() -> impl Strategy<Value = AnswerMap> {
    proptest::collection::vec(
        (
            proptest::sample::select(vec!["age", "name", "role", "ok", "other"]),
            "[ -~]{0,8}",
        ),
        0..5,
    )
    .prop_map(|pairs| pairs.into_iter().collect())
}

fn condition() -> impl Strategy<Value = Condition> {
    (
        proptest::sample::select(vec!["f-age", "f-name", "f-role", "f-ok", "f-missing"]),
        operator(),
        "[ -~]{0,6}",
    )
        .prop_map(|(field, operator, value)| Condition::new(field, operator, value))
}

fn items() -> impl Strategy<Value = Vec<SelectableItem>> {
    proptest::collection::vec(proptest::collection::vec(condition(), 0..3), 0..6).prop_map(
        |sets| {
            sets.into_iter()
                .enumerate()
                .map(|(i, conditions)| {
                    SelectableItem::new(format!("item-{i}"), format!("Item {i}"))
                        .with_conditions(ConditionSet::new(conditions))
                })
                .collect()
        },
    )
}

proptest! {
    #[test]
    fn unknown_field_is_never_met(operator in operator(), value in "[ -~]{0,6}", answers in answers()) {
        let condition = Condition::new("f-missing", operator, value);
        prop_assert!(!condition.evaluate(&answers, &fields()));
    }

    #[test]
    fn unconditional_item_is_always_eligible(answers in answers()) {
        let item = SelectableItem::new("free", "Free");
        prop_assert!(is_eligible(&item, &answers, &fields()));
    }

    #[test]
    fn non_numeric_answer_never_satisfies_numeric_rule(
        operator in operator(),
        answer in "[a-zA-Z ]{1,8}",
        value in "-?[0-9]{1,3}",
    ) {
        let answers = AnswerMap::new().with_answer("age", answer.as_str());
        let condition = Condition::new("f-age", operator, value);
        prop_assert!(!condition.evaluate(&answers, &fields()));
    }

    #[test]
    fn filter_is_idempotent_and_order_preserving(items in items(), answers in answers()) {
        let fields = fields();
        let first: Vec<&str> = filter_eligible(&items, &answers, &fields)
            .into_iter()
            .map(|item| item.id.as_str())
            .collect();
        let second: Vec<&str> = filter_eligible(&items, &answers, &fields)
            .into_iter()
            .map(|item| item.id.as_str())
            .collect();
        prop_assert_eq!(&first, &second);

        let positions: Vec<usize> = first
            .iter()
            .map(|id| items.iter().position(|item| item.id.as_str() == *id).unwrap())
            .collect();
        prop_assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn containment_implies_overlap_for_non_empty_spans(
        start in 0i64..1_000,
        inner_offset in 0i64..100,
        inner_len in 1i64..100,
        tail in 0i64..100,
    ) {
        let minute = |m: i64| chrono::DateTime::<chrono::Utc>::UNIX_EPOCH + chrono::Duration::minutes(m);
        let outer = Interval::new(minute(start), minute(start + inner_offset + inner_len + tail)).unwrap();
        let inner = Interval::new(minute(start + inner_offset), minute(start + inner_offset + inner_len)).unwrap();

        prop_assert!(conflicts(&inner, &outer));
        prop_assert!(inner.overlaps(&outer));
    }
}

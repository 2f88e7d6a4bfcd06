//! Registration Engine Demo
//!
//! Walks through a registration session:
//! - Eligibility filtering as answers change
//! - A committed sub-event blocking a session that falls inside it
//! - Withdrawing the committed sub-event, which frees the blocked session
//! - Submitting the resulting diff
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=debug cargo run --bin registration-demo
//! ```

use registration_core::{environment::SystemClock, reducer::Reducer};
use registration_engine::{
    filter_eligible, parse_fields_json, parse_items_json, AnswerMap, EngineConfig, ItemState,
    SelectionAction, SelectionDiff, SelectionEnvironment, SelectionReducer, SelectionState,
    SelectionSubmitter, SubmissionError,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const FIELDS: &str = r#"[
    {"id": "f-age", "type": "number", "title": "Age", "field_key": "age"},
    {"id": "f-role", "type": "select", "title": "Role", "field_key": "role",
     "options": ["student", "professional"]}
]"#;

const TICKETS: &str = r#"[
    {"id": "general", "name": "General Admission", "price": 40},
    {"id": "adult", "name": "Evening Reception", "price": 15,
     "condition": [{"field": "f-age", "operator": "greater_than", "value": "18"}]},
    {"id": "student", "name": "Student Pass", "price": 0,
     "condition": [{"field": "f-role", "operator": "equals", "value": "student"}]}
]"#;

const SUB_EVENTS: &str = r#"[
    {"id": "workshop", "name": "Rust Workshop", "kind": "sub_event",
     "start_time": "2025-03-01T09:00:00Z", "end_time": "2025-03-01T12:00:00Z",
     "already_booked": true},
    {"id": "keynote", "name": "Keynote", "kind": "sub_event",
     "start_time": "2025-03-01T10:00:00Z", "end_time": "2025-03-01T11:00:00Z"},
    {"id": "panel", "name": "Closing Panel", "kind": "sub_event", "slots_left": 12,
     "start_time": "2025-03-02T16:00:00Z", "end_time": "2025-03-02T17:00:00Z"}
]"#;

/// Submitter that accepts every diff and logs it
struct LoggingSubmitter;

impl SelectionSubmitter for LoggingSubmitter {
    fn submit(
        &self,
        diff: SelectionDiff,
    ) -> Pin<Box<dyn Future<Output = Result<(), SubmissionError>> + Send + '_>> {
        Box::pin(async move {
            tracing::info!(to_add = ?diff.to_add, to_remove = ?diff.to_remove, "backend recorded diff");
            Ok(())
        })
    }
}

fn log_states(state: &SelectionState, env: &SelectionEnvironment) {
    for entry in state.display_states(&env.rules) {
        if entry.state == ItemState::Disabled {
            tracing::info!(item = %entry.id, state = ?entry.state, clashes_with = ?entry.colliding_titles);
        } else {
            tracing::info!(item = %entry.id, state = ?entry.state);
        }
    }
}

/// Reduces an action and drives any effects it returns, feeding results back in
async fn dispatch(
    reducer: &SelectionReducer,
    state: &mut SelectionState,
    action: SelectionAction,
    env: &SelectionEnvironment,
) {
    let mut queue = vec![action];
    while let Some(action) = queue.pop() {
        for effect in reducer.reduce(state, action, env) {
            if let Some(feedback) = effect.run().await {
                queue.push(feedback);
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = EngineConfig::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        policy = %config.conflict_policy,
        utc_offset_minutes = config.utc_offset_minutes,
        "configuration loaded"
    );

    // ========== Eligibility ==========

    let fields = parse_fields_json(FIELDS)?;
    let tickets = parse_items_json(TICKETS)?.items;

    for answers in [
        AnswerMap::new(),
        AnswerMap::new().with_answer("age", "21"),
        AnswerMap::new().with_answer("age", "15").with_answer("role", "student"),
    ] {
        let eligible: Vec<&str> = filter_eligible(&tickets, &answers, &fields)
            .into_iter()
            .map(|item| item.title.as_str())
            .collect();
        tracing::info!(?answers, ?eligible, "eligible tickets");
    }

    // ========== Selection ==========

    let env = SelectionEnvironment::new(
        Arc::new(SystemClock),
        config.schedule_rules(),
        Arc::new(LoggingSubmitter),
    );
    let reducer = SelectionReducer::new();
    let mut state = SelectionState::default();

    let sub_events = parse_items_json(SUB_EVENTS)?;
    dispatch(&reducer, &mut state, SelectionAction::Load { items: sub_events.items }, &env).await;

    for group in env.rules.group_by_date_and_time(state.catalog.iter()) {
        for slot in &group.slots {
            let titles: Vec<&str> = slot.items.iter().map(|item| item.title.as_str()).collect();
            tracing::info!(date = %group.date, time = %slot.time, ?titles, "schedule");
        }
    }
    log_states(&state, &env);

    dispatch(&reducer, &mut state, SelectionAction::Toggle { id: "keynote".into() }, &env).await;
    if let Some(rejection) = &state.last_rejection {
        tracing::info!(%rejection, "keynote refused");
    }

    dispatch(
        &reducer,
        &mut state,
        SelectionAction::RequestWithdraw { id: "workshop".into() },
        &env,
    )
    .await;
    dispatch(&reducer, &mut state, SelectionAction::ConfirmWithdraw, &env).await;
    log_states(&state, &env);

    dispatch(&reducer, &mut state, SelectionAction::Toggle { id: "keynote".into() }, &env).await;
    dispatch(&reducer, &mut state, SelectionAction::Toggle { id: "panel".into() }, &env).await;
    tracing::info!(diff = ?state.diff(), "pending changes");

    dispatch(&reducer, &mut state, SelectionAction::Submit, &env).await;
    log_states(&state, &env);
    tracing::info!(submitted_at = ?state.last_submitted_at, "demo complete");

    Ok(())
}

//! Reducer logic for the selection state machine.
//!
//! Commands are validated against the catalog, capacity, and schedule rules. A
//! refused command leaves the selection untouched and records a [`Rejection`];
//! nothing is thrown. Submission is the only transition with a side effect.

use crate::error::SubmissionError;
use crate::schedule::ScheduleRules;
use crate::selection::types::{
    Collision, Rejection, SelectionAction, SelectionDiff, SelectionEntry, SelectionState,
};
use crate::types::{ItemId, SelectableItem};
use chrono::{DateTime, Utc};
use registration_core::{effect::Effect, environment::Clock, reducer::Reducer, smallvec, SmallVec};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Hands a selection diff to the backend
///
/// Implementations perform the network call; the reducer only describes it.
pub trait SelectionSubmitter: Send + Sync {
    /// Records `diff` for the registrant
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError`] if the backend refuses the diff or cannot be reached.
    fn submit(
        &self,
        diff: SelectionDiff,
    ) -> Pin<Box<dyn Future<Output = Result<(), SubmissionError>> + Send + '_>>;
}

/// Environment dependencies for the selection reducer
#[derive(Clone)]
pub struct SelectionEnvironment {
    /// Clock for submission timestamps
    pub clock: Arc<dyn Clock>,
    /// Conflict policy and local offset
    pub rules: ScheduleRules,
    /// Submission collaborator
    pub submitter: Arc<dyn SelectionSubmitter>,
}

impl SelectionEnvironment {
    /// Creates a new `SelectionEnvironment`
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        rules: ScheduleRules,
        submitter: Arc<dyn SelectionSubmitter>,
    ) -> Self {
        Self {
            clock,
            rules,
            submitter,
        }
    }
}

/// Reducer for the selection state machine
#[derive(Clone, Debug, Default)]
pub struct SelectionReducer;

impl SelectionReducer {
    /// Creates a new `SelectionReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates selecting an item that is not yet chosen
    fn validate_select(
        state: &SelectionState,
        id: &ItemId,
        rules: &ScheduleRules,
    ) -> Result<(), Rejection> {
        let Some(item) = state.catalog.get(id) else {
            return Err(Rejection::UnknownItem { id: id.clone() });
        };

        if item.is_sold_out() {
            return Err(Rejection::SoldOut { id: id.clone() });
        }

        Self::check_collisions(state, item, rules)
    }

    fn check_collisions(
        state: &SelectionState,
        item: &SelectableItem,
        rules: &ScheduleRules,
    ) -> Result<(), Rejection> {
        let colliding = rules.collisions(item, &state.selection, &state.catalog);
        if !colliding.is_empty() {
            return Err(Rejection::Conflict {
                id: item.id.clone(),
                colliding: colliding.into_iter().map(Collision::from).collect(),
            });
        }
        Ok(())
    }

    /// Validates a withdrawal request
    fn validate_withdraw(state: &SelectionState, id: &ItemId) -> Result<(), Rejection> {
        if state.catalog.get(id).is_none() {
            return Err(Rejection::UnknownItem { id: id.clone() });
        }

        if !state.selection.is_committed(id) {
            return Err(Rejection::NotCommitted { id: id.clone() });
        }

        Ok(())
    }

    fn reject(state: &mut SelectionState, rejection: Rejection) {
        tracing::debug!(%rejection, "selection change refused");
        state.last_rejection = Some(rejection);
    }

    fn toggle(state: &mut SelectionState, id: ItemId, rules: &ScheduleRules) {
        if state.selection.is_committed(&id) {
            Self::reject(state, Rejection::Committed { id });
            return;
        }

        if state.selection.contains(&id) {
            state.selection = state.selection.without(&id);
            state.last_rejection = None;
            tracing::debug!(item = %id, "item deselected");
            return;
        }

        // Re-selecting a withdrawn booking undoes the withdrawal. Its seat is
        // still held, so only schedule conflicts can refuse it.
        if state.baseline.contains(&id) {
            if let Some(item) = state.catalog.get(&id) {
                if let Err(rejection) = Self::check_collisions(state, item, rules) {
                    Self::reject(state, rejection);
                    return;
                }
            }
            tracing::debug!(item = %id, "withdrawal undone");
            state.selection = state.selection.with(SelectionEntry::committed(id));
            state.last_rejection = None;
            return;
        }

        if let Err(rejection) = Self::validate_select(state, &id, rules) {
            Self::reject(state, rejection);
            return;
        }

        tracing::debug!(item = %id, "item selected");
        state.selection = state.selection.with(SelectionEntry::selected(id));
        state.last_rejection = None;
    }

    /// Applies a backend confirmation
    ///
    /// Only the ids in `diff` move; anything toggled while the submission was in
    /// flight stays as it is.
    fn apply_submitted(
        state: &mut SelectionState,
        diff: &SelectionDiff,
        submitted_at: DateTime<Utc>,
    ) {
        for id in &diff.to_add {
            if state.selection.contains(id) {
                state.selection = state.selection.with(SelectionEntry::committed(id.clone()));
            }
        }

        let recorded: Vec<ItemId> = state
            .catalog
            .iter()
            .map(|item| &item.id)
            .filter(|id| {
                let was_recorded = state.baseline.contains(id) && !diff.to_remove.contains(id);
                was_recorded || diff.to_add.contains(id)
            })
            .cloned()
            .collect();
        state.baseline = recorded;

        state.last_submitted_at = Some(submitted_at);
        state.last_error = None;
    }

    fn submit_effect(
        diff: SelectionDiff,
        env: &SelectionEnvironment,
    ) -> Effect<SelectionAction> {
        let submitter = Arc::clone(&env.submitter);
        let clock = Arc::clone(&env.clock);

        Effect::Future(Box::pin(async move {
            match submitter.submit(diff.clone()).await {
                Ok(()) => Some(SelectionAction::Submitted {
                    diff,
                    submitted_at: clock.now(),
                }),
                Err(error) => Some(SelectionAction::SubmissionFailed {
                    error: error.to_string(),
                }),
            }
        }))
    }
}

impl Reducer for SelectionReducer {
    type State = SelectionState;
    type Action = SelectionAction;
    type Environment = SelectionEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Commands ==========
            SelectionAction::Load { items } => {
                *state = SelectionState::load(items);
                tracing::debug!(
                    items = state.catalog.len(),
                    committed = state.baseline.len(),
                    "catalog loaded"
                );
                SmallVec::new()
            }

            SelectionAction::Toggle { id } => {
                Self::toggle(state, id, &env.rules);
                SmallVec::new()
            }

            SelectionAction::RequestWithdraw { id } => {
                if let Err(rejection) = Self::validate_withdraw(state, &id) {
                    Self::reject(state, rejection);
                    return SmallVec::new();
                }

                state.pending_withdrawal = Some(id);
                state.last_rejection = None;
                SmallVec::new()
            }

            SelectionAction::ConfirmWithdraw => {
                let Some(id) = state.pending_withdrawal.take() else {
                    Self::reject(state, Rejection::NoPendingWithdrawal);
                    return SmallVec::new();
                };

                tracing::info!(item = %id, "committed item withdrawn");
                state.selection = state.selection.without(&id);
                state.last_rejection = None;
                SmallVec::new()
            }

            SelectionAction::CancelWithdraw => {
                state.pending_withdrawal = None;
                SmallVec::new()
            }

            SelectionAction::Submit => {
                let diff = state.diff();
                if diff.is_empty() {
                    tracing::debug!("nothing to submit");
                    return SmallVec::new();
                }

                tracing::info!(
                    to_add = diff.to_add.len(),
                    to_remove = diff.to_remove.len(),
                    "submitting selection"
                );
                smallvec![Self::submit_effect(diff, env)]
            }

            // ========== Events ==========
            SelectionAction::Submitted { diff, submitted_at } => {
                Self::apply_submitted(state, &diff, submitted_at);
                SmallVec::new()
            }

            SelectionAction::SubmissionFailed { error } => {
                tracing::warn!(%error, "selection submission failed");
                state.last_error = Some(error);
                SmallVec::new()
            }
        }
    }
}

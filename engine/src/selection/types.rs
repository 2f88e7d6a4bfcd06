//! State, actions, and derived views of the selection state machine.

use crate::schedule::ScheduleRules;
use crate::types::{Catalog, ItemId, SelectableItem};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Selection Set
// ============================================================================

/// One chosen item
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionEntry {
    /// Chosen item
    pub id: ItemId,
    /// Whether the backend has already recorded this choice
    pub already_committed: bool,
}

impl SelectionEntry {
    /// A choice made in this session
    #[must_use]
    pub const fn selected(id: ItemId) -> Self {
        Self {
            id,
            already_committed: false,
        }
    }

    /// A choice the backend already recorded
    #[must_use]
    pub const fn committed(id: ItemId) -> Self {
        Self {
            id,
            already_committed: true,
        }
    }
}

/// Ordered set of chosen items
///
/// Updates return a new set; the receiver is never modified.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionSet(Vec<SelectionEntry>);

impl SelectionSet {
    /// Returns a copy containing `entry`, replacing any entry with the same id in place
    #[must_use]
    pub fn with(&self, entry: SelectionEntry) -> Self {
        let mut next = self.0.clone();
        match next.iter_mut().find(|existing| existing.id == entry.id) {
            Some(existing) => *existing = entry,
            None => next.push(entry),
        }
        Self(next)
    }

    /// Returns a copy without `id`
    #[must_use]
    pub fn without(&self, id: &ItemId) -> Self {
        Self(
            self.0
                .iter()
                .filter(|entry| entry.id != *id)
                .cloned()
                .collect(),
        )
    }

    /// Returns `true` if `id` is chosen, committed or not
    #[must_use]
    pub fn contains(&self, id: &ItemId) -> bool {
        self.0.iter().any(|entry| entry.id == *id)
    }

    /// Returns `true` if `id` is chosen and already recorded by the backend
    #[must_use]
    pub fn is_committed(&self, id: &ItemId) -> bool {
        self.0
            .iter()
            .any(|entry| entry.id == *id && entry.already_committed)
    }

    /// Iterates entries in selection order
    pub fn iter(&self) -> impl Iterator<Item = &SelectionEntry> {
        self.0.iter()
    }

    /// Chosen ids in selection order
    #[must_use]
    pub fn ids(&self) -> Vec<ItemId> {
        self.0.iter().map(|entry| entry.id.clone()).collect()
    }

    /// Number of chosen items
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing is chosen
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<SelectionEntry> for SelectionSet {
    fn from_iter<T: IntoIterator<Item = SelectionEntry>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Self::default(), |set, entry| set.with(entry))
    }
}

// ============================================================================
// Derived Views
// ============================================================================

/// Display state of one item
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    /// Not chosen, free to choose
    Unselected,
    /// Chosen in this session
    Selected,
    /// Recorded by the backend before this session (or by a successful submit)
    Committed,
    /// Not chosen and blocked by a scheduling conflict
    Disabled,
}

/// What the UI needs to render one item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDisplay {
    /// Item
    pub id: ItemId,
    /// Derived state
    pub state: ItemState,
    /// Titles of the chosen items blocking this one (empty unless `Disabled`)
    pub colliding_titles: Vec<String>,
}

/// Changes relative to what the backend has recorded
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionDiff {
    /// Newly chosen items, in selection order
    pub to_add: Vec<ItemId>,
    /// Recorded items the registrant withdrew, in catalog order
    pub to_remove: Vec<ItemId>,
}

impl SelectionDiff {
    /// Returns `true` if there is nothing to submit
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

// ============================================================================
// Rejections
// ============================================================================

/// A chosen item that blocks a candidate
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collision {
    /// Blocking item
    pub id: ItemId,
    /// Its display title
    pub title: String,
}

impl From<&SelectableItem> for Collision {
    fn from(item: &SelectableItem) -> Self {
        Self {
            id: item.id.clone(),
            title: item.title.clone(),
        }
    }
}

/// Why a transition was refused
///
/// Rejections are normal outcomes, not faults; the UI turns them into messages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rejection {
    /// The id is not in the catalog
    UnknownItem {
        /// Requested id
        id: ItemId,
    },
    /// Committed items leave through withdrawal, not toggling
    Committed {
        /// Requested id
        id: ItemId,
    },
    /// No capacity left
    SoldOut {
        /// Requested id
        id: ItemId,
    },
    /// Choosing the item would double-book the registrant
    Conflict {
        /// Requested id
        id: ItemId,
        /// Every chosen item it collides with
        colliding: Vec<Collision>,
    },
    /// Only committed items can be withdrawn
    NotCommitted {
        /// Requested id
        id: ItemId,
    },
    /// Confirmation arrived without a pending withdrawal
    NoPendingWithdrawal,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownItem { id } => write!(f, "Unknown item {id}"),
            Self::Committed { id } => write!(f, "Item {id} is already booked; withdraw it instead"),
            Self::SoldOut { id } => write!(f, "Item {id} is sold out"),
            Self::Conflict { colliding, .. } => {
                let titles: Vec<&str> = colliding.iter().map(|c| c.title.as_str()).collect();
                write!(f, "This event timings clashes with: {}", titles.join(", "))
            }
            Self::NotCommitted { id } => write!(f, "Item {id} is not booked"),
            Self::NoPendingWithdrawal => write!(f, "No withdrawal is awaiting confirmation"),
        }
    }
}

// ============================================================================
// State
// ============================================================================

/// Selection state for one form session
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionState {
    /// Items on offer
    pub catalog: Catalog,
    /// Ids the backend has recorded, in catalog order
    pub baseline: Vec<ItemId>,
    /// Current choices
    pub selection: SelectionSet,
    /// Committed item awaiting withdrawal confirmation
    pub pending_withdrawal: Option<ItemId>,
    /// Outcome of the last refused transition
    pub last_rejection: Option<Rejection>,
    /// Last submission failure
    pub last_error: Option<String>,
    /// When the last submission succeeded
    pub last_submitted_at: Option<DateTime<Utc>>,
}

impl SelectionState {
    /// Builds the initial state from a backend snapshot
    ///
    /// Items flagged as already committed start `Committed`; everything else starts
    /// unselected.
    #[must_use]
    pub fn load(items: Vec<SelectableItem>) -> Self {
        let catalog = Catalog::new(items);
        let baseline: Vec<ItemId> = catalog
            .iter()
            .filter(|item| item.already_committed)
            .map(|item| item.id.clone())
            .collect();
        let selection = baseline
            .iter()
            .cloned()
            .map(SelectionEntry::committed)
            .collect();

        Self {
            catalog,
            baseline,
            selection,
            ..Self::default()
        }
    }

    /// Derived display state of one item
    #[must_use]
    pub fn item_state(&self, id: &ItemId, rules: &ScheduleRules) -> Option<ItemState> {
        let item = self.catalog.get(id)?;
        Some(self.state_of(item, rules))
    }

    fn state_of(&self, item: &SelectableItem, rules: &ScheduleRules) -> ItemState {
        if self.selection.is_committed(&item.id) {
            ItemState::Committed
        } else if self.selection.contains(&item.id) {
            ItemState::Selected
        } else if rules.is_disabled(item, &self.selection, &self.catalog) {
            ItemState::Disabled
        } else {
            ItemState::Unselected
        }
    }

    /// Display state of every item, in catalog order
    #[must_use]
    pub fn display_states(&self, rules: &ScheduleRules) -> Vec<ItemDisplay> {
        self.catalog
            .iter()
            .map(|item| {
                let state = self.state_of(item, rules);
                let colliding_titles = if state == ItemState::Disabled {
                    rules
                        .collisions(item, &self.selection, &self.catalog)
                        .into_iter()
                        .map(|other| other.title.clone())
                        .collect()
                } else {
                    Vec::new()
                };
                ItemDisplay {
                    id: item.id.clone(),
                    state,
                    colliding_titles,
                }
            })
            .collect()
    }

    /// What to hand the submission collaborator
    #[must_use]
    pub fn diff(&self) -> SelectionDiff {
        SelectionDiff {
            to_add: self
                .selection
                .iter()
                .filter(|entry| !self.baseline.contains(&entry.id))
                .map(|entry| entry.id.clone())
                .collect(),
            to_remove: self
                .baseline
                .iter()
                .filter(|id| !self.selection.contains(id))
                .cloned()
                .collect(),
        }
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Inputs to the selection reducer
#[derive(Clone, Debug)]
pub enum SelectionAction {
    // Commands
    /// Replace the catalog with a fresh backend snapshot
    Load {
        /// Items as parsed from the backend
        items: Vec<SelectableItem>,
    },

    /// Select or deselect an item
    Toggle {
        /// Item to toggle
        id: ItemId,
    },

    /// Start withdrawing a committed item (awaits confirmation)
    RequestWithdraw {
        /// Committed item
        id: ItemId,
    },

    /// Confirm the pending withdrawal
    ConfirmWithdraw,

    /// Abandon the pending withdrawal
    CancelWithdraw,

    /// Hand the current diff to the submission collaborator
    Submit,

    // Events
    /// The backend recorded a diff
    Submitted {
        /// What was recorded
        diff: SelectionDiff,
        /// When the backend confirmed it
        submitted_at: DateTime<Utc>,
    },

    /// The backend refused or could not be reached
    SubmissionFailed {
        /// Error message
        error: String,
    },
}

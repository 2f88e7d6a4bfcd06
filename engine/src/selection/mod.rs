//! Selection state machine.
//!
//! Keeps the registrant's chosen items consistent with scheduling conflicts and
//! capacity while they toggle choices, withdraw committed bookings, and submit.
//!
//! ```text
//!              toggle (no conflict, not sold out)
//!   Unselected ─────────────────────────────────▶ Selected
//!       ▲  ◀───────────────────────────────────────  │
//!       │                 toggle                     │ submit succeeds
//!       │                                            ▼
//!       └──── withdraw requested + confirmed ──── Committed
//!
//!   Disabled is derived: an unselected item that collides with the selection.
//! ```

pub mod reducer;
pub mod types;

pub use reducer::{SelectionEnvironment, SelectionReducer, SelectionSubmitter};
pub use types::{
    Collision, ItemDisplay, ItemState, Rejection, SelectionAction, SelectionDiff,
    SelectionEntry, SelectionSet, SelectionState,
};

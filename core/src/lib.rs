//! # Registration Core
//!
//! Reducer, effect, and environment abstractions shared by the registration engine.
//!
//! The engine follows a "functional core, imperative shell" split: every decision
//! about eligibility, conflicts and selections is made by a synchronous reducer over
//! an in-memory snapshot, and anything that touches the outside world (submitting a
//! selection to the backend) is returned as an [`effect::Effect`] description for the
//! caller to run.
//!
//! ## Core Concepts
//!
//! - **State**: The snapshot a reducer owns (for example, the current selection)
//! - **Action**: Every input a reducer reacts to (user toggles, backend replies)
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Description of a side effect, never its execution
//! - **Environment**: Injected collaborators (clock, submission client, rules)
//!
//! ## Example
//!
//! ```
//! use registration_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! #[derive(Default)]
//! struct Picks {
//!     count: u32,
//! }
//!
//! enum PickAction {
//!     Pick,
//! }
//!
//! struct PickReducer;
//!
//! impl Reducer for PickReducer {
//!     type State = Picks;
//!     type Action = PickAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut Picks,
//!         action: PickAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<PickAction>; 4]> {
//!         match action {
//!             PickAction::Pick => state.count += 1,
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let mut state = Picks::default();
//! PickReducer.reduce(&mut state, PickAction::Pick, &());
//! assert_eq!(state.count, 1);
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use smallvec::{smallvec, SmallVec};

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
/// They contain all business logic and are deterministic and testable.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Validates the action
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed by the caller
        ///
        /// Most actions produce no effects, so the result is stored inline
        /// for up to four effects.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects are values, not execution. The caller decides when (and whether) to
/// drive them, and feeds any resulting action back into the reducer.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Effect type - describes a side effect to be executed
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Returns `true` for the no-op effect
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }

        /// Drives the effect to completion and returns the feedback action, if any
        pub async fn run(self) -> Option<Action> {
            match self {
                Effect::None => None,
                Effect::Future(future) => future.await,
            }
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use registration_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let earlier = clock.now();
    /// assert!(clock.now() >= earlier);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::effect::Effect;

    #[tokio::test]
    async fn test_none_effect_produces_no_action() {
        let effect: Effect<u8> = Effect::None;
        assert!(effect.is_none());
        assert_eq!(effect.run().await, None);
    }

    #[tokio::test]
    async fn test_future_effect_feeds_back_action() {
        let effect: Effect<u8> = Effect::Future(Box::pin(async { Some(7) }));
        assert!(!effect.is_none());
        assert_eq!(effect.run().await, Some(7));
    }

    #[test]
    fn test_effect_debug() {
        let effect: Effect<u8> = Effect::Future(Box::pin(async { None }));
        assert_eq!(format!("{effect:?}"), "Effect::Future(<future>)");
        assert_eq!(format!("{:?}", Effect::<u8>::None), "Effect::None");
    }
}

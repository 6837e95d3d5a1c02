//! # Exhibit Cart Core
//!
//! Core traits and types for the exhibit ticket cart.
//!
//! The cart is modelled as a small state machine driven by a reducer:
//!
//! - **State**: Domain state owned by a store (the cart lines)
//! - **Action**: Every input the reducer accepts (add, increment, remove, ...)
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Follow-up work described as a value, executed by the runtime
//! - **Environment**: Injected dependencies (clock, pricing defaults)
//!
//! ## Example
//!
//! ```
//! use exhibit_cart_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! #[derive(Clone, Debug, Default)]
//! struct TallyState {
//!     seen: u32,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum TallyAction {
//!     Saw,
//! }
//!
//! struct TallyReducer;
//!
//! impl Reducer for TallyReducer {
//!     type State = TallyState;
//!     type Action = TallyAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut TallyState,
//!         action: TallyAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<TallyAction>; 4]> {
//!         match action {
//!             TallyAction::Saw => state.seen += 1,
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let mut state = TallyState::default();
//! TallyReducer.reduce(&mut state, TallyAction::Saw, &());
//! assert_eq!(state.seen, 1);
//! ```

pub use chrono::{DateTime, Utc};
pub use smallvec::{SmallVec, smallvec};

/// Reducer module - the core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
/// They hold all business rules and are deterministic and testable without a store.
pub mod reducer {
    use super::SmallVec;
    use super::effect::Effect;

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
        /// Implementations update `state` in place and return descriptions of
        /// follow-up work. They must not perform I/O themselves.
        ///
        /// Most reducers return one or two effects, so the result is a
        /// `SmallVec` that stays on the stack for the common case.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - side effect descriptions
///
/// Effects are values returned from reducers. The runtime decides how and
/// when to execute them.
pub mod effect {
    /// Effect type - describes follow-up work for the runtime
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can feed back into the store
    #[derive(Clone, PartialEq, Eq)]
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects independently of each other
        Parallel(Vec<Effect<Action>>),

        /// Run effects one after another, in order
        Sequential(Vec<Effect<Action>>),

        /// Feed an action back into the same store once the current
        /// action has been committed
        Dispatch(Box<Action>),
    }

    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Dispatch(action) => {
                    f.debug_tuple("Effect::Dispatch").field(action).finish()
                },
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Dispatch a follow-up action
        #[must_use]
        pub fn dispatch(action: Action) -> Effect<Action> {
            Effect::Dispatch(Box::new(action))
        }

        /// Whether this effect (recursively) does nothing
        #[must_use]
        pub fn is_none(&self) -> bool {
            match self {
                Effect::None => true,
                Effect::Parallel(effects) | Effect::Sequential(effects) => {
                    effects.iter().all(Effect::is_none)
                },
                Effect::Dispatch(_) => false,
            }
        }

        /// Flatten this effect into the actions it dispatches, in execution order
        ///
        /// `Parallel` branches carry no ordering guarantee between each other;
        /// they are flattened left to right.
        #[must_use]
        pub fn into_actions(self) -> Vec<Action> {
            let mut actions = Vec::new();
            self.collect_actions(&mut actions);
            actions
        }

        fn collect_actions(self, out: &mut Vec<Action>) {
            match self {
                Effect::None => {},
                Effect::Parallel(effects) | Effect::Sequential(effects) => {
                    for effect in effects {
                        effect.collect_actions(out);
                    }
                },
                Effect::Dispatch(action) => out.push(*action),
            }
        }
    }
}

/// Environment module - dependency injection traits
///
/// External dependencies are abstracted behind traits and injected via the
/// reducer's `Environment`.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock time
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

    #[test]
    fn nested_none_is_none() {
        let effect: Effect<u8> = Effect::merge(vec![
            Effect::None,
            Effect::chain(vec![Effect::None, Effect::None]),
        ]);
        assert!(effect.is_none());
    }

    #[test]
    fn dispatch_is_not_none() {
        let effect = Effect::chain(vec![Effect::None, Effect::dispatch(7_u8)]);
        assert!(!effect.is_none());
    }

    #[test]
    fn into_actions_keeps_order() {
        let effect = Effect::chain(vec![
            Effect::dispatch(1_u8),
            Effect::merge(vec![Effect::dispatch(2), Effect::None, Effect::dispatch(3)]),
            Effect::dispatch(4),
        ]);
        assert_eq!(effect.into_actions(), vec![1, 2, 3, 4]);
    }
}

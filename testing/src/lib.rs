//! # Exhibit Cart Testing
//!
//! Testing utilities for reducers and stores.
//!
//! This crate provides:
//! - Deterministic clocks (`FixedClock`, `test_clock`)
//! - A fluent Given-When-Then harness for reducers (`ReducerTest`)
//! - Effect assertions
//! - `StateRecorder`, an observer that keeps every state a store commits
//!
//! ## Example
//!
//! ```ignore
//! use exhibit_cart_testing::{StateRecorder, test_clock};
//! use exhibit_cart_runtime::Store;
//!
//! let store = Store::new(CartState::default(), CartReducer::new(), env);
//! let recorder = StateRecorder::attach(&store);
//!
//! store.send(CartAction::Clear);
//! assert_eq!(recorder.len(), 1);
//! ```

use chrono::{DateTime, Utc};
use exhibit_cart_core::environment::Clock;


pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::{Mutex, PoisonError};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use exhibit_cart_testing::mocks::FixedClock;
    /// use exhibit_cart_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug)]
    pub struct FixedClock {
        time: Mutex<DateTime<Utc>>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Mutex::new(time),
            }
        }

        /// Move the clock forward
        pub fn advance(&self, by: chrono::Duration) {
            let mut time = self.time.lock().unwrap_or_else(PoisonError::into_inner);
            *time += by;
        }
    }

    impl Clone for FixedClock {
        fn clone(&self) -> Self {
            Self::new(self.now())
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Test helpers and utilities
pub mod helpers {
    use exhibit_cart_core::reducer::Reducer;
    use exhibit_cart_runtime::{Store, Subscription};
    use std::sync::{Arc, Mutex, PoisonError};

    /// Observer that records every state a store commits
    ///
    /// The recorder unsubscribes when dropped.
    #[derive(Debug)]
    pub struct StateRecorder<S> {
        states: Arc<Mutex<Vec<S>>>,
        subscription: Subscription<S>,
    }

    impl<S> StateRecorder<S>
    where
        S: Clone + Send + 'static,
    {
        /// Subscribe a new recorder to `store`
        pub fn attach<A, E, R>(store: &Store<S, A, E, R>) -> Self
        where
            R: Reducer<State = S, Action = A, Environment = E>,
            A: Clone + std::fmt::Debug,
        {
            let states = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&states);
            let subscription = store.subscribe(move |state: &S| {
                sink.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(state.clone());
            });

            Self {
                states,
                subscription,
            }
        }

        /// All recorded states, oldest first
        #[must_use]
        pub fn states(&self) -> Vec<S> {
            self.states
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        /// The most recently recorded state
        #[must_use]
        pub fn last(&self) -> Option<S> {
            self.states
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .last()
                .cloned()
        }

        /// Number of notifications received
        #[must_use]
        pub fn len(&self) -> usize {
            self.states
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .len()
        }

        /// Whether no notification has been received yet
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        /// Stop recording, returning what was captured
        #[must_use]
        pub fn stop(self) -> Vec<S> {
            let states = self.states();
            self.subscription.unsubscribe();
            states
        }
    }
}

// Re-export commonly used items
pub use helpers::StateRecorder;
pub use mocks::{FixedClock, test_clock};

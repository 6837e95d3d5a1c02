//! # Exhibit Cart Runtime
//!
//! Runtime for the exhibit ticket cart.
//!
//! This crate provides the [`Store`]: the single owner of a reducer's state.
//! A store is an explicit value constructed once by the application and
//! handed to whatever needs it (usually as an `Arc<Store<..>>`). There is no
//! process-wide store, so tests can build as many isolated instances as they
//! like.
//!
//! ## Core Components
//!
//! - **Store**: Owns state, runs the reducer, executes effects
//! - **Observers**: `subscribe(callback)` returns a [`Subscription`] handle
//! - **Action broadcast**: async consumers receive every processed action
//!
//! ## Example
//!
//! ```ignore
//! use exhibit_cart_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//!
//! let subscription = store.subscribe(|state| render(state));
//! store.send(Action::DoSomething);
//!
//! let value = store.state(|s| s.some_field);
//! subscription.unsubscribe();
//! ```

use exhibit_cart_core::reducer::Reducer;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::time::Instant;
use tokio::sync::broadcast;

/// Upper bound on follow-up actions dispatched by effects for a single `send`
///
/// A reducer that keeps dispatching itself would otherwise never return.
pub const MAX_DISPATCH_CHAIN: usize = 256;

/// Default capacity of the action broadcast channel
pub const DEFAULT_BROADCAST_CAPACITY: usize = 16;

type Observer<S> = Arc<dyn Fn(&S) + Send + Sync>;

/// Registered observers, keyed by subscription id
struct ObserverRegistry<S> {
    next_id: u64,
    observers: Vec<(u64, Observer<S>)>,
}

impl<S> ObserverRegistry<S> {
    const fn new() -> Self {
        Self {
            next_id: 0,
            observers: Vec::new(),
        }
    }

    fn insert(&mut self, observer: Observer<S>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }

    fn remove(&mut self, id: u64) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }
}

fn lock_registry<S>(registry: &Mutex<ObserverRegistry<S>>) -> MutexGuard<'_, ObserverRegistry<S>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle returned by [`Store::subscribe`]
///
/// The observer stays registered until [`Subscription::unsubscribe`] is
/// called or the handle is dropped. Use [`Subscription::detach`] to keep the
/// observer for the lifetime of the store instead.
#[must_use = "dropping a Subscription unsubscribes its observer"]
pub struct Subscription<S> {
    id: u64,
    registry: Weak<Mutex<ObserverRegistry<S>>>,
}

impl<S> Subscription<S> {
    /// Remove the observer from the store
    ///
    /// Safe to call after the store has been dropped.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    /// Keep the observer registered for as long as the store lives
    pub fn detach(mut self) {
        self.registry = Weak::new();
    }

    /// Whether the observer is still registered with a live store
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.registry.upgrade().is_some_and(|registry| {
            lock_registry(&registry)
                .observers
                .iter()
                .any(|(id, _)| *id == self.id)
        })
    }

    fn release(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            if lock_registry(&registry).remove(self.id) {
                tracing::trace!(subscription = self.id, "Observer unsubscribed");
            }
        }
        self.registry = Weak::new();
    }
}

impl<S> Drop for Subscription<S> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<S> std::fmt::Debug for Subscription<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("attached", &(self.registry.strong_count() > 0))
            .finish()
    }
}

/// Store module - the runtime coordinator for a reducer
pub mod store {
    use super::{
        Arc, DEFAULT_BROADCAST_CAPACITY, Instant, MAX_DISPATCH_CHAIN, Mutex, Observer,
        ObserverRegistry, PoisonError, Reducer, RwLock, Subscription, VecDeque, broadcast,
        lock_registry,
    };

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind a `RwLock`; readers only ever see committed state)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (dispatched actions are fed back in order)
    /// 5. Observers (notified with a snapshot after every committed action)
    ///
    /// Everything happens synchronously on the caller's thread. No lock is
    /// held while observers run, so an observer may call [`Store::send`] or
    /// drop its own [`Subscription`].
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: RwLock<S>,
        reducer: R,
        environment: E,
        observers: Arc<Mutex<ObserverRegistry<S>>>,
        /// Every action processed by the reducer is broadcast here.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
        S: Clone + 'static,
        A: Clone + std::fmt::Debug,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// The action broadcast channel buffers 16 actions; use
        /// [`Store::with_broadcast_capacity`] for slow async consumers.
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_broadcast_capacity(
                initial_state,
                reducer,
                environment,
                DEFAULT_BROADCAST_CAPACITY,
            )
        }

        /// Create a new store with a custom action broadcast capacity
        ///
        /// A capacity of zero is raised to one.
        #[must_use]
        pub fn with_broadcast_capacity(
            initial_state: S,
            reducer: R,
            environment: E,
            capacity: usize,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(capacity.max(1));

            Self {
                state: RwLock::new(initial_state),
                reducer,
                environment,
                observers: Arc::new(Mutex::new(ObserverRegistry::new())),
                action_broadcast,
            }
        }

        /// Send an action through the reducer
        ///
        /// The reducer runs under the write lock. Once the new state is
        /// committed, observers are notified and any actions dispatched by
        /// the returned effects are processed the same way, in FIFO order.
        /// At most [`MAX_DISPATCH_CHAIN`] follow-up actions run per call.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub fn send(&self, action: A) {
            let mut queue = VecDeque::from([action]);
            let mut follow_ups = 0_usize;

            while let Some(action) = queue.pop_front() {
                tracing::debug!(?action, "Processing action");
                metrics::counter!("store.actions.total").increment(1);

                let broadcast_copy = action.clone();
                let effects = {
                    let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
                    tracing::trace!("Acquired write lock on state");

                    let start = Instant::now();
                    let effects = self.reducer.reduce(&mut state, action, &self.environment);
                    metrics::histogram!("store.reducer.duration_seconds")
                        .record(start.elapsed().as_secs_f64());

                    tracing::trace!("Reducer completed, returned {} effects", effects.len());
                    effects
                };

                // No receivers is the normal case for a purely synchronous UI.
                let _ = self.action_broadcast.send(broadcast_copy);
                self.notify_observers();

                for effect in effects {
                    for next in effect.into_actions() {
                        if follow_ups == MAX_DISPATCH_CHAIN {
                            tracing::error!(
                                limit = MAX_DISPATCH_CHAIN,
                                "Dispatch chain limit reached, dropping remaining actions"
                            );
                            metrics::counter!("store.dispatch.dropped").increment(1);
                            return;
                        }
                        follow_ups += 1;
                        queue.push_back(next);
                    }
                }
            }
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let line_count = store.state(|s| s.len());
        /// ```
        pub fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            f(&state)
        }

        /// Clone the current state
        #[must_use]
        pub fn snapshot(&self) -> S {
            self.state(S::clone)
        }

        /// Register an observer called with the committed state after every action
        ///
        /// The observer is not called on registration; read [`Store::state`]
        /// for the initial render.
        pub fn subscribe<F>(&self, observer: F) -> Subscription<S>
        where
            F: Fn(&S) + Send + Sync + 'static,
        {
            let observer: Observer<S> = Arc::new(observer);
            let id = lock_registry(&self.observers).insert(observer);
            tracing::trace!(subscription = id, "Observer subscribed");

            Subscription {
                id,
                registry: Arc::downgrade(&self.observers),
            }
        }

        /// Number of registered observers
        #[must_use]
        pub fn subscriber_count(&self) -> usize {
            lock_registry(&self.observers).observers.len()
        }

        /// Subscribe to every action processed by this store
        ///
        /// Intended for async consumers (websocket pushes, audit logs). Slow
        /// receivers lag and skip actions rather than blocking `send`.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        fn notify_observers(&self) {
            let observers: Vec<Observer<S>> = lock_registry(&self.observers)
                .observers
                .iter()
                .map(|(_, observer)| Arc::clone(observer))
                .collect();

            if observers.is_empty() {
                return;
            }

            let snapshot = self.snapshot();
            tracing::trace!(count = observers.len(), "Notifying observers");
            for observer in observers {
                observer(&snapshot);
            }
        }
    }

    impl<S, A, E, R> std::fmt::Debug for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
        S: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("Store")
                .field("state", &self.state)
                .field("observers", &lock_registry(&self.observers).observers.len())
                .finish_non_exhaustive()
        }
    }
}

pub use store::Store;

//! # Unit Frame Runtime
//!
//! Runtime implementation for the embedded-content controller.
//!
//! This crate provides the Store runtime that coordinates reducer execution
//! and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: The runtime that owns one provider's state and executes effects
//! - **Effect Executor**: Executes effect descriptions and feeds actions back to reducers
//! - **Event Loop**: Manages the action → reducer → effects → action feedback loop
//!
//! Each provider instance owns exactly one Store. Closing a Store is how a
//! stale instance is retired: every action that reaches it afterwards (a late
//! timer, a queued callback) is rejected instead of being reduced.
//!
//! ## Example
//!
//! ```ignore
//! use unit_frame_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//!
//! // Send an action
//! store.send(Action::DoSomething).await?;
//!
//! // Read state
//! let value = store.state(|s| s.some_field).await;
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::task::AbortHandle;
use unit_frame_core::effect::{Effect, EffectId};
use unit_frame_core::reducer::Reducer;

/// Prometheus metrics for observability
pub mod metrics;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store has been closed and is not accepting new actions
        ///
        /// Returned by `send()` once the owning provider retired this store.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        ///
        /// Some effects were still running when the timeout elapsed.
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),
    }
}

pub use error::StoreError;

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`] to allow waiting for the effects of one action
/// to complete. Actions fed back by those effects have been reduced by the time
/// the handle resolves. A cancelled effect counts as complete.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(Action::Start).await?;
/// handle.wait().await;
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Wait for all effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                break;
            }
        }
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal: Effect tracking context passed through effect execution
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    /// Increment the effect counter (effect started)
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Decrement the effect counter (effect completed)
    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            // Counter reached zero, notify waiters
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: RAII guard that decrements effect counter on drop
///
/// Ensures the effect counter is always decremented, even if the effect panics
/// or its task is aborted.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Guard that decrements an atomic counter on drop (for shutdown tracking)
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Internal: tasks started under a cancellation id
type InFlight = Arc<Mutex<HashMap<EffectId, Vec<AbortHandle>>>>;

/// Resolves once the store behind `closed` has been closed
async fn until_closed(mut closed: watch::Receiver<bool>) {
    let _ = closed.wait_for(|closed| *closed).await;
}

/// Store module - The runtime for reducers
pub mod store {
    use super::{
        until_closed, Arc, AtomicCounterGuard, AtomicUsize, DecrementGuard, Duration, Effect,
        EffectHandle, EffectId, EffectTracking, Future, InFlight, Ordering, PoisonError, Reducer,
        RwLock, StoreError,
    };
    use tokio::sync::watch;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock` for concurrent access)
    /// 2. Reducer (transition logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop and cancellation)
    ///
    /// Clones share the same state; closing any clone closes them all.
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        closed: Arc<watch::Sender<bool>>,
        pending_effects: Arc<AtomicUsize>,
        in_flight: InFlight,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            let (closed, _) = watch::channel(false);
            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                closed: Arc::new(closed),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                in_flight: InFlight::default(),
            }
        }

        /// Stop accepting actions
        ///
        /// Pending delays are dropped. Other effects already in flight keep
        /// running, but any action they feed back is rejected, so the state is
        /// frozen from this point on.
        pub fn close(&self) {
            if !self.closed.send_replace(true) {
                tracing::debug!("Store closed");
                metrics::counter!("store.closed.total").increment(1);
            }
        }

        /// Whether [`close`](Self::close) has been called on this store or a clone
        #[must_use]
        pub fn is_closed(&self) -> bool {
            *self.closed.borrow()
        }

        /// Close the store and wait for in-flight effects to drain
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if the timeout expires before all
        /// pending effects complete.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            self.close();

            let start = std::time::Instant::now();
            let poll_interval = Duration::from_millis(10);

            loop {
                let pending = self.pending_effects.load(Ordering::Acquire);

                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(
                        pending_effects = pending,
                        "Shutdown timeout: {} effects still running", pending
                    );
                    metrics::counter!("store.shutdown.timeout").increment(1);
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Send an action to the store
        ///
        /// The reducer runs under the state write lock; its effects are then
        /// started and tracked by the returned handle.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store has been closed.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError>
        where
            R: Clone,
            E: Clone,
        {
            if self.is_closed() {
                tracing::debug!("Rejected action: store is closed");
                metrics::counter!("store.closed.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            tracing::debug!("Processing action");
            metrics::counter!("store.commands.total").increment(1);

            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let mut state = self.state.write().await;
                tracing::trace!("Acquired write lock on state");

                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();

                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                tracing::trace!("Reducer completed, returned {} effects", effects.len());
                effects
            };

            for effect in effects {
                self.execute_effect(effect, &tracking, None);
            }

            Ok(handle)
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let loaded = store.state(|s| s.has_loaded).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Execute an effect with tracking
        ///
        /// - `None`: No-op
        /// - `Future`: Executes async computation, sends resulting action if `Some`
        /// - `Delay`: Waits for duration, then sends action; dropped on close
        /// - `Cancellable`: Executes the inner effect under a cancellation id
        /// - `Cancel`: Aborts every task started under the id
        ///
        /// Feedback into a closed store is dropped with a debug log.
        fn execute_effect(&self, effect: Effect<A>, tracking: &EffectTracking, scope: Option<EffectId>)
        where
            R: Clone,
            E: Clone,
        {
            match effect {
                Effect::None => {
                    tracing::trace!("Executing Effect::None (no-op)");
                },
                Effect::Future(fut) => {
                    tracing::trace!("Executing Effect::Future");
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    let store = self.clone();

                    self.spawn(tracking, scope, async move {
                        if let Some(action) = fut.await {
                            store.feed_back(action).await;
                        }
                    });
                },
                Effect::Delay { duration, action } => {
                    tracing::trace!("Executing Effect::Delay (duration: {:?})", duration);
                    metrics::counter!("store.effects.executed", "type" => "delay").increment(1);
                    let store = self.clone();
                    let closed = self.closed.subscribe();

                    self.spawn(tracking, scope, async move {
                        tokio::select! {
                            () = tokio::time::sleep(duration) => store.feed_back(*action).await,
                            () = until_closed(closed) => tracing::trace!("Delay dropped: store closed"),
                        }
                    });
                },
                Effect::Cancellable { id, effect } => {
                    tracing::trace!(%id, "Executing Effect::Cancellable");
                    self.execute_effect(*effect, tracking, Some(id));
                },
                Effect::Cancel(id) => {
                    let tasks = self
                        .in_flight
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .remove(&id)
                        .unwrap_or_default();
                    tracing::trace!(%id, tasks = tasks.len(), "Executing Effect::Cancel");
                    metrics::counter!("store.effects.cancelled").increment(tasks.len() as u64);
                    for task in tasks {
                        task.abort();
                    }
                },
            }
        }

        /// Spawn one tracked effect task, registering it under `scope`
        fn spawn<F>(&self, tracking: &EffectTracking, scope: Option<EffectId>, task: F)
        where
            F: Future<Output = ()> + Send + 'static,
        {
            tracking.increment();
            self.pending_effects.fetch_add(1, Ordering::SeqCst);
            let guard = DecrementGuard(tracking.clone());
            let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));

            let handle = tokio::spawn(async move {
                let _guard = guard;
                let _pending_guard = pending_guard;
                task.await;
            });

            if let Some(id) = scope {
                let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
                let tasks = in_flight.entry(id).or_default();
                tasks.retain(|task| !task.is_finished());
                tasks.push(handle.abort_handle());
            }
        }

        async fn feed_back(&self, action: A)
        where
            R: Clone,
            E: Clone,
        {
            match self.send(action).await {
                Ok(mut handle) => handle.wait().await,
                Err(error) => tracing::debug!(%error, "Dropped action produced by effect"),
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                closed: Arc::clone(&self.closed),
                pending_effects: Arc::clone(&self.pending_effects),
                in_flight: Arc::clone(&self.in_flight),
            }
        }
    }
}

// Re-export for convenience
pub use store::Store;

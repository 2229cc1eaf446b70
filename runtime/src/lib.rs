//! # Divvy Runtime
//!
//! Runtime implementation for the Divvy composable client architecture.
//!
//! This crate provides the Store runtime that coordinates reducer execution
//! and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: The runtime that manages state and executes effects
//! - **Effect Executor**: Executes effect descriptions and feeds actions back to reducers
//! - **Cancellation Registry**: Tracks cancellable effects by id so timers can be
//!   aborted or replaced
//!
//! ## Example
//!
//! ```ignore
//! use divvy_runtime::Store;
//! use divvy_core::Reducer;
//!
//! let store = Store::new(
//!     AuthState::default(),
//!     auth_reducer(),
//!     environment,
//! );
//!
//! // Send an action
//! store.send(AuthAction::GoToLogin).await?;
//!
//! // Read state
//! let step = store.state(|s| s.step.clone()).await;
//! ```

use divvy_core::effect::{Effect, EffectId};
use divvy_core::reducer::Reducer;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// This error is returned when `send()` is called after shutdown initiated.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        ///
        /// Some effects were still running when the timeout elapsed.
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for terminal action
        ///
        /// Returned by `send_and_wait_for` when the timeout expires before
        /// a matching action is received.
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        ///
        /// The action broadcast channel was closed, typically because the
        /// store is shutting down.
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::watch;

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`] to allow waiting for effects to complete.
/// Each action gets a handle that can be awaited to know when the effects
/// it spawned are done.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(Action::Start).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// // All effects from Action::Start are now complete
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    /// Create a new effect handle
    ///
    /// # Returns
    ///
    /// A tuple of `(EffectHandle, EffectTracking)` where:
    /// - `EffectHandle` is returned to the caller for waiting
    /// - `EffectTracking` is used internally for effect execution
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            counter,
            notifier: tx,
        };

        (handle, tracking)
    }

    /// Wait for all effects to complete
    ///
    /// Blocks until the effect counter reaches zero. Aborted cancellable
    /// effects count as completed.
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            let _ = self.completion.changed().await;
        }
    }

    /// Wait for all effects to complete with a timeout
    ///
    /// # Arguments
    ///
    /// - `timeout`: Maximum duration to wait
    ///
    /// # Errors
    ///
    /// Returns `Err(())` if the timeout expires before all effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), ()> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| ())
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
///
/// This type is internal to the runtime and not exposed to users.
/// It carries the tracking state through effect execution.
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: watch::Sender<()>,
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
/// Ensures the effect counter is always decremented, even if the effect
/// panics or is aborted at an await point.
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

/// Internal: a running cancellable effect
///
/// The generation guards registry cleanup: a finished task only removes its
/// own entry, never one inserted by a later effect under the same id.
struct CancellableEntry {
    generation: u64,
    handle: tokio::task::AbortHandle,
}

/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicCounterGuard, AtomicU64, AtomicUsize, CancellableEntry,
        DecrementGuard, Duration, Effect, EffectHandle, EffectId, EffectTracking, HashMap,
        Mutex, Ordering, Reducer, RwLock, StoreError, watch,
    };
    use tokio::sync::broadcast;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock` for concurrent access)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop and cancellation)
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
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        /// Running cancellable effects, keyed by effect id.
        cancellables: Arc<Mutex<HashMap<EffectId, CancellableEntry>>>,
        cancel_generation: Arc<AtomicU64>,
        /// Action broadcast channel for observing actions produced by effects.
        ///
        /// All actions produced by effects (e.g., from `Effect::Future`) are
        /// broadcast to observers. This enables request-response patterns such
        /// as `send_and_wait_for`.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// Creates a Store with the default action broadcast capacity of 16
        /// (increase with [`Store::with_broadcast_capacity`] if observers lag).
        ///
        /// # Arguments
        ///
        /// - `initial_state`: The starting state for the store
        /// - `reducer`: The reducer implementation (business logic)
        /// - `environment`: Injected dependencies
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_broadcast_capacity(initial_state, reducer, environment, 16)
        }

        /// Create a new Store with custom action broadcast capacity
        ///
        /// # Arguments
        ///
        /// - `initial_state`: The starting state for the store
        /// - `reducer`: The reducer implementation (business logic)
        /// - `environment`: Injected dependencies
        /// - `capacity`: Action broadcast channel capacity (number of actions buffered)
        #[must_use]
        pub fn with_broadcast_capacity(
            initial_state: S,
            reducer: R,
            environment: E,
            capacity: usize,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(capacity);

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                cancellables: Arc::new(Mutex::new(HashMap::new())),
                cancel_generation: Arc::new(AtomicU64::new(0)),
                action_broadcast,
            }
        }

        /// Initiate graceful shutdown of the store
        ///
        /// This method:
        /// 1. Sets the shutdown flag (rejecting new actions)
        /// 2. Aborts all running cancellable effects (timers must not delay shutdown)
        /// 3. Waits for remaining pending effects to complete (with timeout)
        ///
        /// # Arguments
        ///
        /// - `timeout`: Maximum time to wait for effects to complete
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if the timeout expires before
        /// all pending effects complete.
        ///
        /// # Panics
        ///
        /// Panics if the cancellation registry mutex is poisoned, which only
        /// happens if a thread panicked while holding the lock.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");

            // Set shutdown flag to reject new actions
            self.shutdown.store(true, Ordering::Release);

            // Timers are not worth waiting out
            let entries: Vec<CancellableEntry> = {
                #[allow(clippy::unwrap_used)] // Mutex poison is unrecoverable
                let mut registry = self.cancellables.lock().unwrap();
                registry.drain().map(|(_, entry)| entry).collect()
            };
            for entry in entries {
                entry.handle.abort();
            }

            // Wait for pending effects with timeout
            let start = std::time::Instant::now();
            let poll_interval = Duration::from_millis(100);

            loop {
                let pending = self.pending_effects.load(Ordering::Acquire);

                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(
                        pending_effects = pending,
                        "Shutdown timeout: {} effects still running",
                        pending
                    );
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tracing::debug!(
                    pending_effects = pending,
                    elapsed_ms = start.elapsed().as_millis(),
                    "Waiting for effects to complete"
                );

                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Send an action to the store
        ///
        /// This is the primary way to interact with the store:
        /// 1. Acquires write lock on state
        /// 2. Calls reducer with (state, action, environment)
        /// 3. Executes returned effects asynchronously
        /// 4. Effects may produce more actions (feedback loop)
        ///
        /// # Concurrency and Effect Execution
        ///
        /// - The reducer executes synchronously while holding a write lock
        /// - Effects execute asynchronously in spawned tasks
        /// - `Effect::Cancel` aborts its target before `send()` returns
        /// - `send()` returns after starting effect execution, not completion
        /// - Multiple concurrent `send()` calls serialize at the reducer level
        ///
        /// # Returns
        ///
        /// An [`EffectHandle`] that can be used to wait for effect completion.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        ///
        /// # Example
        ///
        /// ```ignore
        /// let mut handle = store.send(AuthAction::GoToLogin).await?;
        /// handle.wait().await;
        /// ```
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError>
        where
            R: Clone,
            E: Clone,
            A: Clone,
        {
            // Check if store is shutting down
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                return Err(StoreError::ShutdownInProgress);
            }

            tracing::debug!("Processing action");

            // Create tracking for this action
            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let mut state = self.state.write().await;
                tracing::trace!("Acquired write lock on state");

                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();

                let effects = self.reducer.reduce(&mut state, action, &self.environment);
                tracing::trace!("Reducer completed, returned {} effects", effects.len());

                effects
            };

            // Execute effects with tracking
            for effect in effects {
                self.execute_effect_internal(effect, tracking.clone());
            }
            tracing::debug!("Action processing completed, returning handle");

            Ok(handle)
        }

        /// Send an action and wait for a matching result action
        ///
        /// This method is designed for request-response patterns: trigger a
        /// flow step, then wait for the event that ends it.
        ///
        /// # How It Works
        ///
        /// 1. Subscribe to action broadcast BEFORE sending (avoids race conditions)
        /// 2. Send the initial action through the store
        /// 3. Wait for actions produced by effects
        /// 4. Return the first action matching the predicate
        ///
        /// # Arguments
        ///
        /// - `action`: The initial action to send
        /// - `predicate`: Function to test if an action is the terminal result
        /// - `timeout`: Maximum time to wait for matching action
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: Timeout expired before matching action received
        /// - [`StoreError::ChannelClosed`]: Action broadcast channel closed
        /// - [`StoreError::ShutdownInProgress`]: Store is shutting down
        ///
        /// # Example
        ///
        /// ```ignore
        /// let result = store.send_and_wait_for(
        ///     AuthAction::LoginStart { email: None },
        ///     |a| matches!(a,
        ///         AuthAction::LoginStarted { .. } |
        ///         AuthAction::LoginStartFailed { .. }
        ///     ),
        ///     Duration::from_secs(10),
        /// ).await?;
        /// ```
        ///
        /// # Notes
        ///
        /// - Only actions produced by effects are broadcast (not the initial action)
        /// - If the channel lags and drops actions, continues waiting (timeout catches it)
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            R: Clone,
            E: Clone,
            A: Clone,
            F: Fn(&A) -> bool,
        {
            // Subscribe BEFORE sending to avoid race condition
            let mut rx = self.action_broadcast.subscribe();

            // Send the initial action
            self.send(action).await?;

            // Wait for matching action with timeout
            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {}, // Not the action we want, keep waiting
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            // Slow consumer, some actions were dropped
                            // Continue waiting - timeout catches a dropped terminal action
                            tracing::warn!(
                                skipped,
                                "Action observer lagged, {} actions skipped",
                                skipped
                            );
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Subscribe to all actions from this store
        ///
        /// Returns a receiver that gets a clone of every action produced by
        /// effects. The UI layer uses this to react to flow events.
        ///
        /// # Notes
        ///
        /// - Only actions produced by effects are broadcast (not initial actions sent via `send`)
        /// - If the receiver lags, it will skip old actions and receive `RecvError::Lagged`
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Read current state via a closure
        ///
        /// Access state through a closure to ensure the lock is released promptly:
        ///
        /// ```ignore
        /// let signed_in = store.state(|s| s.session.is_some()).await;
        /// ```
        ///
        /// # Arguments
        ///
        /// - `f`: Closure that receives a reference to state and returns a value
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&state)
        }

        /// Execute an effect with tracking
        ///
        /// Internal method that executes effects with completion tracking.
        /// Uses [`DecrementGuard`] to ensure the effect counter is always
        /// decremented, even if the effect panics or is aborted.
        ///
        /// # Effect Types
        ///
        /// - `None`: No-op
        /// - `Future`: Executes async computation, sends resulting action if `Some`
        /// - `Delay`: Waits for duration, then sends action
        /// - `Parallel`: Executes effects concurrently
        /// - `Sequential`: Executes effects in order, waiting for each to complete
        /// - `Cancellable`: Runs the inner effect in a task registered under its id,
        ///   replacing (and aborting) any previous task under the same id
        /// - `Cancel`: Aborts the registered task, synchronously with this call
        ///
        /// # Error Handling Strategy
        ///
        /// **Reducer panics**: Propagate (fail fast). Reducers should be pure
        /// functions that do not panic.
        ///
        /// **Effect execution failures**: Log and continue. Effects are
        /// fire-and-forget operations. The [`DecrementGuard`] ensures the
        /// counter is always updated even on panic.
        #[allow(clippy::needless_pass_by_value)] // tracking is cloned, so pass by value is intentional
        #[allow(clippy::too_many_lines)]
        #[tracing::instrument(skip(self, effect, tracking), name = "execute_effect")]
        fn execute_effect_internal(&self, effect: Effect<A>, tracking: EffectTracking)
        where
            R: Clone,
            E: Clone,
            A: Clone + Send + 'static,
        {
            match effect {
                Effect::None => {
                    tracing::trace!("Executing Effect::None (no-op)");
                },
                Effect::Future(fut) => {
                    tracing::trace!("Executing Effect::Future");
                    tracking.increment();

                    // Track global pending effects for shutdown
                    self.pending_effects.fetch_add(1, Ordering::SeqCst);
                    let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));

                    let tracking_clone = tracking.clone();
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = DecrementGuard(tracking_clone);
                        let _pending_guard = pending_guard; // Decrement on drop

                        if let Some(action) = fut.await {
                            tracing::trace!("Effect::Future produced an action, sending to store");

                            // Broadcast to observers before feedback
                            let _ = store.action_broadcast.send(action.clone());
                            let _ = store.send(action).await;
                        } else {
                            tracing::trace!("Effect::Future completed with no action");
                        }
                    });
                },
                Effect::Delay { duration, action } => {
                    tracing::trace!("Executing Effect::Delay (duration: {:?})", duration);
                    tracking.increment();

                    // Track global pending effects for shutdown
                    self.pending_effects.fetch_add(1, Ordering::SeqCst);
                    let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));

                    let tracking_clone = tracking.clone();
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = DecrementGuard(tracking_clone);
                        let _pending_guard = pending_guard; // Decrement on drop

                        tokio::time::sleep(duration).await;
                        tracing::trace!("Effect::Delay completed, sending action");

                        // Broadcast to observers before feedback
                        let _ = store.action_broadcast.send((*action).clone());
                        let _ = store.send(*action).await;
                    });
                },
                Effect::Parallel(effects) => {
                    tracing::trace!("Executing Effect::Parallel with {} effects", effects.len());

                    // Execute all effects concurrently, each with the same tracking
                    for effect in effects {
                        self.execute_effect_internal(effect, tracking.clone());
                    }
                },
                Effect::Sequential(effects) => {
                    let effect_count = effects.len();
                    tracing::trace!("Executing Effect::Sequential with {} effects", effect_count);

                    tracking.increment();

                    // Track global pending effects for shutdown
                    self.pending_effects.fetch_add(1, Ordering::SeqCst);
                    let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));

                    let tracking_clone = tracking.clone();
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = DecrementGuard(tracking_clone);
                        let _pending_guard = pending_guard; // Decrement on drop

                        // Execute effects one by one, waiting for each to complete
                        for (idx, effect) in effects.into_iter().enumerate() {
                            tracing::trace!(
                                "Executing sequential effect {} of {}",
                                idx + 1,
                                effect_count
                            );

                            // Create sub-tracking for this effect
                            let (sub_tx, mut sub_rx) = watch::channel(());
                            let sub_tracking = EffectTracking {
                                counter: Arc::new(AtomicUsize::new(0)),
                                notifier: sub_tx,
                            };

                            // Execute the effect
                            store.execute_effect_internal(effect, sub_tracking.clone());

                            // Wait for this effect to complete before continuing
                            if sub_tracking.counter.load(Ordering::SeqCst) > 0 {
                                let _ = sub_rx.changed().await;
                            }
                        }
                        tracing::trace!("Effect::Sequential completed");
                    });
                },
                Effect::Cancellable { id, effect } => {
                    tracing::trace!(id = %id, "Executing Effect::Cancellable");
                    tracking.increment();

                    // Track global pending effects for shutdown
                    self.pending_effects.fetch_add(1, Ordering::SeqCst);
                    let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));

                    let tracking_clone = tracking.clone();
                    let store = self.clone();
                    let registry = Arc::clone(&self.cancellables);
                    let generation = self.cancel_generation.fetch_add(1, Ordering::SeqCst);
                    let cleanup_id = id.clone();

                    let task = tokio::spawn(async move {
                        let _guard = DecrementGuard(tracking_clone);
                        let _pending_guard = pending_guard; // Decrement on drop

                        run_effect_inline(store, *effect).await;

                        // Drop our registry entry unless a newer effect replaced it
                        #[allow(clippy::unwrap_used)] // Mutex poison is unrecoverable
                        let mut registry = registry.lock().unwrap();
                        if registry
                            .get(&cleanup_id)
                            .is_some_and(|entry| entry.generation == generation)
                        {
                            registry.remove(&cleanup_id);
                        }
                    });

                    // Register, aborting any previous task under this id (latest wins)
                    let previous = {
                        #[allow(clippy::unwrap_used)] // Mutex poison is unrecoverable
                        let mut registry = self.cancellables.lock().unwrap();
                        registry.insert(
                            id,
                            CancellableEntry {
                                generation,
                                handle: task.abort_handle(),
                            },
                        )
                    };
                    if let Some(previous) = previous {
                        previous.handle.abort();
                    }
                },
                Effect::Cancel(id) => {
                    tracing::trace!(id = %id, "Executing Effect::Cancel");

                    let entry = {
                        #[allow(clippy::unwrap_used)] // Mutex poison is unrecoverable
                        let mut registry = self.cancellables.lock().unwrap();
                        registry.remove(&id)
                    };
                    match entry {
                        Some(entry) => entry.handle.abort(),
                        None => tracing::trace!(id = %id, "Nothing to cancel"),
                    }
                },
            }
        }

        /// Execute an effect without tying it to any caller's handle
        ///
        /// Used for effects nested inside a cancellable task, which already
        /// completed its own tracking obligations.
        fn execute_detached(&self, effect: Effect<A>)
        where
            R: Clone,
            E: Clone,
        {
            let (_handle, tracking) = EffectHandle::new();
            self.execute_effect_internal(effect, tracking);
        }
    }

    /// Run an effect tree inside the current task
    ///
    /// Cancellable effects execute their whole inner tree within one spawned
    /// task so a single abort handle covers it. Nested cancellable effects go
    /// back through the registry, each id independently cancellable.
    fn run_effect_inline<S, A, E, R>(
        store: Store<S, A, E, R>,
        effect: Effect<A>,
    ) -> futures::future::BoxFuture<'static, ()>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        Box::pin(async move {
            match effect {
                Effect::None => {},
                Effect::Future(fut) => {
                    if let Some(action) = fut.await {
                        let _ = store.action_broadcast.send(action.clone());
                        let _ = store.send(action).await;
                    }
                },
                Effect::Delay { duration, action } => {
                    tokio::time::sleep(duration).await;
                    let _ = store.action_broadcast.send((*action).clone());
                    let _ = store.send(*action).await;
                },
                Effect::Sequential(effects) => {
                    for effect in effects {
                        run_effect_inline(store.clone(), effect).await;
                    }
                },
                Effect::Parallel(effects) => {
                    let branches: Vec<_> = effects
                        .into_iter()
                        .map(|effect| run_effect_inline(store.clone(), effect))
                        .collect();
                    futures::future::join_all(branches).await;
                },
                nested @ (Effect::Cancellable { .. } | Effect::Cancel(_)) => {
                    store.execute_detached(nested);
                },
            }
        })
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
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                cancellables: Arc::clone(&self.cancellables),
                cancel_generation: Arc::clone(&self.cancel_generation),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}

// Re-export for convenience
pub use store::Store;

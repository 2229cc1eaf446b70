//! The core trait for business logic
//!
//! Reducers are pure functions: `(State, Action, Environment) → Effects`.
//! They contain all business logic and are deterministic and testable.

use crate::effect::Effect;
use smallvec::SmallVec;

/// The Reducer trait - core abstraction for business logic
///
/// # Type Parameters
///
/// - `State`: The domain state this reducer operates on
/// - `Action`: The action type this reducer processes
/// - `Environment`: The injected dependencies this reducer needs
///
/// # Example
///
/// ```
/// use divvy_core::{Effect, Reducer, SmallVec, smallvec};
///
/// #[derive(Clone, Default)]
/// struct CounterState {
///     count: i32,
/// }
///
/// #[derive(Clone)]
/// enum CounterAction {
///     Increment,
/// }
///
/// struct CounterReducer;
///
/// impl Reducer for CounterReducer {
///     type State = CounterState;
///     type Action = CounterAction;
///     type Environment = ();
///
///     fn reduce(
///         &self,
///         state: &mut Self::State,
///         action: Self::Action,
///         _env: &Self::Environment,
///     ) -> SmallVec<[Effect<Self::Action>; 4]> {
///         match action {
///             CounterAction::Increment => {
///                 state.count += 1;
///                 smallvec![Effect::None]
///             }
///         }
///     }
/// }
///
/// let mut state = CounterState::default();
/// let _ = CounterReducer.reduce(&mut state, CounterAction::Increment, &());
/// assert_eq!(state.count, 1);
/// ```
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
    /// 3. Returns effect descriptions to be executed
    ///
    /// # Arguments
    ///
    /// - `state`: Mutable reference to current state
    /// - `action`: The action to process
    /// - `env`: Reference to injected dependencies
    ///
    /// # Returns
    ///
    /// Effects to be executed by the runtime. Most reductions produce few
    /// effects, so they are returned inline without allocation.
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]>;
}

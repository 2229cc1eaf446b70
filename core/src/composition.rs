//! Reducer composition utilities
//!
//! Larger features are split across focused reducers that share the same
//! state and action types. [`combine_reducers`] runs them in sequence and
//! concatenates their effects, producing a single reducer for the Store.

use crate::effect::Effect;
use crate::reducer::Reducer;
use std::sync::Arc;

/// Combines multiple reducers that operate on the same state and action types.
///
/// Each reducer is run in sequence, and all effects are collected and
/// concatenated. This is useful when you want to split reducer logic across
/// multiple implementations.
///
/// # Type Parameters
///
/// - `S`: The state type
/// - `A`: The action type
/// - `E`: The environment type
///
/// # Examples
///
/// ```
/// use divvy_core::{Effect, Reducer, SmallVec, smallvec};
/// use divvy_core::composition::combine_reducers;
///
/// #[derive(Clone, Default)]
/// struct AppState {
///     counter: i32,
///     logged: bool,
/// }
///
/// #[derive(Clone)]
/// enum AppAction {
///     Increment,
///     Log,
/// }
///
/// struct CounterReducer;
/// struct LoggingReducer;
///
/// impl Reducer for CounterReducer {
///     type State = AppState;
///     type Action = AppAction;
///     type Environment = ();
///
///     fn reduce(
///         &self,
///         state: &mut Self::State,
///         action: Self::Action,
///         _env: &Self::Environment,
///     ) -> SmallVec<[Effect<Self::Action>; 4]> {
///         if matches!(action, AppAction::Increment) {
///             state.counter += 1;
///         }
///         smallvec![Effect::None]
///     }
/// }
///
/// impl Reducer for LoggingReducer {
///     type State = AppState;
///     type Action = AppAction;
///     type Environment = ();
///
///     fn reduce(
///         &self,
///         state: &mut Self::State,
///         action: Self::Action,
///         _env: &Self::Environment,
///     ) -> SmallVec<[Effect<Self::Action>; 4]> {
///         if matches!(action, AppAction::Log) {
///             state.logged = true;
///         }
///         smallvec![Effect::None]
///     }
/// }
///
/// let combined = combine_reducers(vec![Box::new(CounterReducer), Box::new(LoggingReducer)]);
///
/// let mut state = AppState::default();
/// let _ = combined.reduce(&mut state, AppAction::Increment, &());
/// assert_eq!(state.counter, 1);
/// ```
#[must_use]
pub fn combine_reducers<S, A, E>(
    reducers: Vec<Box<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>>,
) -> CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    CombinedReducer {
        reducers: reducers.into_iter().map(Arc::from).collect(),
    }
}

/// A combined reducer that runs multiple reducers in sequence.
///
/// Created by [`combine_reducers`]. Cloning shares the underlying reducers,
/// which is what the Store's effect feedback loop needs.
pub struct CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    reducers: Vec<Arc<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>>,
}

impl<S, A, E> Clone for CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    fn clone(&self) -> Self {
        Self {
            reducers: self.reducers.clone(),
        }
    }
}

impl<S, A, E> Reducer for CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> smallvec::SmallVec<[Effect<Self::Action>; 4]> {
        let mut all_effects = smallvec::SmallVec::new();

        for reducer in &self.reducers {
            let effects = reducer.reduce(state, action.clone(), env);
            all_effects.extend(effects);
        }

        all_effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SmallVec, smallvec};

    #[derive(Clone, Default)]
    struct TestState {
        counter: i32,
        name: String,
    }

    #[derive(Clone)]
    enum TestAction {
        Increment,
        Decrement,
        SetName(String),
    }

    struct CounterReducer;

    impl Reducer for CounterReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                TestAction::Increment => {
                    state.counter += 1;
                    smallvec![Effect::None]
                },
                TestAction::Decrement => {
                    state.counter -= 1;
                    smallvec![Effect::None]
                },
                TestAction::SetName(_) => smallvec![Effect::None],
            }
        }
    }

    struct NameReducer;

    impl Reducer for NameReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            if let TestAction::SetName(name) = action {
                state.name = name;
            }
            smallvec![Effect::None]
        }
    }

    #[test]
    fn test_combine_reducers() {
        let combined = combine_reducers(vec![Box::new(CounterReducer), Box::new(NameReducer)]);

        let mut state = TestState::default();

        // Test counter reducer
        let _ = combined.reduce(&mut state, TestAction::Increment, &());
        assert_eq!(state.counter, 1);

        // Test name reducer
        let _ = combined.reduce(&mut state, TestAction::SetName("Alice".to_string()), &());
        assert_eq!(state.name, "Alice");

        // Both reducers work
        let _ = combined.reduce(&mut state, TestAction::Decrement, &());
        assert_eq!(state.counter, 0);
        assert_eq!(state.name, "Alice");
    }

    #[test]
    fn test_combined_effects_concatenate() {
        struct TwoEffects;

        impl Reducer for TwoEffects {
            type State = TestState;
            type Action = TestAction;
            type Environment = ();

            fn reduce(
                &self,
                _state: &mut Self::State,
                _action: Self::Action,
                _env: &Self::Environment,
            ) -> SmallVec<[Effect<Self::Action>; 4]> {
                smallvec![Effect::None, Effect::None]
            }
        }

        let reducers: Vec<
            Box<dyn Reducer<State = TestState, Action = TestAction, Environment = ()> + Send + Sync>,
        > = vec![Box::new(TwoEffects), Box::new(TwoEffects)];
        let combined = combine_reducers(reducers);

        let mut state = TestState::default();
        let effects = combined.reduce(&mut state, TestAction::Increment, &());
        assert_eq!(effects.len(), 4);
    }
}

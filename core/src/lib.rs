//! # Divvy Core
//!
//! Core traits and types for the Divvy composable client architecture.
//!
//! The client is built as a set of pure reducers over owned state, with side
//! effects returned as values and executed by the Store runtime in the
//! `divvy-runtime` crate.
//!
//! ## Core Concepts
//!
//! - **State**: Owned domain state for a feature
//! - **Action**: All possible inputs to a reducer (commands and events)
//! - **Reducer**: Pure function `(State, Action, Environment) → Effects`
//! - **Effect**: Side effect descriptions (not execution)
//! - **Environment**: Injected dependencies via traits
//!
//! ## Architecture Principles
//!
//! - Functional Core, Imperative Shell
//! - Unidirectional Data Flow
//! - Explicit Effects (no hidden I/O)
//! - Dependency Injection via Environment
//!
//! ## Example
//!
//! ```ignore
//! use divvy_core::{Effect, Reducer, SmallVec, smallvec};
//!
//! impl Reducer for AuthReducer {
//!     type State = AuthState;
//!     type Action = AuthAction;
//!     type Environment = AuthEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut AuthState,
//!         action: AuthAction,
//!         env: &AuthEnvironment,
//!     ) -> SmallVec<[Effect<AuthAction>; 4]> {
//!         // Business logic goes here
//!         smallvec![Effect::None]
//!     }
//! }
//! ```

/// Reducer composition utilities
pub mod composition;

/// Effect descriptions executed by the Store runtime
pub mod effect;

/// Dependency injection traits
pub mod environment;

/// The Reducer trait
pub mod reducer;

pub use effect::{Effect, EffectId};
pub use reducer::Reducer;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{SmallVec, smallvec};

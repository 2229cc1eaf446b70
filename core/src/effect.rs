//! Side effect descriptions
//!
//! Effects describe side effects to be performed by the runtime.
//! They are values (not execution), returned from reducers and executed
//! by the Store, which feeds any produced actions back into the reducer.

use futures::future::BoxFuture;
use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

/// Identifier for a cancellable effect
///
/// Cancellable effects are keyed by id inside the Store. Starting a new
/// cancellable effect under an id that is already running replaces the
/// running one (latest wins), which is what debounce and ticker re-arm
/// semantics need. [`Effect::Cancel`] aborts without replacement.
///
/// Ids are cheap to construct from static strings:
///
/// ```
/// use divvy_core::EffectId;
///
/// const DEBOUNCE: EffectId = EffectId::from_static("otp-debounce");
/// assert_eq!(DEBOUNCE.as_str(), "otp-debounce");
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct EffectId(Cow<'static, str>);

impl EffectId {
    /// Create an id from a static string, usable in `const` contexts
    #[must_use]
    pub const fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    /// Create an id from an owned or borrowed string
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(Cow::Owned(id.into()))
    }

    /// The id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EffectId({})", self.0)
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for EffectId {
    fn from(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }
}

/// Effect type - describes a side effect to be executed
///
/// Effects are NOT executed immediately. They are descriptions of what should
/// happen, returned from reducers and executed by the Store runtime.
///
/// # Type Parameters
///
/// - `Action`: The action type that effects can produce (feedback loop)
pub enum Effect<Action> {
    /// No-op effect
    None,

    /// Run effects in parallel
    Parallel(Vec<Effect<Action>>),

    /// Run effects sequentially
    Sequential(Vec<Effect<Action>>),

    /// Delayed action (for timeouts, debounce, tickers)
    Delay {
        /// How long to wait
        duration: Duration,
        /// Action to dispatch after delay
        action: Box<Action>,
    },

    /// Arbitrary async computation
    ///
    /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
    Future(BoxFuture<'static, Option<Action>>),

    /// An effect that can be aborted by id
    ///
    /// Starting a cancellable effect under an id that is already running
    /// replaces the running one. The wrapped effect otherwise executes
    /// exactly like its plain counterpart.
    Cancellable {
        /// Cancellation key
        id: EffectId,
        /// The effect to run under that key
        effect: Box<Effect<Action>>,
    },

    /// Abort the cancellable effect registered under the given id
    ///
    /// A no-op when nothing is running under the id.
    Cancel(EffectId),
}

// Manual Debug implementation since Future doesn't implement Debug
impl<Action> fmt::Debug for Effect<Action>
where
    Action: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::None => write!(f, "Effect::None"),
            Effect::Parallel(effects) => {
                f.debug_tuple("Effect::Parallel").field(effects).finish()
            },
            Effect::Sequential(effects) => {
                f.debug_tuple("Effect::Sequential").field(effects).finish()
            },
            Effect::Delay { duration, action } => f
                .debug_struct("Effect::Delay")
                .field("duration", duration)
                .field("action", action)
                .finish(),
            Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            Effect::Cancellable { id, effect } => f
                .debug_struct("Effect::Cancellable")
                .field("id", id)
                .field("effect", effect)
                .finish(),
            Effect::Cancel(id) => f.debug_tuple("Effect::Cancel").field(id).finish(),
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

    /// Wrap an effect so it can be aborted (or replaced) by id
    #[must_use]
    pub fn cancellable(id: impl Into<EffectId>, effect: Effect<Action>) -> Effect<Action> {
        Effect::Cancellable {
            id: id.into(),
            effect: Box::new(effect),
        }
    }

    /// Schedule an action after a delay
    #[must_use]
    pub fn delay(duration: Duration, action: Action) -> Effect<Action> {
        Effect::Delay {
            duration,
            action: Box::new(action),
        }
    }
}

//! Reducers for the authentication orchestrator.
//!
//! The flows are split across focused reducers that share [`AuthState`]
//! and [`AuthAction`]:
//!
//! - [`FlowReducer`]: navigation, reset, session lifecycle, widget events
//! - [`SignupReducer`], [`LoginReducer`], [`RecoveryReducer`]: one per
//!   flow family, owning its backend calls and ceremony step
//! - [`OtpReducer`]: the verification step both signup and recovery pass
//!   through, with its countdown and auto-submit timers
//!
//! [`auth_reducer`] combines them. Every reducer sees every action and
//! falls through on the ones it does not own, so an action like
//! [`AuthAction::OtpVerified`] can be produced by a flow reducer's effect
//! and handled by the verification reducer.

pub mod flow;
pub mod login;
pub mod otp;
pub mod recovery;
pub mod signup;

pub use flow::FlowReducer;
pub use login::LoginReducer;
pub use otp::OtpReducer;
pub use recovery::RecoveryReducer;
pub use signup::SignupReducer;

use crate::actions::AuthAction;
use crate::config::AuthConfig;
use crate::environment::AuthEnvironment;
use crate::providers::{AuthApi, CredentialApi, RecaptchaClient, TokenStorage};
use crate::state::AuthState;
use divvy_core::composition::{CombinedReducer, combine_reducers};

/// The complete authentication reducer, ready for a store.
///
/// # Example
///
/// ```
/// use divvy_auth::config::AuthConfig;
/// use divvy_auth::mocks::mock_environment;
/// use divvy_auth::reducers::auth_reducer;
///
/// let reducer = auth_reducer(&AuthConfig::default());
/// let store = divvy_runtime::Store::new(
///     divvy_auth::AuthState::default(),
///     reducer,
///     mock_environment(),
/// );
/// # let _ = store;
/// ```
#[must_use]
pub fn auth_reducer<A, C, R, S>(
    config: &AuthConfig,
) -> CombinedReducer<AuthState, AuthAction, AuthEnvironment<A, C, R, S>>
where
    A: AuthApi + Clone + 'static,
    C: CredentialApi + Clone + 'static,
    R: RecaptchaClient + Clone + 'static,
    S: TokenStorage + Clone + 'static,
{
    combine_reducers(vec![
        Box::new(FlowReducer::new()),
        Box::new(SignupReducer::with_config(config.otp.clone())),
        Box::new(LoginReducer::with_config(config.otp.clone())),
        Box::new(RecoveryReducer::with_config(
            config.otp.clone(),
            config.recaptcha.clone(),
        )),
        Box::new(OtpReducer::with_config(config.otp.clone())),
    ])
}

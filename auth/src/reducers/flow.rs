//! Cross-flow reducer: navigation, reset, session lifecycle, bot-gate events.
//!
//! Everything that is not specific to one flow family lands here. The
//! completion handler is the single place a session enters the state, and
//! the reset handler is the single place an abandoned flow gets cleaned
//! up, so the invariants around those two transitions live in one file:
//!
//! - Local state is authoritative. Reset and completion mutate the state
//!   synchronously; backend notification and durable persistence happen in
//!   effects afterwards, and their failures degrade to a log line or a
//!   notice, never to a half-reset state.
//! - Both exits cancel the verification-step timers, whether or not that
//!   step was active. Cancelling an idle id is a no-op.

use crate::actions::AuthAction;
use crate::environment::AuthEnvironment;
use crate::error::AuthError;
use crate::providers::{AuthApi, CredentialApi, RecaptchaClient, TokenStorage};
use crate::reducers::otp::{OTP_DEBOUNCE, OTP_TICKER};
use crate::state::{AuthState, FlowNotice, FlowState};
use divvy_core::effect::Effect;
use divvy_core::reducer::Reducer;
use divvy_core::{SmallVec, smallvec};

/// Reducer for navigation, reset, and session lifecycle.
#[derive(Debug, Clone)]
pub struct FlowReducer<A, C, R, S> {
    /// Phantom data to hold type parameters.
    _phantom: std::marker::PhantomData<(A, C, R, S)>,
}

impl<A, C, R, S> FlowReducer<A, C, R, S> {
    /// Create the reducer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<A, C, R, S> Default for FlowReducer<A, C, R, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, C, R, S> Reducer for FlowReducer<A, C, R, S>
where
    A: AuthApi + Clone + 'static,
    C: CredentialApi + Clone + 'static,
    R: RecaptchaClient + Clone + 'static,
    S: TokenStorage + Clone + 'static,
{
    type State = AuthState;
    type Action = AuthAction;
    type Environment = AuthEnvironment<A, C, R, S>;

    #[allow(clippy::too_many_lines)] // One arm per lifecycle event
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ═══════════════════════════════════════════════════════════════
            // GoToSignup / GoToLogin / GoToRecovery: Open a flow from idle
            // ═══════════════════════════════════════════════════════════════
            nav @ (AuthAction::GoToSignup
            | AuthAction::GoToLogin
            | AuthAction::GoToRecovery) => {
                if state.step != FlowState::Idle {
                    tracing::warn!(step = ?state.step, "Navigation requires the idle state");
                    return smallvec![Effect::None];
                }

                state.flow.clear();
                state.otp = None;
                state.in_flight = false;
                state.last_error = None;
                state.notice = None;
                // Probed on entry so the UI can warn before the ceremony step
                state.passkeys_unsupported = !env.credentials.is_supported();
                state.step = match nav {
                    AuthAction::GoToLogin => FlowState::LoginEmail,
                    AuthAction::GoToRecovery => FlowState::RecoveryEmail,
                    _ => FlowState::SignupEmail,
                };
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════
            // ResetFlow: Abandon the active flow, notify the backend after
            // ═══════════════════════════════════════════════════════════════
            AuthAction::ResetFlow => {
                if state.step == FlowState::Idle {
                    return smallvec![Effect::None];
                }

                let abandoned_email = state.flow.email.clone();
                state.step = FlowState::Idle;
                state.flow.clear();
                state.otp = None;
                state.in_flight = false;
                state.last_error = None;
                state.notice = None;
                state.recaptcha.reset();

                let api = env.api.clone();
                let recaptcha = env.recaptcha.clone();
                smallvec![
                    Effect::Cancel(OTP_TICKER),
                    Effect::Cancel(OTP_DEBOUNCE),
                    Effect::Future(Box::pin(async move {
                        // Best effort; local state is already clean.
                        if let Some(email) = abandoned_email {
                            if let Err(error) = api.cancel_pending_flow(&email).await {
                                tracing::warn!(%error, "Backend flow cancellation failed");
                            }
                        }
                        recaptcha.reset().await;
                        None
                    })),
                ]
            },

            // ═══════════════════════════════════════════════════════════════
            // Logout: Drop the session here and in durable storage
            // ═══════════════════════════════════════════════════════════════
            AuthAction::Logout => {
                state.session = None;

                let handle = env.session.clone();
                smallvec![Effect::Future(Box::pin(async move {
                    if let Err(error) = handle.clear().await {
                        tracing::error!(%error, "Failed to clear stored session");
                    }
                    None
                }))]
            },

            // ═══════════════════════════════════════════════════════════════
            // SessionInvalidated: Transport saw a 401 for a bearer token
            // ═══════════════════════════════════════════════════════════════
            AuthAction::SessionInvalidated { token } => {
                let current = state
                    .session
                    .as_ref()
                    .is_some_and(|session| session.token == token);
                if !current {
                    // A late rejection for an already-replaced token must
                    // not sign out whoever is logged in now.
                    tracing::warn!("Invalidation for a stale token ignored");
                    return smallvec![Effect::None];
                }

                tracing::info!("Backend rejected the session token; signing out");
                state.session = None;

                let handle = env.session.clone();
                smallvec![Effect::Future(Box::pin(async move {
                    if let Err(error) = handle.clear().await {
                        tracing::error!(%error, "Failed to clear stored session");
                    }
                    None
                }))]
            },

            // ═══════════════════════════════════════════════════════════════
            // RecaptchaSolved / RecaptchaExpired: Widget lifecycle
            // ═══════════════════════════════════════════════════════════════
            AuthAction::RecaptchaSolved { token } => {
                if !state.recaptcha.required {
                    tracing::warn!("Widget solve arrived without an escalation");
                    return smallvec![Effect::None];
                }
                state.recaptcha.solve(token);
                // The blocked-submission error is moot once a token exists
                if matches!(state.last_error, Some(AuthError::RecaptchaRequired)) {
                    state.last_error = None;
                }
                smallvec![Effect::None]
            },

            AuthAction::RecaptchaExpired => {
                state.recaptcha.expire();

                let recaptcha = env.recaptcha.clone();
                smallvec![Effect::Future(Box::pin(async move {
                    recaptcha.reset().await;
                    None
                }))]
            },

            // ═══════════════════════════════════════════════════════════════
            // AuthCompleted: The one place a session enters the state
            // ═══════════════════════════════════════════════════════════════
            AuthAction::AuthCompleted { flow, session } => {
                tracing::info!(flow = flow.as_str(), "Authentication flow completed");

                state.session = Some(session.clone());
                state.step = FlowState::Idle;
                state.flow.clear();
                state.otp = None;
                state.in_flight = false;
                state.recaptcha.reset();
                state.last_error = None;
                state.notice = None;

                let handle = env.session.clone();
                let recaptcha = env.recaptcha.clone();
                smallvec![
                    Effect::Cancel(OTP_TICKER),
                    Effect::Cancel(OTP_DEBOUNCE),
                    Effect::Future(Box::pin(async move {
                        recaptcha.reset().await;
                        match handle.replace(session).await {
                            Ok(()) => None,
                            Err(error) => {
                                Some(AuthAction::SessionPersistFailed { error })
                            },
                        }
                    })),
                ]
            },

            // ═══════════════════════════════════════════════════════════════
            // PasskeyStepFailed: Ceremony or its finish call failed
            // ═══════════════════════════════════════════════════════════════
            AuthAction::PasskeyStepFailed { error } => {
                state.in_flight = false;

                if matches!(error, AuthError::CeremonyUnsupported) {
                    state.passkeys_unsupported = true;
                    return smallvec![Effect::None];
                }

                tracing::warn!(%error, "Ceremony step failed");
                state.last_error = Some(error);
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════
            // SessionPersistFailed: Signed in, but only in memory
            // ═══════════════════════════════════════════════════════════════
            AuthAction::SessionPersistFailed { error } => {
                tracing::warn!(%error, "Session persisted in memory only");
                state.notice = Some(FlowNotice {
                    message: format!("Could not save your session: {error}"),
                    at: env.clock.now(),
                });
                smallvec![Effect::None]
            },

            // Everything else belongs to another reducer
            _ => smallvec![Effect::None],
        }
    }
}

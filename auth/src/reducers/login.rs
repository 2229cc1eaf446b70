//! Login flow reducer.
//!
//! Login is the short path: one backend exchange fetches an assertion
//! challenge, one ceremony answers it. With an email the challenge is
//! scoped to that account's credentials; without one the backend issues a
//! discoverable challenge and the platform lets the user pick.
//!
//! The interesting wrinkle is the `VerificationRequired` rejection. It
//! means the account exists but never finished signup, so the backend has
//! mailed a fresh code and expects the signup verification exchange. The
//! failure handler jumps straight onto the signup flow's verification
//! step, without visiting the signup form, carrying whichever email the
//! backend attached (or the typed one when it attached none).

use crate::actions::AuthAction;
use crate::config::OtpConfig;
use crate::environment::AuthEnvironment;
use crate::error::AuthError;
use crate::passkeys;
use crate::providers::{AuthApi, CredentialApi, RecaptchaClient, TokenStorage};
use crate::reducers::otp::enter_otp_step;
use crate::state::{AuthState, FlowFamily, FlowState, PendingChallenge, Session};
use divvy_core::effect::Effect;
use divvy_core::reducer::Reducer;
use divvy_core::{SmallVec, smallvec};

/// Reducer for the login flow.
#[derive(Debug, Clone)]
pub struct LoginReducer<A, C, R, S> {
    /// Timings for the verification step the `VerificationRequired`
    /// side-channel lands on.
    otp: OtpConfig,
    /// Phantom data to hold type parameters.
    _phantom: std::marker::PhantomData<(A, C, R, S)>,
}

impl<A, C, R, S> LoginReducer<A, C, R, S> {
    /// Create a reducer with production timings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            otp: OtpConfig::default(),
            _phantom: std::marker::PhantomData,
        }
    }

    /// Create a reducer with custom verification timings.
    #[must_use]
    pub fn with_config(otp: OtpConfig) -> Self {
        Self {
            otp,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<A, C, R, S> Default for LoginReducer<A, C, R, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, C, R, S> Reducer for LoginReducer<A, C, R, S>
where
    A: AuthApi + Clone + 'static,
    C: CredentialApi + Clone + 'static,
    R: RecaptchaClient + Clone + 'static,
    S: TokenStorage + Clone + 'static,
{
    type State = AuthState;
    type Action = AuthAction;
    type Environment = AuthEnvironment<A, C, R, S>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ═══════════════════════════════════════════════════════════════
            // LoginStart: Ask the backend for an assertion challenge
            // ═══════════════════════════════════════════════════════════════
            AuthAction::LoginStart { email } => {
                if state.step != FlowState::LoginEmail {
                    tracing::warn!(step = ?state.step, "LoginStart outside the login form");
                    return smallvec![Effect::None];
                }
                if state.in_flight {
                    tracing::warn!("LoginStart while a request is in flight");
                    return smallvec![Effect::None];
                }

                let email = email
                    .map(|e| e.trim().to_string())
                    .filter(|e| !e.is_empty());
                state.flow.email.clone_from(&email);
                state.in_flight = true;
                state.last_error = None;

                let api = env.api.clone();
                smallvec![Effect::Future(Box::pin(async move {
                    Some(match api.login_start(email.as_deref()).await {
                        Ok(challenge) => AuthAction::LoginStarted { email, challenge },
                        Err(error) => AuthAction::LoginStartFailed { error },
                    })
                }))]
            },

            // ═══════════════════════════════════════════════════════════════
            // LoginStarted: Challenge in hand; wait for the ceremony trigger
            // ═══════════════════════════════════════════════════════════════
            AuthAction::LoginStarted { email, challenge } => {
                state.step = FlowState::Passkey {
                    flow: FlowFamily::Login,
                };
                state.flow.email = email;
                state.flow.pending_challenge =
                    Some(PendingChallenge::Authentication(challenge));
                state.in_flight = false;
                state.last_error = None;
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════
            // LoginStartFailed: Surface, or reroute to signup verification
            // ═══════════════════════════════════════════════════════════════
            AuthAction::LoginStartFailed { error } => {
                state.in_flight = false;

                if let AuthError::VerificationRequired { ref email } = error {
                    // Half-finished signup. The backend has already mailed a
                    // fresh code; land directly on the signup verification
                    // step rather than the signup form.
                    let target = if email.is_empty() {
                        state.flow.email.clone()
                    } else {
                        Some(email.clone())
                    };
                    if let Some(target) = target {
                        tracing::info!(
                            "Login found an unverified signup; rerouting to verification"
                        );
                        state.flow.email = Some(target);
                        return smallvec![enter_otp_step(
                            state,
                            FlowFamily::Signup,
                            &self.otp
                        )];
                    }
                    // No email anywhere to verify against; all we can do
                    // is tell the user what the backend said.
                }

                state.last_error = Some(error);
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════
            // LoginFinish: Run the ceremony, trade it for a session
            // ═══════════════════════════════════════════════════════════════
            AuthAction::LoginFinish => {
                if !matches!(
                    state.step,
                    FlowState::Passkey {
                        flow: FlowFamily::Login
                    }
                ) {
                    tracing::warn!(step = ?state.step, "LoginFinish outside its ceremony step");
                    return smallvec![Effect::None];
                }
                if state.in_flight {
                    tracing::warn!("LoginFinish while a request is in flight");
                    return smallvec![Effect::None];
                }
                if !env.credentials.is_supported() {
                    state.passkeys_unsupported = true;
                    tracing::warn!("Platform has no credential API; login cannot finish here");
                    return smallvec![Effect::None];
                }
                let Some(PendingChallenge::Authentication(challenge)) =
                    state.flow.pending_challenge.clone()
                else {
                    tracing::warn!("LoginFinish with no authentication challenge pending");
                    return smallvec![Effect::None];
                };

                let options = match passkeys::prepare_authentication(&challenge) {
                    Ok(options) => options,
                    Err(error) => {
                        state.last_error = Some(error);
                        return smallvec![Effect::None];
                    },
                };

                state.in_flight = true;
                state.last_error = None;

                let api = env.api.clone();
                let credentials = env.credentials.clone();
                smallvec![Effect::Future(Box::pin(async move {
                    let response =
                        match passkeys::perform_authentication(&credentials, options).await {
                            Ok(response) => response,
                            Err(error) => {
                                return Some(AuthAction::PasskeyStepFailed { error });
                            },
                        };
                    Some(match api.login_finish(&response).await {
                        Ok(payload) => AuthAction::AuthCompleted {
                            flow: FlowFamily::Login,
                            session: Session {
                                token: payload.token,
                                user: payload.user,
                            },
                        },
                        Err(error) => AuthAction::PasskeyStepFailed { error },
                    })
                }))]
            },

            // Everything else belongs to another reducer
            _ => smallvec![Effect::None],
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test assertions

    use super::*;
    use crate::mocks::{
        Endpoint, MockLoginReducer, RecordedCall, mock_environment,
        mock_environment_without_passkeys,
    };
    use crate::state::FlowData;
    use divvy_testing::ReducerTest;
    use divvy_testing::assertions::{
        assert_has_cancellable_effect, assert_has_future_effect, assert_no_effects,
    };

    fn form_state() -> AuthState {
        AuthState {
            step: FlowState::LoginEmail,
            ..AuthState::default()
        }
    }

    fn ceremony_state(env: &crate::mocks::MockEnvironment) -> AuthState {
        AuthState {
            step: FlowState::Passkey {
                flow: FlowFamily::Login,
            },
            flow: FlowData {
                email: Some("ada@divvy.test".to_string()),
                pending_challenge: Some(PendingChallenge::Authentication(
                    env.api.authentication_challenge(),
                )),
                ..FlowData::default()
            },
            ..AuthState::default()
        }
    }

    async fn run_futures(
        effects: SmallVec<[Effect<AuthAction>; 4]>,
    ) -> Vec<AuthAction> {
        let mut produced = Vec::new();
        for effect in effects {
            if let Effect::Future(fut) = effect {
                if let Some(action) = fut.await {
                    produced.push(action);
                }
            }
        }
        produced
    }

    #[test]
    fn start_submits_and_marks_in_flight() {
        ReducerTest::new(MockLoginReducer::new())
            .with_env(mock_environment())
            .given_state(form_state())
            .when_action(AuthAction::LoginStart {
                email: Some("ada@divvy.test".to_string()),
            })
            .then_state(|state| {
                assert!(state.in_flight);
                assert_eq!(state.flow.email, Some("ada@divvy.test".to_string()));
            })
            .then_effects(assert_has_future_effect)
            .run();
    }

    #[tokio::test]
    async fn start_without_an_email_requests_a_discoverable_challenge() {
        let env = mock_environment();
        let reducer = MockLoginReducer::new();
        let mut state = form_state();

        let effects = reducer.reduce(&mut state, AuthAction::LoginStart { email: None }, &env);
        let produced = run_futures(effects).await;

        assert_eq!(
            env.api.calls(),
            vec![RecordedCall::LoginStart { email: None }]
        );
        assert!(matches!(
            produced.as_slice(),
            [AuthAction::LoginStarted { email: None, .. }]
        ));
    }

    #[tokio::test]
    async fn start_treats_a_blank_email_as_absent() {
        let env = mock_environment();
        let reducer = MockLoginReducer::new();
        let mut state = form_state();

        let effects = reducer.reduce(
            &mut state,
            AuthAction::LoginStart {
                email: Some("   ".to_string()),
            },
            &env,
        );
        run_futures(effects).await;

        assert_eq!(
            env.api.calls(),
            vec![RecordedCall::LoginStart { email: None }]
        );
    }

    #[test]
    fn start_outside_the_form_is_rejected() {
        ReducerTest::new(MockLoginReducer::new())
            .with_env(mock_environment())
            .given_state(AuthState::default())
            .when_action(AuthAction::LoginStart { email: None })
            .then_state(|state| {
                assert!(!state.in_flight);
            })
            .then_effects(assert_no_effects)
            .run();
    }

    #[test]
    fn started_holds_the_challenge_for_the_ceremony() {
        let env = mock_environment();
        let challenge = env.api.authentication_challenge();
        let mut state = form_state();
        state.in_flight = true;

        ReducerTest::new(MockLoginReducer::new())
            .with_env(env)
            .given_state(state)
            .when_action(AuthAction::LoginStarted {
                email: Some("ada@divvy.test".to_string()),
                challenge,
            })
            .then_state(|state| {
                assert_eq!(
                    state.step,
                    FlowState::Passkey {
                        flow: FlowFamily::Login
                    }
                );
                assert!(matches!(
                    state.flow.pending_challenge,
                    Some(PendingChallenge::Authentication(_))
                ));
                assert!(!state.in_flight);
            })
            .then_effects(assert_no_effects)
            .run();
    }

    #[test]
    fn unknown_account_surfaces_without_leaving_the_form() {
        let mut state = form_state();
        state.in_flight = true;

        ReducerTest::new(MockLoginReducer::new())
            .with_env(mock_environment())
            .given_state(state)
            .when_action(AuthAction::LoginStartFailed {
                error: AuthError::UserNotFound,
            })
            .then_state(|state| {
                assert_eq!(state.step, FlowState::LoginEmail);
                assert_eq!(state.last_error, Some(AuthError::UserNotFound));
                assert!(!state.in_flight);
            })
            .then_effects(assert_no_effects)
            .run();
    }

    #[test]
    fn unverified_signup_reroutes_to_its_verification_step() {
        let mut state = form_state();
        state.in_flight = true;

        ReducerTest::new(MockLoginReducer::new())
            .with_env(mock_environment())
            .given_state(state)
            .when_action(AuthAction::LoginStartFailed {
                error: AuthError::VerificationRequired {
                    email: "ada@divvy.test".to_string(),
                },
            })
            .then_state(|state| {
                assert_eq!(
                    state.step,
                    FlowState::Otp {
                        flow: FlowFamily::Signup
                    }
                );
                assert_eq!(state.flow.email, Some("ada@divvy.test".to_string()));
                assert_eq!(state.last_error, None);
                let otp = state.otp.as_ref().unwrap();
                assert_eq!(otp.expiry_seconds, 300);
            })
            .then_effects(|effects| {
                assert_has_cancellable_effect(effects, &crate::reducers::otp::OTP_TICKER);
            })
            .run();
    }

    #[test]
    fn reroute_falls_back_to_the_typed_email() {
        let mut state = form_state();
        state.flow.email = Some("typed@divvy.test".to_string());
        state.in_flight = true;

        ReducerTest::new(MockLoginReducer::new())
            .with_env(mock_environment())
            .given_state(state)
            .when_action(AuthAction::LoginStartFailed {
                error: AuthError::VerificationRequired {
                    email: String::new(),
                },
            })
            .then_state(|state| {
                assert_eq!(
                    state.step,
                    FlowState::Otp {
                        flow: FlowFamily::Signup
                    }
                );
                assert_eq!(state.flow.email, Some("typed@divvy.test".to_string()));
            })
            .run();
    }

    #[test]
    fn reroute_without_any_email_surfaces_the_error() {
        let mut state = form_state();
        state.in_flight = true;

        ReducerTest::new(MockLoginReducer::new())
            .with_env(mock_environment())
            .given_state(state)
            .when_action(AuthAction::LoginStartFailed {
                error: AuthError::VerificationRequired {
                    email: String::new(),
                },
            })
            .then_state(|state| {
                assert_eq!(state.step, FlowState::LoginEmail);
                assert!(matches!(
                    state.last_error,
                    Some(AuthError::VerificationRequired { .. })
                ));
            })
            .then_effects(assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn finish_completes_login() {
        let env = mock_environment();
        let reducer = MockLoginReducer::new();
        let mut state = ceremony_state(&env);

        let effects = reducer.reduce(&mut state, AuthAction::LoginFinish, &env);
        assert!(state.in_flight);

        let produced = run_futures(effects).await;
        assert!(matches!(
            produced.as_slice(),
            [AuthAction::AuthCompleted {
                flow: FlowFamily::Login,
                ..
            }]
        ));
        assert_eq!(env.credentials.assertion_requests().len(), 1);
        assert_eq!(env.api.calls(), vec![RecordedCall::LoginFinish]);
    }

    #[test]
    fn finish_on_an_unsupported_platform_flags_and_stops() {
        let env = mock_environment_without_passkeys();
        let state = ceremony_state(&env);

        ReducerTest::new(MockLoginReducer::new())
            .with_env(env)
            .given_state(state)
            .when_action(AuthAction::LoginFinish)
            .then_state(|state| {
                assert!(state.passkeys_unsupported);
                assert!(!state.in_flight);
            })
            .then_effects(assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn backend_rejection_after_the_ceremony_surfaces() {
        let env = mock_environment();
        env.api
            .fail_next(Endpoint::LoginFinish, AuthError::InvalidCredentials);
        let reducer = MockLoginReducer::new();
        let mut state = ceremony_state(&env);

        let effects = reducer.reduce(&mut state, AuthAction::LoginFinish, &env);
        let produced = run_futures(effects).await;

        assert_eq!(
            produced,
            vec![AuthAction::PasskeyStepFailed {
                error: AuthError::InvalidCredentials,
            }]
        );
    }
}

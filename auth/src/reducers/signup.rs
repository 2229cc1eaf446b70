//! Signup flow reducer.
//!
//! Three backend exchanges take a visitor to a signed-in account:
//!
//! 1. `signup_start` sends email and name, the backend mails a code.
//! 2. `signup_verify` submits the code; on success the challenge for the
//!    credential ceremony is fetched in the same effect, so the user never
//!    sees a verified-but-challengeless state.
//! 3. `signup_passkey_finish` runs the creation ceremony and trades its
//!    response for a session.
//!
//! Step transitions happen in the event handlers, driven by what effects
//! feed back, never directly in the command handlers. Commands only
//! validate, flip `in_flight`, and schedule the exchange.

use crate::actions::AuthAction;
use crate::config::OtpConfig;
use crate::environment::AuthEnvironment;
use crate::passkeys;
use crate::providers::{AuthApi, CredentialApi, RecaptchaClient, TokenStorage};
use crate::reducers::otp::enter_otp_step;
use crate::state::{AuthState, FlowFamily, FlowState, PendingChallenge, Session};
use divvy_core::effect::Effect;
use divvy_core::reducer::Reducer;
use divvy_core::{SmallVec, smallvec};

/// Reducer for the signup flow.
#[derive(Debug, Clone)]
pub struct SignupReducer<A, C, R, S> {
    /// Timings handed to the verification step on entry.
    otp: OtpConfig,
    /// Phantom data to hold type parameters.
    _phantom: std::marker::PhantomData<(A, C, R, S)>,
}

impl<A, C, R, S> SignupReducer<A, C, R, S> {
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

impl<A, C, R, S> Default for SignupReducer<A, C, R, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, C, R, S> Reducer for SignupReducer<A, C, R, S>
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
            // SignupStart: Submit the form, backend mails a code
            // ═══════════════════════════════════════════════════════════════
            AuthAction::SignupStart { email, name } => {
                if state.step != FlowState::SignupEmail {
                    tracing::warn!(step = ?state.step, "SignupStart outside the signup form");
                    return smallvec![Effect::None];
                }
                if state.in_flight {
                    tracing::warn!("SignupStart while a request is in flight");
                    return smallvec![Effect::None];
                }

                let email = email.trim().to_string();
                let name = name.trim().to_string();
                state.in_flight = true;
                state.last_error = None;

                let api = env.api.clone();
                smallvec![Effect::Future(Box::pin(async move {
                    Some(match api.signup_start(&email, &name).await {
                        Ok(()) => AuthAction::SignupStarted { email, name },
                        Err(error) => AuthAction::SignupStartFailed { error },
                    })
                }))]
            },

            // ═══════════════════════════════════════════════════════════════
            // SignupStarted: Code is on its way; open the verification step
            // ═══════════════════════════════════════════════════════════════
            AuthAction::SignupStarted { email, name } => {
                state.flow.email = Some(email);
                state.flow.name = Some(name);
                smallvec![enter_otp_step(state, FlowFamily::Signup, &self.otp)]
            },

            AuthAction::SignupStartFailed { error } => {
                state.in_flight = false;
                state.last_error = Some(error);
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════
            // SignupVerify: Submit the code, then fetch the ceremony challenge
            // ═══════════════════════════════════════════════════════════════
            AuthAction::SignupVerify { code } => {
                if !matches!(
                    state.step,
                    FlowState::Otp {
                        flow: FlowFamily::Signup
                    }
                ) {
                    tracing::warn!(step = ?state.step, "SignupVerify outside its verification step");
                    return smallvec![Effect::None];
                }
                if state.in_flight {
                    tracing::warn!("SignupVerify while a request is in flight");
                    return smallvec![Effect::None];
                }
                let Some(ref otp) = state.otp else {
                    return smallvec![Effect::None];
                };
                if otp.expired() {
                    tracing::warn!("SignupVerify with an expired code; resend required");
                    return smallvec![Effect::None];
                }
                let Some(email) = state.flow.email.clone() else {
                    tracing::warn!("SignupVerify with no email on the flow");
                    return smallvec![Effect::None];
                };

                state.in_flight = true;
                state.last_error = None;

                let api = env.api.clone();
                smallvec![Effect::Future(Box::pin(async move {
                    if let Err(error) = api.signup_verify(&email, &code).await {
                        return Some(AuthAction::OtpVerifyFailed {
                            flow: FlowFamily::Signup,
                            error,
                        });
                    }
                    Some(match api.signup_passkey_start().await {
                        Ok(challenge) => AuthAction::OtpVerified {
                            flow: FlowFamily::Signup,
                            challenge,
                        },
                        Err(error) => AuthAction::OtpVerifyFailed {
                            flow: FlowFamily::Signup,
                            error,
                        },
                    })
                }))]
            },

            // ═══════════════════════════════════════════════════════════════
            // SignupPasskeyFinish: Run the ceremony, trade it for a session
            // ═══════════════════════════════════════════════════════════════
            AuthAction::SignupPasskeyFinish => {
                if !matches!(
                    state.step,
                    FlowState::Passkey {
                        flow: FlowFamily::Signup
                    }
                ) {
                    tracing::warn!(step = ?state.step, "SignupPasskeyFinish outside its ceremony step");
                    return smallvec![Effect::None];
                }
                if state.in_flight {
                    tracing::warn!("SignupPasskeyFinish while a request is in flight");
                    return smallvec![Effect::None];
                }
                if !env.credentials.is_supported() {
                    state.passkeys_unsupported = true;
                    tracing::warn!("Platform has no credential API; signup cannot finish here");
                    return smallvec![Effect::None];
                }
                let Some(PendingChallenge::Registration(challenge)) =
                    state.flow.pending_challenge.clone()
                else {
                    tracing::warn!("SignupPasskeyFinish with no registration challenge pending");
                    return smallvec![Effect::None];
                };

                // Decode before going async so a malformed challenge
                // surfaces immediately and leaves the step retryable.
                let options = match passkeys::prepare_registration(&challenge) {
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
                        match passkeys::perform_registration(&credentials, options).await {
                            Ok(response) => response,
                            Err(error) => {
                                return Some(AuthAction::PasskeyStepFailed { error });
                            },
                        };
                    Some(match api.signup_passkey_finish(&response).await {
                        Ok(payload) => AuthAction::AuthCompleted {
                            flow: FlowFamily::Signup,
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
    use crate::error::AuthError;
    use crate::mocks::{
        Endpoint, MockSignupReducer, RecordedCall, mock_environment,
        mock_environment_without_passkeys,
    };
    use crate::otp::OtpState;
    use crate::passkeys::RegistrationChallenge;
    use crate::providers::PlatformError;
    use crate::state::FlowData;
    use divvy_testing::ReducerTest;
    use divvy_testing::assertions::{
        assert_has_cancellable_effect, assert_has_future_effect, assert_no_effects,
    };

    fn form_state() -> AuthState {
        AuthState {
            step: FlowState::SignupEmail,
            ..AuthState::default()
        }
    }

    fn verification_state() -> AuthState {
        AuthState {
            step: FlowState::Otp {
                flow: FlowFamily::Signup,
            },
            flow: FlowData {
                email: Some("ada@divvy.test".to_string()),
                name: Some("Ada".to_string()),
                ..FlowData::default()
            },
            otp: Some(OtpState::start(&OtpConfig::default())),
            ..AuthState::default()
        }
    }

    fn ceremony_state(env: &crate::mocks::MockEnvironment) -> AuthState {
        AuthState {
            step: FlowState::Passkey {
                flow: FlowFamily::Signup,
            },
            flow: FlowData {
                email: Some("ada@divvy.test".to_string()),
                name: Some("Ada".to_string()),
                pending_challenge: Some(PendingChallenge::Registration(
                    env.api.registration_challenge(),
                )),
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
        ReducerTest::new(MockSignupReducer::new())
            .with_env(mock_environment())
            .given_state(form_state())
            .when_action(AuthAction::SignupStart {
                email: "  ada@divvy.test  ".to_string(),
                name: "Ada".to_string(),
            })
            .then_state(|state| {
                assert!(state.in_flight);
                assert_eq!(state.last_error, None);
            })
            .then_effects(assert_has_future_effect)
            .run();
    }

    #[test]
    fn start_outside_the_form_is_rejected() {
        ReducerTest::new(MockSignupReducer::new())
            .with_env(mock_environment())
            .given_state(AuthState::default())
            .when_action(AuthAction::SignupStart {
                email: "ada@divvy.test".to_string(),
                name: "Ada".to_string(),
            })
            .then_state(|state| {
                assert!(!state.in_flight);
            })
            .then_effects(assert_no_effects)
            .run();
    }

    #[test]
    fn start_while_in_flight_is_rejected() {
        let mut state = form_state();
        state.in_flight = true;

        ReducerTest::new(MockSignupReducer::new())
            .with_env(mock_environment())
            .given_state(state)
            .when_action(AuthAction::SignupStart {
                email: "ada@divvy.test".to_string(),
                name: "Ada".to_string(),
            })
            .then_effects(assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn start_trims_the_form_before_sending() {
        let env = mock_environment();
        let reducer = MockSignupReducer::new();
        let mut state = form_state();

        let effects = reducer.reduce(
            &mut state,
            AuthAction::SignupStart {
                email: " ada@divvy.test ".to_string(),
                name: " Ada ".to_string(),
            },
            &env,
        );
        let produced = run_futures(effects).await;

        assert_eq!(
            env.api.calls(),
            vec![RecordedCall::SignupStart {
                email: "ada@divvy.test".to_string(),
                name: "Ada".to_string(),
            }]
        );
        assert_eq!(
            produced,
            vec![AuthAction::SignupStarted {
                email: "ada@divvy.test".to_string(),
                name: "Ada".to_string(),
            }]
        );
    }

    #[test]
    fn started_opens_the_verification_step() {
        let mut state = form_state();
        state.in_flight = true;

        ReducerTest::new(MockSignupReducer::new())
            .with_env(mock_environment())
            .given_state(state)
            .when_action(AuthAction::SignupStarted {
                email: "ada@divvy.test".to_string(),
                name: "Ada".to_string(),
            })
            .then_state(|state| {
                assert_eq!(
                    state.step,
                    FlowState::Otp {
                        flow: FlowFamily::Signup
                    }
                );
                assert_eq!(state.flow.email, Some("ada@divvy.test".to_string()));
                assert_eq!(state.flow.name, Some("Ada".to_string()));
                let otp = state.otp.as_ref().unwrap();
                assert_eq!(otp.expiry_seconds, 300);
                assert!(otp.can_resend());
                assert!(!state.in_flight);
            })
            .then_effects(|effects| {
                assert_has_cancellable_effect(effects, &crate::reducers::otp::OTP_TICKER);
            })
            .run();
    }

    #[test]
    fn start_failure_surfaces_and_stays_on_the_form() {
        let mut state = form_state();
        state.in_flight = true;

        ReducerTest::new(MockSignupReducer::new())
            .with_env(mock_environment())
            .given_state(state)
            .when_action(AuthAction::SignupStartFailed {
                error: AuthError::Network {
                    message: "Connection refused".to_string(),
                },
            })
            .then_state(|state| {
                assert_eq!(state.step, FlowState::SignupEmail);
                assert!(!state.in_flight);
                assert!(matches!(
                    state.last_error,
                    Some(AuthError::Network { .. })
                ));
            })
            .then_effects(assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn verify_chains_code_check_and_challenge_fetch() {
        let env = mock_environment();
        let reducer = MockSignupReducer::new();
        let mut state = verification_state();

        let effects = reducer.reduce(
            &mut state,
            AuthAction::SignupVerify {
                code: "123456".to_string(),
            },
            &env,
        );
        assert!(state.in_flight);

        let produced = run_futures(effects).await;
        assert_eq!(
            env.api.calls(),
            vec![
                RecordedCall::SignupVerify {
                    email: "ada@divvy.test".to_string(),
                    code: "123456".to_string(),
                },
                RecordedCall::SignupPasskeyStart,
            ]
        );
        assert!(matches!(
            produced.as_slice(),
            [AuthAction::OtpVerified {
                flow: FlowFamily::Signup,
                ..
            }]
        ));
    }

    #[tokio::test]
    async fn verify_rejection_skips_the_challenge_fetch() {
        let env = mock_environment();
        env.api
            .fail_next(Endpoint::SignupVerify, AuthError::InvalidCredentials);
        let reducer = MockSignupReducer::new();
        let mut state = verification_state();

        let effects = reducer.reduce(
            &mut state,
            AuthAction::SignupVerify {
                code: "000000".to_string(),
            },
            &env,
        );
        let produced = run_futures(effects).await;

        assert_eq!(
            produced,
            vec![AuthAction::OtpVerifyFailed {
                flow: FlowFamily::Signup,
                error: AuthError::InvalidCredentials,
            }]
        );
        // Only the verify call went out
        assert_eq!(env.api.calls().len(), 1);
    }

    #[test]
    fn verify_with_an_expired_code_is_ignored() {
        let mut state = verification_state();
        state.otp.as_mut().unwrap().expiry_seconds = 0;

        ReducerTest::new(MockSignupReducer::new())
            .with_env(mock_environment())
            .given_state(state)
            .when_action(AuthAction::SignupVerify {
                code: "123456".to_string(),
            })
            .then_state(|state| {
                assert!(!state.in_flight);
            })
            .then_effects(assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn passkey_finish_completes_signup() {
        let env = mock_environment();
        let reducer = MockSignupReducer::new();
        let mut state = ceremony_state(&env);

        let effects = reducer.reduce(&mut state, AuthAction::SignupPasskeyFinish, &env);
        assert!(state.in_flight);

        let produced = run_futures(effects).await;
        assert!(matches!(
            produced.as_slice(),
            [AuthAction::AuthCompleted {
                flow: FlowFamily::Signup,
                ..
            }]
        ));
        // The ceremony ran exactly once
        assert_eq!(env.credentials.creation_requests().len(), 1);
    }

    #[test]
    fn passkey_finish_on_an_unsupported_platform_flags_and_stops() {
        let env = mock_environment_without_passkeys();
        let state = ceremony_state(&env);

        ReducerTest::new(MockSignupReducer::new())
            .with_env(env)
            .given_state(state)
            .when_action(AuthAction::SignupPasskeyFinish)
            .then_state(|state| {
                assert!(state.passkeys_unsupported);
                assert!(!state.in_flight);
                assert_eq!(state.last_error, None);
            })
            .then_effects(assert_no_effects)
            .run();
    }

    #[tokio::test]
    #[allow(clippy::panic)] // Test assertion
    async fn cancelled_ceremony_surfaces_as_retryable() {
        let env = mock_environment();
        env.credentials.fail_create(PlatformError::NotAllowed {
            message: "The operation was aborted by the user".to_string(),
        });
        let reducer = MockSignupReducer::new();
        let mut state = ceremony_state(&env);

        let effects = reducer.reduce(&mut state, AuthAction::SignupPasskeyFinish, &env);
        let produced = run_futures(effects).await;

        let [AuthAction::PasskeyStepFailed { error }] = produced.as_slice() else {
            panic!("expected PasskeyStepFailed, got {produced:?}");
        };
        assert_eq!(*error, AuthError::CeremonyCancelled);
        assert!(error.retryable_in_place());
        // The challenge is still pending, so the user can try again
        assert!(state.flow.pending_challenge.is_some());
    }

    #[test]
    fn malformed_challenge_fails_before_going_async() {
        let env = mock_environment();
        let mut state = ceremony_state(&env);
        state.flow.pending_challenge = Some(PendingChallenge::Registration(
            RegistrationChallenge::default(),
        ));

        ReducerTest::new(MockSignupReducer::new())
            .with_env(env)
            .given_state(state)
            .when_action(AuthAction::SignupPasskeyFinish)
            .then_state(|state| {
                assert!(!state.in_flight);
                assert!(matches!(
                    state.last_error,
                    Some(AuthError::MalformedChallenge { .. })
                ));
            })
            .then_effects(assert_no_effects)
            .run();
    }
}

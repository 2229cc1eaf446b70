//! Recovery flow reducer.
//!
//! Recovery re-proves ownership of an email whose account lost all of its
//! passkeys, so it is the one flow gated by bot detection. The first
//! attempt carries an invisible assessment token; when the backend rejects
//! the score it answers with an escalation code, the interactive widget
//! appears, and every further attempt must spend a widget token. Widget
//! tokens are single-use: consumed on submission, and the widget is reset
//! afterwards so a failed attempt can be solved again.
//!
//! Past the bot gate, recovery is signup's verification and ceremony steps
//! with recovery routes: verify the code, fetch a registration challenge,
//! create a replacement credential, receive a session.

use crate::actions::AuthAction;
use crate::config::{OtpConfig, RecaptchaConfig};
use crate::environment::AuthEnvironment;
use crate::error::AuthError;
use crate::passkeys;
use crate::providers::{AuthApi, CredentialApi, RecaptchaClient, TokenStorage};
use crate::recaptcha::RecaptchaToken;
use crate::reducers::otp::enter_otp_step;
use crate::state::{AuthState, FlowFamily, FlowState, PendingChallenge, Session};
use divvy_core::effect::Effect;
use divvy_core::reducer::Reducer;
use divvy_core::{SmallVec, smallvec};

/// Reducer for the recovery flow.
#[derive(Debug, Clone)]
pub struct RecoveryReducer<A, C, R, S> {
    /// Timings handed to the verification step on entry.
    otp: OtpConfig,
    /// Bot-detection parameters.
    recaptcha: RecaptchaConfig,
    /// Phantom data to hold type parameters.
    _phantom: std::marker::PhantomData<(A, C, R, S)>,
}

impl<A, C, R, S> RecoveryReducer<A, C, R, S> {
    /// Create a reducer with production parameters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            otp: OtpConfig::default(),
            recaptcha: RecaptchaConfig::default(),
            _phantom: std::marker::PhantomData,
        }
    }

    /// Create a reducer with custom parameters.
    #[must_use]
    pub fn with_config(otp: OtpConfig, recaptcha: RecaptchaConfig) -> Self {
        Self {
            otp,
            recaptcha,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<A, C, R, S> Default for RecoveryReducer<A, C, R, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, C, R, S> Reducer for RecoveryReducer<A, C, R, S>
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
            // RecoveryStart: Submit the email through the bot gate
            // ═══════════════════════════════════════════════════════════════
            AuthAction::RecoveryStart { email } => {
                if state.step != FlowState::RecoveryEmail {
                    tracing::warn!(step = ?state.step, "RecoveryStart outside the recovery form");
                    return smallvec![Effect::None];
                }
                if state.in_flight {
                    tracing::warn!("RecoveryStart while a request is in flight");
                    return smallvec![Effect::None];
                }

                let email = email.trim().to_string();
                state.flow.email = Some(email.clone());

                if state.recaptcha.required {
                    // Escalated: only a spent widget token gets through.
                    let Some(token) = state.recaptcha.take_escalated() else {
                        tracing::warn!("RecoveryStart blocked; widget not solved yet");
                        state.last_error = Some(AuthError::RecaptchaRequired);
                        return smallvec![Effect::None];
                    };

                    state.in_flight = true;
                    state.last_error = None;

                    let api = env.api.clone();
                    let recaptcha = env.recaptcha.clone();
                    return smallvec![Effect::Future(Box::pin(async move {
                        let result = api.recovery_start(&email, Some(&token)).await;
                        // The token is spent either way; reset the widget so
                        // a rejected attempt can be solved afresh.
                        recaptcha.reset().await;
                        Some(match result {
                            Ok(()) => AuthAction::RecoveryStarted { email },
                            Err(error) => AuthAction::RecoveryStartFailed { error },
                        })
                    }))];
                }

                // Default path: invisible assessment, no user interaction.
                state.in_flight = true;
                state.last_error = None;

                let api = env.api.clone();
                let recaptcha = env.recaptcha.clone();
                let action_label = self.recaptcha.recovery_action.clone();
                smallvec![Effect::Future(Box::pin(async move {
                    let token = match recaptcha.execute(&action_label).await {
                        Ok(Some(token)) => Some(RecaptchaToken::v3(token)),
                        Ok(None) => None,
                        Err(error) => {
                            // Assessment trouble is the backend's call to
                            // make; send the request bare and let it judge.
                            tracing::warn!(%error, "Invisible assessment failed");
                            None
                        },
                    };
                    Some(match api.recovery_start(&email, token.as_ref()).await {
                        Ok(()) => AuthAction::RecoveryStarted { email },
                        Err(error) => AuthAction::RecoveryStartFailed { error },
                    })
                }))]
            },

            // ═══════════════════════════════════════════════════════════════
            // RecoveryStarted: Code is on its way; open the verification step
            // ═══════════════════════════════════════════════════════════════
            AuthAction::RecoveryStarted { email } => {
                state.flow.email = Some(email);
                state.recaptcha.reset();
                smallvec![enter_otp_step(state, FlowFamily::Recovery, &self.otp)]
            },

            // ═══════════════════════════════════════════════════════════════
            // RecoveryStartFailed: Escalate the bot gate, or surface
            // ═══════════════════════════════════════════════════════════════
            AuthAction::RecoveryStartFailed { error } => {
                state.in_flight = false;

                if error.is_escalation() {
                    tracing::info!("Backend demanded the interactive widget");
                    state.recaptcha.escalate();
                    return smallvec![Effect::None];
                }

                state.last_error = Some(error);
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════
            // RecoveryVerify: Submit the code, then fetch the ceremony challenge
            // ═══════════════════════════════════════════════════════════════
            AuthAction::RecoveryVerify { code } => {
                if !matches!(
                    state.step,
                    FlowState::Otp {
                        flow: FlowFamily::Recovery
                    }
                ) {
                    tracing::warn!(step = ?state.step, "RecoveryVerify outside its verification step");
                    return smallvec![Effect::None];
                }
                if state.in_flight {
                    tracing::warn!("RecoveryVerify while a request is in flight");
                    return smallvec![Effect::None];
                }
                let Some(ref otp) = state.otp else {
                    return smallvec![Effect::None];
                };
                if otp.expired() {
                    tracing::warn!("RecoveryVerify with an expired code; resend required");
                    return smallvec![Effect::None];
                }
                let Some(email) = state.flow.email.clone() else {
                    tracing::warn!("RecoveryVerify with no email on the flow");
                    return smallvec![Effect::None];
                };

                state.in_flight = true;
                state.last_error = None;

                let api = env.api.clone();
                smallvec![Effect::Future(Box::pin(async move {
                    if let Err(error) = api.recovery_verify(&email, &code).await {
                        return Some(AuthAction::OtpVerifyFailed {
                            flow: FlowFamily::Recovery,
                            error,
                        });
                    }
                    Some(match api.recovery_passkey_start().await {
                        Ok(challenge) => AuthAction::OtpVerified {
                            flow: FlowFamily::Recovery,
                            challenge,
                        },
                        Err(error) => AuthAction::OtpVerifyFailed {
                            flow: FlowFamily::Recovery,
                            error,
                        },
                    })
                }))]
            },

            // ═══════════════════════════════════════════════════════════════
            // RecoveryPasskeyFinish: Create the replacement credential
            // ═══════════════════════════════════════════════════════════════
            AuthAction::RecoveryPasskeyFinish => {
                if !matches!(
                    state.step,
                    FlowState::Passkey {
                        flow: FlowFamily::Recovery
                    }
                ) {
                    tracing::warn!(step = ?state.step, "RecoveryPasskeyFinish outside its ceremony step");
                    return smallvec![Effect::None];
                }
                if state.in_flight {
                    tracing::warn!("RecoveryPasskeyFinish while a request is in flight");
                    return smallvec![Effect::None];
                }
                if !env.credentials.is_supported() {
                    state.passkeys_unsupported = true;
                    tracing::warn!("Platform has no credential API; recovery cannot finish here");
                    return smallvec![Effect::None];
                }
                let Some(PendingChallenge::Registration(challenge)) =
                    state.flow.pending_challenge.clone()
                else {
                    tracing::warn!("RecoveryPasskeyFinish with no registration challenge pending");
                    return smallvec![Effect::None];
                };

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
                    Some(match api.recovery_passkey_finish(&response).await {
                        Ok(payload) => AuthAction::AuthCompleted {
                            flow: FlowFamily::Recovery,
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

//! Verification-step reducer: countdowns, input, resend, auto-submit.
//!
//! The one-time-passcode step is timer-heavy. This reducer owns the two
//! cancellable timers that drive it:
//!
//! - [`OTP_TICKER`]: a one-second delay that re-arms itself after every
//!   [`AuthAction::OtpTick`] until both countdowns reach zero.
//! - [`OTP_DEBOUNCE`]: the quiet period between the final typed digit and
//!   automatic submission. Every keystroke re-registers it, so only the
//!   last complete code survives the debounce.
//!
//! Both are registered under fixed [`EffectId`]s, which means re-arming
//! replaces the running timer instead of stacking a second one. Exits from
//! the verification step cancel both ids; the success and failure handlers
//! here do it themselves, and the flow reducer does the same on reset.
//!
//! Verification submission itself lives in the signup and recovery
//! reducers. Auto-submit only translates an elapsed quiet period into the
//! same action a manual submit would have sent.

use crate::actions::AuthAction;
use crate::config::OtpConfig;
use crate::environment::AuthEnvironment;
use crate::error::AuthError;
use crate::otp::{self, OtpState};
use crate::providers::{AuthApi, CredentialApi, RecaptchaClient, TokenStorage};
use crate::state::{AuthState, FlowFamily, FlowNotice, FlowState, PendingChallenge};
use divvy_core::effect::{Effect, EffectId};
use divvy_core::reducer::Reducer;
use divvy_core::{SmallVec, smallvec};
use std::time::Duration;

/// Cancellation key for the one-second countdown timer.
pub const OTP_TICKER: EffectId = EffectId::from_static("otp-ticker");

/// Cancellation key for the auto-submit quiet period.
pub const OTP_DEBOUNCE: EffectId = EffectId::from_static("otp-auto-submit");

/// Schedule the next [`AuthAction::OtpTick`] one second out.
///
/// Registered under [`OTP_TICKER`], so an already running tick timer is
/// replaced rather than doubled.
pub(crate) fn arm_ticker() -> Effect<AuthAction> {
    Effect::cancellable(
        OTP_TICKER,
        Effect::delay(Duration::from_secs(1), AuthAction::OtpTick),
    )
}

/// Move `state` onto the verification step for `flow` and start its clocks.
///
/// Entering the step is what sent the first code, so the expiry countdown
/// starts full and the resend control starts unlocked. Returns the ticker
/// effect the caller must include in its effect list.
pub(crate) fn enter_otp_step(
    state: &mut AuthState,
    flow: FlowFamily,
    config: &OtpConfig,
) -> Effect<AuthAction> {
    state.step = FlowState::Otp { flow };
    state.otp = Some(OtpState::start(config));
    state.in_flight = false;
    state.last_error = None;
    arm_ticker()
}

/// Reducer for the shared verification step.
#[derive(Debug, Clone)]
pub struct OtpReducer<A, C, R, S> {
    /// Timing parameters for codes, cooldowns, and the debounce.
    config: OtpConfig,
    /// Phantom data to hold type parameters.
    _phantom: std::marker::PhantomData<(A, C, R, S)>,
}

impl<A, C, R, S> OtpReducer<A, C, R, S> {
    /// Create a reducer with production timings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: OtpConfig::default(),
            _phantom: std::marker::PhantomData,
        }
    }

    /// Create a reducer with custom timings.
    #[must_use]
    pub fn with_config(config: OtpConfig) -> Self {
        Self {
            config,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<A, C, R, S> Default for OtpReducer<A, C, R, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, C, R, S> Reducer for OtpReducer<A, C, R, S>
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
            // OtpInputChanged: Normalize and maybe arm auto-submit
            // ═══════════════════════════════════════════════════════════════
            AuthAction::OtpInputChanged { raw } => {
                if !matches!(state.step, FlowState::Otp { .. }) {
                    return smallvec![Effect::None];
                }
                let Some(ref mut otp) = state.otp else {
                    return smallvec![Effect::None];
                };

                otp.input = otp::normalize_input(&raw);

                // A complete code on a live countdown starts the quiet
                // period; anything else disarms whatever was pending.
                if otp::is_complete(&otp.input) && !otp.expired() {
                    let code = otp.input.clone();
                    smallvec![Effect::cancellable(
                        OTP_DEBOUNCE,
                        Effect::delay(
                            self.config.auto_submit_debounce,
                            AuthAction::OtpAutoSubmit { code },
                        ),
                    )]
                } else {
                    smallvec![Effect::Cancel(OTP_DEBOUNCE)]
                }
            },

            // ═══════════════════════════════════════════════════════════════
            // OtpTick: Advance countdowns, re-arm while anything still runs
            // ═══════════════════════════════════════════════════════════════
            AuthAction::OtpTick => {
                let Some(ref mut otp) = state.otp else {
                    // Tick raced a step exit; nothing to count down.
                    return smallvec![Effect::None];
                };

                otp.tick();

                if otp.expiry_seconds > 0 || otp.resend_cooldown_seconds > 0 {
                    smallvec![arm_ticker()]
                } else {
                    smallvec![Effect::None]
                }
            },

            // ═══════════════════════════════════════════════════════════════
            // OtpResendRequested: Restart clocks, then ask the backend
            // ═══════════════════════════════════════════════════════════════
            AuthAction::OtpResendRequested => {
                if !matches!(state.step, FlowState::Otp { .. }) {
                    tracing::warn!("Resend requested outside the verification step");
                    return smallvec![Effect::None];
                }
                let Some(ref mut otp) = state.otp else {
                    return smallvec![Effect::None];
                };
                if !otp.can_resend() {
                    tracing::warn!(
                        remaining = otp.resend_cooldown_seconds,
                        "Resend requested while the cooldown is locked"
                    );
                    return smallvec![Effect::None];
                }
                let Some(email) = state.flow.email.clone() else {
                    tracing::warn!("Resend requested with no email on the flow");
                    return smallvec![Effect::None];
                };

                // Optimistic: the clocks restart before the backend answers,
                // and a failure surfaces as a notice instead of rolling back.
                otp.mark_resent(&self.config);

                let api = env.api.clone();
                smallvec![
                    arm_ticker(),
                    Effect::Future(Box::pin(async move {
                        match api.resend_otp(&email).await {
                            Ok(()) => None,
                            Err(error) => Some(AuthAction::OtpResendFailed { error }),
                        }
                    })),
                ]
            },

            // ═══════════════════════════════════════════════════════════════
            // OtpAutoSubmit: Quiet period elapsed; submit if still current
            // ═══════════════════════════════════════════════════════════════
            AuthAction::OtpAutoSubmit { code } => {
                let FlowState::Otp { flow } = state.step else {
                    return smallvec![Effect::None];
                };
                if state.in_flight {
                    return smallvec![Effect::None];
                }
                let Some(ref otp) = state.otp else {
                    return smallvec![Effect::None];
                };
                // The field may have changed, or the code died, while the
                // quiet period ran. Only a still-current code submits.
                if otp.expired() || otp.input != code {
                    return smallvec![Effect::None];
                }

                smallvec![Effect::Future(Box::pin(async move {
                    Some(match flow {
                        FlowFamily::Recovery => AuthAction::RecoveryVerify { code },
                        FlowFamily::Signup | FlowFamily::Login => {
                            AuthAction::SignupVerify { code }
                        },
                    })
                }))]
            },

            // ═══════════════════════════════════════════════════════════════
            // OtpVerified: Code accepted; move to the ceremony step
            // ═══════════════════════════════════════════════════════════════
            AuthAction::OtpVerified { flow, challenge } => {
                state.step = FlowState::Passkey { flow };
                state.flow.pending_challenge =
                    Some(PendingChallenge::Registration(challenge));
                state.otp = None;
                state.in_flight = false;
                state.last_error = None;

                smallvec![Effect::Cancel(OTP_TICKER), Effect::Cancel(OTP_DEBOUNCE)]
            },

            // ═══════════════════════════════════════════════════════════════
            // OtpVerifyFailed: Code rejected; stay put or bail to signup
            // ═══════════════════════════════════════════════════════════════
            AuthAction::OtpVerifyFailed { flow, error } => {
                state.in_flight = false;

                if matches!(error, AuthError::UserNotFound) {
                    // The account is gone, so no code can ever verify.
                    // Signup is the only step that still makes sense; the
                    // typed email and name carry over into its form.
                    tracing::warn!(
                        flow = flow.as_str(),
                        "Account vanished mid-verification; redirecting to signup"
                    );
                    state.step = FlowState::SignupEmail;
                    state.otp = None;
                    state.flow.pending_challenge = None;
                    state.last_error = Some(error);
                    return smallvec![
                        Effect::Cancel(OTP_TICKER),
                        Effect::Cancel(OTP_DEBOUNCE)
                    ];
                }

                // Wrong or expired code: the step and its clocks carry on,
                // the user can retype or resend.
                state.last_error = Some(error);
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════
            // OtpResendFailed: Surface as a notice, keep the countdown
            // ═══════════════════════════════════════════════════════════════
            AuthAction::OtpResendFailed { error } => {
                tracing::warn!(%error, "Resend failed; restarted countdown stands");
                state.notice = Some(FlowNotice {
                    message: format!("Could not send a new code: {error}"),
                    at: env.clock.now(),
                });
                smallvec![Effect::None]
            },

            // Everything else belongs to another reducer
            _ => smallvec![Effect::None],
        }
    }
}

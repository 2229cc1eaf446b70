//! End-to-end recovery through the store, with the bot-detection
//! escalation journey: invisible assessment first, widget only after
//! the backend rejects the score.

#![allow(clippy::unwrap_used)] // Test assertions
#![allow(clippy::panic)] // Test assertions

use divvy_auth::actions::AuthAction;
use divvy_auth::config::AuthConfig;
use divvy_auth::error::AuthError;
use divvy_auth::mocks::{Endpoint, MockEnvironment, RecordedCall, mock_environment};
use divvy_auth::recaptcha::RecaptchaToken;
use divvy_auth::reducers::auth_reducer;
use divvy_auth::state::{AuthState, FlowFamily, FlowState};
use divvy_core::composition::CombinedReducer;
use divvy_runtime::Store;
use std::time::Duration;

type AuthStore = Store<
    AuthState,
    AuthAction,
    MockEnvironment,
    CombinedReducer<AuthState, AuthAction, MockEnvironment>,
>;

const STEP_TIMEOUT: Duration = Duration::from_secs(5);

fn test_store(env: MockEnvironment) -> AuthStore {
    Store::new(
        AuthState::default(),
        auth_reducer(&AuthConfig::default()),
        env,
    )
}

async fn wait_for_state(
    store: &AuthStore,
    what: &str,
    predicate: impl Fn(&AuthState) -> bool,
) {
    for _ in 0..500 {
        if store.state(|state| predicate(state)).await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("gave up waiting until {what}");
}

fn submit_email() -> AuthAction {
    AuthAction::RecoveryStart {
        email: "ada@divvy.test".to_string(),
    }
}

fn started_or_failed(action: &AuthAction) -> bool {
    matches!(
        action,
        AuthAction::RecoveryStarted { .. } | AuthAction::RecoveryStartFailed { .. }
    )
}

fn recovery_starts(env: &MockEnvironment) -> Vec<RecordedCall> {
    env.api
        .calls()
        .into_iter()
        .filter(|call| matches!(call, RecordedCall::RecoveryStart { .. }))
        .collect()
}

#[tokio::test]
async fn recovery_attaches_an_invisible_assessment_and_completes() {
    let env = mock_environment();
    let store = test_store(env.clone());

    store.send(AuthAction::GoToRecovery).await.unwrap();
    let outcome = store
        .send_and_wait_for(submit_email(), started_or_failed, STEP_TIMEOUT)
        .await
        .unwrap();
    assert!(matches!(outcome, AuthAction::RecoveryStarted { .. }));

    wait_for_state(&store, "the verification step opens", |state| {
        matches!(
            state.step,
            FlowState::Otp {
                flow: FlowFamily::Recovery
            }
        )
    })
    .await;

    // The assessment ran behind the scenes and rode the request
    assert_eq!(
        env.recaptcha.executed_actions(),
        vec!["recovery_start".to_string()]
    );
    assert_eq!(
        recovery_starts(&env),
        vec![RecordedCall::RecoveryStart {
            email: "ada@divvy.test".to_string(),
            recaptcha: Some(RecaptchaToken::v3("mock-v3-token")),
        }]
    );

    let outcome = store
        .send_and_wait_for(
            AuthAction::RecoveryVerify {
                code: "123456".to_string(),
            },
            |action| {
                matches!(
                    action,
                    AuthAction::OtpVerified { .. } | AuthAction::OtpVerifyFailed { .. }
                )
            },
            STEP_TIMEOUT,
        )
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        AuthAction::OtpVerified {
            flow: FlowFamily::Recovery,
            ..
        }
    ));
    wait_for_state(&store, "the ceremony step opens", |state| {
        matches!(
            state.step,
            FlowState::Passkey {
                flow: FlowFamily::Recovery
            }
        )
    })
    .await;

    let outcome = store
        .send_and_wait_for(
            AuthAction::RecoveryPasskeyFinish,
            |action| {
                matches!(
                    action,
                    AuthAction::AuthCompleted { .. } | AuthAction::PasskeyStepFailed { .. }
                )
            },
            STEP_TIMEOUT,
        )
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        AuthAction::AuthCompleted {
            flow: FlowFamily::Recovery,
            ..
        }
    ));
    wait_for_state(&store, "the session is installed", AuthState::is_authenticated).await;

    assert_eq!(
        env.api.calls(),
        vec![
            RecordedCall::RecoveryStart {
                email: "ada@divvy.test".to_string(),
                recaptcha: Some(RecaptchaToken::v3("mock-v3-token")),
            },
            RecordedCall::RecoveryVerify {
                email: "ada@divvy.test".to_string(),
                code: "123456".to_string(),
            },
            RecordedCall::RecoveryPasskeyStart,
            RecordedCall::RecoveryPasskeyFinish,
        ]
    );
}

#[tokio::test]
async fn a_score_rejection_escalates_and_the_widget_token_unblocks() {
    let env = mock_environment();
    env.api
        .fail_next(Endpoint::RecoveryStart, AuthError::RecaptchaRequired);
    let store = test_store(env.clone());

    store.send(AuthAction::GoToRecovery).await.unwrap();
    let outcome = store
        .send_and_wait_for(submit_email(), started_or_failed, STEP_TIMEOUT)
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        AuthAction::RecoveryStartFailed {
            error: AuthError::RecaptchaRequired,
        }
    ));

    // The demand is a state the UI renders a widget for, not an error
    wait_for_state(&store, "the widget is demanded", |state| {
        state.recaptcha.required
            && state.last_error.is_none()
            && state.step == FlowState::RecoveryEmail
    })
    .await;

    // Retrying before the widget is solved is blocked locally
    store.send(submit_email()).await.unwrap().wait().await;
    assert!(
        store
            .state(|state| state.last_error == Some(AuthError::RecaptchaRequired))
            .await
    );
    assert_eq!(recovery_starts(&env).len(), 1);

    // Solving clears the block; the widget token rides the retry
    store
        .send(AuthAction::RecaptchaSolved {
            token: "widget-1".to_string(),
        })
        .await
        .unwrap();
    let outcome = store
        .send_and_wait_for(submit_email(), started_or_failed, STEP_TIMEOUT)
        .await
        .unwrap();
    assert!(matches!(outcome, AuthAction::RecoveryStarted { .. }));

    wait_for_state(&store, "verification opens and the gate clears", |state| {
        matches!(
            state.step,
            FlowState::Otp {
                flow: FlowFamily::Recovery
            }
        ) && !state.recaptcha.required
    })
    .await;

    let starts = recovery_starts(&env);
    assert_eq!(starts.len(), 2);
    assert_eq!(
        starts[1],
        RecordedCall::RecoveryStart {
            email: "ada@divvy.test".to_string(),
            recaptcha: Some(RecaptchaToken::v2("widget-1")),
        }
    );
    // The invisible assessment ran only for the first attempt
    assert_eq!(env.recaptcha.executed_actions().len(), 1);
}

#[tokio::test]
async fn an_expired_widget_keeps_the_demand_and_blocks_again() {
    let env = mock_environment();
    env.api
        .fail_next(Endpoint::RecoveryStart, AuthError::RecaptchaRequired);
    let store = test_store(env.clone());

    store.send(AuthAction::GoToRecovery).await.unwrap();
    store
        .send_and_wait_for(submit_email(), started_or_failed, STEP_TIMEOUT)
        .await
        .unwrap();
    wait_for_state(&store, "the widget is demanded", |state| {
        state.recaptcha.required
    })
    .await;

    store
        .send(AuthAction::RecaptchaSolved {
            token: "widget-1".to_string(),
        })
        .await
        .unwrap();
    store.send(AuthAction::RecaptchaExpired).await.unwrap().wait().await;

    // Expiry dropped the token but not the demand, and asked the
    // provider to render a fresh widget
    assert!(
        store
            .state(|state| state.recaptcha.required && state.recaptcha.token.is_none())
            .await
    );
    assert_eq!(env.recaptcha.reset_count(), 1);

    store.send(submit_email()).await.unwrap().wait().await;
    assert!(
        store
            .state(|state| state.last_error == Some(AuthError::RecaptchaRequired))
            .await
    );
    assert_eq!(recovery_starts(&env).len(), 1);
}

#[tokio::test]
async fn a_vanished_account_mid_recovery_lands_on_the_signup_form() {
    let env = mock_environment();
    let store = test_store(env.clone());

    store.send(AuthAction::GoToRecovery).await.unwrap();
    store
        .send_and_wait_for(submit_email(), started_or_failed, STEP_TIMEOUT)
        .await
        .unwrap();
    wait_for_state(&store, "the verification step opens", |state| {
        matches!(
            state.step,
            FlowState::Otp {
                flow: FlowFamily::Recovery
            }
        )
    })
    .await;

    env.api
        .fail_next(Endpoint::RecoveryVerify, AuthError::UserNotFound);
    let outcome = store
        .send_and_wait_for(
            AuthAction::RecoveryVerify {
                code: "123456".to_string(),
            },
            |action| {
                matches!(
                    action,
                    AuthAction::OtpVerified { .. } | AuthAction::OtpVerifyFailed { .. }
                )
            },
            STEP_TIMEOUT,
        )
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        AuthAction::OtpVerifyFailed {
            error: AuthError::UserNotFound,
            ..
        }
    ));

    // The account is gone; recovery cannot proceed, so the flow lands
    // on the signup form with the email kept for convenience
    wait_for_state(&store, "the flow lands on signup", |state| {
        state.step == FlowState::SignupEmail
    })
    .await;
    let (email, otp_cleared, last_error) = store
        .state(|state| {
            (
                state.flow.email.clone(),
                state.otp.is_none(),
                state.last_error.clone(),
            )
        })
        .await;
    assert_eq!(email, Some("ada@divvy.test".to_string()));
    assert!(otp_cleared);
    assert_eq!(last_error, Some(AuthError::UserNotFound));

    // No challenge was fetched for the dead account
    assert!(
        !env
            .api
            .calls()
            .contains(&RecordedCall::RecoveryPasskeyStart)
    );
}

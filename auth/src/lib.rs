//! # Divvy Auth
//!
//! Passwordless authentication for the Divvy client: passkey ceremonies,
//! emailed one-time codes as the verification step, and a bot-detection
//! gate on account recovery, all orchestrated as reducers over one owned
//! state value.
//!
//! ## Features
//!
//! - **Passwordless-first**: passkeys for signup, login, and recovery
//! - **Composable**: one reducer per flow family, combined for the store
//! - **Deterministic**: every side effect sits behind a provider trait;
//!   the bundled mocks run whole flows at memory speed
//! - **Durable sessions**: the bearer token and profile survive restarts
//!
//! ## Architecture
//!
//! Authentication is implemented as reducers and effects:
//!
//! ```text
//! Action → Reducer → (State, Effects) → Effect Execution → More Actions
//! ```
//!
//! ## Example: Passkey Signup
//!
//! ```rust,ignore
//! use divvy_auth::{AuthAction, AuthConfig, AuthState, auth_reducer};
//! use divvy_runtime::Store;
//!
//! let store = Store::new(
//!     AuthState::default(),
//!     auth_reducer(&AuthConfig::default()),
//!     environment,
//! );
//!
//! // 1. Open the flow and submit the form
//! store.send(AuthAction::GoToSignup).await?;
//! store.send(AuthAction::SignupStart { email, name }).await?;
//!
//! // 2. The emailed code auto-submits once typed
//! store.send(AuthAction::OtpInputChanged { raw: "483 921".into() }).await?;
//!
//! // 3. Run the ceremony for the issued challenge
//! store.send(AuthAction::SignupPasskeyFinish).await?;
//!
//! // 4. Session created and persisted
//! assert!(store.state(|s| s.is_authenticated()).await);
//! ```

// Public modules
pub mod actions;
pub mod codec;
pub mod config;
pub mod constants;
pub mod environment;
pub mod error;
pub mod mocks;
pub mod otp;
pub mod passkeys;
pub mod providers;
pub mod recaptcha;
pub mod reducers;
pub mod session;
pub mod state;
pub mod stores;

// Re-export main types for convenience
pub use actions::AuthAction;
pub use config::AuthConfig;
pub use environment::AuthEnvironment;
pub use error::{AuthError, Result};
pub use reducers::auth_reducer;
pub use session::SessionHandle;
pub use state::{AuthState, FlowFamily, FlowState, Session, User, UserId};

//! HTTP implementation of the backend API.
//!
//! Thin JSON-over-POST client. Every route shares one error path: a
//! non-success status is read as the backend's error envelope and mapped
//! through [`AuthError::from_api`]; transport failures and unreadable
//! bodies land in [`AuthError::Network`].

use super::api::{ApiErrorBody, AuthApi, SessionPayload};
use crate::config::ApiConfig;
use crate::error::{AuthError, Result};
use crate::passkeys::{
    AuthenticationChallenge, AuthenticationResponse, RegistrationChallenge, RegistrationResponse,
};
use crate::recaptcha::{RecaptchaToken, RecaptchaVersion};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Backend API client over HTTP.
#[derive(Debug, Clone)]
pub struct HttpAuthApi {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct SignupStartBody<'a> {
    email: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyBody<'a> {
    email: &'a str,
    otp_code: &'a str,
}

#[derive(Serialize)]
struct EmailBody<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct LoginStartBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecoveryStartBody<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    recaptcha_token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    recaptcha_version: Option<RecaptchaVersion>,
}

impl HttpAuthApi {
    /// Create a client for the configured backend.
    #[must_use]
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// POST `body` and deserialize the success payload.
    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(path = %path, error = %e, "Backend request failed to send");
                AuthError::Network {
                    message: e.to_string(),
                }
            })?;

        if !response.status().is_success() {
            return Err(Self::error_from(path, response).await);
        }

        response.json::<T>().await.map_err(|e| {
            tracing::error!(path = %path, error = %e, "Backend success body failed to parse");
            AuthError::Network {
                message: e.to_string(),
            }
        })
    }

    /// POST `body` and discard any success payload.
    async fn post_no_content<B>(&self, path: &str, body: &B) -> Result<()>
    where
        B: Serialize + ?Sized + Sync,
    {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(path = %path, error = %e, "Backend request failed to send");
                AuthError::Network {
                    message: e.to_string(),
                }
            })?;

        if !response.status().is_success() {
            return Err(Self::error_from(path, response).await);
        }
        Ok(())
    }

    /// Read a failed response as the backend's error envelope.
    async fn error_from(path: &str, response: reqwest::Response) -> AuthError {
        let status = response.status();
        match response.json::<ApiErrorBody>().await {
            Ok(body) => {
                tracing::warn!(path = %path, code = %body.code, "Backend rejected request");
                AuthError::from_api(&body.code, body.message, body.email)
            }
            Err(_) => {
                tracing::error!(path = %path, status = %status, "Backend error body failed to parse");
                AuthError::Network {
                    message: format!("backend returned {status} with an unreadable body"),
                }
            }
        }
    }
}

impl AuthApi for HttpAuthApi {
    async fn signup_start(&self, email: &str, name: &str) -> Result<()> {
        self.post_no_content("auth/signup-start", &SignupStartBody { email, name })
            .await
    }

    async fn signup_verify(&self, email: &str, code: &str) -> Result<()> {
        self.post_no_content("auth/signup-verify", &VerifyBody { email, otp_code: code })
            .await
    }

    async fn signup_passkey_start(&self) -> Result<RegistrationChallenge> {
        self.post("auth/signup-passkey-start", &serde_json::json!({}))
            .await
    }

    async fn signup_passkey_finish(
        &self,
        response: &RegistrationResponse,
    ) -> Result<SessionPayload> {
        self.post("auth/signup-passkey-finish", response).await
    }

    async fn login_start(&self, email: Option<&str>) -> Result<AuthenticationChallenge> {
        self.post("auth/login-start", &LoginStartBody { email })
            .await
    }

    async fn login_finish(&self, response: &AuthenticationResponse) -> Result<SessionPayload> {
        self.post("auth/login-finish", response).await
    }

    async fn recovery_start(&self, email: &str, recaptcha: Option<&RecaptchaToken>) -> Result<()> {
        let body = RecoveryStartBody {
            email,
            recaptcha_token: recaptcha.map(|t| t.token.as_str()),
            recaptcha_version: recaptcha.map(|t| t.version),
        };
        self.post_no_content("auth/recovery-start", &body).await
    }

    async fn recovery_verify(&self, email: &str, code: &str) -> Result<()> {
        self.post_no_content("auth/recovery-verify", &VerifyBody { email, otp_code: code })
            .await
    }

    async fn recovery_passkey_start(&self) -> Result<RegistrationChallenge> {
        self.post("auth/recovery-passkey-start", &serde_json::json!({}))
            .await
    }

    async fn recovery_passkey_finish(
        &self,
        response: &RegistrationResponse,
    ) -> Result<SessionPayload> {
        self.post("auth/recovery-passkey-finish", response).await
    }

    async fn resend_otp(&self, email: &str) -> Result<()> {
        self.post_no_content("auth/resend-otp", &EmailBody { email })
            .await
    }

    async fn cancel_pending_flow(&self, email: &str) -> Result<()> {
        self.post_no_content("auth/flow-cancel", &EmailBody { email })
            .await
    }
}

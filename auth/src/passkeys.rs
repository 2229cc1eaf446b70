//! Credential ceremony adapter.
//!
//! Bridges the backend's wire shapes and the platform credential API.
//! The backend speaks URL-safe unpadded base64 for every binary field;
//! the platform wants raw bytes. `prepare_*` decodes a server challenge
//! into platform options, `perform_*` runs the ceremony and encodes the
//! platform's answer back into a server-bound response. Platform failures
//! are folded into the [`AuthError`] taxonomy here so flow logic never
//! sees a raw platform error.
//!
//! Challenges are decoded once per ceremony and never reused; replay
//! protection is server-enforced, but nothing here caches a used challenge.

use crate::codec;
use crate::error::{AuthError, Result};
use crate::providers::ceremony::{
    CreatedCredential, CreationOptions, CredentialApi, CredentialRef, PlatformError,
    RequestOptions,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ═══════════════════════════════════════════════════════════
// Wire Shapes
// ═══════════════════════════════════════════════════════════

/// Relying-party metadata inside a registration challenge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelyingParty {
    /// Relying party identifier.
    pub id: Option<String>,

    /// Human-readable relying party name.
    pub name: Option<String>,
}

/// Account metadata inside a registration challenge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeUser {
    /// Encoded user handle. Required; its absence makes the challenge
    /// unusable.
    pub id: Option<String>,

    /// Account name shown in the platform dialog.
    pub name: Option<String>,

    /// Display name shown in the platform dialog.
    pub display_name: Option<String>,
}

/// Reference to an existing credential as the backend transmits it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireCredentialDescriptor {
    /// Always `"public-key"`.
    #[serde(rename = "type")]
    pub credential_type: String,

    /// Encoded credential id.
    pub id: String,

    /// Transport hints, such as `"internal"` or `"hybrid"`.
    pub transports: Option<Vec<String>>,
}

/// Server-issued options for a registration ceremony.
///
/// Every field is optional at the deserialization layer; the adapter
/// decides which absences are fatal so a missing field surfaces as
/// [`AuthError::MalformedChallenge`] instead of a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationChallenge {
    /// Encoded challenge bytes.
    pub challenge: Option<String>,

    /// Relying-party metadata.
    pub rp: Option<RelyingParty>,

    /// Account the credential is being created for.
    pub user: Option<ChallengeUser>,

    /// Credentials the authenticator must not duplicate.
    pub exclude_credentials: Option<Vec<WireCredentialDescriptor>>,

    /// Ceremony timeout in milliseconds.
    pub timeout: Option<u64>,
}

/// Server-issued options for an authentication ceremony.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationChallenge {
    /// Encoded challenge bytes.
    pub challenge: Option<String>,

    /// Relying party identifier.
    pub rp_id: Option<String>,

    /// Credentials the platform may answer with. Absent for the
    /// discoverable flow, where the platform offers whatever it has.
    pub allow_credentials: Option<Vec<WireCredentialDescriptor>>,

    /// Ceremony timeout in milliseconds.
    pub timeout: Option<u64>,

    /// User verification requirement, such as `"required"`.
    pub user_verification: Option<String>,
}

/// Encoded attestation material inside a registration response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationPayload {
    /// Encoded client data.
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,

    /// Encoded attestation object.
    pub attestation_object: String,
}

/// Server-bound response from a registration ceremony.
///
/// Built fresh per ceremony and sent exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    /// Credential id as the platform reports it.
    pub id: String,

    /// Encoded raw credential id.
    pub raw_id: String,

    /// Attestation material.
    pub response: AttestationPayload,

    /// Always `"public-key"`.
    #[serde(rename = "type")]
    pub credential_type: String,

    /// Ceremony extension results, passed through untouched.
    pub client_extension_results: Value,
}

/// Encoded assertion material inside an authentication response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionPayload {
    /// Encoded client data.
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,

    /// Encoded authenticator data.
    pub authenticator_data: String,

    /// Encoded assertion signature.
    pub signature: String,

    /// Encoded user handle, when the authenticator disclosed one.
    pub user_handle: Option<String>,
}

/// Server-bound response from an authentication ceremony.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationResponse {
    /// Credential id as the platform reports it.
    pub id: String,

    /// Encoded raw credential id.
    pub raw_id: String,

    /// Assertion material.
    pub response: AssertionPayload,

    /// Always `"public-key"`.
    #[serde(rename = "type")]
    pub credential_type: String,

    /// Ceremony extension results, passed through untouched.
    pub client_extension_results: Value,
}

// ═══════════════════════════════════════════════════════════
// Challenge Preparation
// ═══════════════════════════════════════════════════════════

/// Decode a server registration challenge into platform creation options.
///
/// # Errors
///
/// Returns [`AuthError::MalformedChallenge`] when the challenge or the
/// user handle is absent, and [`AuthError::Codec`] when any encoded field
/// fails to decode.
pub fn prepare_registration(options: &RegistrationChallenge) -> Result<CreationOptions> {
    let Some(challenge) = options.challenge.as_deref() else {
        return Err(AuthError::MalformedChallenge {
            reason: "challenge is missing".to_string(),
        });
    };
    let Some(user) = options.user.as_ref() else {
        return Err(AuthError::MalformedChallenge {
            reason: "user is missing".to_string(),
        });
    };
    let Some(user_id) = user.id.as_deref() else {
        return Err(AuthError::MalformedChallenge {
            reason: "user id is missing".to_string(),
        });
    };

    let user_name = user.name.clone().unwrap_or_default();
    let rp = options.rp.clone().unwrap_or_default();

    Ok(CreationOptions {
        challenge: codec::decode(challenge)?,
        rp_id: rp.id.unwrap_or_default(),
        rp_name: rp.name.unwrap_or_default(),
        user_id: codec::decode(user_id)?,
        user_display_name: user.display_name.clone().unwrap_or_else(|| user_name.clone()),
        user_name,
        exclude_credentials: decode_descriptors(
            options.exclude_credentials.as_deref().unwrap_or_default(),
        )?,
        timeout_ms: options.timeout,
    })
}

/// Decode a server authentication challenge into platform request options.
///
/// An absent allow list is the discoverable flow and maps to an empty
/// list, not an error.
///
/// # Errors
///
/// Returns [`AuthError::MalformedChallenge`] when the challenge is absent,
/// and [`AuthError::Codec`] when any encoded field fails to decode.
pub fn prepare_authentication(options: &AuthenticationChallenge) -> Result<RequestOptions> {
    let Some(challenge) = options.challenge.as_deref() else {
        return Err(AuthError::MalformedChallenge {
            reason: "challenge is missing".to_string(),
        });
    };

    Ok(RequestOptions {
        challenge: codec::decode(challenge)?,
        rp_id: options.rp_id.clone(),
        allow_credentials: decode_descriptors(
            options.allow_credentials.as_deref().unwrap_or_default(),
        )?,
        timeout_ms: options.timeout,
        user_verification: options.user_verification.clone(),
    })
}

fn decode_descriptors(wire: &[WireCredentialDescriptor]) -> Result<Vec<CredentialRef>> {
    wire.iter()
        .map(|descriptor| {
            Ok(CredentialRef {
                id: codec::decode(&descriptor.id)?,
                transports: descriptor.transports.clone().unwrap_or_default(),
            })
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════
// Ceremony Execution
// ═══════════════════════════════════════════════════════════

/// Run a registration ceremony and encode the result for the server.
///
/// # Errors
///
/// Returns [`AuthError::CeremonyUnsupported`] when the platform has no
/// credential API, otherwise the taxonomy mapping of whatever the
/// platform reported.
pub async fn perform_registration<C: CredentialApi>(
    api: &C,
    options: CreationOptions,
) -> Result<RegistrationResponse> {
    if !api.is_supported() {
        return Err(AuthError::CeremonyUnsupported);
    }
    let credential = api.create(options).await.map_err(map_creation_error)?;
    Ok(encode_registration(credential))
}

/// Run an authentication ceremony and encode the result for the server.
///
/// # Errors
///
/// Returns [`AuthError::CeremonyUnsupported`] when the platform has no
/// credential API, otherwise the taxonomy mapping of whatever the
/// platform reported.
pub async fn perform_authentication<C: CredentialApi>(
    api: &C,
    options: RequestOptions,
) -> Result<AuthenticationResponse> {
    if !api.is_supported() {
        return Err(AuthError::CeremonyUnsupported);
    }
    let credential = api.get(options).await.map_err(map_assertion_error)?;
    Ok(AuthenticationResponse {
        id: credential.id,
        raw_id: codec::encode(&credential.raw_id),
        response: AssertionPayload {
            client_data_json: codec::encode(&credential.client_data_json),
            authenticator_data: codec::encode(&credential.authenticator_data),
            signature: codec::encode(&credential.signature),
            user_handle: credential.user_handle.as_deref().map(codec::encode),
        },
        credential_type: "public-key".to_string(),
        client_extension_results: credential.extensions,
    })
}

fn encode_registration(credential: CreatedCredential) -> RegistrationResponse {
    RegistrationResponse {
        id: credential.id,
        raw_id: codec::encode(&credential.raw_id),
        response: AttestationPayload {
            client_data_json: codec::encode(&credential.client_data_json),
            attestation_object: codec::encode(&credential.attestation_object),
        },
        credential_type: "public-key".to_string(),
        client_extension_results: credential.extensions,
    }
}

// ═══════════════════════════════════════════════════════════
// Error Mapping
// ═══════════════════════════════════════════════════════════

/// Platforms report dismissal and timeout as the same "not allowed"
/// failure; the message text is the only discriminator they give us.
fn is_timeout_message(message: &str) -> bool {
    let lowered = message.to_ascii_lowercase();
    lowered.contains("timed out") || lowered.contains("timeout")
}

fn map_creation_error(error: PlatformError) -> AuthError {
    match error {
        PlatformError::NotSupported => AuthError::CeremonyUnsupported,
        PlatformError::NotAllowed { message } if is_timeout_message(&message) => {
            AuthError::CeremonyTimedOut
        }
        PlatformError::NotAllowed { .. } => AuthError::CeremonyCancelled,
        // During creation, a state conflict means an excluded credential
        // already lives on this authenticator
        PlatformError::InvalidState => AuthError::CeremonyAlreadyRegistered,
        PlatformError::Security { message } => AuthError::CeremonySecurity { message },
        PlatformError::Other(message) => AuthError::Network { message },
    }
}

fn map_assertion_error(error: PlatformError) -> AuthError {
    match error {
        PlatformError::NotSupported => AuthError::CeremonyUnsupported,
        PlatformError::NotAllowed { message } if is_timeout_message(&message) => {
            AuthError::CeremonyTimedOut
        }
        PlatformError::NotAllowed { .. } => AuthError::CeremonyCancelled,
        PlatformError::Security { message } => AuthError::CeremonySecurity { message },
        // No already-registered reading exists for an assertion
        PlatformError::InvalidState => AuthError::Network {
            message: PlatformError::InvalidState.to_string(),
        },
        PlatformError::Other(message) => AuthError::Network { message },
    }
}

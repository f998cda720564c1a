use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use super::main::PkcePair;
use super::provider::ProviderKind;
use crate::utils::base64url_encode;

/// Normalized identity produced by a provider after a successful exchange/fetch.
///
/// Never persisted directly; it is resolved into a local [`crate::User`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub provider_name: String,
    pub provider_subject_id: String,
    pub display_name: String,
    pub email_address: String,
}

impl Identity {
    /// Username used to look up the local user: display name, falling back to email.
    pub fn resolved_username(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.email_address
        } else {
            &self.display_name
        }
    }

    /// Stable local identifier derived from provider and subject.
    ///
    /// Hashing "provider:subject" keeps equal subject ids from different
    /// providers apart and never exposes the raw subject.
    pub fn local_id(&self) -> String {
        let digest = Sha256::digest(
            format!("{}:{}", self.provider_name, self.provider_subject_id).as_bytes(),
        );
        base64url_encode(digest)
    }

    /// True when the identity carries enough data to resolve a local user.
    pub(crate) fn is_complete(&self) -> bool {
        !self.provider_subject_id.is_empty() && !self.resolved_username().trim().is_empty()
    }
}

/// Tokens returned by a provider token endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// One authorization attempt: the URL to open plus the secrets it owns.
#[derive(Clone)]
pub struct AuthorizationRequest {
    pub provider: ProviderKind,
    pub url: String,
    pub state: String,
    pub(crate) pkce: Option<PkcePair>,
}

impl AuthorizationRequest {
    pub fn code_verifier(&self) -> Option<&str> {
        self.pkce.as_ref().map(|p| p.verifier.as_str())
    }
}

impl fmt::Debug for AuthorizationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationRequest")
            .field("provider", &self.provider)
            .field("url", &self.url)
            .field("state", &self.state)
            .field("pkce", &self.pkce.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// What the provider redirected back with.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizationCallback {
    pub code: String,
    pub state: String,
}

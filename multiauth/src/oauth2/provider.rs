use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::errors::OAuth2Error;
use super::types::Identity;

/// The five supported identity providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Google,
    Twitter,
    GitHub,
    Facebook,
    LinkedIn,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 5] = [
        Self::Google,
        Self::Twitter,
        Self::GitHub,
        Self::Facebook,
        Self::LinkedIn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Twitter => "twitter",
            Self::GitHub => "github",
            Self::Facebook => "facebook",
            Self::LinkedIn => "linkedin",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = OAuth2Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "twitter" | "x" => Ok(Self::Twitter),
            "github" => Ok(Self::GitHub),
            "facebook" => Ok(Self::Facebook),
            "linkedin" => Ok(Self::LinkedIn),
            _ => Err(OAuth2Error::Config(format!("unknown provider: {s}"))),
        }
    }
}

/// Wire-level configuration of one provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub profile_url: String,
    pub scopes: Vec<String>,
    /// Send code_challenge / code_verifier
    pub use_pkce: bool,
    /// Send client_secret on the token request (non-native flows)
    pub send_client_secret: bool,
}

/// A provider together with its configuration.
#[derive(Debug, Clone)]
pub enum IdentityProvider {
    Google(ProviderConfig),
    Twitter(ProviderConfig),
    GitHub(ProviderConfig),
    Facebook(ProviderConfig),
    LinkedIn(ProviderConfig),
}

impl IdentityProvider {
    pub fn new(kind: ProviderKind, config: ProviderConfig) -> Self {
        match kind {
            ProviderKind::Google => Self::Google(config),
            ProviderKind::Twitter => Self::Twitter(config),
            ProviderKind::GitHub => Self::GitHub(config),
            ProviderKind::Facebook => Self::Facebook(config),
            ProviderKind::LinkedIn => Self::LinkedIn(config),
        }
    }

    pub fn from_env(kind: ProviderKind) -> Result<Self, OAuth2Error> {
        Ok(Self::new(kind, ProviderConfig::from_env(kind)?))
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::Google(_) => ProviderKind::Google,
            Self::Twitter(_) => ProviderKind::Twitter,
            Self::GitHub(_) => ProviderKind::GitHub,
            Self::Facebook(_) => ProviderKind::Facebook,
            Self::LinkedIn(_) => ProviderKind::LinkedIn,
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        match self {
            Self::Google(c)
            | Self::Twitter(c)
            | Self::GitHub(c)
            | Self::Facebook(c)
            | Self::LinkedIn(c) => c,
        }
    }

    /// GitHub answers form-encoded unless asked for JSON explicitly.
    pub(crate) fn wants_json_accept_header(&self) -> bool {
        matches!(self, Self::GitHub(_))
    }

    /// Providers that return an OIDC ID token from the token endpoint.
    pub(crate) fn issues_id_token(&self) -> bool {
        matches!(self, Self::Google(_) | Self::LinkedIn(_))
    }

    /// Map a profile endpoint body to an [`Identity`].
    pub(crate) fn map_profile(&self, profile: &Value) -> Result<Identity, OAuth2Error> {
        let kind = self.kind();
        let identity = match self {
            Self::Google(_) | Self::LinkedIn(_) => Identity {
                provider_name: kind.to_string(),
                provider_subject_id: string_claim(profile, "sub"),
                display_name: string_claim(profile, "name"),
                email_address: string_claim(profile, "email"),
            },
            Self::Twitter(_) => {
                let data = profile.get("data").ok_or_else(|| {
                    OAuth2Error::MalformedResponse("twitter profile without data".to_string())
                })?;
                Identity {
                    provider_name: kind.to_string(),
                    provider_subject_id: string_claim(data, "id"),
                    display_name: string_claim(data, "username"),
                    email_address: String::new(),
                }
            }
            Self::GitHub(_) => Identity {
                provider_name: kind.to_string(),
                provider_subject_id: string_claim(profile, "id"),
                display_name: string_claim(profile, "login"),
                email_address: string_claim(profile, "email"),
            },
            Self::Facebook(_) => Identity {
                provider_name: kind.to_string(),
                provider_subject_id: string_claim(profile, "id"),
                display_name: string_claim(profile, "name"),
                email_address: string_claim(profile, "email"),
            },
        };

        if identity.provider_subject_id.is_empty() {
            return Err(OAuth2Error::MalformedResponse(format!(
                "{kind} profile without subject id"
            )));
        }
        Ok(identity)
    }

    /// Map ID token claims to an [`Identity`]; `None` for providers without ID tokens.
    pub(crate) fn map_id_token_claims(&self, claims: &Value) -> Option<Identity> {
        if !self.issues_id_token() {
            return None;
        }
        let subject = string_claim(claims, "sub");
        if subject.is_empty() {
            return None;
        }
        Some(Identity {
            provider_name: self.kind().to_string(),
            provider_subject_id: subject,
            display_name: string_claim(claims, "name"),
            email_address: string_claim(claims, "email"),
        })
    }
}

/// Read a claim as a string; numeric ids (GitHub, Facebook) are stringified.
fn string_claim(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

//! Central configuration for the multiauth crate
//!
//! Values are read lazily from the environment and copied into [`AuthSettings`],
//! which is what the orchestrator actually holds.

use std::{env, sync::LazyLock, time::Duration};

use crate::coordination::CoordinationError;

/// Public origin of the host application, used to derive the OAuth2 redirect URI.
/// Default: "http://localhost:3001"
pub static ORIGIN: LazyLock<String> =
    LazyLock::new(|| env::var("ORIGIN").unwrap_or_else(|_| "http://localhost:3001".to_string()));

/// Path of the OAuth2 callback route on the host application.
/// Default: "/auth/callback"
pub static OAUTH2_REDIRECT_PATH: LazyLock<String> = LazyLock::new(|| {
    env::var("OAUTH2_REDIRECT_PATH").unwrap_or_else(|_| "/auth/callback".to_string())
});

pub(crate) static OAUTH2_HTTP_TIMEOUT_SECS: LazyLock<u64> =
    LazyLock::new(|| parse_env("OAUTH2_HTTP_TIMEOUT_SECS", 30));

pub(crate) static OAUTH2_INTERACTION_TIMEOUT_SECS: LazyLock<u64> =
    LazyLock::new(|| parse_env("OAUTH2_INTERACTION_TIMEOUT_SECS", 300));

pub(crate) static SESSION_MAX_AGE_SECS: LazyLock<u64> =
    LazyLock::new(|| parse_env("SESSION_MAX_AGE_SECS", 3600));

pub(crate) static TOTP_ISSUER: LazyLock<String> =
    LazyLock::new(|| env::var("TOTP_ISSUER").unwrap_or_else(|_| "multiauth".to_string()));

pub(crate) static BASIC_AUTH_AUTO_REGISTER: LazyLock<bool> = LazyLock::new(|| {
    env::var("BASIC_AUTH_AUTO_REGISTER")
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
});

/// Longest accepted session lifetime (400 days)
pub const MAX_SESSION_MAX_AGE: Duration = Duration::from_secs(400 * 24 * 60 * 60);

fn parse_env(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Full redirect URI registered with every provider.
pub fn redirect_uri() -> String {
    format!(
        "{}{}",
        ORIGIN.trim_end_matches('/'),
        OAUTH2_REDIRECT_PATH.as_str()
    )
}

/// Settings threaded through the orchestrator and its collaborators.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Timeout applied to every provider token/profile request
    pub http_timeout: Duration,
    /// How long the orchestrator waits for the browser/dialog step
    pub interaction_timeout: Duration,
    /// Lifetime of a session in the cache store
    pub session_max_age: Duration,
    /// Issuer shown by authenticator apps
    pub totp_issuer: String,
    /// Create an account when the password path sees an unknown username
    pub auto_register: bool,
}

impl AuthSettings {
    pub fn from_env() -> Self {
        Self {
            http_timeout: Duration::from_secs(*OAUTH2_HTTP_TIMEOUT_SECS),
            interaction_timeout: Duration::from_secs(*OAUTH2_INTERACTION_TIMEOUT_SECS),
            session_max_age: Duration::from_secs(*SESSION_MAX_AGE_SECS),
            totp_issuer: TOTP_ISSUER.clone(),
            auto_register: *BASIC_AUTH_AUTO_REGISTER,
        }
    }

    /// Reject settings the session store cannot honor.
    pub fn validate(&self) -> Result<(), CoordinationError> {
        if self.session_max_age > MAX_SESSION_MAX_AGE {
            return Err(CoordinationError::Configuration(format!(
                "SESSION_MAX_AGE_SECS={} exceeds the maximum of {}",
                self.session_max_age.as_secs(),
                MAX_SESSION_MAX_AGE.as_secs()
            ))
            .log());
        }
        Ok(())
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            http_timeout: Duration::from_secs(30),
            interaction_timeout: Duration::from_secs(300),
            session_max_age: Duration::from_secs(3600),
            totp_issuer: "multiauth".to_string(),
            auto_register: false,
        }
    }
}

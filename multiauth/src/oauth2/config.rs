//! Per-provider endpoint defaults and environment loading.
//!
//! Every endpoint can be overridden with `OAUTH2_<PROVIDER>_AUTH_URL`,
//! `OAUTH2_<PROVIDER>_TOKEN_URL` and `OAUTH2_<PROVIDER>_PROFILE_URL`.

use std::env;

use super::errors::OAuth2Error;
use super::provider::{ProviderConfig, ProviderKind};
use crate::config::redirect_uri;

pub(super) struct ProviderDefaults {
    pub(super) auth_url: &'static str,
    pub(super) token_url: &'static str,
    pub(super) profile_url: &'static str,
    pub(super) scopes: &'static [&'static str],
    pub(super) use_pkce: bool,
    pub(super) send_client_secret: bool,
}

pub(super) fn defaults_for(kind: ProviderKind) -> ProviderDefaults {
    match kind {
        ProviderKind::Google => ProviderDefaults {
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth",
            token_url: "https://oauth2.googleapis.com/token",
            profile_url: "https://openidconnect.googleapis.com/v1/userinfo",
            scopes: &["openid", "email", "profile"],
            use_pkce: true,
            send_client_secret: true,
        },
        // Native/public client: PKCE only, no secret on the wire
        ProviderKind::Twitter => ProviderDefaults {
            auth_url: "https://twitter.com/i/oauth2/authorize",
            token_url: "https://api.twitter.com/2/oauth2/token",
            profile_url: "https://api.twitter.com/2/users/me",
            scopes: &["users.read", "tweet.read"],
            use_pkce: true,
            send_client_secret: false,
        },
        ProviderKind::GitHub => ProviderDefaults {
            auth_url: "https://github.com/login/oauth/authorize",
            token_url: "https://github.com/login/oauth/access_token",
            profile_url: "https://api.github.com/user",
            scopes: &["read:user", "user:email"],
            use_pkce: false,
            send_client_secret: true,
        },
        ProviderKind::Facebook => ProviderDefaults {
            auth_url: "https://www.facebook.com/v19.0/dialog/oauth",
            token_url: "https://graph.facebook.com/v19.0/oauth/access_token",
            profile_url: "https://graph.facebook.com/me?fields=id,name,email",
            scopes: &["email", "public_profile"],
            use_pkce: false,
            send_client_secret: true,
        },
        ProviderKind::LinkedIn => ProviderDefaults {
            auth_url: "https://www.linkedin.com/oauth/v2/authorization",
            token_url: "https://www.linkedin.com/oauth/v2/accessToken",
            profile_url: "https://api.linkedin.com/v2/userinfo",
            scopes: &["openid", "profile", "email"],
            use_pkce: false,
            send_client_secret: true,
        },
    }
}

fn env_key(kind: ProviderKind, suffix: &str) -> String {
    format!("OAUTH2_{}_{}", kind.as_str().to_uppercase(), suffix)
}

impl ProviderConfig {
    /// Build the default configuration for `kind` with the given credentials.
    pub fn new(
        kind: ProviderKind,
        client_id: impl Into<String>,
        client_secret: Option<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        let defaults = defaults_for(kind);
        Self {
            client_id: client_id.into(),
            client_secret,
            redirect_uri: redirect_uri.into(),
            auth_url: defaults.auth_url.to_string(),
            token_url: defaults.token_url.to_string(),
            profile_url: defaults.profile_url.to_string(),
            scopes: defaults.scopes.iter().map(|s| s.to_string()).collect(),
            use_pkce: defaults.use_pkce,
            send_client_secret: defaults.send_client_secret,
        }
    }

    /// Load `OAUTH2_<PROVIDER>_*` variables on top of the provider defaults.
    pub fn from_env(kind: ProviderKind) -> Result<Self, OAuth2Error> {
        let client_id = env::var(env_key(kind, "CLIENT_ID"))
            .map_err(|_| OAuth2Error::Config(format!("{} must be set", env_key(kind, "CLIENT_ID"))))?;
        let client_secret = env::var(env_key(kind, "CLIENT_SECRET")).ok();

        let mut config = Self::new(kind, client_id, client_secret, redirect_uri());

        if config.send_client_secret && config.client_secret.is_none() {
            return Err(OAuth2Error::Config(format!(
                "{} must be set",
                env_key(kind, "CLIENT_SECRET")
            )));
        }

        if let Ok(url) = env::var(env_key(kind, "AUTH_URL")) {
            tracing::debug!("Using {} from environment: {}", env_key(kind, "AUTH_URL"), url);
            config.auth_url = url;
        }
        if let Ok(url) = env::var(env_key(kind, "TOKEN_URL")) {
            tracing::debug!("Using {} from environment: {}", env_key(kind, "TOKEN_URL"), url);
            config.token_url = url;
        }
        if let Ok(url) = env::var(env_key(kind, "PROFILE_URL")) {
            tracing::debug!("Using {} from environment: {}", env_key(kind, "PROFILE_URL"), url);
            config.profile_url = url;
        }
        if let Ok(scopes) = env::var(env_key(kind, "SCOPES")) {
            config.scopes = scopes.split_whitespace().map(str::to_string).collect();
        }

        Ok(config)
    }
}

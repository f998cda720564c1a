use async_trait::async_trait;
use http::header::ACCEPT;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::oauth2::errors::OAuth2Error;
use crate::oauth2::provider::{IdentityProvider, ProviderKind};
use crate::oauth2::types::{AuthorizationRequest, Identity, TokenSet};

use super::idtoken::decode_id_token_claims;
use super::pkce::{generate_state_token, generate_verifier_and_challenge};

/// Longest slice of a provider error body kept in error messages
const MAX_ERROR_BODY: usize = 256;

/// Uniform contract every provider is driven through.
#[async_trait]
pub trait IdentityProviderAdapter: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Start an attempt: fresh state token and, where applicable, a fresh PKCE pair.
    fn build_authorization_url(&self) -> Result<AuthorizationRequest, OAuth2Error>;

    async fn exchange_code_for_token(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<TokenSet, OAuth2Error>;

    /// Fetch the profile; `id_token` claims are used when the profile is unavailable or incomplete.
    async fn fetch_identity(
        &self,
        access_token: &str,
        id_token: Option<&str>,
    ) -> Result<Identity, OAuth2Error>;
}

/// Generic OAuth2 (+PKCE) engine parameterized by an [`IdentityProvider`].
#[derive(Debug, Clone)]
pub struct OAuth2Engine {
    provider: IdentityProvider,
    client: reqwest::Client,
}

impl OAuth2Engine {
    pub fn new(provider: IdentityProvider, timeout: Duration) -> Result<Self, OAuth2Error> {
        Ok(Self {
            provider,
            client: build_client(timeout)?,
        })
    }

    pub fn provider(&self) -> &IdentityProvider {
        &self.provider
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<Identity, OAuth2Error> {
        let config = self.provider.config();
        let response = self
            .client
            .get(config.profile_url.as_str())
            .bearer_auth(access_token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(OAuth2Error::from_reqwest)?;

        let body = read_success_body(response).await?;
        tracing::debug!(provider = %self.kind(), "Profile response received");

        let profile: Value = serde_json::from_str(&body).map_err(|e| {
            OAuth2Error::MalformedResponse(format!("profile body is not JSON: {e}"))
        })?;
        self.provider.map_profile(&profile)
    }

    fn identity_from_id_token(&self, id_token: Option<&str>) -> Option<Identity> {
        let id_token = id_token?;
        match decode_id_token_claims(id_token) {
            Ok(claims) => self.provider.map_id_token_claims(&claims),
            Err(e) => {
                tracing::warn!(provider = %self.kind(), "Unusable id_token: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl IdentityProviderAdapter for OAuth2Engine {
    fn kind(&self) -> ProviderKind {
        self.provider.kind()
    }

    fn build_authorization_url(&self) -> Result<AuthorizationRequest, OAuth2Error> {
        let config = self.provider.config();
        let state = generate_state_token()?;
        let pkce = if config.use_pkce {
            Some(generate_verifier_and_challenge()?)
        } else {
            None
        };

        let scope = config.scopes.join(" ");
        let mut params: Vec<(&str, &str)> = vec![
            ("client_id", config.client_id.as_str()),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", scope.as_str()),
            ("state", state.as_str()),
        ];
        if let Some(pair) = &pkce {
            params.push(("code_challenge", pair.challenge.as_str()));
            params.push(("code_challenge_method", "S256"));
        }

        let url = Url::parse_with_params(&config.auth_url, &params)
            .map_err(|e| OAuth2Error::Config(format!("invalid auth url: {e}")))?;

        tracing::debug!(provider = %self.kind(), "Auth URL: {}", url);

        Ok(AuthorizationRequest {
            provider: self.kind(),
            url: url.to_string(),
            state,
            pkce,
        })
    }

    async fn exchange_code_for_token(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<TokenSet, OAuth2Error> {
        let config = self.provider.config();

        let mut form: Vec<(&str, &str)> = vec![
            ("code", code),
            ("client_id", config.client_id.as_str()),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];
        if config.use_pkce {
            let verifier = code_verifier
                .ok_or_else(|| OAuth2Error::Config("missing PKCE code verifier".to_string()))?;
            form.push(("code_verifier", verifier));
        }
        if config.send_client_secret {
            let secret = config
                .client_secret
                .as_deref()
                .ok_or_else(|| OAuth2Error::Config("missing client secret".to_string()))?;
            form.push(("client_secret", secret));
        }

        let mut request = self.client.post(config.token_url.as_str()).form(&form);
        if self.provider.wants_json_accept_header() {
            request = request.header(ACCEPT, "application/json");
        }

        let response = request.send().await.map_err(OAuth2Error::from_reqwest)?;
        let body = read_success_body(response).await?;

        let json: Value = serde_json::from_str(&body).map_err(|e| {
            OAuth2Error::MalformedResponse(format!("token body is not JSON: {e}"))
        })?;

        // GitHub reports bad codes with 200 and an "error" field
        if let Some(error) = json.get("error").and_then(Value::as_str) {
            return Err(OAuth2Error::ProviderRejected {
                status: 200,
                message: error.to_string(),
            });
        }

        let tokens: TokenSet = serde_json::from_value(json)
            .map_err(|e| OAuth2Error::MalformedResponse(format!("token response: {e}")))?;

        if tokens.access_token.is_empty() {
            return Err(OAuth2Error::MalformedResponse(
                "empty access_token".to_string(),
            ));
        }

        tracing::debug!(
            provider = %self.kind(),
            has_id_token = tokens.id_token.is_some(),
            "Token exchange succeeded"
        );
        Ok(tokens)
    }

    async fn fetch_identity(
        &self,
        access_token: &str,
        id_token: Option<&str>,
    ) -> Result<Identity, OAuth2Error> {
        match self.fetch_profile(access_token).await {
            Ok(identity) if identity.is_complete() => Ok(identity),
            Ok(partial) => {
                tracing::debug!(provider = %self.kind(), "Profile incomplete, trying id_token");
                Ok(self.identity_from_id_token(id_token).unwrap_or(partial))
            }
            Err(e) => match self.identity_from_id_token(id_token) {
                Some(identity) => {
                    tracing::warn!(
                        provider = %self.kind(),
                        "Profile fetch failed ({}), using id_token claims",
                        e
                    );
                    Ok(identity)
                }
                None => Err(e),
            },
        }
    }
}

/// HTTP client for provider calls. The timeout bounds every request so a
/// stalled provider turns into `NetworkFailure` instead of a hung attempt.
pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, OAuth2Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .pool_idle_timeout(Duration::from_secs(90))
        .user_agent(concat!("multiauth/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| OAuth2Error::Config(format!("failed to build HTTP client: {e}")))
}

async fn read_success_body(response: reqwest::Response) -> Result<String, OAuth2Error> {
    let status = response.status();
    let body = response.text().await.map_err(OAuth2Error::from_reqwest)?;
    if !status.is_success() {
        let message: String = body.chars().take(MAX_ERROR_BODY).collect();
        tracing::debug!("Provider returned {}: {}", status, message);
        return Err(OAuth2Error::ProviderRejected {
            status: status.as_u16(),
            message,
        });
    }
    Ok(body)
}

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::AuthSettings;
use crate::oauth2::{IdentityProvider, IdentityProviderAdapter, OAuth2Engine, ProviderKind};
use crate::session::SessionManager;
use crate::storage::cache_store_from_env;
use crate::totp::{PngQrRenderer, TwoFactorService};
use crate::userdb::{Argon2PasswordHasher, PasswordHasher, UserDirectory, user_directory_from_env};

use super::errors::CoordinationError;

/// Top-level entry point for every sign-in path.
///
/// Holds its collaborators explicitly; nothing is read from globals once built.
/// Cheap to share behind an `Arc`; concurrent attempts only meet in the user
/// directory and the session store.
pub struct AuthOrchestrator {
    pub(super) directory: Arc<dyn UserDirectory>,
    pub(super) sessions: Arc<SessionManager>,
    pub(super) hasher: Arc<dyn PasswordHasher>,
    pub(super) two_factor: Arc<TwoFactorService>,
    pub(super) providers: HashMap<ProviderKind, Arc<dyn IdentityProviderAdapter>>,
    pub(super) settings: AuthSettings,
}

impl AuthOrchestrator {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        sessions: SessionManager,
        two_factor: TwoFactorService,
        hasher: Arc<dyn PasswordHasher>,
        settings: AuthSettings,
    ) -> Self {
        Self {
            directory,
            sessions: Arc::new(sessions),
            hasher,
            two_factor: Arc::new(two_factor),
            providers: HashMap::new(),
            settings,
        }
    }

    /// Register (or replace) the adapter for its provider kind.
    pub fn with_provider(mut self, adapter: Arc<dyn IdentityProviderAdapter>) -> Self {
        let kind = adapter.kind();
        if self.providers.insert(kind, adapter).is_some() {
            tracing::debug!("Replaced adapter for {}", kind);
        }
        self
    }

    /// Build everything from environment variables.
    ///
    /// Providers are registered for every `OAUTH2_<PROVIDER>_CLIENT_ID` that is set.
    pub async fn from_env() -> Result<Self, CoordinationError> {
        let settings = AuthSettings::from_env();
        settings.validate()?;
        let directory = user_directory_from_env().await?;
        let store = cache_store_from_env().await?;

        let sessions = SessionManager::new(store, directory.clone(), settings.session_max_age);
        let two_factor = TwoFactorService::new(
            directory.clone(),
            Arc::new(PngQrRenderer),
            settings.totp_issuer.clone(),
        );
        let http_timeout = settings.http_timeout;

        let mut orchestrator = Self::new(
            directory,
            sessions,
            two_factor,
            Arc::new(Argon2PasswordHasher::new()),
            settings,
        );

        for kind in ProviderKind::ALL {
            match IdentityProvider::from_env(kind) {
                Ok(provider) => {
                    let engine = OAuth2Engine::new(provider, http_timeout)?;
                    orchestrator = orchestrator.with_provider(Arc::new(engine));
                    tracing::info!("Registered OAuth2 provider: {}", kind);
                }
                Err(e) => tracing::debug!("Provider {} not configured: {}", kind, e),
            }
        }

        if orchestrator.providers.is_empty() {
            tracing::warn!("No OAuth2 provider configured; only password sign-in is available");
        }
        Ok(orchestrator)
    }

    pub fn providers(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|kind| self.providers.contains_key(kind))
            .collect()
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn directory(&self) -> &Arc<dyn UserDirectory> {
        &self.directory
    }

    pub fn two_factor(&self) -> &TwoFactorService {
        &self.two_factor
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    pub(super) fn adapter(
        &self,
        kind: ProviderKind,
    ) -> Result<&Arc<dyn IdentityProviderAdapter>, CoordinationError> {
        self.providers
            .get(&kind)
            .ok_or(CoordinationError::UnknownProvider(kind))
    }

    /// End a session. False if it did not exist.
    #[tracing::instrument(skip(self, session_id))]
    pub async fn logout(&self, session_id: &str) -> Result<bool, CoordinationError> {
        Ok(self.sessions.end_session(session_id).await?)
    }

    /// False for unknown, expired or still-pending sessions; otherwise the user's role decides.
    pub async fn authorize_action(
        &self,
        session_id: &str,
        resource: &str,
        action: &str,
    ) -> Result<bool, CoordinationError> {
        Ok(self
            .sessions
            .authorize_action(session_id, resource, action)
            .await?)
    }
}

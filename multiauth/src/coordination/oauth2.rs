use crate::oauth2::{
    AuthorizationInteraction, Identity, IdentityProviderAdapter, OAuth2Error, ProviderKind,
    verify_state,
};

use super::errors::CoordinationError;
use super::orchestrator::AuthOrchestrator;
use super::types::AuthenticationResult;

impl AuthOrchestrator {
    /// Full authorization-code round trip with the selected provider.
    ///
    /// Provider, transport and interaction failures (including cancellation
    /// and timeout) all end in a failed result. Only store failures are errors.
    #[tracing::instrument(skip(self, interaction))]
    pub async fn authenticate_with_oauth(
        &self,
        provider: ProviderKind,
        interaction: &dyn AuthorizationInteraction,
    ) -> Result<AuthenticationResult, CoordinationError> {
        let adapter = match self.adapter(provider) {
            Ok(adapter) => adapter.clone(),
            Err(e) => return Ok(failed(e)),
        };

        let (identity, access_token) =
            match self.run_authorization(adapter.as_ref(), interaction).await {
                Ok(found) => found,
                Err(e) => return Ok(absorb(provider, e)),
            };

        self.complete_primary(&identity, access_token).await
    }

    /// Sign in with an access token obtained out-of-band.
    ///
    /// A non-empty `presented_identifier` must match the fetched identity's
    /// subject id, username or email.
    #[tracing::instrument(skip(self, access_token))]
    pub async fn authenticate_with_token(
        &self,
        provider: ProviderKind,
        presented_identifier: &str,
        access_token: &str,
    ) -> Result<AuthenticationResult, CoordinationError> {
        let adapter = match self.adapter(provider) {
            Ok(adapter) => adapter.clone(),
            Err(e) => return Ok(failed(e)),
        };

        let identity = match adapter.fetch_identity(access_token, None).await {
            Ok(identity) => identity,
            Err(e) => return Ok(absorb(provider, e)),
        };

        let presented = presented_identifier.trim();
        if !presented.is_empty()
            && presented != identity.provider_subject_id
            && presented != identity.resolved_username()
            && presented != identity.email_address
        {
            tracing::warn!("Presented identifier does not match the token's identity");
            return Ok(AuthenticationResult::failed());
        }

        self.complete_primary(&identity, access_token.to_string())
            .await
    }

    async fn run_authorization(
        &self,
        adapter: &dyn IdentityProviderAdapter,
        interaction: &dyn AuthorizationInteraction,
    ) -> Result<(Identity, String), OAuth2Error> {
        let request = adapter.build_authorization_url()?;

        let callback = tokio::time::timeout(
            self.settings.interaction_timeout,
            interaction.authorize(&request),
        )
        .await
        .map_err(|_| {
            tracing::warn!("Authorization interaction timed out");
            OAuth2Error::Cancelled
        })?
        .ok_or(OAuth2Error::Cancelled)?;

        verify_state(&request.state, &callback.state)?;

        let tokens = adapter
            .exchange_code_for_token(&callback.code, request.code_verifier())
            .await?;
        let identity = adapter
            .fetch_identity(&tokens.access_token, tokens.id_token.as_deref())
            .await?;
        Ok((identity, tokens.access_token))
    }

    /// Resolve the user and open a pending session for the second factor.
    async fn complete_primary(
        &self,
        identity: &Identity,
        access_token: String,
    ) -> Result<AuthenticationResult, CoordinationError> {
        if !identity.is_complete() {
            tracing::error!(
                provider = %identity.provider_name,
                "Identity has no usable subject or username"
            );
            return Ok(AuthenticationResult::failed());
        }

        let (user, is_new_account) = self.resolve_identity(identity).await?;
        let session = self.sessions.create_pending_session(&user.user_id).await?;

        tracing::info!(
            provider = %identity.provider_name,
            user_id = %user.user_id,
            is_new_account,
            "Primary authentication succeeded"
        );
        Ok(AuthenticationResult::succeeded(
            session.session_id,
            access_token,
            is_new_account,
        ))
    }
}

fn failed(err: CoordinationError) -> AuthenticationResult {
    err.log();
    AuthenticationResult::failed()
}

fn absorb(provider: ProviderKind, err: OAuth2Error) -> AuthenticationResult {
    match &err {
        OAuth2Error::Cancelled => tracing::info!(%provider, "Authorization cancelled"),
        _ => tracing::error!(%provider, "OAuth2 sign-in failed: {}", err),
    }
    AuthenticationResult::failed()
}

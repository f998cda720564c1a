use crate::oauth2::Identity;
use crate::userdb::{User, UserError};

use super::errors::CoordinationError;
use super::orchestrator::AuthOrchestrator;

impl AuthOrchestrator {
    /// Lookup-or-create the local user for a provider identity.
    ///
    /// Users are keyed by resolved username. A new user gets the identity's
    /// hashed local id, no password and no second factor. Returns the user and
    /// whether it was created by this call.
    #[tracing::instrument(skip(self, identity), fields(provider = %identity.provider_name))]
    pub(super) async fn resolve_identity(
        &self,
        identity: &Identity,
    ) -> Result<(User, bool), CoordinationError> {
        let username = identity.resolved_username().trim();

        if let Some(existing) = self.directory.get_user_by_username(username).await? {
            tracing::debug!(user_id = %existing.user_id, "Resolved existing user");
            return Ok((self.refresh_profile(existing, identity).await?, false));
        }

        let user = User::new(
            identity.local_id(),
            username.to_string(),
            identity.email_address.clone(),
        );

        match self.directory.create_user(user).await {
            Ok(created) => {
                tracing::info!(user_id = %created.user_id, "Created user for provider identity");
                Ok((created, true))
            }
            Err(UserError::Conflict(reason)) => {
                // Lost a race with a concurrent attempt, or the subject was
                // seen before under another username
                tracing::debug!("User creation conflicted: {}", reason);
                if let Some(existing) = self.directory.get_user_by_username(username).await? {
                    return Ok((existing, false));
                }
                match self.directory.get_user_by_id(&identity.local_id()).await? {
                    Some(existing) => Ok((existing, false)),
                    None => Err(UserError::Conflict(reason).into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Fill in an email the local record is missing. Nothing else is touched.
    async fn refresh_profile(
        &self,
        mut user: User,
        identity: &Identity,
    ) -> Result<User, CoordinationError> {
        if user.email_address.is_empty() && !identity.email_address.is_empty() {
            user.email_address = identity.email_address.clone();
            user = self.directory.update_user(user).await?;
            tracing::debug!(user_id = %user.user_id, "Filled missing email from provider");
        }
        Ok(user)
    }
}

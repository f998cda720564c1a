use uuid::Uuid;

use crate::userdb::{User, UserError};

use super::errors::CoordinationError;
use super::orchestrator::AuthOrchestrator;
use super::types::AuthenticationResult;

impl AuthOrchestrator {
    /// Username/password sign-in.
    ///
    /// An unknown username fails unless `auto_register` is set, in which case
    /// an account is created with the given password.
    #[tracing::instrument(skip(self, password))]
    pub async fn authenticate_with_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthenticationResult, CoordinationError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Ok(AuthenticationResult::failed());
        }

        let Some(user) = self.directory.get_user_by_username(username).await? else {
            if self.settings.auto_register {
                return self.register_with_password(username, password).await;
            }
            tracing::info!("Password sign-in for unknown username");
            return Ok(AuthenticationResult::failed());
        };

        let verified = user
            .password_hash
            .as_deref()
            .is_some_and(|hash| self.hasher.verify(password, hash));
        if !verified {
            tracing::info!(user_id = %user.user_id, "Password sign-in rejected");
            return Ok(AuthenticationResult::failed());
        }

        let session = self.sessions.create_pending_session(&user.user_id).await?;
        Ok(AuthenticationResult::succeeded(
            session.session_id,
            String::new(),
            false,
        ))
    }

    async fn register_with_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthenticationResult, CoordinationError> {
        let mut user = User::new(Uuid::new_v4().to_string(), username.to_string(), String::new());
        user.password_hash = Some(self.hasher.hash(password)?);

        let user = match self.directory.create_user(user).await {
            Ok(user) => user,
            Err(UserError::Conflict(_)) => {
                // Someone registered the name in the meantime
                return Ok(AuthenticationResult::failed());
            }
            Err(e) => return Err(e.into()),
        };
        tracing::info!(user_id = %user.user_id, "Registered user through password sign-in");

        let session = self.sessions.create_pending_session(&user.user_id).await?;
        Ok(AuthenticationResult::succeeded(
            session.session_id,
            String::new(),
            true,
        ))
    }
}

use crate::totp::{CodePrompt, TwoFactorContext};
use crate::userdb::UserError;

use super::errors::CoordinationError;
use super::orchestrator::AuthOrchestrator;

impl AuthOrchestrator {
    /// Second-factor gate for a session opened by a primary sign-in.
    ///
    /// Users without a secret go through setup, others through verification.
    /// Success activates the session; failure or error ends it.
    #[tracing::instrument(skip(self, session_id, prompt))]
    pub async fn complete_second_factor(
        &self,
        session_id: &str,
        prompt: &dyn CodePrompt,
    ) -> Result<bool, CoordinationError> {
        let session = self.sessions.get_session(session_id).await?;
        let user = self
            .directory
            .get_user_by_id(&session.user_id)
            .await?
            .ok_or(UserError::NotFound)?;

        let context = TwoFactorContext {
            user_id: user.user_id.clone(),
            is_first_time_setup: !user.has_two_factor(),
        };

        match self.two_factor.setup_or_verify(&context, prompt).await {
            Ok(true) => {
                self.sessions.activate_session(session_id).await?;
                Ok(true)
            }
            Ok(false) => {
                tracing::info!(user_id = %user.user_id, "Second factor rejected");
                self.sessions.end_session(session_id).await?;
                Ok(false)
            }
            Err(e) => {
                self.sessions.end_session(session_id).await?;
                Err(e.into())
            }
        }
    }
}

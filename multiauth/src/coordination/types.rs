use serde::Serialize;

/// Uniform outcome of every primary sign-in path.
///
/// Constructed only through [`AuthenticationResult::failed`] and
/// [`AuthenticationResult::succeeded`], so a success always carries a session id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticationResult {
    pub authentication_succeeded: bool,
    /// Provider access token; empty for the password path
    #[serde(skip_serializing)]
    pub oauth_token: String,
    /// Pending until the second factor passes
    pub session_id: String,
    pub is_new_account: bool,
}

impl AuthenticationResult {
    pub fn failed() -> Self {
        Self {
            authentication_succeeded: false,
            oauth_token: String::new(),
            session_id: String::new(),
            is_new_account: false,
        }
    }

    pub(super) fn succeeded(
        session_id: String,
        oauth_token: String,
        is_new_account: bool,
    ) -> Self {
        debug_assert!(!session_id.is_empty());
        Self {
            authentication_succeeded: true,
            oauth_token,
            session_id,
            is_new_account,
        }
    }
}

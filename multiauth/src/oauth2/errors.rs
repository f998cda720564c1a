use crate::utils::UtilError;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum OAuth2Error {
    /// Transport-level failure, including timeouts. Never retried.
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    /// Provider answered with a non-success status or an error payload
    #[error("Provider rejected request ({status}): {message}")]
    ProviderRejected { status: u16, message: String },

    /// Provider answered with a payload we could not understand
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("State token mismatch")]
    StateMismatch,

    #[error("Authorization was cancelled before a code was received")]
    Cancelled,

    #[error("Provider configuration error: {0}")]
    Config(String),

    #[error("Id token error: {0}")]
    IdToken(String),

    #[error("Utils error: {0}")]
    Utils(#[from] UtilError),
}

impl OAuth2Error {
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::NetworkFailure(format!("request timed out: {err}"))
        } else {
            Self::NetworkFailure(err.to_string())
        }
    }
}

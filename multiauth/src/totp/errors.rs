use thiserror::Error;

use crate::userdb::UserError;
use crate::utils::UtilError;

#[derive(Debug, Error, Clone)]
pub enum TwoFactorError {
    /// The user store rejected or failed a read/write. Fatal to the current flow.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Precondition not met, e.g. verifying without an enrolled secret
    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("User not found")]
    NotFound,

    #[error("TOTP error: {0}")]
    Totp(String),

    #[error("Utils error: {0}")]
    Utils(#[from] UtilError),
}

impl From<UserError> for TwoFactorError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound => Self::NotFound,
            other => Self::Persistence(other.to_string()),
        }
    }
}

//! Error types for the coordination layer

use thiserror::Error;

use crate::oauth2::{OAuth2Error, ProviderKind};
use crate::session::SessionError;
use crate::storage::StorageError;
use crate::totp::TwoFactorError;
use crate::userdb::UserError;
use crate::utils::UtilError;

/// Errors that escape the orchestrator.
///
/// Provider failures never show up here; they become a failed
/// [`super::AuthenticationResult`]. What remains are store and configuration
/// failures the caller has to handle.
#[derive(Error, Debug)]
pub enum CoordinationError {
    /// No adapter registered for the provider
    #[error("Provider not configured: {0}")]
    UnknownProvider(ProviderKind),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error from the user database operations
    #[error("User error: {0}")]
    UserError(UserError),

    /// Error from OAuth2 operations
    #[error("OAuth2 error: {0}")]
    OAuth2Error(OAuth2Error),

    /// Error from Session operations
    #[error("Session error: {0}")]
    SessionError(SessionError),

    /// Error from two-factor operations
    #[error("Two-factor error: {0}")]
    TwoFactorError(TwoFactorError),

    /// Error from the cache store
    #[error("Storage error: {0}")]
    StorageError(StorageError),

    /// Error from utils operations
    #[error("Utils error: {0}")]
    UtilsError(UtilError),
}

impl CoordinationError {
    /// Log the error and return self
    ///
    /// This method logs the error with appropriate context and returns self,
    /// allowing for method chaining and explicit logging when needed.
    pub fn log(self) -> Self {
        match &self {
            Self::UnknownProvider(kind) => tracing::error!("Provider not configured: {}", kind),
            Self::Configuration(msg) => tracing::error!("Configuration error: {}", msg),
            Self::UserError(err) => tracing::error!("User error: {}", err),
            Self::OAuth2Error(err) => tracing::error!("OAuth2 error: {}", err),
            Self::SessionError(err) => tracing::error!("Session error: {}", err),
            Self::TwoFactorError(err) => tracing::error!("Two-factor error: {}", err),
            Self::StorageError(err) => tracing::error!("Storage error: {}", err),
            Self::UtilsError(err) => tracing::error!("Utils error: {}", err),
        }
        self
    }
}

// Custom From implementations that automatically log errors

impl From<OAuth2Error> for CoordinationError {
    fn from(err: OAuth2Error) -> Self {
        let error = Self::OAuth2Error(err);
        tracing::error!("{}", error);
        error
    }
}

impl From<SessionError> for CoordinationError {
    fn from(err: SessionError) -> Self {
        let error = Self::SessionError(err);
        tracing::error!("{}", error);
        error
    }
}

impl From<UserError> for CoordinationError {
    fn from(err: UserError) -> Self {
        let error = Self::UserError(err);
        tracing::error!("{}", error);
        error
    }
}

impl From<TwoFactorError> for CoordinationError {
    fn from(err: TwoFactorError) -> Self {
        let error = Self::TwoFactorError(err);
        tracing::error!("{}", error);
        error
    }
}

impl From<StorageError> for CoordinationError {
    fn from(err: StorageError) -> Self {
        let error = Self::StorageError(err);
        tracing::error!("{}", error);
        error
    }
}

impl From<UtilError> for CoordinationError {
    fn from(err: UtilError) -> Self {
        let error = Self::UtilsError(err);
        tracing::error!("{}", error);
        error
    }
}

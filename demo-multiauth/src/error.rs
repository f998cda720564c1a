use axum::http::StatusCode;
use multiauth::CoordinationError;

/// Helper trait for converting errors to a standard response error format
pub(crate) trait IntoResponseError<T> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)>;
}

impl<T> IntoResponseError<T> for Result<T, CoordinationError> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)> {
        self.map_err(|e| {
            let status = match e {
                CoordinationError::UnknownProvider(_) => StatusCode::NOT_FOUND,
                CoordinationError::OAuth2Error(_) => StatusCode::BAD_REQUEST,
                CoordinationError::TwoFactorError(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, e.log().to_string())
        })
    }
}

impl<T> IntoResponseError<T> for Result<T, tokio::task::JoinError> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)> {
        self.map_err(|e| {
            tracing::error!("Authentication task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication task failed".to_string(),
            )
        })
    }
}

//! Unverified claim extraction from OIDC ID tokens.
//!
//! The ID token arrives over the same TLS channel as the access token, directly
//! from the token endpoint, so its claims are only used as a fallback source of
//! profile data when the profile endpoint fails or returns an incomplete body.

use serde_json::Value;

use crate::oauth2::errors::OAuth2Error;
use crate::utils::base64url_decode;

/// Decode the payload segment of a JWT into a JSON object.
pub(crate) fn decode_id_token_claims(id_token: &str) -> Result<Value, OAuth2Error> {
    let segments: Vec<&str> = id_token.split('.').collect();
    if segments.len() != 3 {
        return Err(OAuth2Error::IdToken(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    }

    // Tolerate padded segments
    let bytes = base64url_decode(segments[1].trim_end_matches('='))
        .map_err(|e| OAuth2Error::IdToken(format!("invalid payload: {e}")))?;

    let claims: Value = serde_json::from_slice(&bytes)
        .map_err(|e| OAuth2Error::IdToken(format!("invalid JSON payload: {e}")))?;

    if !claims.is_object() {
        return Err(OAuth2Error::IdToken("payload is not a JSON object".to_string()));
    }
    Ok(claims)
}

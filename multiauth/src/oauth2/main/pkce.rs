use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::oauth2::errors::OAuth2Error;
use crate::utils::{UtilError, base64url_encode, gen_random_string};

/// Bytes of entropy behind every verifier and state token
const PKCE_VERIFIER_BYTES: usize = 32;
const STATE_TOKEN_BYTES: usize = 32;

/// Verifier/challenge pair owned by a single authorization attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
}

/// Generate a fresh PKCE pair (S256).
pub fn generate_verifier_and_challenge() -> Result<PkcePair, UtilError> {
    let verifier = gen_random_string(PKCE_VERIFIER_BYTES)?;
    let challenge = challenge_for(&verifier);
    Ok(PkcePair {
        verifier,
        challenge,
    })
}

/// SHA-256 of the verifier, base64url without padding.
pub fn challenge_for(verifier: &str) -> String {
    base64url_encode(Sha256::digest(verifier.as_bytes()))
}

/// Opaque anti-forgery token for the `state` parameter.
pub fn generate_state_token() -> Result<String, UtilError> {
    gen_random_string(STATE_TOKEN_BYTES)
}

/// Compare the returned state with the one sent, in constant time.
pub(crate) fn verify_state(expected: &str, returned: &str) -> Result<(), OAuth2Error> {
    if expected.is_empty() || !bool::from(expected.as_bytes().ct_eq(returned.as_bytes())) {
        tracing::warn!("State mismatch on authorization callback");
        return Err(OAuth2Error::StateMismatch);
    }
    Ok(())
}

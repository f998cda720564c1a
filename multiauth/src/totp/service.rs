use std::sync::Arc;
use totp_rs::{Algorithm, Secret, TOTP};

use crate::userdb::{User, UserDirectory};
use crate::utils::gen_random_bytes;

use super::errors::TwoFactorError;
use super::qr::QrRenderer;
use super::types::{CodePrompt, Enrollment, TwoFactorContext};

/// TOTP configuration constants
const TOTP_DIGITS: usize = 6;
const TOTP_STEP: u64 = 30;
const SECRET_BYTES: usize = 20;
/// The code entered right after enrollment must match the current step exactly
const SETUP_SKEW: u8 = 0;
/// Tolerate one step of clock drift at login
const VERIFY_SKEW: u8 = 1;

/// TOTP enrollment and verification against secrets stored on [`User`] records.
pub struct TwoFactorService {
    directory: Arc<dyn UserDirectory>,
    qr_renderer: Arc<dyn QrRenderer>,
    issuer: String,
}

impl TwoFactorService {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        qr_renderer: Arc<dyn QrRenderer>,
        issuer: impl Into<String>,
    ) -> Self {
        Self {
            directory,
            qr_renderer,
            issuer: issuer.into(),
        }
    }

    /// Run one second-factor step.
    ///
    /// Setup issues and persists a new secret, shows it through `prompt` and
    /// checks one code against it. Verify checks one code against the stored
    /// secret and fails with [`TwoFactorError::Argument`] if there is none.
    #[tracing::instrument(skip(self, prompt), fields(user_id = %context.user_id, setup = context.is_first_time_setup))]
    pub async fn setup_or_verify(
        &self,
        context: &TwoFactorContext,
        prompt: &dyn CodePrompt,
    ) -> Result<bool, TwoFactorError> {
        if context.is_first_time_setup {
            let enrollment = self.enroll(&context.user_id).await?;
            let Some(code) = prompt.request_code(Some(&enrollment)).await else {
                tracing::debug!("No code submitted after enrollment");
                return Ok(false);
            };
            check_code(&enrollment.secret, &code, SETUP_SKEW)
        } else {
            let secret = self.stored_secret(&context.user_id).await?;
            let Some(code) = prompt.request_code(None).await else {
                tracing::debug!("No code submitted");
                return Ok(false);
            };
            check_code(&secret, &code, VERIFY_SKEW)
        }
    }

    /// Issue a fresh secret, persist it on the user and return what to show.
    ///
    /// Replaces any existing secret; this is the explicit re-enrollment path.
    #[tracing::instrument(skip(self))]
    pub async fn enroll(&self, user_id: &str) -> Result<Enrollment, TwoFactorError> {
        let mut user = self.load_user(user_id).await?;

        let secret = generate_secret()?;
        let provisioning_uri = self.provisioning_uri(&user.username, &secret);
        let qr_png = match self.qr_renderer.render(&provisioning_uri) {
            Ok(png) => Some(png),
            Err(e) => {
                tracing::warn!("QR rendering failed, secret still usable: {}", e);
                None
            }
        };

        user.two_factor_secret = Some(secret.clone());
        self.directory.update_user(user).await.map_err(|e| {
            tracing::error!("Failed to persist two-factor secret: {}", e);
            TwoFactorError::Persistence(e.to_string())
        })?;

        tracing::info!("Two-factor secret enrolled");
        Ok(Enrollment {
            secret,
            provisioning_uri,
            qr_png,
        })
    }

    /// Check a login-time code against the stored secret. Never mutates the secret.
    #[tracing::instrument(skip(self, code))]
    pub async fn verify_code(&self, user_id: &str, code: &str) -> Result<bool, TwoFactorError> {
        let secret = self.stored_secret(user_id).await?;
        check_code(&secret, code, VERIFY_SKEW)
    }

    /// `otpauth://totp/{issuer}:{username}?secret={secret}&issuer={issuer}`
    pub fn provisioning_uri(&self, username: &str, secret: &str) -> String {
        let issuer = urlencoding::encode(&self.issuer);
        format!(
            "otpauth://totp/{issuer}:{}?secret={secret}&issuer={issuer}",
            urlencoding::encode(username)
        )
    }

    async fn load_user(&self, user_id: &str) -> Result<User, TwoFactorError> {
        self.directory
            .get_user_by_id(user_id)
            .await?
            .ok_or(TwoFactorError::NotFound)
    }

    async fn stored_secret(&self, user_id: &str) -> Result<String, TwoFactorError> {
        let user = self.load_user(user_id).await?;
        match user.two_factor_secret {
            Some(secret) if !secret.is_empty() => Ok(secret),
            _ => Err(TwoFactorError::Argument(
                "no two-factor secret enrolled; run setup first".to_string(),
            )),
        }
    }
}

fn generate_secret() -> Result<String, TwoFactorError> {
    let bytes = gen_random_bytes(SECRET_BYTES)?;
    Ok(Secret::Raw(bytes).to_encoded().to_string())
}

fn totp_for(secret: &str, skew: u8) -> Result<TOTP, TwoFactorError> {
    let bytes = Secret::Encoded(secret.to_string())
        .to_bytes()
        .map_err(|e| TwoFactorError::Totp(format!("invalid stored secret: {e:?}")))?;
    // Label fields do not take part in code computation
    Ok(TOTP::new_unchecked(
        Algorithm::SHA1,
        TOTP_DIGITS,
        skew,
        TOTP_STEP,
        bytes,
        None,
        String::new(),
    ))
}

fn check_code(secret: &str, code: &str, skew: u8) -> Result<bool, TwoFactorError> {
    let code = code.trim();
    if code.len() != TOTP_DIGITS || !code.bytes().all(|b| b.is_ascii_digit()) {
        tracing::debug!("Rejecting malformed code");
        return Ok(false);
    }
    let totp = totp_for(secret, skew)?;
    let valid = totp.check_current(code).unwrap_or(false);
    tracing::debug!(valid, "Code checked");
    Ok(valid)
}

#[cfg(test)]
pub(crate) fn current_code(secret: &str) -> String {
    totp_for(secret, 0).unwrap().generate_current().unwrap()
}

use totp_rs::TOTP;

use super::errors::TwoFactorError;

/// Turns a provisioning URI into image bytes.
pub trait QrRenderer: Send + Sync {
    fn render(&self, uri: &str) -> Result<Vec<u8>, TwoFactorError>;
}

/// PNG renderer backed by totp-rs.
#[derive(Debug, Default, Clone, Copy)]
pub struct PngQrRenderer;

impl QrRenderer for PngQrRenderer {
    fn render(&self, uri: &str) -> Result<Vec<u8>, TwoFactorError> {
        let totp = TOTP::from_url_unchecked(uri)
            .map_err(|e| TwoFactorError::Totp(format!("invalid provisioning uri: {e}")))?;
        totp.get_qr_png()
            .map_err(|e| TwoFactorError::Totp(format!("QR rendering failed: {e}")))
    }
}

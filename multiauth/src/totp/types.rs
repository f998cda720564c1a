use async_trait::async_trait;
use std::fmt;

/// Selects enrollment (`is_first_time_setup`) or login-time verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwoFactorContext {
    pub user_id: String,
    pub is_first_time_setup: bool,
}

impl TwoFactorContext {
    pub fn setup(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            is_first_time_setup: true,
        }
    }

    pub fn verify(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            is_first_time_setup: false,
        }
    }
}

/// Material shown to the user when a new secret is issued.
#[derive(Clone)]
pub struct Enrollment {
    /// Base32 shared secret, for manual entry
    pub secret: String,
    pub provisioning_uri: String,
    /// PNG QR code of `provisioning_uri`; `None` if rendering failed
    pub qr_png: Option<Vec<u8>>,
}

impl fmt::Debug for Enrollment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enrollment")
            .field("secret", &"<redacted>")
            .field("provisioning_uri", &"<redacted>")
            .field("qr_png", &self.qr_png.as_ref().map(Vec::len))
            .finish()
    }
}

/// Asks the user for a one-time code.
///
/// During setup the enrollment is passed so it can be displayed first.
/// `None` means the user gave up.
#[async_trait]
pub trait CodePrompt: Send + Sync {
    async fn request_code(&self, enrollment: Option<&Enrollment>) -> Option<String>;
}

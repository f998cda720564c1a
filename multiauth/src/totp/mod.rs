mod errors;
mod qr;
mod service;
mod types;

pub use errors::TwoFactorError;
pub use qr::{PngQrRenderer, QrRenderer};
pub use service::TwoFactorService;
pub use types::{CodePrompt, Enrollment, TwoFactorContext};

#[cfg(test)]
pub(crate) use service::current_code;

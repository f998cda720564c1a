//! Authentication orchestration: one entry point per sign-in path, identity
//! resolution, and the second-factor gate in front of session activation.

mod errors;
mod oauth2;
mod orchestrator;
mod password;
mod two_factor;
mod types;
mod user;

pub use errors::CoordinationError;
pub use orchestrator::AuthOrchestrator;
pub use types::AuthenticationResult;

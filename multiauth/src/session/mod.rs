mod errors;
mod main;
mod types;

pub use errors::SessionError;
pub use main::SessionManager;
pub use types::Session;

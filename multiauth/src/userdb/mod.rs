mod errors;
mod password;
mod types;
mod user;

pub use errors::UserError;
pub use password::{Argon2PasswordHasher, PasswordHasher};
pub use types::{Role, User};
pub use user::{InMemoryUserDirectory, SqliteUserDirectory, UserDirectory, user_directory_from_env};

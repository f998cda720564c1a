use async_trait::async_trait;
use std::{env, sync::Arc, sync::LazyLock};

use crate::userdb::{errors::UserError, types::User};

use super::memory::InMemoryUserDirectory;
use super::sqlite::SqliteUserDirectory;

/// "memory" or "sqlite". Default: "memory"
static GENERIC_DATA_STORE_TYPE: LazyLock<String> = LazyLock::new(|| {
    env::var("GENERIC_DATA_STORE_TYPE").unwrap_or_else(|_| "memory".to_string())
});

/// Default: "sqlite:multiauth.db"
static GENERIC_DATA_STORE_URL: LazyLock<String> = LazyLock::new(|| {
    env::var("GENERIC_DATA_STORE_URL").unwrap_or_else(|_| "sqlite:multiauth.db".to_string())
});

/// Local user records.
///
/// Lookups return `Ok(None)` for a miss; writes fail with
/// [`UserError::Conflict`] or [`UserError::NotFound`].
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_user_by_id(&self, user_id: &str) -> Result<Option<User>, UserError>;

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, UserError>;

    /// Insert a new user. Fails with `Conflict` if the id or username is taken.
    async fn create_user(&self, user: User) -> Result<User, UserError>;

    /// Replace an existing user. Fails with `NotFound` if it does not exist.
    async fn update_user(&self, user: User) -> Result<User, UserError>;

    /// Whether the user may perform `action` on `resource`. Unknown users may not.
    async fn validate_action(
        &self,
        user_id: &str,
        resource: &str,
        action: &str,
    ) -> Result<bool, UserError> {
        Ok(self
            .get_user_by_id(user_id)
            .await?
            .is_some_and(|user| user.role.allows(resource, action)))
    }
}

/// Build the directory selected by `GENERIC_DATA_STORE_TYPE` / `GENERIC_DATA_STORE_URL`.
pub async fn user_directory_from_env() -> Result<Arc<dyn UserDirectory>, UserError> {
    let store_type = GENERIC_DATA_STORE_TYPE.as_str();
    tracing::info!("Initializing user directory with type: {}", store_type);

    match store_type {
        "memory" => Ok(Arc::new(InMemoryUserDirectory::new())),
        "sqlite" => {
            let directory = SqliteUserDirectory::connect(&GENERIC_DATA_STORE_URL).await?;
            Ok(Arc::new(directory))
        }
        t => Err(UserError::Storage(format!(
            "Unsupported store type: {t}. Supported types are 'memory' and 'sqlite'"
        ))),
    }
}

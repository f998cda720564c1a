use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::userdb::{errors::UserError, types::User};

use super::store_type::UserDirectory;

/// Users keyed by id; the username index is checked under the same lock.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: Mutex<HashMap<String, User>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn get_user_by_id(&self, user_id: &str) -> Result<Option<User>, UserError> {
        Ok(self.users.lock().await.get(user_id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, UserError> {
        Ok(self
            .users
            .lock()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    #[tracing::instrument(skip(self, user), fields(user_id = %user.user_id, username = %user.username))]
    async fn create_user(&self, user: User) -> Result<User, UserError> {
        let mut users = self.users.lock().await;
        if users.contains_key(&user.user_id) {
            return Err(UserError::Conflict(format!("user id {}", user.user_id)));
        }
        if users.values().any(|u| u.username == user.username) {
            return Err(UserError::Conflict(format!("username {}", user.username)));
        }
        users.insert(user.user_id.clone(), user.clone());
        tracing::debug!("User created");
        Ok(user)
    }

    #[tracing::instrument(skip(self, user), fields(user_id = %user.user_id))]
    async fn update_user(&self, mut user: User) -> Result<User, UserError> {
        let mut users = self.users.lock().await;
        if !users.contains_key(&user.user_id) {
            return Err(UserError::NotFound);
        }
        if users
            .values()
            .any(|u| u.username == user.username && u.user_id != user.user_id)
        {
            return Err(UserError::Conflict(format!("username {}", user.username)));
        }
        user.updated_at = Utc::now();
        users.insert(user.user_id.clone(), user.clone());
        Ok(user)
    }
}

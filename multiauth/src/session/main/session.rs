use chrono::{Duration as ChronoDuration, Utc};
use std::{sync::Arc, time::Duration};
use tokio::sync::RwLock;

use crate::session::errors::SessionError;
use crate::session::types::Session;
use crate::storage::{CacheData, CacheStore};
use crate::userdb::{UserDirectory, UserError};
use crate::utils::gen_random_string;

const SESSION_PREFIX: &str = "session";
const USER_INDEX_PREFIX: &str = "session_user";

/// Session lifecycle over a [`CacheStore`].
///
/// At most one session exists per user: creating a session supersedes the
/// previous one. Read-modify-write sequences hold the write lock, so two
/// concurrent logins for the same user leave exactly one of them standing.
/// Lookups share the read lock.
pub struct SessionManager {
    store: RwLock<Box<dyn CacheStore>>,
    directory: Arc<dyn UserDirectory>,
    max_age: Duration,
}

impl SessionManager {
    pub fn new(
        store: Box<dyn CacheStore>,
        directory: Arc<dyn UserDirectory>,
        max_age: Duration,
    ) -> Self {
        Self {
            store: RwLock::new(store),
            directory,
            max_age,
        }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Create an active session for `user_id`.
    #[tracing::instrument(skip(self))]
    pub async fn create_session(&self, user_id: &str) -> Result<Session, SessionError> {
        self.insert_session(user_id, true).await
    }

    /// Create a session that does not authorize anything until activated.
    #[tracing::instrument(skip(self))]
    pub async fn create_pending_session(&self, user_id: &str) -> Result<Session, SessionError> {
        self.insert_session(user_id, false).await
    }

    async fn insert_session(&self, user_id: &str, is_active: bool) -> Result<Session, SessionError> {
        if self.directory.get_user_by_id(user_id).await?.is_none() {
            tracing::warn!("Refusing to create a session for unknown user");
            return Err(UserError::NotFound.into());
        }

        let now = Utc::now();
        let expires_at = ChronoDuration::from_std(self.max_age)
            .ok()
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                SessionError::Lifetime(format!("{}s is out of range", self.max_age.as_secs()))
            })?;
        let ttl = usize::try_from(self.max_age.as_secs())
            .map_err(|e| SessionError::Lifetime(e.to_string()))?;
        let session = Session {
            session_id: gen_random_string(32)?,
            user_id: user_id.to_string(),
            is_active,
            created_at: now,
            expires_at,
        };

        let mut store = self.store.write().await;

        if let Some(previous) = store.get(USER_INDEX_PREFIX, user_id).await? {
            tracing::debug!("Superseding previous session for user");
            store.remove(SESSION_PREFIX, &previous.value).await?;
        }

        store
            .put_with_ttl(SESSION_PREFIX, &session.session_id, (&session).try_into()?, ttl)
            .await?;
        store
            .put_with_ttl(
                USER_INDEX_PREFIX,
                user_id,
                CacheData {
                    value: session.session_id.clone(),
                },
                ttl,
            )
            .await?;

        tracing::info!(is_active, "Session created");
        Ok(session)
    }

    /// Mark a pending session active, keeping its original expiry.
    #[tracing::instrument(skip(self, session_id))]
    pub async fn activate_session(&self, session_id: &str) -> Result<Session, SessionError> {
        let mut store = self.store.write().await;
        let mut session = load_session(&**store, session_id)
            .await?
            .ok_or(SessionError::NotFound)?;

        if !session.is_active {
            session.is_active = true;
            store
                .put_with_ttl(
                    SESSION_PREFIX,
                    session_id,
                    (&session).try_into()?,
                    session.remaining_ttl(),
                )
                .await?;
            tracing::info!(user_id = %session.user_id, "Session activated");
        }
        Ok(session)
    }

    /// End a session. Returns false if it did not exist.
    #[tracing::instrument(skip(self, session_id))]
    pub async fn end_session(&self, session_id: &str) -> Result<bool, SessionError> {
        let mut store = self.store.write().await;
        let Some(session) = load_session(&**store, session_id).await? else {
            return Ok(false);
        };

        store.remove(SESSION_PREFIX, session_id).await?;

        let indexed = store.get(USER_INDEX_PREFIX, &session.user_id).await?;
        if indexed.is_some_and(|d| d.value == session_id) {
            store.remove(USER_INDEX_PREFIX, &session.user_id).await?;
        }

        tracing::info!(user_id = %session.user_id, "Session ended");
        Ok(true)
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Session, SessionError> {
        let store = self.store.read().await;
        load_session(&**store, session_id)
            .await?
            .ok_or(SessionError::NotFound)
    }

    pub async fn get_session_by_user_id(&self, user_id: &str) -> Result<Session, SessionError> {
        let store = self.store.read().await;
        let session_id = store
            .get(USER_INDEX_PREFIX, user_id)
            .await?
            .ok_or(SessionError::NotFound)?
            .value;

        load_session(&**store, &session_id)
            .await?
            .filter(|s| s.user_id == user_id)
            .ok_or(SessionError::NotFound)
    }

    /// True iff the session exists, has not expired and is active.
    pub async fn validate_session(&self, session_id: &str) -> Result<bool, SessionError> {
        match self.get_session(session_id).await {
            Ok(session) => Ok(session.is_active),
            Err(SessionError::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }

    #[tracing::instrument(skip(self, session_id))]
    pub async fn authorize_action(
        &self,
        session_id: &str,
        resource: &str,
        action: &str,
    ) -> Result<bool, SessionError> {
        let session = match self.get_session(session_id).await {
            Ok(session) if session.is_active => session,
            Ok(_) | Err(SessionError::NotFound) => return Ok(false),
            Err(e) => return Err(e),
        };

        let allowed = self
            .directory
            .validate_action(&session.user_id, resource, action)
            .await?;
        tracing::debug!(user_id = %session.user_id, allowed, "Action checked");
        Ok(allowed)
    }
}

async fn load_session(
    store: &dyn CacheStore,
    session_id: &str,
) -> Result<Option<Session>, SessionError> {
    if session_id.is_empty() {
        return Ok(None);
    }
    let Some(data) = store.get(SESSION_PREFIX, session_id).await? else {
        return Ok(None);
    };
    let session = Session::try_from(data)?;
    if session.is_expired() {
        return Ok(None);
    }
    Ok(Some(session))
}

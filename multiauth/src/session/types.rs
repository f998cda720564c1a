use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::errors::SessionError;
use crate::storage::CacheData;

/// Server-side record binding a session id to a user.
///
/// A session starts inactive when it still waits for the second factor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub user_id: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// Whole seconds left before expiry, zero when already expired.
    pub(super) fn remaining_ttl(&self) -> usize {
        usize::try_from((self.expires_at - Utc::now()).num_seconds()).unwrap_or(0)
    }
}

impl TryFrom<&Session> for CacheData {
    type Error = SessionError;

    fn try_from(session: &Session) -> Result<Self, Self::Error> {
        Ok(CacheData::from_json(session)?)
    }
}

impl TryFrom<CacheData> for Session {
    type Error = SessionError;

    fn try_from(data: CacheData) -> Result<Self, Self::Error> {
        Ok(data.to_json()?)
    }
}

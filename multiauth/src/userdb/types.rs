use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::UserError;

/// Represents a local user, shared by every sign-in path
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Unique, stable identifier; the join key across providers
    pub user_id: String,
    /// Unique login name
    pub username: String,
    /// PHC string; `None` for accounts that only sign in through a provider
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    /// Base32 TOTP secret; `None` until enrollment
    #[serde(skip_serializing)]
    pub two_factor_secret: Option<String>,
    pub email_address: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new member without password or second factor
    pub fn new(user_id: String, username: String, email_address: String) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            username,
            password_hash: None,
            two_factor_secret: None,
            email_address,
            role: Role::Member,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_two_factor(&self) -> bool {
        self.two_factor_secret
            .as_deref()
            .is_some_and(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
    Guest,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Member => "member",
            Role::Guest => "guest",
        }
    }

    /// Fixed permission table.
    ///
    /// Admins may do anything. Members may read, create and update anything
    /// outside the `admin` resource. Guests may only read.
    pub fn allows(&self, resource: &str, action: &str) -> bool {
        match self {
            Role::Admin => true,
            Role::Member => {
                resource != "admin" && matches!(action, "read" | "create" | "update")
            }
            Role::Guest => resource != "admin" && action == "read",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = UserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "member" => Ok(Role::Member),
            "guest" => Ok(Role::Guest),
            other => Err(UserError::InvalidData(format!("unknown role: {other}"))),
        }
    }
}

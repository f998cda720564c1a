use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, Pool, Sqlite};
use std::str::FromStr;
use std::{env, sync::LazyLock};

use crate::userdb::{
    errors::UserError,
    types::{Role, User},
};

use super::store_type::UserDirectory;

/// Table prefix from environment variable
static DB_TABLE_PREFIX: LazyLock<String> =
    LazyLock::new(|| env::var("DB_TABLE_PREFIX").unwrap_or_else(|_| "ma_".to_string()));

static DB_TABLE_USERS: LazyLock<String> = LazyLock::new(|| format!("{}users", *DB_TABLE_PREFIX));

#[derive(Debug, Clone)]
pub struct SqliteUserDirectory {
    pool: Pool<Sqlite>,
}

#[derive(FromRow)]
struct UserRow {
    user_id: String,
    username: String,
    password_hash: Option<String>,
    two_factor_secret: Option<String>,
    email_address: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = UserError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            user_id: row.user_id,
            username: row.username,
            password_hash: row.password_hash,
            two_factor_secret: row.two_factor_secret,
            email_address: row.email_address,
            role: Role::from_str(&row.role)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl SqliteUserDirectory {
    /// Connect and create the users table if missing.
    ///
    /// `sqlite::memory:` databases live in a single connection that is never recycled.
    pub async fn connect(url: &str) -> Result<Self, UserError> {
        let opts = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let mut pool_options = SqlitePoolOptions::new();
        if url.contains(":memory:") {
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = pool_options.connect_with(opts).await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: Pool<Sqlite>) -> Result<Self, UserError> {
        create_tables_sqlite(&pool).await?;
        Ok(Self { pool })
    }
}

async fn create_tables_sqlite(pool: &Pool<Sqlite>) -> Result<(), UserError> {
    let table_name = DB_TABLE_USERS.as_str();

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table_name} (
            user_id TEXT PRIMARY KEY NOT NULL,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT,
            two_factor_secret TEXT,
            email_address TEXT NOT NULL,
            role TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL
        )
        "#
    ))
    .execute(pool)
    .await?;

    Ok(())
}

#[async_trait]
impl UserDirectory for SqliteUserDirectory {
    async fn get_user_by_id(&self, user_id: &str) -> Result<Option<User>, UserError> {
        let table_name = DB_TABLE_USERS.as_str();

        sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT * FROM {table_name} WHERE user_id = ?
            "#
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, UserError> {
        let table_name = DB_TABLE_USERS.as_str();

        sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT * FROM {table_name} WHERE username = ?
            "#
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    #[tracing::instrument(skip(self, user), fields(user_id = %user.user_id, username = %user.username))]
    async fn create_user(&self, user: User) -> Result<User, UserError> {
        let table_name = DB_TABLE_USERS.as_str();

        sqlx::query(&format!(
            r#"
            INSERT INTO {table_name}
                (user_id, username, password_hash, two_factor_secret, email_address, role, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#
        ))
        .bind(&user.user_id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.two_factor_secret)
        .bind(&user.email_address)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        tracing::debug!("User created");
        Ok(user)
    }

    #[tracing::instrument(skip(self, user), fields(user_id = %user.user_id))]
    async fn update_user(&self, mut user: User) -> Result<User, UserError> {
        let table_name = DB_TABLE_USERS.as_str();
        user.updated_at = Utc::now();

        let result = sqlx::query(&format!(
            r#"
            UPDATE {table_name} SET
                username = ?,
                password_hash = ?,
                two_factor_secret = ?,
                email_address = ?,
                role = ?,
                updated_at = ?
            WHERE user_id = ?
            "#
        ))
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.two_factor_secret)
        .bind(&user.email_address)
        .bind(user.role.as_str())
        .bind(user.updated_at)
        .bind(&user.user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(UserError::NotFound);
        }
        Ok(user)
    }
}

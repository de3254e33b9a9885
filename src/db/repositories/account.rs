use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    Set, SqlErr,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::accounts;

/// Account data returned from the repository (without the password hash)
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub failed_login_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
    pub created_at: String,
    pub last_login_at: Option<String>,
}

impl Account {
    #[must_use]
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }
}

impl From<accounts::Model> for Account {
    fn from(model: accounts::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            username: model.username,
            failed_login_attempts: model.failed_login_attempts,
            locked_until: model.locked_until.as_deref().and_then(parse_timestamp),
            created_at: model.created_at,
            last_login_at: model.last_login_at,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InsertAccountError {
    #[error("email already registered")]
    DuplicateEmail,

    #[error("username already taken")]
    DuplicateUsername,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Outcome of recording a failed login.
#[derive(Debug, Clone, Copy)]
pub struct FailedLogin {
    pub attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
}

pub struct AccountRepository {
    conn: DatabaseConnection,
}

impl AccountRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<Account>> {
        let account = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query account by email")?;

        Ok(account.map(Account::from))
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<Account>> {
        let account = accounts::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query account by ID")?;

        Ok(account.map(Account::from))
    }

    /// Any account already holding this email or this username
    pub async fn find_conflicting(&self, email: &str, username: &str) -> Result<Option<Account>> {
        let account = accounts::Entity::find()
            .filter(
                Condition::any()
                    .add(accounts::Column::Email.eq(email))
                    .add(accounts::Column::Username.eq(username)),
            )
            .one(&self.conn)
            .await
            .context("Failed to query accounts for duplicates")?;

        Ok(account.map(Account::from))
    }

    pub async fn create(
        &self,
        email: &str,
        username: &str,
        password_hash: String,
    ) -> Result<Account, InsertAccountError> {
        let now = Utc::now().to_rfc3339();

        let active = accounts::ActiveModel {
            email: Set(email.to_string()),
            username: Set(username.to_string()),
            password_hash: Set(password_hash),
            failed_login_attempts: Set(0),
            locked_until: Set(None),
            password_reset_token_hash: Set(None),
            password_reset_expires_at: Set(None),
            created_at: Set(now.clone()),
            last_login_at: Set(Some(now.clone())),
            updated_at: Set(now),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(Account::from(model)),
            Err(err) => Err(classify_insert_error(err)),
        }
    }

    /// Verify a password against the stored hash.
    /// Argon2 is CPU-intensive, so the check runs on a blocking thread.
    pub async fn verify_password(&self, id: i32, password: &str) -> Result<bool> {
        let account = accounts::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query account for password verification")?;

        let Some(account) = account else {
            return Ok(false);
        };

        let password_hash = account.password_hash;
        let password = password.to_string();

        task::spawn_blocking(move || verify_password_hash(&password_hash, &password))
            .await
            .context("Password verification task panicked")?
    }

    /// Bump the failure counter, locking the account once it reaches `max_attempts`.
    /// The increment happens in SQL so concurrent failures are all counted.
    pub async fn record_failed_login(
        &self,
        id: i32,
        max_attempts: u32,
        lockout: chrono::Duration,
    ) -> Result<FailedLogin> {
        let now = Utc::now();

        accounts::Entity::update_many()
            .col_expr(
                accounts::Column::FailedLoginAttempts,
                Expr::col(accounts::Column::FailedLoginAttempts).add(1),
            )
            .col_expr(accounts::Column::UpdatedAt, Expr::value(now.to_rfc3339()))
            .filter(accounts::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to record failed login")?;

        let attempts = self.find_model(id).await?.failed_login_attempts;
        let threshold = i32::try_from(max_attempts).unwrap_or(i32::MAX);
        if attempts < threshold {
            return Ok(FailedLogin {
                attempts,
                locked_until: None,
            });
        }

        let until = now + lockout;
        let locked = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::LockedUntil,
                Expr::value(Some(until.to_rfc3339())),
            )
            .filter(accounts::Column::Id.eq(id))
            .filter(accounts::Column::FailedLoginAttempts.gte(threshold))
            .exec(&self.conn)
            .await
            .context("Failed to lock account")?;

        Ok(FailedLogin {
            attempts,
            locked_until: (locked.rows_affected > 0).then_some(until),
        })
    }

    /// Clears the failure counter and lock, and stamps `last_login_at`.
    pub async fn record_successful_login(&self, id: i32) -> Result<Account> {
        let account = self.find_model(id).await?;
        let now = Utc::now().to_rfc3339();

        let mut active: accounts::ActiveModel = account.into();
        active.failed_login_attempts = Set(0);
        active.locked_until = Set(None);
        active.last_login_at = Set(Some(now.clone()));
        active.updated_at = Set(now);
        let model = active.update(&self.conn).await?;

        Ok(Account::from(model))
    }

    pub async fn set_reset_token(
        &self,
        id: i32,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let account = self.find_model(id).await?;

        let mut active: accounts::ActiveModel = account.into();
        active.password_reset_token_hash = Set(Some(token_hash.to_string()));
        active.password_reset_expires_at = Set(Some(expires_at.to_rfc3339()));
        active.updated_at = Set(Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Account holding an unexpired reset token with this digest
    pub async fn find_by_reset_token(&self, token_hash: &str) -> Result<Option<Account>> {
        let account = accounts::Entity::find()
            .filter(accounts::Column::PasswordResetTokenHash.eq(token_hash))
            .one(&self.conn)
            .await
            .context("Failed to query account by reset token")?;

        let now = Utc::now();
        Ok(account
            .filter(|a| {
                a.password_reset_expires_at
                    .as_deref()
                    .and_then(parse_timestamp)
                    .is_some_and(|expires| expires > now)
            })
            .map(Account::from))
    }

    /// Replace the password and burn the reset token.
    pub async fn complete_password_reset(&self, id: i32, new_hash: String) -> Result<()> {
        let account = self.find_model(id).await?;

        let mut active: accounts::ActiveModel = account.into();
        active.password_hash = Set(new_hash);
        active.password_reset_token_hash = Set(None);
        active.password_reset_expires_at = Set(None);
        active.failed_login_attempts = Set(0);
        active.locked_until = Set(None);
        active.updated_at = Set(Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }

    async fn find_model(&self, id: i32) -> Result<accounts::Model> {
        accounts::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query account")?
            .ok_or_else(|| anyhow::anyhow!("Account not found: {id}"))
    }
}

fn classify_insert_error(err: DbErr) -> InsertAccountError {
    if let Some(SqlErr::UniqueConstraintViolation(message)) = err.sql_err() {
        if message.contains("email") {
            return InsertAccountError::DuplicateEmail;
        }
        if message.contains("username") {
            return InsertAccountError::DuplicateUsername;
        }
    }
    InsertAccountError::Other(anyhow::Error::new(err).context("Failed to insert account"))
}

#[must_use]
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Hash a password using Argon2id with the configured cost parameters.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Parameters are read back from the PHC string, so any cost setting verifies.
pub fn verify_password_hash(password_hash: &str, password: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap_config() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        }
    }

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("Sup3rSecret", &cheap_config()).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password_hash(&hash, "Sup3rSecret").unwrap());
        assert!(!verify_password_hash(&hash, "sup3rsecret").unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let config = cheap_config();
        let a = hash_password("Sup3rSecret", &config).unwrap();
        let b = hash_password("Sup3rSecret", &config).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn lock_state_depends_on_time() {
        let now = Utc::now();
        let account = Account {
            id: 1,
            email: "a@b.io".to_string(),
            username: "abc".to_string(),
            failed_login_attempts: 5,
            locked_until: Some(now + chrono::Duration::minutes(1)),
            created_at: now.to_rfc3339(),
            last_login_at: None,
        };
        assert!(account.is_locked_at(now));
        assert!(!account.is_locked_at(now + chrono::Duration::minutes(2)));
    }
}

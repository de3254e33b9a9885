//! Domain service for account registration, login and sessions.
//!
//! Handles signup, credential checks with lockout, session token resolution
//! and the password reset flow.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::db::Account;
use crate::services::token::TokenError;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("Email already in use")]
    EmailTaken,

    #[error("Username already taken")]
    UsernameTaken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is temporarily locked. Please try again later.")]
    AccountLocked,

    #[error("Token expired, please log in again")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("User not found")]
    AccountNotFound,

    #[error("Invalid or expired reset token")]
    InvalidResetToken,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        if err.is_expired() {
            Self::TokenExpired
        } else {
            Self::InvalidToken
        }
    }
}

/// Account fields that are safe to hand to clients.
#[derive(Debug, Clone, Serialize)]
pub struct PublicProfile {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub created_at: String,
    pub last_login_at: Option<String>,
}

impl From<Account> for PublicProfile {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email,
            username: account.username,
            created_at: account.created_at,
            last_login_at: account.last_login_at,
        }
    }
}

/// A freshly issued session.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub profile: PublicProfile,
}

/// Raw reset token for out-of-band delivery. Only its digest is stored.
#[derive(Debug, Clone)]
pub struct PasswordResetTicket {
    pub account_id: i32,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates an account and signs it in.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] for malformed fields and
    /// [`AuthError::EmailTaken`] / [`AuthError::UsernameTaken`] for duplicates.
    async fn register(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> Result<AuthSession, AuthError>;

    /// Verifies credentials, tracking failures towards a lockout.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::AccountLocked`] while a lockout window is open,
    /// even when the password is correct.
    async fn authenticate(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    /// Resolves a session token to the account it was issued for.
    async fn resolve_session(&self, token: &str) -> Result<PublicProfile, AuthError>;

    /// Issues a reset token when the account exists. Callers must respond the
    /// same way whether or not a ticket comes back.
    async fn request_password_reset(
        &self,
        email: &str,
    ) -> Result<Option<PasswordResetTicket>, AuthError>;

    /// Consumes a reset token and replaces the password.
    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError>;
}

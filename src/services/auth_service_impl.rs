//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::config::SecurityConfig;
use crate::db::{InsertAccountError, Store, hash_password_blocking, verify_password_blocking};
use crate::services::account_rules::{normalize_email, validate_password, validate_username};
use crate::services::auth_service::{
    AuthError, AuthService, AuthSession, PasswordResetTicket, PublicProfile,
};
use crate::services::token::TokenSigner;

pub struct SeaOrmAuthService {
    store: Store,
    tokens: TokenSigner,
    security: SecurityConfig,
    /// Hashed with the configured cost; checked when the email is unknown
    /// so both failure paths pay for one argon2 verification.
    dummy_hash: OnceCell<String>,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, tokens: TokenSigner, security: SecurityConfig) -> Self {
        Self {
            store,
            tokens,
            security,
            dummy_hash: OnceCell::const_new(),
        }
    }

    async fn burn_password_check(&self, password: &str) -> Result<(), AuthError> {
        let hash = self
            .dummy_hash
            .get_or_try_init(|| {
                let password = hex::encode(rand::random::<[u8; 16]>());
                async move { hash_password_blocking(&password, &self.security).await }
            })
            .await?;
        verify_password_blocking(hash, password).await?;
        Ok(())
    }

    fn issue_session(&self, profile: PublicProfile) -> Result<AuthSession, AuthError> {
        let token = self
            .tokens
            .issue(profile.id, &profile.email)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        Ok(AuthSession { token, profile })
    }
}

/// Reset tokens are stored as a SHA-256 hex digest.
#[must_use]
pub fn reset_token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> Result<AuthSession, AuthError> {
        let email = normalize_email(email).map_err(AuthError::Validation)?;
        validate_password(password).map_err(AuthError::Validation)?;
        let username = username.trim();
        validate_username(username).map_err(AuthError::Validation)?;

        if let Some(existing) = self.store.find_conflicting_account(&email, username).await? {
            return Err(if existing.email == email {
                AuthError::EmailTaken
            } else {
                AuthError::UsernameTaken
            });
        }

        let password_hash = hash_password_blocking(password, &self.security).await?;

        // Unique indexes still catch a concurrent signup that slipped past the check above.
        let account = self
            .store
            .create_account(&email, username, password_hash)
            .await
            .map_err(|e| match e {
                InsertAccountError::DuplicateEmail => AuthError::EmailTaken,
                InsertAccountError::DuplicateUsername => AuthError::UsernameTaken,
                InsertAccountError::Other(err) => AuthError::Database(err.to_string()),
            })?;

        info!(account_id = account.id, username = %account.username, "Account registered");

        self.issue_session(PublicProfile::from(account))
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let email = normalize_email(email).map_err(AuthError::Validation)?;
        if password.is_empty() {
            return Err(AuthError::Validation("Password is required".to_string()));
        }

        let Some(account) = self.store.get_account_by_email(&email).await? else {
            self.burn_password_check(password).await?;
            return Err(AuthError::InvalidCredentials);
        };

        if account.is_locked_at(Utc::now()) {
            warn!(account_id = account.id, "Login attempt on locked account");
            return Err(AuthError::AccountLocked);
        }

        if !self
            .store
            .verify_account_password(account.id, password)
            .await?
        {
            let throttle = &self.security.auth_throttle;
            let outcome = self
                .store
                .record_failed_login(account.id, throttle.max_attempts, throttle.lockout())
                .await?;

            if let Some(until) = outcome.locked_until {
                warn!(
                    account_id = account.id,
                    attempts = outcome.attempts,
                    locked_until = %until.to_rfc3339(),
                    "Account locked after repeated failed logins"
                );
            } else {
                warn!(
                    account_id = account.id,
                    attempts = outcome.attempts,
                    "Failed login attempt"
                );
            }
            return Err(AuthError::InvalidCredentials);
        }

        let account = self.store.record_successful_login(account.id).await?;
        info!(account_id = account.id, "Login successful");

        self.issue_session(PublicProfile::from(account))
    }

    async fn resolve_session(&self, token: &str) -> Result<PublicProfile, AuthError> {
        let claims = self.tokens.verify(token)?;

        let account = self
            .store
            .get_account(claims.sub)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        Ok(PublicProfile::from(account))
    }

    async fn request_password_reset(
        &self,
        email: &str,
    ) -> Result<Option<PasswordResetTicket>, AuthError> {
        let email = normalize_email(email).map_err(AuthError::Validation)?;

        let Some(account) = self.store.get_account_by_email(&email).await? else {
            return Ok(None);
        };

        let token = hex::encode(rand::random::<[u8; 32]>());
        let expires_at = Utc::now() + self.security.reset_token_ttl();

        self.store
            .set_password_reset_token(account.id, &reset_token_digest(&token), expires_at)
            .await?;

        info!(account_id = account.id, "Password reset token issued");

        Ok(Some(PasswordResetTicket {
            account_id: account.id,
            token,
            expires_at,
        }))
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::InvalidResetToken);
        }
        validate_password(new_password).map_err(AuthError::Validation)?;

        let account = self
            .store
            .find_account_by_reset_token(&reset_token_digest(token))
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        let password_hash = hash_password_blocking(new_password, &self.security).await?;
        self.store
            .complete_password_reset(account.id, password_hash)
            .await?;

        info!(account_id = account.id, "Password reset completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::token::TokenSigner;

    async fn service() -> SeaOrmAuthService {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let security = SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        };
        let tokens =
            TokenSigner::new(b"unit-test-secret", security.session_ttl(), &security.token_issuer)
                .unwrap();
        SeaOrmAuthService::new(store, tokens, security)
    }

    #[tokio::test]
    async fn register_then_resolve_session() {
        let auth = service().await;
        let session = auth
            .register(" Trinity@Matrix.io", "Passw0rdX", "trinity")
            .await
            .unwrap();
        assert_eq!(session.profile.email, "trinity@matrix.io");

        let profile = auth.resolve_session(&session.token).await.unwrap();
        assert_eq!(profile.username, "trinity");
    }

    #[tokio::test]
    async fn register_rejects_duplicates() {
        let auth = service().await;
        auth.register("a@matrix.io", "Passw0rdX", "alpha")
            .await
            .unwrap();

        let err = auth
            .register("A@matrix.io", "Passw0rdX", "other")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));

        let err = auth
            .register("b@matrix.io", "Passw0rdX", "alpha")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UsernameTaken));
    }

    #[tokio::test]
    async fn lockout_rejects_correct_password() {
        let auth = service().await;
        auth.register("morpheus@matrix.io", "Passw0rdX", "morpheus")
            .await
            .unwrap();

        for _ in 0..5 {
            let err = auth
                .authenticate("morpheus@matrix.io", "wrong-password")
                .await
                .unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredentials));
        }

        let err = auth
            .authenticate("morpheus@matrix.io", "Passw0rdX")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AccountLocked));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_failures_still_lock() {
        let auth = std::sync::Arc::new(service().await);
        auth.register("neo@matrix.io", "Passw0rdX", "neo")
            .await
            .unwrap();

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let auth = auth.clone();
                tokio::spawn(async move { auth.authenticate("neo@matrix.io", "wrong").await })
            })
            .collect();
        for handle in handles {
            let err = handle.await.unwrap().unwrap_err();
            assert!(matches!(
                err,
                AuthError::InvalidCredentials | AuthError::AccountLocked
            ));
        }

        let err = auth
            .authenticate("neo@matrix.io", "Passw0rdX")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AccountLocked));
    }

    #[tokio::test]
    async fn unknown_email_still_verifies_a_hash() {
        let auth = service().await;
        assert!(auth.dummy_hash.get().is_none());

        let err = auth
            .authenticate("ghost@matrix.io", "Passw0rdX")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert!(
            auth.dummy_hash
                .get()
                .is_some_and(|h| h.starts_with("$argon2id$"))
        );
    }

    #[tokio::test]
    async fn successful_login_resets_failures() {
        let auth = service().await;
        auth.register("tank@matrix.io", "Passw0rdX", "tank")
            .await
            .unwrap();

        for _ in 0..4 {
            let _ = auth.authenticate("tank@matrix.io", "nope").await;
        }
        auth.authenticate("tank@matrix.io", "Passw0rdX")
            .await
            .unwrap();

        // The counter starts over, so four more failures still do not lock.
        for _ in 0..4 {
            let _ = auth.authenticate("tank@matrix.io", "nope").await;
        }
        assert!(auth.authenticate("tank@matrix.io", "Passw0rdX").await.is_ok());
    }

    #[tokio::test]
    async fn reset_token_is_single_use() {
        let auth = service().await;
        auth.register("switch@matrix.io", "Passw0rdX", "switch")
            .await
            .unwrap();

        assert!(
            auth.request_password_reset("nobody@matrix.io")
                .await
                .unwrap()
                .is_none()
        );

        let ticket = auth
            .request_password_reset("switch@matrix.io")
            .await
            .unwrap()
            .unwrap();

        auth.reset_password(&ticket.token, "N3wPassword")
            .await
            .unwrap();
        assert!(auth.authenticate("switch@matrix.io", "N3wPassword").await.is_ok());

        let err = auth
            .reset_password(&ticket.token, "An0therOne")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidResetToken));
    }

    #[test]
    fn reset_digest_is_sha256_hex() {
        assert_eq!(
            reset_token_digest("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}

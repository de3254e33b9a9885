use crate::config::SecurityConfig;
use crate::models::movie::MovieSummary;
use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::account::{Account, FailedLogin, InsertAccountError};

/// Handle to the document store. Cloned into each service that needs it;
/// the underlying pool is shared.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        // Every in-memory connection is its own database, so keep exactly one.
        let in_memory = db_url.contains(":memory:");
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        if !in_memory {
            opt.idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn account_repo(&self) -> repositories::account::AccountRepository {
        repositories::account::AccountRepository::new(self.conn.clone())
    }

    fn cache_repo(&self) -> repositories::cache::CacheRepository {
        repositories::cache::CacheRepository::new(self.conn.clone())
    }

    pub async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.account_repo().get_by_email(email).await
    }

    pub async fn get_account(&self, id: i32) -> Result<Option<Account>> {
        self.account_repo().get_by_id(id).await
    }

    pub async fn find_conflicting_account(
        &self,
        email: &str,
        username: &str,
    ) -> Result<Option<Account>> {
        self.account_repo().find_conflicting(email, username).await
    }

    pub async fn create_account(
        &self,
        email: &str,
        username: &str,
        password_hash: String,
    ) -> Result<Account, InsertAccountError> {
        self.account_repo()
            .create(email, username, password_hash)
            .await
    }

    pub async fn verify_account_password(&self, id: i32, password: &str) -> Result<bool> {
        self.account_repo().verify_password(id, password).await
    }

    pub async fn record_failed_login(
        &self,
        id: i32,
        max_attempts: u32,
        lockout: chrono::Duration,
    ) -> Result<FailedLogin> {
        self.account_repo()
            .record_failed_login(id, max_attempts, lockout)
            .await
    }

    pub async fn record_successful_login(&self, id: i32) -> Result<Account> {
        self.account_repo().record_successful_login(id).await
    }

    pub async fn set_password_reset_token(
        &self,
        id: i32,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        self.account_repo()
            .set_reset_token(id, token_hash, expires_at)
            .await
    }

    pub async fn find_account_by_reset_token(&self, token_hash: &str) -> Result<Option<Account>> {
        self.account_repo().find_by_reset_token(token_hash).await
    }

    pub async fn complete_password_reset(&self, id: i32, new_hash: String) -> Result<()> {
        self.account_repo()
            .complete_password_reset(id, new_hash)
            .await
    }

    pub async fn get_cached_search(
        &self,
        cache_key: &str,
        ttl: Option<chrono::Duration>,
    ) -> Result<Option<Vec<MovieSummary>>> {
        self.cache_repo().get_cached_search(cache_key, ttl).await
    }

    pub async fn cache_search_results(
        &self,
        cache_key: &str,
        results: &[MovieSummary],
    ) -> Result<()> {
        self.cache_repo()
            .cache_search_results(cache_key, results)
            .await
    }
}

/// Hash on a blocking thread so argon2 does not stall the runtime.
pub async fn hash_password_blocking(password: &str, config: &SecurityConfig) -> Result<String> {
    let password = password.to_string();
    let config = config.clone();
    tokio::task::spawn_blocking(move || repositories::account::hash_password(&password, &config))
        .await
        .map_err(|e| anyhow::anyhow!("Password hashing task panicked: {e}"))?
}

/// Verify against an arbitrary PHC hash on a blocking thread.
pub async fn verify_password_blocking(password_hash: &str, password: &str) -> Result<bool> {
    let password_hash = password_hash.to_string();
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        repositories::account::verify_password_hash(&password_hash, &password)
    })
    .await
    .map_err(|e| anyhow::anyhow!("Password verification task panicked: {e}"))?
}

use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::clients::tmdb::TmdbClient;
use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthService, SeaOrmAuthService, SearchService, TokenSigner};

/// Build a shared HTTP client with reasonable defaults for API calls.
/// Reused by every outbound caller so connections are pooled.
pub fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(concat!("Cinesearch/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

/// Everything a request handler may touch, passed explicitly instead of
/// living in globals.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub tokens: TokenSigner,

    pub auth_service: Arc<dyn AuthService>,

    pub search_service: Arc<SearchService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;
        Self::with_store(config, store)
    }

    pub fn with_store(config: Config, store: Store) -> anyhow::Result<Self> {
        let http_client =
            build_shared_http_client(config.tmdb.request_timeout_seconds.into())?;

        let tmdb = match config.tmdb.api_key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => Some(TmdbClient::with_shared_client(
                http_client,
                key.to_string(),
                &config.tmdb,
            )),
            None => {
                warn!("TMDB API key is not configured; movie endpoints will fail");
                None
            }
        };

        let secret = match config.security.token_secret.as_deref().filter(|s| !s.is_empty()) {
            Some(secret) => secret.as_bytes().to_vec(),
            None => {
                warn!("No token secret configured; generated a random one. Sessions will not survive a restart");
                TokenSigner::generate_secret()
            }
        };
        let tokens = TokenSigner::new(
            &secret,
            config.security.session_ttl(),
            config.security.token_issuer.clone(),
        )
        .map_err(|e| anyhow::anyhow!("Failed to initialize token signer: {e}"))?;

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            tokens.clone(),
            config.security.clone(),
        )) as Arc<dyn AuthService>;

        let search_service = Arc::new(SearchService::new(
            store.clone(),
            tmdb,
            config.cache.ttl(),
            Duration::from_millis(config.tmdb.enrichment_stagger_ms),
        ));

        Ok(Self {
            config: Arc::new(config),
            store,
            tokens,
            auth_service,
            search_service,
        })
    }
}

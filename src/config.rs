use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub tmdb: TmdbConfig,

    pub security: SecurityConfig,

    pub cache: CacheConfig,

    pub observability: ObservabilityConfig,

    pub client: ClientConfig,

    /// File the config was read from, `None` when running on defaults.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations) - higher = more CPU work
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,

    /// HMAC secret for session tokens. Overridden by `JWT_SECRET`.
    /// When unset a random secret is generated at startup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_secret: Option<String>,

    pub token_issuer: String,

    pub session_ttl_hours: u32,

    pub reset_token_ttl_minutes: u32,

    /// Per-account lockout policy for failed logins.
    pub auth_throttle: AuthThrottleConfig,

    /// Per-client request limit on the credential endpoints.
    pub auth_rate_limit: AuthRateLimitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthThrottleConfig {
    /// Consecutive failures that trigger a lockout.
    pub max_attempts: u32,

    /// Lockout duration once max attempts is reached.
    pub lockout_seconds: u64,
}

impl Default for AuthThrottleConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout_seconds: 15 * 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthRateLimitConfig {
    pub enabled: bool,

    /// Requests a single client may burst before being throttled.
    pub max_requests: u32,

    /// Time for a client's full allowance to replenish.
    pub window_seconds: u64,
}

impl Default for AuthRateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 10,
            window_seconds: 15 * 60,
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            token_secret: None,
            token_issuer: "cinesearch-app".to_string(),
            session_ttl_hours: 24,
            reset_token_ttl_minutes: 60,
            auth_throttle: AuthThrottleConfig::default(),
            auth_rate_limit: AuthRateLimitConfig::default(),
        }
    }
}

impl SecurityConfig {
    #[must_use]
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.session_ttl_hours))
    }

    #[must_use]
    pub fn reset_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.reset_token_ttl_minutes))
    }
}

impl AuthThrottleConfig {
    pub const MAX_LOCKOUT_SECONDS: u64 = 30 * 24 * 3600;

    #[must_use]
    pub fn lockout(&self) -> chrono::Duration {
        let secs = self.lockout_seconds.min(Self::MAX_LOCKOUT_SECONDS);
        chrono::Duration::seconds(i64::try_from(secs).unwrap_or_default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Whether to set the Secure flag on the session cookie.
    /// Set to false for local development without HTTPS.
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            cors_allowed_origins: vec!["http://localhost:3000".to_string()],
            secure_cookies: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/cinesearch.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TmdbConfig {
    /// Provider credential. Overridden by `TMDB_API_KEY`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    pub base_url: String,

    pub image_base_url: String,

    pub language: Option<String>,

    pub request_timeout_seconds: u32,

    /// Delay added per result before its detail fetch starts.
    pub enrichment_stagger_ms: u64,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.themoviedb.org/3".to_string(),
            image_base_url: "https://image.tmdb.org/t/p".to_string(),
            language: None,
            request_timeout_seconds: 30,
            enrichment_stagger_ms: 200,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Age after which cached searches are ignored. 0 keeps them forever.
    pub ttl_hours: u32,
}

impl CacheConfig {
    #[must_use]
    pub fn ttl(&self) -> Option<chrono::Duration> {
        (self.ttl_hours > 0).then(|| chrono::Duration::hours(i64::from(self.ttl_hours)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server_url: String,

    /// Where the terminal client keeps history and favorites.
    pub data_dir: Option<PathBuf>,

    pub history_limit: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:5000".to_string(),
            data_dir: None,
            history_limit: 10,
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("cinesearch")
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            tmdb: TmdbConfig::default(),
            security: SecurityConfig::default(),
            cache: CacheConfig::default(),
            observability: ObservabilityConfig::default(),
            client: ClientConfig::default(),
            source: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        let mut config = match paths.iter().find(|p| p.exists()) {
            Some(path) => Self::load_from_path(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.source = Some(path.to_path_buf());

        Ok(config)
    }

    /// Secrets and the listen port may come from the environment (or `.env`).
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("TMDB_API_KEY")
            && !key.trim().is_empty()
        {
            self.tmdb.api_key = Some(key);
        }

        if let Ok(secret) = std::env::var("JWT_SECRET")
            && !secret.is_empty()
        {
            self.security.token_secret = Some(secret);
        }

        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("cinesearch").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".cinesearch").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.tmdb.base_url.is_empty() || self.tmdb.image_base_url.is_empty() {
            anyhow::bail!("TMDB base URLs cannot be empty");
        }

        if self.security.auth_throttle.max_attempts == 0 {
            anyhow::bail!("security.auth_throttle.max_attempts must be > 0");
        }

        let lockout = self.security.auth_throttle.lockout_seconds;
        if lockout == 0 || lockout > AuthThrottleConfig::MAX_LOCKOUT_SECONDS {
            anyhow::bail!("security.auth_throttle.lockout_seconds must be between 1 and 30 days");
        }

        let rate_limit = &self.security.auth_rate_limit;
        if rate_limit.enabled && (rate_limit.max_requests == 0 || rate_limit.window_seconds == 0) {
            anyhow::bail!("security.auth_rate_limit needs max_requests and window_seconds > 0");
        }

        if self.security.session_ttl_hours == 0 {
            anyhow::bail!("security.session_ttl_hours must be > 0");
        }

        argon2::Params::new(
            self.security.argon2_memory_cost_kib,
            self.security.argon2_time_cost,
            self.security.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.security.auth_throttle.max_attempts, 5);
        assert_eq!(config.security.auth_throttle.lockout_seconds, 900);
        assert_eq!(config.security.auth_rate_limit.max_requests, 10);
        assert_eq!(config.tmdb.enrichment_stagger_ms, 200);
        assert_eq!(config.cache.ttl_hours, 0);
        assert!(config.tmdb.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[tmdb]"));
        assert!(toml_str.contains("[security.auth_throttle]"));
        assert!(!toml_str.contains("api_key"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [tmdb]
            api_key = "abc123"
            enrichment_stagger_ms = 50

            [cache]
            ttl_hours = 6
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.tmdb.api_key.as_deref(), Some("abc123"));
        assert_eq!(config.tmdb.enrichment_stagger_ms, 50);
        assert_eq!(config.cache.ttl_hours, 6);

        assert_eq!(config.tmdb.base_url, "https://api.themoviedb.org/3");
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_validate_rejects_zero_lockout_threshold() {
        let mut config = Config::default();
        config.security.auth_throttle.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_path_records_source() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 6100\n").unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.server.port, 6100);
        assert_eq!(config.source.as_deref(), Some(path.as_path()));

        let serialized = toml::to_string(&config).unwrap();
        assert!(!serialized.contains("source"));
        assert!(Config::default().source.is_none());
    }

    #[test]
    fn test_client_data_dir_override() {
        let mut config = ClientConfig::default();
        config.data_dir = Some(PathBuf::from("/tmp/cinesearch-test"));
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/cinesearch-test"));
    }
}

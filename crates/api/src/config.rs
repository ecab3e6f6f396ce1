// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server configuration module
//!
//! Configuration is layered: built-in defaults, an optional `config.json`, an optional
//! `config.{environment}.json`, then `EXPLORER_` environment variables. Nested keys use
//! `__` in variable names, so `EXPLORER_CACHE__TTL_MS=5000` sets `cache.ttl_ms`.

use std::{
    fmt,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

use anyhow::{Result, anyhow, ensure};
use api_client::{RateLimitConfig, RetryPolicy};
use config::{Config, ConfigError, Environment as ConfigEnv, File};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use shared_types::Network;
use url::Url;

use crate::error::{ServerError, ServerResult};

/// Port the server listens on when nothing else is configured
pub const DEFAULT_PORT: u16 = 7801;
/// Default Base mainnet explorer API
pub const DEFAULT_MAINNET_URL: &str = "https://base.blockscout.com/api";
/// Default Base Sepolia explorer API
pub const DEFAULT_SEPOLIA_URL: &str = "https://base-sepolia.blockscout.com/api";

const ENV_PREFIX: &str = "EXPLORER";

/// A validated server port that ensures the value is appropriate for the environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServerPort {
    port: u16,
    environment: Environment,
}

impl ServerPort {
    /// Create a new `ServerPort`, ensuring it's valid for the given environment
    ///
    /// # Errors
    ///
    /// Returns an error if the port is 0 in non-testing environments
    pub fn new(port: u16, environment: Environment) -> Result<Self> {
        if port == 0 && environment != Environment::Testing {
            return Err(anyhow!("port cannot be 0 in non-testing environments"));
        }
        Ok(Self { port, environment })
    }

    /// Default port for development
    pub const fn default_development() -> Self {
        Self {
            port: DEFAULT_PORT,
            environment: Environment::Development,
        }
    }

    /// Let the OS pick a port
    pub const fn testing() -> Self {
        Self {
            port: 0,
            environment: Environment::Testing,
        }
    }

    /// Get the port value
    pub fn value(&self) -> u16 {
        self.port
    }
}

impl<'de> Deserialize<'de> for ServerPort {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let port = u16::deserialize(deserializer)?;
        // Re-checked against the real environment once loading completes
        Ok(Self {
            port,
            environment: Environment::Development,
        })
    }
}

/// A validated inbound request timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeoutSeconds(Duration);

impl TimeoutSeconds {
    /// Create a new `TimeoutSeconds`, ensuring the value is within valid bounds
    ///
    /// # Errors
    ///
    /// Returns an error if timeout is 0 or greater than 300 seconds
    pub fn new(seconds: u64) -> Result<Self> {
        ensure!(seconds != 0, "timeout must be greater than 0");
        ensure!(seconds <= 300, "timeout cannot exceed 300");
        Ok(Self(Duration::from_secs(seconds)))
    }

    /// 30 seconds
    pub const fn default_value() -> Self {
        Self(Duration::from_secs(30))
    }

    /// 5 seconds
    pub const fn testing() -> Self {
        Self(Duration::from_secs(5))
    }

    /// Get the timeout value
    pub fn value(&self) -> Duration {
        self.0
    }
}

impl<'de> Deserialize<'de> for TimeoutSeconds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = u64::deserialize(deserializer)?;
        Self::new(seconds).map_err(|e| de::Error::custom(e.to_string()))
    }
}

impl Default for TimeoutSeconds {
    fn default() -> Self {
        Self::default_value()
    }
}

/// An absolute `http` or `https` URL of an upstream explorer API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamUrl(String);

impl UpstreamUrl {
    /// Parse and check an upstream URL
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not an absolute `http(s)` URL
    pub fn new(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let url = Url::parse(trimmed).map_err(|e| anyhow!("invalid upstream URL '{raw}': {e}"))?;
        ensure!(
            matches!(url.scheme(), "http" | "https"),
            "upstream URL '{raw}' must use http or https"
        );
        Ok(Self(trimmed.to_string()))
    }

    /// The URL as text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UpstreamUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for UpstreamUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for UpstreamUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(&raw).map_err(|e| de::Error::custom(e.to_string()))
    }
}

/// Environment types for configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Production environment
    Production,
    /// Development environment
    Development,
    /// Testing environment
    Testing,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Production => write!(f, "production"),
            Environment::Development => write!(f, "development"),
            Environment::Testing => write!(f, "testing"),
        }
    }
}

/// Upstream explorer endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockscoutConfig {
    /// Base mainnet API
    pub mainnet_url: UpstreamUrl,
    /// Base Sepolia API
    pub sepolia_url: UpstreamUrl,
    /// Optional API key sent with every request
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

impl BlockscoutConfig {
    /// API for `network`
    pub fn url_for(&self, network: Network) -> &UpstreamUrl {
        match network {
            Network::BaseMainnet => &self.mainnet_url,
            Network::BaseSepolia => &self.sepolia_url,
        }
    }
}

impl Default for BlockscoutConfig {
    fn default() -> Self {
        Self {
            mainnet_url: UpstreamUrl(DEFAULT_MAINNET_URL.to_string()),
            sepolia_url: UpstreamUrl(DEFAULT_SEPOLIA_URL.to_string()),
            api_key: None,
        }
    }
}

/// Response cache settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Entry lifetime in milliseconds
    pub ttl_ms: u64,
    /// Entries kept before the least recently used one is evicted
    pub max_entries: usize,
}

impl CacheSettings {
    fn validate(&self) -> Result<()> {
        ensure!(self.max_entries > 0, "cache.max_entries must be greater than 0");
        Ok(())
    }

    /// Entry lifetime
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_ms: 15_000,
            max_entries: 500,
        }
    }
}

/// Outbound rate limit settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitSettings {
    /// Requests allowed per window
    pub points: u32,
    /// Window length in seconds
    pub duration_seconds: u64,
}

impl RateLimitSettings {
    fn validate(&self) -> Result<()> {
        ensure!(self.points > 0, "rate_limit.points must be greater than 0");
        ensure!(
            self.duration_seconds > 0,
            "rate_limit.duration_seconds must be greater than 0"
        );
        Ok(())
    }

    /// Limiter quota
    pub fn quota(&self) -> RateLimitConfig {
        RateLimitConfig {
            points: self.points,
            duration: Duration::from_secs(self.duration_seconds),
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            points: 10,
            duration_seconds: 1,
        }
    }
}

/// Upstream retry settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Attempts per request, including the first
    pub attempts: u32,
    /// First backoff delay in milliseconds
    pub min_ms: u64,
    /// Backoff ceiling in milliseconds
    pub max_ms: u64,
}

impl RetrySettings {
    fn validate(&self) -> Result<()> {
        ensure!(self.attempts > 0, "retry.attempts must be greater than 0");
        ensure!(
            self.min_ms <= self.max_ms,
            "retry.min_ms ({}) cannot exceed retry.max_ms ({})",
            self.min_ms,
            self.max_ms
        );
        Ok(())
    }

    /// Backoff policy
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.attempts,
            Duration::from_millis(self.min_ms),
            Duration::from_millis(self.max_ms),
        )
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            attempts: 3,
            min_ms: 250,
            max_ms: 1500,
        }
    }
}

/// Server configuration for different environments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    pub host: IpAddr,
    /// Server port (validated for environment compatibility)
    pub port: ServerPort,
    /// Inbound request timeout (validated range: 1-300 seconds)
    pub timeout_seconds: TimeoutSeconds,
    /// Environment type
    pub environment: Environment,
    /// Network the explorer tools read from
    pub network: Network,
    /// Upstream explorer endpoints
    pub blockscout: BlockscoutConfig,
    /// Response cache
    pub cache: CacheSettings,
    /// Outbound rate limit
    pub rate_limit: RateLimitSettings,
    /// Upstream retries
    pub retry: RetrySettings,
    /// JSON file with router overrides
    #[serde(default)]
    pub routers_config_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: ServerPort::default_development(),
            timeout_seconds: TimeoutSeconds::default(),
            environment: Environment::Development,
            network: Network::BaseMainnet,
            blockscout: BlockscoutConfig::default(),
            cache: CacheSettings::default(),
            rate_limit: RateLimitSettings::default(),
            retry: RetrySettings::default(),
            routers_config_path: None,
        }
    }
}

impl ServerConfig {
    /// Create configuration from environment variables and optional configuration files
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if configuration is invalid or cannot be loaded.
    pub fn from_env() -> ServerResult<Self> {
        Self::load().map_err(|e| ServerError::Config {
            message: format!("failed to load configuration: {e}"),
        })
    }

    /// Load configuration using the config crate with hierarchical sources
    ///
    /// Later sources override earlier ones:
    /// 1. Default values
    /// 2. Configuration file (config.json)
    /// 3. Environment-specific file (config.{env}.json)
    /// 4. Environment variables with the `EXPLORER_` prefix
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let env_var = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let cache = CacheSettings::default();
        let rate_limit = RateLimitSettings::default();
        let retry = RetrySettings::default();

        let mut config_builder = Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", DEFAULT_PORT)?
            .set_default("timeout_seconds", 30)?
            .set_default("environment", "development")?
            .set_default("network", Network::BaseMainnet.slug())?
            .set_default("blockscout.mainnet_url", DEFAULT_MAINNET_URL)?
            .set_default("blockscout.sepolia_url", DEFAULT_SEPOLIA_URL)?
            .set_default("cache.ttl_ms", cache.ttl_ms)?
            .set_default("cache.max_entries", cache.max_entries.to_string())?
            .set_default("rate_limit.points", rate_limit.points)?
            .set_default("rate_limit.duration_seconds", rate_limit.duration_seconds)?
            .set_default("retry.attempts", retry.attempts)?
            .set_default("retry.min_ms", retry.min_ms)?
            .set_default("retry.max_ms", retry.max_ms)?
            .add_source(File::with_name("config.json").required(false))
            .add_source(
                File::with_name(&format!("config.{}.json", env_var.to_lowercase())).required(false),
            )
            .add_source(
                ConfigEnv::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        if std::env::var("ENVIRONMENT").is_ok() {
            config_builder = config_builder.set_override("environment", env_var.to_lowercase())?;
        }

        let config = config_builder.build()?;
        let mut server_config: Self = config.try_deserialize()?;

        server_config.port = ServerPort::new(server_config.port.value(), server_config.environment)
            .map_err(|e| ConfigError::Message(format!("invalid port configuration: {e}")))?;
        server_config
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(server_config)
    }

    /// Check the settings the type system does not cover
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<()> {
        self.cache.validate()?;
        self.rate_limit.validate()?;
        self.retry.validate()?;
        Ok(())
    }

    /// Create configuration optimized for testing
    ///
    /// Upstream calls are not retried and the limiter is generous so tests only see the
    /// behaviour they set up.
    pub fn for_testing() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: ServerPort::testing(),
            timeout_seconds: TimeoutSeconds::testing(),
            environment: Environment::Testing,
            rate_limit: RateLimitSettings {
                points: 1_000,
                duration_seconds: 1,
            },
            retry: RetrySettings {
                attempts: 1,
                min_ms: 0,
                max_ms: 0,
            },
            ..Self::default()
        }
    }

    /// Point the active network at another upstream, e.g. a mock server
    #[must_use]
    pub fn with_upstream(mut self, url: UpstreamUrl) -> Self {
        match self.network {
            Network::BaseMainnet => self.blockscout.mainnet_url = url,
            Network::BaseSepolia => self.blockscout.sepolia_url = url,
        }
        self
    }

    /// Upstream API of the active network
    pub fn upstream_url(&self) -> &UpstreamUrl {
        self.blockscout.url_for(self.network)
    }

    /// Get socket address for binding
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port.value())
    }
}

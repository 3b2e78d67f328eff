use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::primitives::group::MIN_GROUP_BITS;
use crate::{derive_group_with_generators, Error, GroupParameters, Result};

/// Environment variable naming an alternative TOML configuration file.
pub const CONFIG_PATH_ENV: &str = "SERVER_CONFIG_PATH";

const DEFAULT_CONFIG_PATH: &str = "config/server.toml";

/// Server configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Hostname or IP address to bind to.
    pub host: String,
    /// Port number to listen on.
    pub port: u16,
    /// Session validity window in seconds.
    pub session_ttl_secs: u64,
    /// Age in seconds after which an unanswered challenge is dropped.
    pub challenge_ttl_secs: u64,
    /// Group every user proves against.
    pub group: GroupSetting,
    /// Rate limiting configuration.
    pub rate_limit: RateLimitSettings,
}

/// Which group the server runs on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupSetting {
    /// Fixed built-in parameters.
    Default,
    /// Freshly derived parameters of roughly `bits` bits.
    Generated {
        /// Bit length of the derived `q`.
        bits: u64,
    },
}

/// Rate limiting settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitSettings {
    /// Maximum sustained requests per minute.
    pub requests_per_minute: u64,
    /// Burst capacity for short-term spikes.
    pub burst: u64,
}

impl RateLimitSettings {
    /// Creates a rate limiter from these settings.
    pub fn build_limiter(&self) -> RateLimiter {
        RateLimiter::new(self.requests_per_minute, self.burst)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 50051,
            session_ttl_secs: super::DEFAULT_SESSION_TTL.as_secs(),
            challenge_ttl_secs: super::DEFAULT_CHALLENGE_TTL.as_secs(),
            group: GroupSetting::Default,
            rate_limit: RateLimitSettings {
                requests_per_minute: 600,
                burst: 50,
            },
        }
    }
}

impl ServerConfig {
    /// Loads configuration from an optional `.env`, a TOML file and
    /// `SERVER_`-prefixed environment variables.
    ///
    /// Priority: environment variables > TOML file > defaults. Nested keys use
    /// a double underscore, e.g. `SERVER_RATE_LIMIT__BURST`.
    #[allow(clippy::result_large_err)]
    pub fn from_env() -> figment::error::Result<Self> {
        use figment::providers::{Env, Format, Serialized, Toml};
        use figment::Figment;

        dotenvy::dotenv().ok();

        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        Figment::from(Serialized::defaults(ServerConfig::default()))
            .merge(Toml::file(path))
            .merge(
                Env::prefixed("SERVER_")
                    .ignore(&["CONFIG_PATH"])
                    .split("__"),
            )
            .extract()
    }

    /// Validates configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParams`] for an empty host, a zero session
    /// window, zero rate limits, or a generated group that is too small.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::InvalidParams("host cannot be empty".to_string()));
        }

        if format!("{}:{}", self.host, self.port)
            .parse::<SocketAddr>()
            .is_err()
        {
            return Err(Error::InvalidParams(format!(
                "invalid listen address {}:{}",
                self.host, self.port
            )));
        }

        if self.session_ttl_secs == 0 {
            return Err(Error::InvalidParams(
                "session_ttl_secs must be greater than 0".to_string(),
            ));
        }

        if self.challenge_ttl_secs == 0 {
            return Err(Error::InvalidParams(
                "challenge_ttl_secs must be greater than 0".to_string(),
            ));
        }

        if self.rate_limit.requests_per_minute == 0 {
            return Err(Error::InvalidParams(
                "rate_limit.requests_per_minute must be greater than 0".to_string(),
            ));
        }

        if self.rate_limit.burst == 0 {
            return Err(Error::InvalidParams(
                "rate_limit.burst must be greater than 0".to_string(),
            ));
        }

        if let GroupSetting::Generated { bits } = self.group {
            if bits < MIN_GROUP_BITS {
                return Err(Error::InvalidParams(format!(
                    "group bits must be at least {MIN_GROUP_BITS}, got {bits}"
                )));
            }
        }

        Ok(())
    }

    /// Converts host and port into a socket address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParams`] if they do not form a valid address.
    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| {
                Error::InvalidParams(format!(
                    "invalid listen address {}:{}: {e}",
                    self.host, self.port
                ))
            })
    }

    /// Session validity window.
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// Age after which unanswered challenges are pruned.
    pub fn challenge_ttl(&self) -> Duration {
        Duration::from_secs(self.challenge_ttl_secs)
    }

    /// Builds the group the server runs on.
    pub fn group_parameters(&self) -> Result<GroupParameters> {
        match self.group {
            GroupSetting::Default => Ok(GroupParameters::default_group()),
            GroupSetting::Generated { bits } => derive_group_with_generators(bits, 2),
        }
    }
}

/// Token-bucket rate limiter shared by all request handlers.
#[derive(Clone)]
pub struct RateLimiter {
    state: Arc<Mutex<RateLimiterState>>,
    rate: u64,
    burst: u64,
}

struct RateLimiterState {
    tokens: f64,
    last_update: Instant,
}

impl RateLimiter {
    /// Creates a limiter refilling `requests_per_minute` tokens per minute up
    /// to `burst`.
    pub fn new(requests_per_minute: u64, burst: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(RateLimiterState {
                tokens: burst as f64,
                last_update: Instant::now(),
            })),
            rate: requests_per_minute,
            burst,
        }
    }

    /// Takes one token if available.
    pub async fn try_acquire(&self) -> bool {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_update).as_secs_f64();

        let tokens_per_second = self.rate as f64 / 60.0;
        state.tokens = (state.tokens + elapsed * tokens_per_second).min(self.burst as f64);
        state.last_update = now;

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

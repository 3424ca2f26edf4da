use std::time::Duration;

use clap::{ArgAction, Args};

use crate::{Error, Result};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 6379;

/// Connection pool settings. Read once when the pool is built and never changed after.
///
/// Every field can be supplied as a command line flag or through the matching `KV_*`
/// environment variable when the struct is flattened into a `clap` parser.
#[derive(Debug, Clone, Args)]
pub struct PoolConfig {
    /// Host name or address of the store
    #[arg(long, env = "KV_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port of the store
    #[arg(long, env = "KV_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Password sent with AUTH on every new connection. Empty means no authentication.
    #[arg(long, env = "KV_AUTH", hide_env_values = true)]
    pub auth: Option<String>,

    /// Database index selected after authenticating
    #[arg(long, env = "KV_DATABASE", default_value_t = 0)]
    pub database: u32,

    /// Maximum number of connections leased at the same time
    #[arg(long, env = "KV_MAX_ACTIVE", default_value_t = 8)]
    pub max_active: usize,

    /// Maximum number of idle connections kept for reuse
    #[arg(long, env = "KV_MAX_IDLE", default_value_t = 8)]
    pub max_idle: usize,

    /// How long an acquire waits for a free connection before giving up
    #[arg(long, env = "KV_MAX_WAIT_MS", default_value_t = 10_000)]
    pub max_wait_ms: u64,

    /// Timeout for connecting and for every request/response exchange
    #[arg(long, env = "KV_CONNECT_TIMEOUT_MS", default_value_t = 10_000)]
    pub connect_timeout_ms: u64,

    /// Ping idle connections before handing them out
    #[arg(long, env = "KV_TEST_ON_BORROW", default_value_t = true, action = ArgAction::Set)]
    pub test_on_borrow: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            auth: None,
            database: 0,
            max_active: 8,
            max_idle: 8,
            max_wait_ms: 10_000,
            connect_timeout_ms: 10_000,
            test_on_borrow: true,
        }
    }
}

impl PoolConfig {
    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// The password to authenticate with, if one is configured and non-empty.
    pub fn auth_token(&self) -> Option<&str> {
        self.auth.as_deref().filter(|token| !token.is_empty())
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Rejects settings the pool cannot honour. Called once at construction, so a bad
    /// configuration fails at startup instead of on the first command.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::Config("host must not be empty".to_string()));
        }
        if self.max_active == 0 {
            return Err(Error::Config("max_active must be at least 1".to_string()));
        }
        if self.max_idle > self.max_active {
            return Err(Error::Config(format!(
                "max_idle ({}) must not exceed max_active ({})",
                self.max_idle, self.max_active
            )));
        }
        if self.connect_timeout_ms == 0 {
            return Err(Error::Config(
                "connect_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

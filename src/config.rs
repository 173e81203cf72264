//! Server Configuration
//!
//! Process-level settings read from `INKWAR_*` environment variables. Game
//! tuning stays in `MatchConfig`.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::game::tick::MatchConfig;
use crate::TICK_RATE;

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:30004";

/// Default per-connection outbound queue capacity, in frames.
pub const DEFAULT_OUTBOUND_QUEUE: usize = 256;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable was set but could not be parsed.
    #[error("Invalid value for {var}: {value:?}")]
    Invalid {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Simulation rate in Hz.
    pub tick_rate: u32,
    /// Frames buffered per connection before new ones are dropped.
    pub outbound_queue: usize,
    /// JSON-lines match log. `None` keeps records in memory.
    pub store_path: Option<PathBuf>,
    /// Tuning applied to every new session.
    pub match_config: MatchConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 30004)),
            tick_rate: TICK_RATE,
            outbound_queue: DEFAULT_OUTBOUND_QUEUE,
            store_path: None,
            match_config: MatchConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create config from environment variables. Unset variables keep
    /// their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as `from_env` with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = parse(&lookup, "INKWAR_BIND_ADDR")? {
            config.bind_addr = addr;
        }
        if let Some(rate) = parse::<u32, _>(&lookup, "INKWAR_TICK_RATE")? {
            if rate == 0 {
                return Err(ConfigError::Invalid {
                    var: "INKWAR_TICK_RATE",
                    value: rate.to_string(),
                });
            }
            config.tick_rate = rate;
        }
        if let Some(queue) = parse::<usize, _>(&lookup, "INKWAR_OUTBOUND_QUEUE")? {
            if queue == 0 {
                return Err(ConfigError::Invalid {
                    var: "INKWAR_OUTBOUND_QUEUE",
                    value: queue.to_string(),
                });
            }
            config.outbound_queue = queue;
        }
        config.store_path = lookup("INKWAR_STORE_PATH")
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);

        Ok(config)
    }
}

fn parse<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&'static str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}

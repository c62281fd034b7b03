use crate::error::Error;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Service configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Token refill rate per client, tokens per second
    pub rate_limit_per_sec: f64,
    /// Burst capacity per client
    pub rate_limit_burst: u32,
    /// How often the sweeper scans for idle clients
    pub sweep_interval: Duration,
    /// Idle time after which a client entry is evicted
    pub idle_threshold: Duration,
    /// Default tracing filter level
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, Error> {
        Ok(Self {
            bind_addr: env_parsed("BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 3000)))?,
            rate_limit_per_sec: env_parsed("RATE_LIMIT_PER_SEC", 5.0)?,
            rate_limit_burst: env_parsed("RATE_LIMIT_BURST", 10)?,
            sweep_interval: Duration::from_secs(env_parsed("SWEEP_INTERVAL_SECS", 60u64)?),
            idle_threshold: Duration::from_secs(env_parsed("IDLE_EVICT_SECS", 180u64)?),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.rate_limit_per_sec <= 0.0 {
            return Err(Error::Config(
                "RATE_LIMIT_PER_SEC must be positive".to_string(),
            ));
        }
        if self.rate_limit_burst == 0 {
            return Err(Error::Config("RATE_LIMIT_BURST must be at least 1".to_string()));
        }
        if self.sweep_interval.is_zero() {
            return Err(Error::Config("SWEEP_INTERVAL_SECS must be positive".to_string()));
        }
        Ok(())
    }
}

fn env_parsed<T>(key: &str, default: T) -> Result<T, Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|e| Error::Config(format!("invalid {key}={value}: {e}"))),
        Err(_) => {
            tracing::debug!("environment variable {key} is not set, using default");
            Ok(default)
        }
    }
}

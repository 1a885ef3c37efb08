use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration, resolved once at startup from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: String,
    pub admin_password: String,
    /// Outbound queue slots per client connection; a client further behind
    /// than this is dropped.
    pub queue_capacity: usize,
    /// Ping cadence; a connection silent for two periods is closed.
    pub heartbeat: Duration,
    /// Sessions with zero connections and no activity for this long are
    /// evicted by the sweeper.
    pub idle_timeout: Duration,
    pub sweep_interval: Duration,
    pub persist_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            admin_password: "changeme".to_string(),
            queue_capacity: 32,
            heartbeat: Duration::from_secs(20),
            idle_timeout: Duration::from_secs(30 * 60),
            sweep_interval: Duration::from_secs(60),
            persist_path: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            admin_password: env::var("ADMIN_PASSWORD").unwrap_or(defaults.admin_password),
            queue_capacity: env_parse("WS_QUEUE_CAPACITY", defaults.queue_capacity),
            heartbeat: Duration::from_secs(env_parse("HEARTBEAT_SECS", 20)),
            idle_timeout: Duration::from_secs(env_parse("IDLE_TIMEOUT_SECS", 30 * 60)),
            sweep_interval: Duration::from_secs(env_parse("SWEEP_INTERVAL_SECS", 60)),
            persist_path: env::var("PERSIST_PATH").ok().map(PathBuf::from),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfflineConfig {
    pub database: DatabaseConfig,
    pub sync: SyncConfig,
    pub retry: RetryConfig,
    pub breaker: CircuitBreakerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Drain automatically on reconnect.
    pub auto_drain: bool,
    /// Periodic drain interval in seconds (0 disables the timer).
    pub drain_interval: u64,
    /// Replay attempts before a mutation is dropped from the queue.
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    /// Extra message substrings treated as retryable, on top of the
    /// built-in classification.
    #[serde(default)]
    pub retryable_patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub open_timeout_ms: u64,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite:data/moghub-offline.db".to_string(),
                max_connections: 5,
                connection_timeout: 30,
            },
            sync: SyncConfig::default(),
            retry: RetryConfig::default(),
            breaker: CircuitBreakerConfig::default(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_drain: true,
            drain_interval: 300, // 5 minutes
            max_attempts: 3,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1_000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
            retryable_patterns: Vec::new(),
        }
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_timeout_ms: 60_000,
        }
    }
}

impl OfflineConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("MOGHUB_DATABASE_URL") {
            if !v.trim().is_empty() {
                cfg.database.url = v;
            }
        }
        if let Ok(v) = std::env::var("MOGHUB_AUTO_DRAIN") {
            cfg.sync.auto_drain = parse_bool(&v, cfg.sync.auto_drain);
        }
        if let Ok(v) = std::env::var("MOGHUB_DRAIN_INTERVAL") {
            if let Some(value) = parse_u64(&v) {
                cfg.sync.drain_interval = value;
            }
        }
        if let Ok(v) = std::env::var("MOGHUB_SYNC_MAX_ATTEMPTS") {
            if let Some(value) = parse_u32(&v) {
                cfg.sync.max_attempts = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("MOGHUB_RETRY_MAX") {
            if let Some(value) = parse_u32(&v) {
                cfg.retry.max_retries = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("MOGHUB_RETRY_INITIAL_DELAY_MS") {
            if let Some(value) = parse_u64(&v) {
                cfg.retry.initial_delay_ms = value;
            }
        }
        if let Ok(v) = std::env::var("MOGHUB_RETRY_MAX_DELAY_MS") {
            if let Some(value) = parse_u64(&v) {
                cfg.retry.max_delay_ms = value;
            }
        }
        if let Ok(v) = std::env::var("MOGHUB_BREAKER_THRESHOLD") {
            if let Some(value) = parse_u32(&v) {
                cfg.breaker.failure_threshold = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("MOGHUB_BREAKER_TIMEOUT_MS") {
            if let Some(value) = parse_u64(&v) {
                cfg.breaker.open_timeout_ms = value;
            }
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.sync.max_attempts == 0 {
            return Err("Sync max_attempts must be greater than 0".to_string());
        }
        if self.retry.max_retries == 0 {
            return Err("Retry max_retries must be greater than 0".to_string());
        }
        if self.retry.backoff_multiplier < 1.0 {
            return Err("Retry backoff_multiplier must be at least 1.0".to_string());
        }
        if self.retry.max_delay_ms < self.retry.initial_delay_ms {
            return Err("Retry max_delay_ms must not be below initial_delay_ms".to_string());
        }
        if self.breaker.failure_threshold == 0 {
            return Err("Breaker failure_threshold must be greater than 0".to_string());
        }
        Ok(())
    }
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

fn parse_u32(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok()
}

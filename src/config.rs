use crate::compress::{BatchOptions, CompressionRequest};
use std::{env, str::FromStr, time::Duration};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub optimizer: OptimizerConfig,
}

#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    pub interval: Duration,
    pub cooldown: Duration,
    pub target_kb: u64,
    pub min_size_kb: u64,
    pub max_attempts: u32,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            cooldown: Duration::from_secs(60),
            target_kb: 100,
            min_size_kb: 150,
            max_attempts: 5,
        }
    }
}

impl OptimizerConfig {
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            request: CompressionRequest {
                max_attempts: self.max_attempts,
                ..CompressionRequest::with_target_kb(self.target_kb)
            },
            min_size_bytes: self.min_size_kb * 1024,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = OptimizerConfig::default();

        Self {
            port: env_or("PORT", 8080),
            optimizer: OptimizerConfig {
                interval: Duration::from_secs(env_or(
                    "OPTIMIZE_INTERVAL_SECS",
                    defaults.interval.as_secs(),
                )),
                cooldown: Duration::from_secs(env_or(
                    "OPTIMIZE_COOLDOWN_SECS",
                    defaults.cooldown.as_secs(),
                )),
                target_kb: env_or("OPTIMIZE_TARGET_KB", defaults.target_kb),
                min_size_kb: env_or("OPTIMIZE_MIN_SIZE_KB", defaults.min_size_kb),
                max_attempts: env_or("OPTIMIZE_MAX_ATTEMPTS", defaults.max_attempts),
            },
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
        .unwrap_or(default)
}

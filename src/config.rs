use std::{env, str::FromStr, time::Duration};

use rand::Rng;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub checkout: RetryPolicy,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env_or("APP_PORT", 3000);
        Ok(Self {
            port,
            database_url,
            host,
            checkout: RetryPolicy::from_env(),
        })
    }
}

/// Bounds for the checkout retry loop.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    pub backoff_min: Duration,
    pub backoff_max: Duration,
    /// Wall-clock cap on a single attempt.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_min: Duration::from_millis(50),
            backoff_max: Duration::from_millis(200),
            attempt_timeout: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_attempts: env_or("CHECKOUT_MAX_ATTEMPTS", defaults.max_attempts).max(1),
            backoff_min: env_millis("CHECKOUT_BACKOFF_MIN_MS", defaults.backoff_min),
            backoff_max: env_millis("CHECKOUT_BACKOFF_MAX_MS", defaults.backoff_max),
            attempt_timeout: env_millis("CHECKOUT_ATTEMPT_TIMEOUT_MS", defaults.attempt_timeout),
        }
    }

    /// Random delay in `[backoff_min, backoff_max]`.
    pub fn backoff(&self) -> Duration {
        let min = self.backoff_min.as_millis() as u64;
        let max = self.backoff_max.as_millis() as u64;
        if max <= min {
            return self.backoff_min;
        }
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn env_millis(key: &str, default: Duration) -> Duration {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_stays_within_bounds() {
        let policy = RetryPolicy::default();
        for _ in 0..200 {
            let delay = policy.backoff();
            assert!(delay >= policy.backoff_min && delay <= policy.backoff_max);
        }
    }

    #[test]
    fn backoff_collapses_to_min_when_range_is_empty() {
        let policy = RetryPolicy {
            backoff_min: Duration::from_millis(30),
            backoff_max: Duration::from_millis(10),
            ..RetryPolicy::default()
        };
        assert_eq!(policy.backoff(), Duration::from_millis(30));
    }
}

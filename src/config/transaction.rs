use super::parse_env;
use rand::Rng;
use std::time::Duration;

/// Retry and timeout policy for serializable transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionConfig {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Upper bound on a single attempt, begin through commit.
    pub attempt_timeout: Duration,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            attempt_timeout: Duration::from_millis(5_000),
            backoff_base: Duration::from_millis(10),
            backoff_max: Duration::from_millis(200),
        }
    }
}

impl TransactionConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let cfg = Self {
            max_attempts: parse_env("TX_MAX_ATTEMPTS", defaults.max_attempts),
            attempt_timeout: Duration::from_millis(parse_env(
                "TX_TIMEOUT_MS",
                defaults.attempt_timeout.as_millis() as u64,
            )),
            backoff_base: Duration::from_millis(parse_env(
                "TX_BACKOFF_BASE_MS",
                defaults.backoff_base.as_millis() as u64,
            )),
            backoff_max: Duration::from_millis(parse_env(
                "TX_BACKOFF_MAX_MS",
                defaults.backoff_max.as_millis() as u64,
            )),
        };
        cfg.normalized()
    }

    fn normalized(mut self) -> Self {
        if self.max_attempts == 0 {
            tracing::warn!("TX_MAX_ATTEMPTS must be >= 1, using 1");
            self.max_attempts = 1;
        }
        if self.backoff_max < self.backoff_base {
            self.backoff_max = self.backoff_base;
        }
        self
    }

    /// Exponential ceiling for the wait after `attempt` failed attempts.
    fn backoff_ceiling(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.backoff_base
            .saturating_mul(factor)
            .min(self.backoff_max)
    }

    /// Randomized ("full jitter") wait before the next attempt.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let ceiling = self.backoff_ceiling(attempt).as_millis() as u64;
        if ceiling == 0 {
            return Duration::ZERO;
        }
        let mut rng = rand::rng();
        Duration::from_millis(rng.random_range(ceiling / 2..=ceiling))
    }
}

use std::env;
use std::time::Duration;

use quiz_core::model::DEFAULT_DURATION_SECS;

/// How long a quiz fetch may take before the caller is told it is slow.
pub const SLOW_LOAD_AFTER: Duration = Duration::from_secs(4);

/// Countdown granularity.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Tunables for loading and running assessments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    slow_load_after: Duration,
    tick_period: Duration,
    default_duration_secs: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            slow_load_after: SLOW_LOAD_AFTER,
            tick_period: TICK_PERIOD,
            default_duration_secs: DEFAULT_DURATION_SECS,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `QUIZ_SLOW_LOAD_MS`, `QUIZ_TICK_MS` and
    /// `QUIZ_DEFAULT_DURATION_SECS` when they hold positive integers.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(ms) = positive_env("QUIZ_SLOW_LOAD_MS") {
            config = config.with_slow_load_after(Duration::from_millis(ms));
        }
        if let Some(ms) = positive_env("QUIZ_TICK_MS") {
            config = config.with_tick_period(Duration::from_millis(ms));
        }
        if let Some(secs) = positive_env("QUIZ_DEFAULT_DURATION_SECS") {
            config = config.with_default_duration_secs(u32::try_from(secs).unwrap_or(u32::MAX));
        }
        config
    }

    #[must_use]
    pub fn with_slow_load_after(mut self, after: Duration) -> Self {
        self.slow_load_after = after;
        self
    }

    #[must_use]
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        if !period.is_zero() {
            self.tick_period = period;
        }
        self
    }

    #[must_use]
    pub fn with_default_duration_secs(mut self, secs: u32) -> Self {
        if secs > 0 {
            self.default_duration_secs = secs;
        }
        self
    }

    #[must_use]
    pub fn slow_load_after(&self) -> Duration {
        self.slow_load_after
    }

    #[must_use]
    pub fn tick_period(&self) -> Duration {
        self.tick_period
    }

    #[must_use]
    pub fn default_duration_secs(&self) -> u32 {
        self.default_duration_secs
    }
}

fn positive_env(key: &str) -> Option<u64> {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_delivery_policy() {
        let config = EngineConfig::default();
        assert_eq!(config.slow_load_after(), Duration::from_secs(4));
        assert_eq!(config.tick_period(), Duration::from_secs(1));
        assert_eq!(config.default_duration_secs(), 1200);
    }

    #[test]
    fn zero_values_are_ignored() {
        let config = EngineConfig::default()
            .with_tick_period(Duration::ZERO)
            .with_default_duration_secs(0);
        assert_eq!(config, EngineConfig::default());
    }
}

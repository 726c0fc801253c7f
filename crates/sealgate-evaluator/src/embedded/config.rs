use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Upper bound on a single HTTP bundle fetch; 0 disables it.
    pub long_polling_timeout_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 10_000,
            max_delay_ms: 60_000,
            long_polling_timeout_ms: 0,
        }
    }
}

impl PollingConfig {
    /// Delay before retrying after `failures` consecutive failed reloads.
    pub fn backoff(&self, failures: u32) -> Duration {
        let min = self.min_delay_ms.max(1);
        let max = self.max_delay_ms.max(min);
        let shift = failures.saturating_sub(1).min(20);
        let delay = min.saturating_mul(1u64 << shift).min(max);
        Duration::from_millis(delay)
    }

    pub fn long_poll_timeout(&self) -> Option<Duration> {
        (self.long_polling_timeout_ms > 0).then(|| Duration::from_millis(self.long_polling_timeout_ms))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddedConfig {
    /// `file://` directory, `.rego` or `.json` bundle, or `http(s)://` bundle document.
    pub bundle_url: String,
    /// Decision used for queries with an empty document, as `/segment/segment`.
    pub decision_path: String,
    pub default_decision_path: String,
    pub polling: PollingConfig,
    /// Periodic refresh interval; 0 only reloads on demand.
    pub reload_interval_ms: u64,
}

impl Default for EmbeddedConfig {
    fn default() -> Self {
        Self {
            bundle_url: String::new(),
            decision_path: "/authz/rbac/validate_v1".to_string(),
            default_decision_path: "/system/main".to_string(),
            polling: PollingConfig::default(),
            reload_interval_ms: 30_000,
        }
    }
}

impl EmbeddedConfig {
    pub fn with_bundle_url(mut self, url: impl Into<String>) -> Self {
        self.bundle_url = url.into();
        self
    }

    pub fn with_decision_path(mut self, path: impl Into<String>) -> Self {
        self.decision_path = path.into();
        self
    }

    pub fn with_reload_interval(mut self, interval: Duration) -> Self {
        self.reload_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn reload_interval(&self) -> Option<Duration> {
        (self.reload_interval_ms > 0).then(|| Duration::from_millis(self.reload_interval_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let polling = PollingConfig {
            min_delay_ms: 100,
            max_delay_ms: 750,
            long_polling_timeout_ms: 0,
        };
        assert_eq!(polling.backoff(1), Duration::from_millis(100));
        assert_eq!(polling.backoff(2), Duration::from_millis(200));
        assert_eq!(polling.backoff(3), Duration::from_millis(400));
        assert_eq!(polling.backoff(4), Duration::from_millis(750));
        assert_eq!(polling.backoff(60), Duration::from_millis(750));
    }

    #[test]
    fn zero_intervals_disable_timers() {
        let config = EmbeddedConfig {
            reload_interval_ms: 0,
            ..EmbeddedConfig::default()
        };
        assert_eq!(config.reload_interval(), None);
        assert_eq!(config.polling.long_poll_timeout(), None);
    }
}

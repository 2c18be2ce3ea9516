//! Harness configuration.
//!
//! Configuration is per mount: pass it through [`crate::MountOptions`].
//! Nothing here is process-global.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Tunables for async waits, flushing and error output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarnessConfig {
    /// Deadline for `wait_for`, `find_by` and `act_async`, in milliseconds
    #[serde(default = "default_async_timeout_ms")]
    pub async_timeout_ms: u64,

    /// Interval between condition checks while waiting, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Upper bound on render passes in a single flush
    #[serde(default = "default_max_flush_iterations")]
    pub max_flush_iterations: usize,

    /// Maximum characters of DOM included in query errors
    #[serde(default = "default_debug_print_limit")]
    pub debug_print_limit: usize,

    /// Tags whose text is never matched by text queries
    #[serde(default = "default_ignore")]
    pub default_ignore: Vec<String>,

    /// Log a warning when state is updated outside a flush boundary
    #[serde(default = "default_true")]
    pub warn_on_unscoped_updates: bool,
}

fn default_async_timeout_ms() -> u64 {
    3_000
}

fn default_poll_interval_ms() -> u64 {
    50
}

fn default_max_flush_iterations() -> usize {
    50
}

fn default_debug_print_limit() -> usize {
    7_000
}

fn default_ignore() -> Vec<String> {
    vec!["script".to_string(), "style".to_string()]
}

fn default_true() -> bool {
    true
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            async_timeout_ms: default_async_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            max_flush_iterations: default_max_flush_iterations(),
            debug_print_limit: default_debug_print_limit(),
            default_ignore: default_ignore(),
            warn_on_unscoped_updates: true,
        }
    }
}

impl HarnessConfig {
    /// Defaults overridden by `UI_TESTKIT_*` environment variables.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(ms) = env_number("UI_TESTKIT_ASYNC_TIMEOUT_MS") {
            config.async_timeout_ms = ms;
        }

        if let Some(ms) = env_number("UI_TESTKIT_POLL_INTERVAL_MS") {
            config.poll_interval_ms = ms;
        }

        if let Some(limit) = env_number("UI_TESTKIT_MAX_FLUSH_ITERATIONS") {
            config.max_flush_iterations = limit as usize;
        }

        if let Some(limit) = env_number("UI_TESTKIT_DEBUG_PRINT_LIMIT") {
            config.debug_print_limit = limit as usize;
        }

        config
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Deadline for waits and async act scopes.
    pub fn with_async_timeout(mut self, timeout: Duration) -> Self {
        self.async_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Delay between wait attempts.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Flush passes allowed before reporting an update loop.
    pub fn with_max_flush_iterations(mut self, limit: usize) -> Self {
        self.max_flush_iterations = limit;
        self
    }

    /// Maximum characters of markup printed in errors.
    pub fn with_debug_print_limit(mut self, limit: usize) -> Self {
        self.debug_print_limit = limit;
        self
    }

    /// The configured wait deadline.
    pub fn async_timeout(&self) -> Duration {
        Duration::from_millis(self.async_timeout_ms)
    }

    /// The delay between wait attempts, at least one millisecond.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub(crate) fn ignores(&self, tag: &str) -> bool {
        self.default_ignore
            .iter()
            .any(|ignored| ignored.eq_ignore_ascii_case(tag))
    }
}

fn env_number(key: &str) -> Option<u64> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring non-numeric config value");
            None
        }
    }
}

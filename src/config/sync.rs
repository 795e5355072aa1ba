use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Startup barrier configuration
///
/// ```toml
/// [sync]
/// timeout_ms = 30000
/// poll_interval_ms = 100
/// ```
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SyncConfig {
    /// Readiness window for every stream's initial cache population
    #[serde(default = "default_sync_timeout_ms")]
    pub timeout_ms: u64,

    /// How often the barrier polls the watch source for readiness
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_sync_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl SyncConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms < 1 {
            return Err(Error::Config(ConfigError::Message(
                "sync.timeout_ms must be at least 1ms".into(),
            )));
        }

        if self.poll_interval_ms < 1 {
            return Err(Error::Config(ConfigError::Message(
                "sync.poll_interval_ms must be at least 1ms".into(),
            )));
        }

        if self.poll_interval_ms > self.timeout_ms {
            return Err(Error::Config(ConfigError::Message(format!(
                "sync.poll_interval_ms ({}) must not exceed sync.timeout_ms ({})",
                self.poll_interval_ms, self.timeout_ms
            ))));
        }

        Ok(())
    }
}

fn default_sync_timeout_ms() -> u64 {
    30_000
}
// in ms
fn default_poll_interval_ms() -> u64 {
    100
}

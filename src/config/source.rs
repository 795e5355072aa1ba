use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Configuration of the in-memory watch source
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SourceConfig {
    /// Capacity of each kind's event queue.
    /// Producers wait for room when a queue is full; the router never does.
    #[serde(default = "default_event_queue_size")]
    pub event_queue_size: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            event_queue_size: default_event_queue_size(),
        }
    }
}

impl SourceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.event_queue_size == 0 {
            return Err(Error::Config(ConfigError::Message(
                "source.event_queue_size must be greater than 0".into(),
            )));
        }
        Ok(())
    }
}

fn default_event_queue_size() -> usize {
    1000
}

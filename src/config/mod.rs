//! Watcher configuration: namespace, startup barrier and in-memory source.
//!
//! [`WatcherConfig::load`] is the only loader and always returns a validated
//! value. Constructors that take a config validate it again, since every
//! field is public.
mod source;
mod sync;
pub use source::*;
pub use sync::*;


use std::env;

use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::Error;
use crate::Result;

/// Environment variable prefix for overrides, e.g. `CONDWATCH__SYNC__TIMEOUT_MS`
pub const ENV_PREFIX: &str = "CONDWATCH";

/// Main configuration container for the condition watcher
///
/// See [`WatcherConfig::load`] for how sources are layered.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WatcherConfig {
    /// Namespace all watched resources live in; fixed for the watcher's lifetime
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Startup barrier parameters
    #[serde(default)]
    pub sync: SyncConfig,

    /// In-memory watch source parameters
    #[serde(default)]
    pub source: SourceConfig,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            sync: SyncConfig::default(),
            source: SourceConfig::default(),
        }
    }
}

fn default_namespace() -> String {
    "azure-disk-csi".to_string()
}

impl WatcherConfig {
    /// Loads and validates the watcher configuration.
    ///
    /// Layers, later overriding earlier:
    /// 1. Defaults
    /// 2. `path`, or the file named by `CONFIG_PATH` when `path` is `None`
    /// 3. `CONDWATCH__*` environment variables
    ///
    /// ```ignore
    /// std::env::set_var("CONDWATCH__SYNC__TIMEOUT_MS", "60000");
    /// let cfg = WatcherConfig::load(Some("config/watcher.toml"))?;
    /// ```
    pub fn load(path: Option<&str>) -> Result<Self> {
        let path = path.map(str::to_string).or_else(|| env::var("CONFIG_PATH").ok());

        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);
        if let Some(path) = path.as_deref() {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        let config: Self = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        debug!(namespace = %config.namespace, file = ?path, "Watcher configuration loaded");
        config.validate()
    }

    /// Validates configuration and returns validated instance.
    pub fn validate(self) -> Result<Self> {
        if self.namespace.trim().is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "namespace must not be empty".into(),
            )));
        }
        self.sync.validate()?;
        self.source.validate()?;
        Ok(self)
    }
}

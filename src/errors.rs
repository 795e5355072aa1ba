//! Condition Watcher Error Hierarchy
//!
//! Errors are scoped as narrowly as possible: registration conflicts go back
//! to the registering caller, predicate failures to the one waiter whose
//! predicate failed, and router-level problems with no identifiable waiter
//! are only logged.

use std::time::Duration;

use config::ConfigError;

use crate::ResourceKey;
use crate::ResourceKind;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

/// Error type a caller's condition function may return.
pub type ConditionError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A wait is already registered for this key
    #[error("another wait operation in process for {key}")]
    AlreadyWaiting { key: ResourceKey },

    /// The caller's condition function reported a failure
    #[error("condition function failed: {0}")]
    Predicate(#[source] ConditionError),

    /// The watch source handed over an object no resource kind matches
    #[error("unsupported object type {type_name}")]
    UnsupportedObjectType { type_name: String },

    /// Initial cache population did not complete within the readiness window
    #[error("unable to sync caches for {pending:?} within {timeout:?}")]
    SyncTimeout {
        pending: Vec<ResourceKind>,
        timeout: Duration,
    },

    /// Caller-driven cancellation fired before a result was delivered.
    /// `key` is `None` when the watcher itself was shut down during startup.
    #[error("wait cancelled{}", key.as_ref().map(|k| format!(" for {k}")).unwrap_or_default())]
    Cancelled { key: Option<ResourceKey> },

    /// Bounded wait elapsed before a result was delivered
    #[error("timed out after {timeout:?} waiting for {key}")]
    WaitTimeout { key: ResourceKey, timeout: Duration },

    /// The waiter was closed, or its result slot went away without a delivery
    #[error("waiter for {key} is closed")]
    WaiterClosed { key: ResourceKey },

    /// The watch source could not be started
    #[error("watch source error: {0}")]
    WatchSource(String),

    /// The watcher was shut down; no further waits are accepted
    #[error("condition watcher is shut down")]
    Shutdown,

    /// Configuration loading or validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// True for outcomes caused by the caller giving up rather than by the
    /// watched resource.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled { .. } | Error::WaitTimeout { .. })
    }
}

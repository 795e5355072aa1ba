//! Calling contract of the watch source.
//!
//! The watch source discovers resource state from the cluster, keeps a local
//! cache per [`ResourceKind`], and streams create/update/delete notifications
//! to registered handlers. The condition watcher only consumes it through
//! [`WatchSource`]; [`InMemoryWatchSource`] is an in-process implementation.

mod memory;
pub use memory::*;


use std::sync::Arc;

#[cfg(test)]
use mockall::automock;
use tokio_util::sync::CancellationToken;

use crate::ResourceKind;
use crate::ResourceObject;
use crate::Result;

/// Receives notifications for one or more resource kinds.
///
/// Handlers are invoked on the watch source's delivery path and must not
/// block.
pub trait ResourceEventHandler: Send + Sync {
    fn on_add(
        &self,
        obj: &ResourceObject,
    );

    fn on_update(
        &self,
        old: &ResourceObject,
        new: &ResourceObject,
    );

    fn on_delete(
        &self,
        obj: &ResourceObject,
    );
}

#[cfg_attr(test, automock)]
pub trait WatchSource: Send + Sync {
    /// Subscribes `handler` to the event stream of `kind`.
    /// Must be called before [`WatchSource::start`].
    fn add_event_handler(
        &self,
        kind: ResourceKind,
        handler: Arc<dyn ResourceEventHandler>,
    );

    /// Starts delivery on every subscribed stream. Delivery stops once
    /// `shutdown` is cancelled.
    fn start(
        &self,
        shutdown: CancellationToken,
    ) -> Result<()>;

    /// Readiness check: true once the local view of `kind` has been fully
    /// populated from current cluster state.
    fn has_synced(
        &self,
        kind: ResourceKind,
    ) -> bool;
}

//! Single-waiter condition watching over a stream of resource events.
//!
//! A caller registers a wait for exactly one resource key together with a
//! condition function. Events from the watch source are routed to the wait
//! registered for the event's key, the condition is evaluated, and the first
//! terminal outcome is handed to the waiter.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌──────────────┐  per-kind delivery
//! │ WatchSource  │ ─────────────────────┐
//! └──────────────┘                      ▼
//!                              ┌─────────────────┐
//!                              │   EventRouter   │ classify -> (kind, name)
//!                              └────────┬────────┘
//!                                       │ lookup in DashMap
//!                                       ▼
//!                              ┌─────────────────┐
//!                              │ WaiterRegistry  │ at most one entry per key
//!                              └────────┬────────┘
//!                                       │ condition(obj, deleted)
//!                                       │ try_send (capacity 1)
//!                                       ▼
//!                              ┌─────────────────┐
//!                              │ ConditionWaiter │ wait() / close()
//!                              └─────────────────┘
//! ```
//!
//! # Delivery Guarantees
//!
//! - Registration is insert-if-absent: a second wait on an occupied key fails
//!   with [`Error::AlreadyWaiting`](crate::Error::AlreadyWaiting).
//! - The event path never blocks. Delivery is a `try_send` into a slot of
//!   capacity one; a full or abandoned slot is logged and skipped.
//! - Each entry yields at most one result. The entry leaves the registry on
//!   delivery and again (idempotently) when its waiter closes, so the key is
//!   free for the next registration and late events find nothing.
//! - Removal is keyed by entry id, so a stale waiter never evicts a newer
//!   registration for the same key.
//!
//! # Startup
//!
//! [`ConditionWatcher::new`] subscribes to every [`ResourceKind`](crate::ResourceKind)
//! and returns only after each stream finished its initial sync, so no wait is
//! ever registered against a partially populated view.
//!
//! # Usage Example
//!
//! ```ignore
//! let source = Arc::new(InMemoryWatchSource::new("azure-disk-csi", &config.source)?);
//! let watcher = ConditionWatcher::new(source.clone(), &config, CancellationToken::new()).await?;
//!
//! let mut waiter = watcher.new_condition_waiter(ResourceKind::Volume, "pvc-1", |obj, deleted| {
//!     Ok(!deleted && obj.as_volume().and_then(|v| v.state()) == Some(VolumeState::Created))
//! })?;
//!
//! let volume = waiter.wait_timeout(Duration::from_secs(30)).await?;
//! ```

mod condition_watcher;
mod registry;
mod router;
mod sync;
mod waiter;

pub use condition_watcher::*;
pub use registry::*;
pub use router::*;
pub use sync::*;
pub use waiter::*;

#[cfg(test)]
mod registry_test;

use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::trace;

use super::ConditionWaiter;
use crate::ConditionError;
use crate::Error;
use crate::ResourceKey;
use crate::ResourceObject;
use crate::Result;

/// Caller-supplied condition.
///
/// Invoked with the object snapshot and whether the event was a delete.
/// `Ok(true)` ends the wait with the snapshot, `Err` ends it with the error,
/// `Ok(false)` keeps waiting.
pub type ConditionFn =
    dyn Fn(&ResourceObject, bool) -> std::result::Result<bool, ConditionError> + Send + Sync;

/// Terminal outcome of one wait
pub type WaitResult = Result<ResourceObject>;

/// One registered wait.
///
/// Owned by the registry from registration until removal; the router only
/// ever holds a cloned handle for the duration of one event.
pub struct WaitEntry {
    id: u64,
    key: ResourceKey,
    condition: Box<ConditionFn>,
    /// Single-slot result queue (capacity 1)
    sender: mpsc::Sender<WaitResult>,
    terminated: AtomicBool,
}

impl std::fmt::Debug for WaitEntry {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("WaitEntry")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("terminated", &self.terminated)
            .finish_non_exhaustive()
    }
}

impl WaitEntry {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    /// True once a terminal outcome has been claimed for this entry
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    pub(crate) fn evaluate(
        &self,
        obj: &ResourceObject,
        deleted: bool,
    ) -> std::result::Result<bool, ConditionError> {
        (self.condition)(obj, deleted)
    }

    /// Non-blocking delivery of the terminal outcome.
    ///
    /// Only the first caller claims the entry. A slot that is occupied or
    /// whose waiter is gone drops the result. Returns whether the result was
    /// placed in the slot.
    pub(crate) fn try_deliver(
        &self,
        result: WaitResult,
    ) -> bool {
        if self.terminated.swap(true, Ordering::AcqRel) {
            debug!(key = %self.key, entry_id = self.id, "Wait entry already terminated, result dropped");
            return false;
        }

        match self.sender.try_send(result) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                info!(key = %self.key, entry_id = self.id, "Wait slot is already occupied, result dropped");
                false
            }
            Err(TrySendError::Closed(_)) => {
                info!(key = %self.key, entry_id = self.id, "Wait slot is closed, result dropped");
                false
            }
        }
    }
}

/// Concurrent mapping from resource key to at most one active wait.
///
/// Backed by a sharded `DashMap`: insert-if-absent holds only the shard lock
/// of the key being registered, so contention is per key.
pub struct WaiterRegistry {
    entries: DashMap<ResourceKey, Arc<WaitEntry>>,

    /// Next entry ID (monotonically increasing)
    next_id: AtomicU64,
}

impl std::fmt::Debug for WaiterRegistry {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("WaiterRegistry")
            .field("entries", &self.entries.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl Default for WaiterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl WaiterRegistry {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers a wait for `key`.
    ///
    /// Atomically inserts only if no entry exists for `key`; otherwise
    /// returns [`Error::AlreadyWaiting`] and leaves the existing entry
    /// untouched. Of any number of concurrent registrations for one key,
    /// exactly one succeeds.
    pub fn register(
        self: &Arc<Self>,
        key: ResourceKey,
        condition: Box<ConditionFn>,
    ) -> Result<ConditionWaiter> {
        match self.entries.entry(key.clone()) {
            Entry::Occupied(_) => {
                let err = Error::AlreadyWaiting { key };
                error!("{}", err);
                Err(err)
            }
            Entry::Vacant(vacant) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let (sender, receiver) = mpsc::channel(1);

                vacant.insert(Arc::new(WaitEntry {
                    id,
                    key: key.clone(),
                    condition,
                    sender,
                    terminated: AtomicBool::new(false),
                }));

                trace!(entry_id = id, key = %key, "Wait entry registered");

                Ok(ConditionWaiter::new(key, id, self.clone(), receiver))
            }
        }
    }

    /// Returns the active entry for `key`, if any.
    ///
    /// The handle is cloned out of the map so no shard lock outlives the call.
    pub fn lookup(
        &self,
        key: &ResourceKey,
    ) -> Option<Arc<WaitEntry>> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    /// Removes the entry for `key` if it is still the one identified by
    /// `entry_id`. Idempotent; returns whether an entry was removed.
    pub fn remove(
        &self,
        key: &ResourceKey,
        entry_id: u64,
    ) -> bool {
        let removed = self.entries.remove_if(key, |_, entry| entry.id == entry_id).is_some();
        if removed {
            trace!(entry_id, key = %key, "Wait entry removed");
        }
        removed
    }

    /// Drops every entry. Their waiters observe a closed slot.
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn contains(
        &self,
        key: &ResourceKey,
    ) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of active waits
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! In-process watch source.
//!
//! Keeps one cache and one bounded event queue per [`ResourceKind`]. On
//! `start()` every kind gets its own delivery task which first replays the
//! cached objects as adds, then flips the kind's synced flag, then drains the
//! queue until shutdown:
//!
//! ```text
//! apply()/delete() -> store upsert/remove -> queue.send(event)
//!                                                  │
//!                       per-kind delivery task <───┘
//!                                 │
//!                                 ▼
//!                 handler.on_add / on_update / on_delete
//! ```

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use super::ResourceEventHandler;
use super::WatchSource;
use crate::Error;
use crate::ResourceKind;
use crate::ResourceObject;
use crate::Result;
use crate::SourceConfig;

#[derive(Debug, Clone)]
enum SourceEvent {
    Add(ResourceObject),
    Update {
        old: ResourceObject,
        new: ResourceObject,
    },
    Delete(ResourceObject),
}

struct KindStream {
    kind: ResourceKind,
    store: DashMap<String, ResourceObject>,
    handlers: RwLock<Vec<Arc<dyn ResourceEventHandler>>>,
    synced: AtomicBool,
    sender: mpsc::Sender<SourceEvent>,
    /// Taken by the delivery task on start
    receiver: Mutex<Option<mpsc::Receiver<SourceEvent>>>,
}

impl KindStream {
    fn new(
        kind: ResourceKind,
        queue_size: usize,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(queue_size);
        Self {
            kind,
            store: DashMap::new(),
            handlers: RwLock::new(Vec::new()),
            synced: AtomicBool::new(false),
            sender,
            receiver: Mutex::new(Some(receiver)),
        }
    }

    fn dispatch(
        &self,
        event: &SourceEvent,
    ) {
        // Snapshot the handler list so no lock is held while handlers run
        let handlers: Vec<_> = self.handlers.read().clone();
        for handler in handlers.iter() {
            match event {
                SourceEvent::Add(obj) => handler.on_add(obj),
                SourceEvent::Update { old, new } => handler.on_update(old, new),
                SourceEvent::Delete(obj) => handler.on_delete(obj),
            }
        }
        trace!(kind = %self.kind, handlers = handlers.len(), "Event dispatched");
    }
}

struct Inner {
    namespace: String,
    streams: HashMap<ResourceKind, KindStream>,
    started: AtomicBool,
    /// Serializes seeding against `start` so no seeded object misses the replay
    lifecycle: Mutex<()>,
    next_version: AtomicU64,
}

impl Inner {
    fn stream(
        &self,
        kind: ResourceKind,
    ) -> Result<&KindStream> {
        self.streams
            .get(&kind)
            .ok_or_else(|| Error::WatchSource(format!("no event stream for {kind}")))
    }
}

/// Informer-like cache that lives entirely in process.
///
/// Cloning is cheap; all clones share the same caches and streams.
#[derive(Clone)]
pub struct InMemoryWatchSource {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for InMemoryWatchSource {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("InMemoryWatchSource")
            .field("namespace", &self.inner.namespace)
            .field("started", &self.inner.started)
            .finish_non_exhaustive()
    }
}

impl InMemoryWatchSource {
    /// Fails with [`Error::Config`] when `config` does not validate.
    pub fn new(
        namespace: impl Into<String>,
        config: &SourceConfig,
    ) -> Result<Self> {
        config.validate()?;

        let streams = ResourceKind::ALL
            .iter()
            .map(|kind| (*kind, KindStream::new(*kind, config.event_queue_size)))
            .collect();

        Ok(Self {
            inner: Arc::new(Inner {
                namespace: namespace.into(),
                streams,
                started: AtomicBool::new(false),
                lifecycle: Mutex::new(()),
                next_version: AtomicU64::new(1),
            }),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }

    /// Places `obj` in the cache without emitting an event.
    ///
    /// Seeded objects are replayed as adds during initial sync. After start,
    /// use [`InMemoryWatchSource::apply`] instead.
    pub fn seed(
        &self,
        obj: ResourceObject,
    ) -> Result<()> {
        let Some(obj) = self.admit(obj) else {
            return Ok(());
        };
        if self.try_seed(&obj)? {
            Ok(())
        } else {
            Err(Error::WatchSource(
                "cannot seed a watch source that is already started".to_string(),
            ))
        }
    }

    /// Creates or updates `obj`, emitting an add or update event.
    ///
    /// Before start this behaves like [`InMemoryWatchSource::seed`]. An
    /// object no kind describes is not cached; it is handed to every stream
    /// as an add, the way an informer would pass through an undecodable
    /// object.
    pub async fn apply(
        &self,
        obj: ResourceObject,
    ) -> Result<()> {
        let Some(mut obj) = self.admit(obj) else {
            return Ok(());
        };

        let Some(kind) = obj.kind() else {
            if self.inner.started.load(Ordering::Acquire) {
                for stream in self.inner.streams.values() {
                    Self::enqueue(stream, SourceEvent::Add(obj.clone())).await?;
                }
            }
            return Ok(());
        };

        if self.try_seed(&obj)? {
            return Ok(());
        }

        let version = self.inner.next_version.fetch_add(1, Ordering::Relaxed);
        obj.meta_mut().resource_version = version.to_string();

        let stream = self.inner.stream(kind)?;
        let event = match stream.store.insert(obj.name().to_string(), obj.clone()) {
            Some(old) => SourceEvent::Update { old, new: obj },
            None => SourceEvent::Add(obj),
        };
        Self::enqueue(stream, event).await
    }

    /// Removes the named object, emitting a delete event carrying its last
    /// cached state. Returns `false` when nothing was cached under that name.
    pub async fn delete(
        &self,
        kind: ResourceKind,
        name: &str,
    ) -> Result<bool> {
        let stream = self.inner.stream(kind)?;
        let Some((_, last)) = stream.store.remove(name) else {
            debug!(%kind, name, "Delete of unknown object ignored");
            return Ok(false);
        };

        if self.inner.started.load(Ordering::Acquire) {
            Self::enqueue(stream, SourceEvent::Delete(last)).await?;
        }
        Ok(true)
    }

    pub fn get(
        &self,
        kind: ResourceKind,
        name: &str,
    ) -> Option<ResourceObject> {
        self.inner
            .streams
            .get(&kind)
            .and_then(|s| s.store.get(name).map(|o| o.value().clone()))
    }

    pub fn list(
        &self,
        kind: ResourceKind,
    ) -> Vec<ResourceObject> {
        self.inner
            .streams
            .get(&kind)
            .map(|s| s.store.iter().map(|o| o.value().clone()).collect())
            .unwrap_or_default()
    }

    /// Inserts `obj` into its kind's cache unless the source has started.
    /// Returns whether the object was seeded.
    fn try_seed(
        &self,
        obj: &ResourceObject,
    ) -> Result<bool> {
        let _guard = self.inner.lifecycle.lock();
        if self.inner.started.load(Ordering::Acquire) {
            return Ok(false);
        }
        if let Some(kind) = obj.kind() {
            self.inner.stream(kind)?.store.insert(obj.name().to_string(), obj.clone());
        }
        Ok(true)
    }

    fn admit(
        &self,
        obj: ResourceObject,
    ) -> Option<ResourceObject> {
        if obj.namespace() != self.inner.namespace {
            debug!(
                name = obj.name(),
                namespace = obj.namespace(),
                watched = %self.inner.namespace,
                "Object outside watched namespace ignored"
            );
            return None;
        }
        Some(obj)
    }

    async fn enqueue(
        stream: &KindStream,
        event: SourceEvent,
    ) -> Result<()> {
        stream.sender.send(event).await.map_err(|_| {
            Error::WatchSource(format!("event stream for {} is closed", stream.kind))
        })
    }

    async fn run_stream(
        inner: Arc<Inner>,
        kind: ResourceKind,
        mut receiver: mpsc::Receiver<SourceEvent>,
        shutdown: CancellationToken,
    ) {
        let Some(stream) = inner.streams.get(&kind) else {
            return;
        };

        // Initial list
        let initial: Vec<ResourceObject> = stream.store.iter().map(|o| o.value().clone()).collect();
        for obj in initial {
            stream.dispatch(&SourceEvent::Add(obj));
        }
        stream.synced.store(true, Ordering::Release);
        debug!(%kind, "Initial sync completed");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!(%kind, "Delivery received shutdown signal");
                    break;
                }
                event = receiver.recv() => {
                    match event {
                        Some(event) => stream.dispatch(&event),
                        None => {
                            warn!(%kind, "Event queue closed unexpectedly");
                            break;
                        }
                    }
                }
            }
        }

        debug!(%kind, "Delivery stopped");
    }
}

impl WatchSource for InMemoryWatchSource {
    fn add_event_handler(
        &self,
        kind: ResourceKind,
        handler: Arc<dyn ResourceEventHandler>,
    ) {
        if let Some(stream) = self.inner.streams.get(&kind) {
            stream.handlers.write().push(handler);
        }
    }

    fn start(
        &self,
        shutdown: CancellationToken,
    ) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::WatchSource(format!("no async runtime available: {e}")))?;

        {
            let _guard = self.inner.lifecycle.lock();
            if self
                .inner
                .started
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return Err(Error::WatchSource("watch source already started".to_string()));
            }
        }

        for (kind, stream) in self.inner.streams.iter() {
            let Some(receiver) = stream.receiver.lock().take() else {
                continue;
            };
            runtime.spawn(Self::run_stream(
                self.inner.clone(),
                *kind,
                receiver,
                shutdown.clone(),
            ));
        }

        debug!(namespace = %self.inner.namespace, "Watch source started");
        Ok(())
    }

    fn has_synced(
        &self,
        kind: ResourceKind,
    ) -> bool {
        self.inner
            .streams
            .get(&kind)
            .map(|s| s.synced.load(Ordering::Acquire))
            .unwrap_or(false)
    }
}

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;

use super::wait_for_cache_sync;
use super::ConditionWaiter;
use super::EventRouter;
use super::WaiterRegistry;
use crate::ConditionError;
use crate::Error;
use crate::ResourceKey;
use crate::ResourceKind;
use crate::ResourceObject;
use crate::Result;
use crate::WatchSource;
use crate::WatcherConfig;

/// Entry point: one registry and one router scoped to one watch source.
pub struct ConditionWatcher {
    source: Arc<dyn WatchSource>,
    registry: Arc<WaiterRegistry>,
    namespace: String,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for ConditionWatcher {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ConditionWatcher")
            .field("namespace", &self.namespace)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl ConditionWatcher {
    /// Subscribes to every resource kind, starts the source and waits for
    /// the initial sync of each stream.
    ///
    /// No watcher exists until all streams are synced, so no wait can be
    /// registered against a partially populated view. If the readiness
    /// window in `config.sync` elapses first, the source is stopped and
    /// [`Error::SyncTimeout`](crate::Error::SyncTimeout) is returned.
    /// An invalid `config` is rejected before the source is touched.
    pub async fn new(
        source: Arc<dyn WatchSource>,
        config: &WatcherConfig,
        shutdown: CancellationToken,
    ) -> Result<Self> {
        let config = config.clone().validate()?;

        let registry = Arc::new(WaiterRegistry::new());
        let router = Arc::new(EventRouter::new(registry.clone()));

        for kind in ResourceKind::ALL {
            source.add_event_handler(kind, router.clone());
        }

        let shutdown = shutdown.child_token();
        source.start(shutdown.clone())?;

        if let Err(e) = wait_for_cache_sync(source.as_ref(), &ResourceKind::ALL, &config.sync, &shutdown).await {
            shutdown.cancel();
            return Err(e);
        }

        info!(namespace = %config.namespace, "Condition watcher ready");

        Ok(Self {
            source,
            registry,
            namespace: config.namespace,
            shutdown,
        })
    }

    /// Registers a wait for the named resource.
    ///
    /// Fails with [`Error::AlreadyWaiting`](crate::Error::AlreadyWaiting)
    /// while another wait for the same key is active, and with
    /// [`Error::Shutdown`](crate::Error::Shutdown) once the watcher is shut down.
    pub fn new_condition_waiter<F>(
        &self,
        kind: ResourceKind,
        name: &str,
        condition: F,
    ) -> Result<ConditionWaiter>
    where
        F: Fn(&ResourceObject, bool) -> std::result::Result<bool, ConditionError> + Send + Sync + 'static,
    {
        if self.is_shutdown() {
            return Err(Error::Shutdown);
        }

        debug!("Adding a condition function for {} ({})", kind, name);
        let mut waiter = self.registry.register(ResourceKey::new(kind, name), Box::new(condition))?;

        // shutdown may have cleared the registry between the check and the insert
        if self.is_shutdown() {
            waiter.close();
            return Err(Error::Shutdown);
        }
        Ok(waiter)
    }

    pub fn watch_source(&self) -> &Arc<dyn WatchSource> {
        &self.source
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Number of waits currently registered
    pub fn active_waits(&self) -> usize {
        self.registry.len()
    }

    /// Stops event delivery and releases every registered wait.
    /// Outstanding waiters return [`Error::WaiterClosed`](crate::Error::WaiterClosed).
    pub fn shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            info!(namespace = %self.namespace, "Condition watcher shutting down");
        }
        self.shutdown.cancel();
        self.registry.clear();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

impl Drop for ConditionWatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

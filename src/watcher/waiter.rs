use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::trace;

use super::WaitResult;
use super::WaiterRegistry;
use crate::Error;
use crate::ResourceKey;
use crate::ResourceObject;
use crate::Result;

/// Caller handle for one registered wait.
///
/// The handle owns the wait's registry entry: [`ConditionWaiter::close`]
/// removes it, and dropping the handle closes it as well. Every `wait*`
/// call closes the waiter once it returns, whatever the outcome.
pub struct ConditionWaiter {
    key: ResourceKey,
    entry_id: u64,
    registry: Arc<WaiterRegistry>,
    /// None once closed
    receiver: Option<mpsc::Receiver<WaitResult>>,
}

impl std::fmt::Debug for ConditionWaiter {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ConditionWaiter")
            .field("key", &self.key)
            .field("entry_id", &self.entry_id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl ConditionWaiter {
    pub(crate) fn new(
        key: ResourceKey,
        entry_id: u64,
        registry: Arc<WaiterRegistry>,
        receiver: mpsc::Receiver<WaitResult>,
    ) -> Self {
        Self {
            key,
            entry_id,
            registry,
            receiver: Some(receiver),
        }
    }

    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    pub fn is_closed(&self) -> bool {
        self.receiver.is_none()
    }

    /// Waits until a result is delivered or `cancel` fires.
    ///
    /// Pass a token that is never cancelled to wait indefinitely. If a result
    /// and the cancellation are ready at the same time, the result wins.
    pub async fn wait(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<ResourceObject> {
        let key = self.key.clone();
        let receiver = self
            .receiver
            .as_mut()
            .ok_or_else(|| Error::WaiterClosed { key: key.clone() })?;

        let outcome = tokio::select! {
            biased;
            result = receiver.recv() => {
                result.unwrap_or(Err(Error::WaiterClosed { key }))
            }
            _ = cancel.cancelled() => {
                debug!(%key, "Wait cancelled");
                Err(Error::Cancelled { key: Some(key) })
            }
        };

        self.close();
        outcome
    }

    /// Waits at most `timeout` for a result.
    pub async fn wait_timeout(
        &mut self,
        timeout: Duration,
    ) -> Result<ResourceObject> {
        let key = self.key.clone();
        let receiver = self
            .receiver
            .as_mut()
            .ok_or_else(|| Error::WaiterClosed { key: key.clone() })?;

        let outcome = match tokio::time::timeout(timeout, receiver.recv()).await {
            Ok(Some(result)) => result,
            Ok(None) => Err(Error::WaiterClosed { key }),
            Err(_) => {
                debug!(%key, ?timeout, "Wait timed out");
                Err(Error::WaitTimeout { key, timeout })
            }
        };

        self.close();
        outcome
    }

    /// Removes the wait from the registry and discards its result slot.
    ///
    /// Idempotent. A later event for the key finds no entry, and a router
    /// already holding the entry finds the slot closed.
    pub fn close(&mut self) {
        let Some(mut receiver) = self.receiver.take() else {
            return;
        };
        receiver.close();
        self.registry.remove(&self.key, self.entry_id);
        trace!(key = %self.key, entry_id = self.entry_id, "Waiter closed");
    }
}

impl Drop for ConditionWaiter {
    fn drop(&mut self) {
        self.close();
    }
}

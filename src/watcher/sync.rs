use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::trace;

use crate::Error;
use crate::ResourceKind;
use crate::Result;
use crate::SyncConfig;
use crate::WatchSource;

/// Blocks until every stream in `kinds` reports initial sync.
///
/// Probes the source every `poll_interval`. Returns
/// [`Error::SyncTimeout`] naming the kinds still pending when the readiness
/// window closes, or [`Error::Cancelled`] when `shutdown` fires first.
pub async fn wait_for_cache_sync(
    source: &dyn WatchSource,
    kinds: &[ResourceKind],
    config: &SyncConfig,
    shutdown: &CancellationToken,
) -> Result<()> {
    let pending = || -> Vec<ResourceKind> {
        kinds.iter().copied().filter(|kind| !source.has_synced(*kind)).collect()
    };

    let timeout = config.timeout();
    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    let mut interval = tokio::time::interval(config.poll_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                return Err(Error::Cancelled { key: None });
            }
            _ = &mut deadline => {
                let pending = pending();
                if pending.is_empty() {
                    return Ok(());
                }
                let err = Error::SyncTimeout { pending, timeout };
                error!("{}", err);
                return Err(err);
            }
            _ = interval.tick() => {
                let pending = pending();
                if pending.is_empty() {
                    return Ok(());
                }
                trace!(?pending, "Waiting for caches to sync");
            }
        }
    }
}

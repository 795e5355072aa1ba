use std::sync::Arc;
use std::time::Duration;

use condition_watcher::AttachmentRole;
use condition_watcher::AttachmentState;
use condition_watcher::ConditionWatcher;
use condition_watcher::InMemoryWatchSource;
use condition_watcher::ObjectMeta;
use condition_watcher::ResourceObject;
use condition_watcher::Volume;
use condition_watcher::VolumeAttachment;
use condition_watcher::VolumeAttachmentSpec;
use condition_watcher::VolumeAttachmentStatus;
use condition_watcher::VolumeSpec;
use condition_watcher::VolumeState;
use condition_watcher::VolumeStatus;
use condition_watcher::WatcherConfig;
use tokio_util::sync::CancellationToken;

pub const NAMESPACE: &str = "azure-disk-csi";

// generous upper bound for a delivery that should be immediate
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(2);

pub fn test_config() -> WatcherConfig {
    let mut config = WatcherConfig::default();
    config.namespace = NAMESPACE.to_string();
    config.sync.timeout_ms = 2000;
    config.sync.poll_interval_ms = 5;
    config
}

pub fn volume(
    name: &str,
    state: Option<VolumeState>,
) -> ResourceObject {
    ResourceObject::Volume(Volume {
        meta: ObjectMeta::new(name, NAMESPACE),
        spec: VolumeSpec {
            volume_name: name.to_string(),
            capacity_bytes: 1 << 30,
        },
        status: state.map(|state| VolumeStatus { state, error: None }),
    })
}

#[allow(dead_code)]
pub fn attachment(
    name: &str,
    node: &str,
    state: AttachmentState,
) -> ResourceObject {
    ResourceObject::VolumeAttachment(VolumeAttachment {
        meta: ObjectMeta::new(name, NAMESPACE),
        spec: VolumeAttachmentSpec {
            volume_name: "vol-0".to_string(),
            node_name: node.to_string(),
            role: AttachmentRole::Primary,
        },
        status: Some(VolumeAttachmentStatus { state, error: None }),
    })
}

/// Starts an in-memory source seeded with `initial` and a watcher on top of it
pub async fn start_watcher(initial: Vec<ResourceObject>) -> (InMemoryWatchSource, ConditionWatcher) {
    let config = test_config();
    let source = InMemoryWatchSource::new(NAMESPACE, &config.source).expect("valid source config");
    for obj in initial {
        source.seed(obj).expect("seed before start");
    }

    let watcher = ConditionWatcher::new(Arc::new(source.clone()), &config, CancellationToken::new())
        .await
        .expect("watcher should sync");
    (source, watcher)
}

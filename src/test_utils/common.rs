use tracing_subscriber::EnvFilter;

use crate::AttachmentRole;
use crate::AttachmentState;
use crate::ConditionError;
use crate::ConditionFn;
use crate::DriverNode;
use crate::DriverNodeSpec;
use crate::DriverNodeStatus;
use crate::ObjectMeta;
use crate::ResourceObject;
use crate::Volume;
use crate::VolumeAttachment;
use crate::VolumeAttachmentSpec;
use crate::VolumeAttachmentStatus;
use crate::VolumeSpec;
use crate::VolumeState;
use crate::VolumeStatus;

pub const TEST_NAMESPACE: &str = "azure-disk-csi";

pub fn volume(
    name: &str,
    state: Option<VolumeState>,
) -> ResourceObject {
    ResourceObject::Volume(Volume {
        meta: ObjectMeta::new(name, TEST_NAMESPACE),
        spec: VolumeSpec {
            volume_name: name.to_string(),
            capacity_bytes: 10 << 30,
        },
        status: state.map(|state| VolumeStatus { state, error: None }),
    })
}

pub fn attachment(
    name: &str,
    state: Option<AttachmentState>,
) -> ResourceObject {
    ResourceObject::VolumeAttachment(VolumeAttachment {
        meta: ObjectMeta::new(name, TEST_NAMESPACE),
        spec: VolumeAttachmentSpec {
            volume_name: "vol-0".to_string(),
            node_name: "node-0".to_string(),
            role: AttachmentRole::Primary,
        },
        status: state.map(|state| VolumeAttachmentStatus { state, error: None }),
    })
}

pub fn driver_node(
    name: &str,
    ready: Option<bool>,
) -> ResourceObject {
    ResourceObject::DriverNode(DriverNode {
        meta: ObjectMeta::new(name, TEST_NAMESPACE),
        spec: DriverNodeSpec {
            node_name: name.to_string(),
        },
        status: Some(DriverNodeStatus {
            ready_for_volume_allocation: ready,
            message: None,
        }),
    })
}

pub fn unknown_object(
    type_name: &str,
    name: &str,
) -> ResourceObject {
    ResourceObject::Unknown {
        type_name: type_name.to_string(),
        meta: ObjectMeta::new(name, TEST_NAMESPACE),
    }
}

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for unit test.");
}

/// Boxes a closure as a condition function, letting the closure's argument
/// and error types be inferred.
pub fn condition<F>(f: F) -> Box<ConditionFn>
where
    F: Fn(&ResourceObject, bool) -> std::result::Result<bool, ConditionError> + Send + Sync + 'static,
{
    Box::new(f)
}

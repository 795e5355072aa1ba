use serde::Deserialize;
use serde::Serialize;

use super::ResourceKey;
use super::ResourceKind;

/// Metadata shared by every watched object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    /// Opaque version assigned by the cluster; bumped on every change
    #[serde(default)]
    pub resource_version: String,
}

impl ObjectMeta {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            resource_version: String::new(),
        }
    }
}

//---
// Volume

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeState {
    Pending,
    Creating,
    Created,
    CreationFailed,
    Updating,
    Updated,
    UpdateFailed,
    Deleting,
    Deleted,
    DeletionFailed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeSpec {
    pub volume_name: String,
    #[serde(default)]
    pub capacity_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeStatus {
    pub state: VolumeState,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub meta: ObjectMeta,
    pub spec: VolumeSpec,
    #[serde(default)]
    pub status: Option<VolumeStatus>,
}

impl Volume {
    /// Current state, `None` until the controller has written a status
    pub fn state(&self) -> Option<VolumeState> {
        self.status.as_ref().map(|s| s.state)
    }
}

//---
// VolumeAttachment

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttachmentRole {
    Primary,
    Replica,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttachmentState {
    Pending,
    Attaching,
    Attached,
    AttachmentFailed,
    Detaching,
    Detached,
    DetachmentFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeAttachmentSpec {
    pub volume_name: String,
    pub node_name: String,
    pub role: AttachmentRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeAttachmentStatus {
    pub state: AttachmentState,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeAttachment {
    pub meta: ObjectMeta,
    pub spec: VolumeAttachmentSpec,
    #[serde(default)]
    pub status: Option<VolumeAttachmentStatus>,
}

impl VolumeAttachment {
    pub fn state(&self) -> Option<AttachmentState> {
        self.status.as_ref().map(|s| s.state)
    }
}

//---
// DriverNode

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverNodeSpec {
    pub node_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverNodeStatus {
    #[serde(default)]
    pub ready_for_volume_allocation: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverNode {
    pub meta: ObjectMeta,
    pub spec: DriverNodeSpec,
    #[serde(default)]
    pub status: Option<DriverNodeStatus>,
}

impl DriverNode {
    pub fn is_ready(&self) -> bool {
        self.status
            .as_ref()
            .and_then(|s| s.ready_for_volume_allocation)
            .unwrap_or(false)
    }
}

//---

/// Snapshot of a watched object as delivered by the watch source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceObject {
    Volume(Volume),
    VolumeAttachment(VolumeAttachment),
    DriverNode(DriverNode),
    /// An object the source decoded but no [`ResourceKind`] describes
    Unknown { type_name: String, meta: ObjectMeta },
}

impl ResourceObject {
    /// Closed classification over the known variants.
    ///
    /// Returns `None` for [`ResourceObject::Unknown`].
    pub fn kind(&self) -> Option<ResourceKind> {
        match self {
            ResourceObject::Volume(_) => Some(ResourceKind::Volume),
            ResourceObject::VolumeAttachment(_) => Some(ResourceKind::VolumeAttachment),
            ResourceObject::DriverNode(_) => Some(ResourceKind::DriverNode),
            ResourceObject::Unknown { .. } => None,
        }
    }

    pub fn meta(&self) -> &ObjectMeta {
        match self {
            ResourceObject::Volume(v) => &v.meta,
            ResourceObject::VolumeAttachment(a) => &a.meta,
            ResourceObject::DriverNode(n) => &n.meta,
            ResourceObject::Unknown { meta, .. } => meta,
        }
    }

    pub fn meta_mut(&mut self) -> &mut ObjectMeta {
        match self {
            ResourceObject::Volume(v) => &mut v.meta,
            ResourceObject::VolumeAttachment(a) => &mut a.meta,
            ResourceObject::DriverNode(n) => &mut n.meta,
            ResourceObject::Unknown { meta, .. } => meta,
        }
    }

    pub fn name(&self) -> &str {
        &self.meta().name
    }

    pub fn namespace(&self) -> &str {
        &self.meta().namespace
    }

    /// Type name used in logs
    pub fn type_name(&self) -> &str {
        match self {
            ResourceObject::Volume(_) => "AzVolume",
            ResourceObject::VolumeAttachment(_) => "AzVolumeAttachment",
            ResourceObject::DriverNode(_) => "AzDriverNode",
            ResourceObject::Unknown { type_name, .. } => type_name,
        }
    }

    pub fn key(&self) -> Option<ResourceKey> {
        self.kind().map(|kind| ResourceKey::new(kind, self.name()))
    }

    pub fn as_volume(&self) -> Option<&Volume> {
        match self {
            ResourceObject::Volume(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_volume_attachment(&self) -> Option<&VolumeAttachment> {
        match self {
            ResourceObject::VolumeAttachment(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_driver_node(&self) -> Option<&DriverNode> {
        match self {
            ResourceObject::DriverNode(n) => Some(n),
            _ => None,
        }
    }
}

impl From<Volume> for ResourceObject {
    fn from(v: Volume) -> Self {
        ResourceObject::Volume(v)
    }
}

impl From<VolumeAttachment> for ResourceObject {
    fn from(a: VolumeAttachment) -> Self {
        ResourceObject::VolumeAttachment(a)
    }
}

impl From<DriverNode> for ResourceObject {
    fn from(n: DriverNode) -> Self {
        ResourceObject::DriverNode(n)
    }
}

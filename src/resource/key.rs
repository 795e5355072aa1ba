use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Class of watched resource.
///
/// Each kind is served by its own event stream on the watch source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    VolumeAttachment,
    Volume,
    DriverNode,
}

impl ResourceKind {
    /// Every kind the watcher subscribes to at startup
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::VolumeAttachment,
        ResourceKind::Volume,
        ResourceKind::DriverNode,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::VolumeAttachment => "azvolumeattachments",
            ResourceKind::Volume => "azvolume",
            ResourceKind::DriverNode => "azdrivernode",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of one watchable entity within the watcher's namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    pub kind: ResourceKind,
    pub name: String,
}

impl ResourceKey {
    pub fn new(
        kind: ResourceKind,
        name: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

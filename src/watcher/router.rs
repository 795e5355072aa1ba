use std::sync::Arc;

use tracing::debug;
use tracing::error;
use tracing::trace;

use super::WaiterRegistry;
use crate::Error;
use crate::ResourceEventHandler;
use crate::ResourceKey;
use crate::ResourceObject;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Create,
    Update,
    Delete,
}

/// Routes watch source notifications to the wait registered for their key.
///
/// Runs on the shared delivery path of every resource kind, so nothing in
/// here blocks or propagates an error back to the source.
#[derive(Debug)]
pub struct EventRouter {
    registry: Arc<WaiterRegistry>,
}

impl EventRouter {
    pub fn new(registry: Arc<WaiterRegistry>) -> Self {
        Self { registry }
    }

    pub fn handle_event(
        &self,
        obj: &ResourceObject,
        event_type: EventType,
    ) {
        let Some(kind) = obj.kind() else {
            let err = Error::UnsupportedObjectType {
                type_name: obj.type_name().to_string(),
            };
            error!(name = obj.name(), ?event_type, "{}", err);
            return;
        };

        let key = ResourceKey::new(kind, obj.name());
        let Some(entry) = self.registry.lookup(&key) else {
            return;
        };
        if entry.is_terminated() {
            trace!(%key, entry_id = entry.id(), "Wait entry already terminated, event skipped");
            return;
        }
        debug!(%key, entry_id = entry.id(), ?event_type, "Found a wait entry");

        let result = match entry.evaluate(obj, event_type == EventType::Delete) {
            Err(e) => Err(Error::Predicate(e)),
            Ok(true) => Ok(obj.clone()),
            Ok(false) => {
                trace!(%key, ?event_type, "Condition not met");
                return;
            }
        };
        debug!(%key, succeeded = result.is_ok(), "Condition reached a terminal outcome");

        entry.try_deliver(result);
        self.registry.remove(&key, entry.id());
    }
}

impl ResourceEventHandler for EventRouter {
    fn on_add(
        &self,
        obj: &ResourceObject,
    ) {
        self.handle_event(obj, EventType::Create);
    }

    fn on_update(
        &self,
        _old: &ResourceObject,
        new: &ResourceObject,
    ) {
        self.handle_event(new, EventType::Update);
    }

    fn on_delete(
        &self,
        obj: &ResourceObject,
    ) {
        self.handle_event(obj, EventType::Delete);
    }
}

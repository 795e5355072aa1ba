//! Wait for one watched cluster resource to reach a caller-defined condition.
//!
//! A [`ConditionWatcher`] sits on top of a [`WatchSource`] that streams
//! create/update/delete events for volumes, volume attachments and driver
//! nodes. Callers register at most one [`ConditionWaiter`] per resource and
//! block on it until their condition holds, the condition fails, or they give
//! up. See the [`watcher`] module for the delivery guarantees.

mod config;
mod errors;
mod resource;
mod watch_source;
pub mod watcher;

pub use crate::config::*;
pub use errors::*;
pub use resource::*;
pub use watch_source::*;
pub use watcher::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;

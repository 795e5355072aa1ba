//! Unit tests for WaiterRegistry
//!
//! Covers the single-waiter invariant, id-checked removal and slot
//! delivery semantics.

use std::sync::Arc;

use futures::future::join_all;

use super::*;
use crate::test_utils::condition;
use crate::test_utils::volume;
use crate::Error;
use crate::ResourceKey;
use crate::ResourceKind;
use crate::VolumeState;

fn always_met() -> Box<ConditionFn> {
    condition(|_, _| Ok(true))
}

fn key(name: &str) -> ResourceKey {
    ResourceKey::new(ResourceKind::Volume, name)
}

#[test]
fn test_register_single_waiter() {
    let registry = Arc::new(WaiterRegistry::new());

    let _waiter = registry.register(key("v1"), always_met()).unwrap();

    assert_eq!(registry.len(), 1);
    assert!(registry.contains(&key("v1")));
    assert!(registry.lookup(&key("v1")).is_some());
}

#[test]
fn test_second_registration_for_same_key_is_rejected() {
    let registry = Arc::new(WaiterRegistry::new());

    let first = registry.register(key("v1"), always_met()).unwrap();
    let first_id = registry.lookup(&key("v1")).unwrap().id();

    let second = registry.register(key("v1"), always_met());
    assert!(matches!(second, Err(Error::AlreadyWaiting { key: k }) if k == key("v1")));

    // existing entry untouched
    assert_eq!(registry.lookup(&key("v1")).unwrap().id(), first_id);
    assert_eq!(registry.len(), 1);
    drop(first);
}

#[test]
fn test_same_name_under_different_kinds_does_not_conflict() {
    let registry = Arc::new(WaiterRegistry::new());

    let _a = registry
        .register(ResourceKey::new(ResourceKind::Volume, "x"), always_met())
        .unwrap();
    let _b = registry
        .register(ResourceKey::new(ResourceKind::VolumeAttachment, "x"), always_met())
        .unwrap();

    assert_eq!(registry.len(), 2);
}

#[test]
fn test_remove_requires_matching_entry_id() {
    let registry = Arc::new(WaiterRegistry::new());
    let _waiter = registry.register(key("v1"), always_met()).unwrap();
    let id = registry.lookup(&key("v1")).unwrap().id();

    assert!(!registry.remove(&key("v1"), id + 1000));
    assert!(registry.contains(&key("v1")));

    assert!(registry.remove(&key("v1"), id));
    assert!(!registry.contains(&key("v1")));

    // idempotent
    assert!(!registry.remove(&key("v1"), id));
}

#[test]
fn test_entry_ids_are_unique() {
    let registry = Arc::new(WaiterRegistry::new());
    let mut w1 = registry.register(key("v1"), always_met()).unwrap();
    let id1 = registry.lookup(&key("v1")).unwrap().id();
    w1.close();

    let _w2 = registry.register(key("v1"), always_met()).unwrap();
    let id2 = registry.lookup(&key("v1")).unwrap().id();
    assert_ne!(id1, id2);
}

#[test]
fn test_lookup_of_absent_key() {
    let registry = WaiterRegistry::new();
    assert!(registry.lookup(&key("missing")).is_none());
    assert!(registry.is_empty());
}

#[test]
fn test_clear_drops_every_entry() {
    let registry = Arc::new(WaiterRegistry::new());
    let _w1 = registry.register(key("v1"), always_met()).unwrap();
    let _w2 = registry.register(key("v2"), always_met()).unwrap();

    registry.clear();

    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_try_deliver_only_first_outcome_wins() {
    let registry = Arc::new(WaiterRegistry::new());
    let mut waiter = registry.register(key("v1"), always_met()).unwrap();
    let entry = registry.lookup(&key("v1")).unwrap();

    assert!(entry.try_deliver(Ok(volume("v1", Some(VolumeState::Created)))));
    assert!(entry.is_terminated());
    assert!(!entry.try_deliver(Ok(volume("v1", Some(VolumeState::Deleted)))));

    let obj = waiter.wait_timeout(std::time::Duration::from_millis(100)).await.unwrap();
    assert_eq!(obj.as_volume().unwrap().state(), Some(VolumeState::Created));
}

#[tokio::test]
async fn test_try_deliver_into_closed_slot_is_dropped() {
    let registry = Arc::new(WaiterRegistry::new());
    let mut waiter = registry.register(key("v1"), always_met()).unwrap();
    let entry = registry.lookup(&key("v1")).unwrap();

    waiter.close();

    assert!(!entry.try_deliver(Ok(volume("v1", None))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registrations_for_same_key_exactly_one_wins() {
    let registry = Arc::new(WaiterRegistry::new());

    let tasks = (0..32).map(|_| {
        let registry = registry.clone();
        tokio::spawn(async move { registry.register(key("contended"), always_met()) })
    });

    let results: Vec<_> = join_all(tasks).await.into_iter().map(|r| r.unwrap()).collect();

    let winners = results.iter().filter(|r| r.is_ok()).count();
    let losers = results
        .iter()
        .filter(|r| matches!(r, Err(Error::AlreadyWaiting { .. })))
        .count();
    assert_eq!(winners, 1);
    assert_eq!(losers, 31);
    assert_eq!(registry.len(), 1);
}

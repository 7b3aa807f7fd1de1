//! Unit tests for handle_registry.rs
//!
//! Tests reserve/commit/rollback, generation checks, double free,
//! cross-device rejection and per-kind counters.

use crate::error::Error;
use crate::device::{
    Handle, HandleRegistry, ResourceKind, ResourcePayload, ResourceRecord, SamplerState,
    NativeHandle,
};

fn sampler_record() -> ResourceRecord {
    ResourceRecord::new(Some(NativeHandle(7)), ResourcePayload::Sampler(SamplerState::default()))
}

// ============================================================================
// ALLOCATION
// ============================================================================

#[test]
fn test_allocate_then_resolve() {
    let mut registry = HandleRegistry::new();
    let handle = registry.allocate(sampler_record());

    assert_eq!(handle.kind(), ResourceKind::Sampler);
    assert_eq!(handle.device(), registry.device());

    let record = registry.resolve(handle).unwrap();
    assert_eq!(record.native(), Some(NativeHandle(7)));
    assert!(record.as_sampler().is_some());
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.count(ResourceKind::Sampler), 1);
}

#[test]
fn test_reserved_handle_does_not_resolve() {
    let mut registry = HandleRegistry::new();
    let handle = registry.reserve(ResourceKind::Sampler);

    assert_eq!(registry.resolve(handle).unwrap_err(), Error::InvalidHandle(handle));
    assert!(registry.is_empty());

    registry.commit(handle, sampler_record()).unwrap();
    assert!(registry.is_valid(handle));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_rollback_releases_slot() {
    let mut registry = HandleRegistry::new();
    let handle = registry.reserve(ResourceKind::Texture);

    assert!(registry.rollback(handle));
    assert!(!registry.rollback(handle));
    assert!(registry.commit(handle, sampler_record()).is_err());
    assert_eq!(registry.len(), 0);
}

#[test]
fn test_commit_rejects_kind_mismatch() {
    let mut registry = HandleRegistry::new();
    let handle = registry.reserve(ResourceKind::Buffer);

    let result = registry.commit(handle, sampler_record());
    assert_eq!(result, Err(Error::InvalidHandle(handle)));
    assert!(registry.rollback(handle));
}

#[test]
fn test_reserved_slot_keeps_its_kind() {
    let mut registry = HandleRegistry::new();
    let handle = registry.reserve(ResourceKind::Texture);
    let retagged = Handle::new(ResourceKind::Sampler, handle.key(), registry.device());

    // The slot was reserved for a texture, a sampler handle on it is foreign
    assert_eq!(registry.commit(retagged, sampler_record()), Err(Error::InvalidHandle(retagged)));
    assert!(!registry.rollback(retagged));
    assert!(registry.rollback(handle));
}

#[test]
fn test_commit_twice_fails() {
    let mut registry = HandleRegistry::new();
    let handle = registry.reserve(ResourceKind::Sampler);
    registry.commit(handle, sampler_record()).unwrap();

    assert!(registry.commit(handle, sampler_record()).is_err());
    assert!(!registry.rollback(handle));
    assert_eq!(registry.len(), 1);
}

// ============================================================================
// GENERATIONS
// ============================================================================

#[test]
fn test_free_invalidates_handle() {
    let mut registry = HandleRegistry::new();
    let handle = registry.allocate(sampler_record());

    assert!(registry.free(handle).is_some());
    assert!(!registry.is_valid(handle));
    assert_eq!(registry.resolve(handle).unwrap_err(), Error::InvalidHandle(handle));
}

#[test]
fn test_double_free_is_noop() {
    let mut registry = HandleRegistry::new();
    let handle = registry.allocate(sampler_record());

    assert!(registry.free(handle).is_some());
    assert!(registry.free(handle).is_none());
    assert_eq!(registry.len(), 0);
}

#[test]
fn test_slot_reuse_bumps_generation() {
    let mut registry = HandleRegistry::new();
    let first = registry.allocate(sampler_record());
    registry.free(first);

    let second = registry.allocate(sampler_record());
    assert_eq!(first.slot(), second.slot());
    assert_ne!(first.generation(), second.generation());
    assert_ne!(first.id(), second.id());

    assert!(!registry.is_valid(first));
    assert!(registry.is_valid(second));
}

#[test]
fn test_never_allocated_handle_fails() {
    let mut registry = HandleRegistry::new();
    let live = registry.allocate(sampler_record());

    let forged = Handle::from_raw(ResourceKind::Sampler, registry.device(), live.id() + 40);
    assert!(registry.resolve(forged).is_err());

    let wrong_generation = Handle::from_raw(
        ResourceKind::Sampler,
        registry.device(),
        (u64::from(live.generation() + 2) << 32) | u64::from(live.slot()),
    );
    assert!(registry.resolve(wrong_generation).is_err());
}

#[test]
fn test_round_trip_through_raw_id() {
    let mut registry = HandleRegistry::new();
    let handle = registry.allocate(sampler_record());

    let rebuilt = Handle::from_raw(ResourceKind::Sampler, registry.device(), handle.id());
    assert_eq!(rebuilt, handle);
    assert!(registry.is_valid(rebuilt));
}

#[test]
fn test_wrong_kind_tag_fails() {
    let mut registry = HandleRegistry::new();
    let handle = registry.allocate(sampler_record());

    let retagged = Handle::from_raw(ResourceKind::Texture, registry.device(), handle.id());
    assert!(registry.resolve(retagged).is_err());
    assert!(registry.free(retagged).is_none());
    assert!(registry.is_valid(handle));
}

#[test]
fn test_foreign_device_handle_fails() {
    let mut registry_a = HandleRegistry::new();
    let mut registry_b = HandleRegistry::new();
    assert_ne!(registry_a.device(), registry_b.device());

    let handle_a = registry_a.allocate(sampler_record());
    let _handle_b = registry_b.allocate(sampler_record());

    assert!(registry_b.resolve(handle_a).is_err());
    assert!(registry_b.free(handle_a).is_none());
    assert_eq!(registry_b.len(), 1);
}

// ============================================================================
// NAMES, COUNTS, DRAIN
// ============================================================================

#[test]
fn test_set_name() {
    let mut registry = HandleRegistry::new();
    let handle = registry.allocate(sampler_record());

    assert_eq!(registry.name(handle), None);
    registry.set_name(handle, "linear_clamp").unwrap();
    assert_eq!(registry.name(handle), Some("linear_clamp"));

    registry.free(handle);
    assert!(registry.set_name(handle, "gone").is_err());
}

#[test]
fn test_handles_and_drain() {
    let mut registry = HandleRegistry::new();
    let a = registry.allocate(sampler_record());
    let b = registry.allocate(sampler_record());
    let reserved = registry.reserve(ResourceKind::Buffer);

    let mut handles: Vec<Handle> = registry.handles().collect();
    handles.sort_by_key(|h| h.id());
    let mut expected = vec![a, b];
    expected.sort_by_key(|h| h.id());
    assert_eq!(handles, expected);

    let drained = registry.drain();
    assert_eq!(drained.len(), 2);
    assert!(registry.is_empty());
    assert!(!registry.is_valid(a));
    assert!(!registry.rollback(reserved));
}

//! Cache store trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use serde_json::Value;

/// A cached payload plus the moment it was last successfully fetched.
///
/// Staleness is a property of the query (each has its own window), not of
/// the entry, so the store only records the timestamp.
#[derive(Debug, Clone)]
pub struct CacheEntry {
  pub value: Value,
  pub fetched_at: Instant,
}

/// Trait for cache storage backends.
///
/// Payloads are stored in canonical serialized form so one store handles
/// every query's result type. Retention is the store's own business; the
/// query layer never evicts.
pub trait CacheStore: Send + Sync {
  /// Look up the entry for a key.
  fn get(&self, key: &str) -> Option<CacheEntry>;

  /// Store a payload for a key, stamping it as fetched now.
  fn put(&self, key: &str, value: Value);

  /// Drop the entry for a key.
  fn remove(&self, key: &str);
}

/// Store that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStore;

impl CacheStore for NoopStore {
  fn get(&self, _key: &str) -> Option<CacheEntry> {
    None // Always miss
  }

  fn put(&self, _key: &str, _value: Value) {
    // Discard
  }

  fn remove(&self, _key: &str) {}
}

/// In-memory cache store.
#[derive(Default)]
pub struct MemoryStore {
  entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl CacheStore for MemoryStore {
  fn get(&self, key: &str) -> Option<CacheEntry> {
    self
      .entries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .get(key)
      .cloned()
  }

  fn put(&self, key: &str, value: Value) {
    let entry = CacheEntry {
      value,
      fetched_at: Instant::now(),
    };
    self
      .entries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(key.to_string(), entry);
  }

  fn remove(&self, key: &str) {
    self
      .entries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .remove(key);
  }
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Bounded memoization of query results.

use std::fmt::Debug;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lru::LruCache;
use tracing::debug;

/// Default number of results kept per cache.
pub const DEFAULT_CAPACITY: usize = 64;

/// LRU cache of computed results keyed by an explicit key type.
///
/// Values are handed out as `Arc<V>`, so every hit for the same key returns
/// the same allocation. Entries never expire; the least recently used one is
/// evicted once `capacity` is reached. Results are not refreshed if the
/// underlying repository changes during the process lifetime.
pub struct MemoCache<K, V> {
	name: &'static str,
	entries: Mutex<LruCache<K, Arc<V>>>,
}

impl<K, V> MemoCache<K, V>
where
	K: Hash + Eq + Clone + Debug,
{
	pub fn new(name: &'static str, capacity: NonZeroUsize) -> Self {
		Self {
			name,
			entries: Mutex::new(LruCache::new(capacity)),
		}
	}

	pub fn get(&self, key: &K) -> Option<Arc<V>> {
		self.lock().get(key).cloned()
	}

	/// Return the cached value for `key`, computing it with `compute` on a miss.
	///
	/// `compute` runs without the lock held. Two threads missing on the same
	/// key may both compute; the last insert wins. Errors are returned as-is
	/// and nothing is cached for them.
	pub fn get_or_try_insert_with<E, F>(&self, key: &K, compute: F) -> Result<Arc<V>, E>
	where
		F: FnOnce() -> Result<V, E>,
	{
		if let Some(hit) = self.get(key) {
			debug!(cache = self.name, key = ?key, "memo hit");
			return Ok(hit);
		}

		debug!(cache = self.name, key = ?key, "memo miss");
		let value = Arc::new(compute()?);
		self.lock().put(key.clone(), Arc::clone(&value));
		Ok(value)
	}

	pub fn len(&self) -> usize {
		self.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.lock().is_empty()
	}

	pub fn capacity(&self) -> NonZeroUsize {
		self.lock().cap()
	}

	pub fn clear(&self) {
		self.lock().clear();
	}

	fn lock(&self) -> MutexGuard<'_, LruCache<K, Arc<V>>> {
		self.entries.lock().unwrap_or_else(PoisonError::into_inner)
	}
}

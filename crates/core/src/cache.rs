//! Bounded LRU cache of decoded and normalized frames.
//!
//! Lookups of populated entries take a shared read lock and bump an atomic
//! recency stamp. Population is serialized per key: concurrent misses on the
//! same key wait for the first decode instead of repeating it.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::{Mutex, RwLock};

use crate::config::ImageConfig;
use crate::decoder::{PixelGrid, decode_frame};
use crate::error::Result;
use crate::geometry::FrameGeometry;
use crate::normalize::{DisplayGrid, NormalizeParams, normalize};
use crate::source::ByteSource;

pub const DEFAULT_CAPACITY: usize = 10;

/// Cache key: frame index plus the fingerprint of the config it was decoded under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub frame_index: usize,
    pub fingerprint: u32,
}

impl CacheKey {
    pub fn new(frame_index: usize, config: &ImageConfig) -> Self {
        Self {
            frame_index,
            fingerprint: config.fingerprint(),
        }
    }
}

/// One frame in both its raw and display forms.
#[derive(Debug)]
pub struct DecodedFrame {
    pub index: usize,
    pub pixels: PixelGrid,
    pub display: DisplayGrid,
}

struct Slot {
    frame: Arc<DecodedFrame>,
    last_used: AtomicU64,
}

/// Hit/miss counters, mostly for diagnostics and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

pub struct FrameCache {
    capacity: usize,
    entries: RwLock<HashMap<CacheKey, Slot>>,
    inflight: Mutex<HashMap<CacheKey, Arc<Mutex<()>>>>,
    clock: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl FrameCache {
    /// Create a cache holding at most `capacity` frames (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: RwLock::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
            clock: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut entries = self.entries.write();
        if !entries.is_empty() {
            tracing::debug!(entries = entries.len(), "clearing frame cache");
        }
        entries.clear();
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Cached frame for `key`, marking it most recently used.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<DecodedFrame>> {
        let entries = self.entries.read();
        let slot = entries.get(key)?;
        slot.last_used.store(self.tick(), Ordering::Relaxed);
        Some(Arc::clone(&slot.frame))
    }

    fn insert(&self, key: CacheKey, frame: Arc<DecodedFrame>) {
        let mut entries = self.entries.write();
        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            let victim = entries
                .iter()
                .min_by_key(|(_, slot)| slot.last_used.load(Ordering::Relaxed))
                .map(|(k, _)| *k);
            if let Some(victim) = victim {
                entries.remove(&victim);
                self.evictions.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(frame = victim.frame_index, "evicted frame");
            }
        }
        entries.insert(
            key,
            Slot {
                frame,
                last_used: AtomicU64::new(self.tick()),
            },
        );
    }

    /// Return the cached frame for `key`, or build it with `build` and store it.
    ///
    /// At most one `build` runs per key at a time; other callers for the same
    /// key block until it finishes and then read the stored result.
    pub fn get_or_insert_with<F>(&self, key: CacheKey, build: F) -> Result<Arc<DecodedFrame>>
    where
        F: FnOnce() -> Result<DecodedFrame>,
    {
        if let Some(frame) = self.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(frame);
        }

        let gate = Arc::clone(self.inflight.lock().entry(key).or_default());
        let result = {
            let _populating = gate.lock();
            if let Some(frame) = self.get(&key) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(frame)
            } else {
                self.misses.fetch_add(1, Ordering::Relaxed);
                build().map(|frame| {
                    let frame = Arc::new(frame);
                    self.insert(key, Arc::clone(&frame));
                    frame
                })
            }
        };

        let mut inflight = self.inflight.lock();
        if inflight.get(&key).is_some_and(|g| Arc::ptr_eq(g, &gate)) {
            inflight.remove(&key);
        }
        result
    }

    /// Decode frame `index` of `source` under `config`, going through the cache.
    pub fn get_or_decode(
        &self,
        index: usize,
        config: &ImageConfig,
        params: &NormalizeParams,
        source: &ByteSource,
    ) -> Result<Arc<DecodedFrame>> {
        self.get_or_insert_with(CacheKey::new(index, config), || {
            let started = Instant::now();
            let geometry = FrameGeometry::compute(config, source.len());
            let (offset, length) = geometry.frame_byte_range(index)?;
            let raw = source.read(offset, length)?;
            let pixels = decode_frame(raw, config)?;
            let display = normalize(&pixels, params);
            tracing::debug!(
                frame = index,
                elapsed_us = started.elapsed().as_micros() as u64,
                "decoded frame"
            );
            Ok(DecodedFrame {
                index,
                pixels,
                display,
            })
        })
    }
}

impl Default for FrameCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Computation cache for repeated geometric queries.
//!
//! Four independent value families (wall snapshots, quality metrics,
//! arbitrary geometric-computation results, intersection-result lists), each
//! with its own TTL. Reads take a shared lock and bump access metadata
//! through atomics, so concurrent readers never block each other; writes
//! serialize per family. Capacity is a global budget over entry count and
//! estimated bytes; exceeding either evicts under the configured policy
//! until back under budget.
//!
//! The cache is an explicitly constructed object injected into the engines
//! that need it; there is no process-wide singleton, so tests can run
//! independent caches side by side.

use rustc_hash::FxHashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use wall_lite_core::{Intersection, QualityMetrics, Wall};

/// Which entry leaves first when the cache is over budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum EvictionPolicy {
    /// Oldest last-access evicted first.
    Lru,
    /// Lowest access count evicted first.
    Lfu,
    /// Oldest insertion evicted first.
    Ttl,
}

/// Configuration for the computation cache
#[derive(Debug, Clone, Copy)]
pub struct GeometryCacheConfig {
    /// Ceiling on total entries across all families. Default: 4096
    pub max_entries: usize,

    /// Ceiling on total estimated bytes across all families.
    /// Default: 64 MiB
    pub max_memory_bytes: usize,

    pub policy: EvictionPolicy,

    /// Time-to-live per family.
    pub wall_ttl: Duration,
    pub quality_ttl: Duration,
    pub computation_ttl: Duration,
    pub intersection_ttl: Duration,
}

impl Default for GeometryCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 4096,
            max_memory_bytes: 64 * 1024 * 1024,
            policy: EvictionPolicy::Lru,
            wall_ttl: Duration::from_secs(300),
            quality_ttl: Duration::from_secs(120),
            computation_ttl: Duration::from_secs(600),
            intersection_ttl: Duration::from_secs(600),
        }
    }
}

/// A cached value with its bookkeeping.
#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    /// Nanoseconds since `epoch` of the owning cache.
    last_access_ns: AtomicU64,
    access_count: AtomicU64,
    size_bytes: usize,
}

/// One value family: a keyed map plus its TTL.
#[derive(Debug)]
struct Family<V> {
    map: RwLock<FxHashMap<String, CacheEntry<V>>>,
    ttl: Duration,
}

impl<V: Clone> Family<V> {
    fn new(ttl: Duration) -> Self {
        Self {
            map: RwLock::new(FxHashMap::default()),
            ttl,
        }
    }

    /// Shared-lock read; expired entries count as misses.
    fn get(&self, key: &str, epoch: Instant) -> Option<V> {
        let map = self.map.read().expect("cache lock poisoned");
        let entry = map.get(key)?;
        if entry.inserted_at.elapsed() > self.ttl {
            return None;
        }
        entry
            .last_access_ns
            .store(epoch.elapsed().as_nanos() as u64, Ordering::Relaxed);
        entry.access_count.fetch_add(1, Ordering::Relaxed);
        Some(entry.value.clone())
    }

    fn insert(&self, key: String, value: V, size_bytes: usize, epoch: Instant) -> isize {
        let mut map = self.map.write().expect("cache lock poisoned");
        let entry = CacheEntry {
            value,
            inserted_at: Instant::now(),
            last_access_ns: AtomicU64::new(epoch.elapsed().as_nanos() as u64),
            access_count: AtomicU64::new(0),
            size_bytes,
        };
        let old = map.insert(key, entry);
        size_bytes as isize - old.map_or(0, |e| e.size_bytes as isize)
    }

    fn remove(&self, key: &str) -> Option<usize> {
        let mut map = self.map.write().expect("cache lock poisoned");
        map.remove(key).map(|e| e.size_bytes)
    }

    fn len(&self) -> usize {
        self.map.read().expect("cache lock poisoned").len()
    }

    /// Victim candidate under the policy: (key, badness) where the largest
    /// badness is evicted first. Idle time breaks ties so equally-ranked
    /// entries evict deterministically.
    fn victim(&self, policy: EvictionPolicy, epoch: Instant) -> Option<(String, u128)> {
        let map = self.map.read().expect("cache lock poisoned");
        let now_ns = epoch.elapsed().as_nanos() as u64;
        map.iter()
            .map(|(k, e)| {
                let idle_ns =
                    now_ns.saturating_sub(e.last_access_ns.load(Ordering::Relaxed)) as u128;
                let badness = match policy {
                    // Longest-idle entry.
                    EvictionPolicy::Lru => idle_ns,
                    // Invert so "least used" sorts largest.
                    EvictionPolicy::Lfu => {
                        let unused = (u64::MAX - e.access_count.load(Ordering::Relaxed)) as u128;
                        (unused << 64) | idle_ns
                    }
                    // Oldest insertion.
                    EvictionPolicy::Ttl => e.inserted_at.elapsed().as_nanos(),
                };
                (k.clone(), badness)
            })
            .max_by_key(|(_, b)| *b)
    }

    fn remove_matching(&self, pred: impl Fn(&str) -> bool) -> (usize, usize) {
        let mut map = self.map.write().expect("cache lock poisoned");
        let keys: Vec<String> = map.keys().filter(|k| pred(k)).cloned().collect();
        let mut bytes = 0;
        for k in &keys {
            if let Some(e) = map.remove(k) {
                bytes += e.size_bytes;
            }
        }
        (keys.len(), bytes)
    }
}

/// Counters exposed for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
    pub memory_bytes: usize,
}

/// The shared computation cache.
#[derive(Debug)]
pub struct GeometryCache {
    config: GeometryCacheConfig,
    epoch: Instant,

    walls: Family<Wall>,
    quality: Family<QualityMetrics>,
    computations: Family<serde_json::Value>,
    intersections: Family<Vec<Intersection>>,

    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    memory_bytes: AtomicUsize,
}

impl Default for GeometryCache {
    fn default() -> Self {
        Self::new(GeometryCacheConfig::default())
    }
}

impl GeometryCache {
    pub fn new(config: GeometryCacheConfig) -> Self {
        Self {
            config,
            epoch: Instant::now(),
            walls: Family::new(config.wall_ttl),
            quality: Family::new(config.quality_ttl),
            computations: Family::new(config.computation_ttl),
            intersections: Family::new(config.intersection_ttl),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            memory_bytes: AtomicUsize::new(0),
        }
    }

    /// Canonical key for an arbitrary geometric computation: operation name,
    /// wall id, tolerance and a stable JSON encoding of the parameters.
    pub fn computation_key<P: Serialize>(
        operation: &str,
        wall_id: &str,
        tolerance: f64,
        params: &P,
    ) -> String {
        let encoded = serde_json::to_string(params).unwrap_or_else(|_| "null".to_string());
        format!("comp:{operation}:{wall_id}:{tolerance:e}:{encoded}")
    }

    // --- wall snapshots ---

    pub fn get_wall(&self, id: &str) -> Option<Wall> {
        self.track(self.walls.get(id, self.epoch))
    }

    pub fn put_wall(&self, wall: Wall) {
        let size = estimate_wall_bytes(&wall);
        let delta = self.walls.insert(wall.id.clone(), wall, size, self.epoch);
        self.bump_memory(delta);
        self.enforce_budget();
    }

    // --- quality metrics ---

    pub fn get_quality(&self, wall_id: &str) -> Option<QualityMetrics> {
        self.track(self.quality.get(wall_id, self.epoch))
    }

    pub fn put_quality(&self, wall_id: &str, metrics: QualityMetrics) {
        let size = 256 + metrics.issues.len() * 128;
        let delta = self.quality.insert(wall_id.to_string(), metrics, size, self.epoch);
        self.bump_memory(delta);
        self.enforce_budget();
    }

    // --- arbitrary computation results ---

    pub fn get_computation(&self, key: &str) -> Option<serde_json::Value> {
        self.track(self.computations.get(key, self.epoch))
    }

    pub fn put_computation(&self, key: String, value: serde_json::Value) {
        let size = 64 + key.len() + estimate_value_bytes(&value);
        let delta = self.computations.insert(key, value, size, self.epoch);
        self.bump_memory(delta);
        self.enforce_budget();
    }

    // --- intersection result lists ---

    pub fn get_intersections(&self, key: &str) -> Option<Vec<Intersection>> {
        self.track(self.intersections.get(key, self.epoch))
    }

    pub fn put_intersections(&self, key: String, list: Vec<Intersection>) {
        let size: usize = 128 + list.iter().map(estimate_intersection_bytes).sum::<usize>();
        let delta = self.intersections.insert(key, list, size, self.epoch);
        self.bump_memory(delta);
        self.enforce_budget();
    }

    /// Cascade removal of everything touching a wall across all families.
    pub fn invalidate_wall(&self, wall_id: &str) {
        let mut freed = 0usize;
        if let Some(b) = self.walls.remove(wall_id) {
            freed += b;
        }
        if let Some(b) = self.quality.remove(wall_id) {
            freed += b;
        }
        // Computation keys embed the wall id as the third colon field.
        let needle = wall_id.to_string();
        let (_, b) = self.computations.remove_matching(|k| {
            k.split(':').nth(2).is_some_and(|f| f == needle)
        });
        freed += b;
        // Intersection keys list sorted wall ids in the second field.
        let (_, b) = self.intersections.remove_matching(|k| {
            k.split(':')
                .nth(1)
                .is_some_and(|ids| ids.split(',').any(|id| id == needle))
        });
        freed += b;

        self.bump_memory(-(freed as isize));
        tracing::debug!(wall_id, freed_bytes = freed, "invalidated wall across cache families");
    }

    pub fn clear(&self) {
        self.walls.remove_matching(|_| true);
        self.quality.remove_matching(|_| true);
        self.computations.remove_matching(|_| true);
        self.intersections.remove_matching(|_| true);
        self.memory_bytes.store(0, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.walls.len() + self.quality.len() + self.computations.len() + self.intersections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.len(),
            memory_bytes: self.memory_bytes.load(Ordering::Relaxed),
        }
    }

    fn track<V>(&self, hit: Option<V>) -> Option<V> {
        match hit {
            Some(v) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(v)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn bump_memory(&self, delta: isize) {
        if delta >= 0 {
            self.memory_bytes.fetch_add(delta as usize, Ordering::Relaxed);
        } else {
            self.memory_bytes
                .fetch_sub(delta.unsigned_abs(), Ordering::Relaxed);
        }
    }

    /// Evict until both ceilings hold. Families are scanned in a fixed order;
    /// the worst candidate across all of them goes first.
    fn enforce_budget(&self) {
        loop {
            let entries = self.len();
            let bytes = self.memory_bytes.load(Ordering::Relaxed);
            if entries <= self.config.max_entries && bytes <= self.config.max_memory_bytes {
                return;
            }
            if entries == 0 {
                return;
            }

            let mut worst: Option<(FamilyTag, String, u128)> = None;
            for tag in FamilyTag::ALL {
                let candidate = match tag {
                    FamilyTag::Walls => self.walls.victim(self.config.policy, self.epoch),
                    FamilyTag::Quality => self.quality.victim(self.config.policy, self.epoch),
                    FamilyTag::Computations => {
                        self.computations.victim(self.config.policy, self.epoch)
                    }
                    FamilyTag::Intersections => {
                        self.intersections.victim(self.config.policy, self.epoch)
                    }
                };
                if let Some((key, badness)) = candidate {
                    if worst.as_ref().map_or(true, |(_, _, b)| badness > *b) {
                        worst = Some((tag, key, badness));
                    }
                }
            }

            let Some((tag, key, _)) = worst else { return };
            let freed = match tag {
                FamilyTag::Walls => self.walls.remove(&key),
                FamilyTag::Quality => self.quality.remove(&key),
                FamilyTag::Computations => self.computations.remove(&key),
                FamilyTag::Intersections => self.intersections.remove(&key),
            };
            if let Some(b) = freed {
                self.bump_memory(-(b as isize));
                self.evictions.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key = %key, bytes = b, "evicted cache entry");
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FamilyTag {
    Walls,
    Quality,
    Computations,
    Intersections,
}

impl FamilyTag {
    const ALL: [FamilyTag; 4] = [
        FamilyTag::Walls,
        FamilyTag::Quality,
        FamilyTag::Computations,
        FamilyTag::Intersections,
    ];
}

fn estimate_wall_bytes(wall: &Wall) -> usize {
    let point_bytes = 96;
    let curve_points = wall.baseline.points.len()
        + wall.left_offset.as_ref().map_or(0, |c| c.points.len())
        + wall.right_offset.as_ref().map_or(0, |c| c.points.len());
    let solid_points = wall.solid.as_ref().map_or(0, |s| s.vertex_count());
    256 + (curve_points + solid_points) * point_bytes
}

fn estimate_intersection_bytes(ix: &Intersection) -> usize {
    let point_bytes = 96;
    let solid_points = ix.resolved.as_ref().map_or(0, |s| s.vertex_count());
    256 + (ix.offset_points.len() + solid_points) * point_bytes
}

fn estimate_value_bytes(value: &serde_json::Value) -> usize {
    match value {
        serde_json::Value::Null | serde_json::Value::Bool(_) | serde_json::Value::Number(_) => 16,
        serde_json::Value::String(s) => 24 + s.len(),
        serde_json::Value::Array(a) => 24 + a.iter().map(estimate_value_bytes).sum::<usize>(),
        serde_json::Value::Object(o) => {
            24 + o
                .iter()
                .map(|(k, v)| k.len() + estimate_value_bytes(v))
                .sum::<usize>()
        }
    }
}

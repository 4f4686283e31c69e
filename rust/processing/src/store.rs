// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Persistence contract.
//!
//! The core treats storage as an opaque keyed + spatial store and depends
//! only on this trait, never on a concrete engine. [`MemoryWallStore`] is
//! the reference implementation used by tests.

use crate::error::{Error, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use wall_lite_core::{BoundingBox, UnifiedWallData, WallId};

/// Outcome of one save or load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreResult {
    pub wall_id: WallId,
    /// Monotonic per-wall version, bumped on every save.
    pub version: u64,
    /// Milliseconds since the UNIX epoch.
    pub timestamp_ms: u64,
}

/// Opaque key-value + spatial wall store.
pub trait WallStore: Send + Sync {
    fn save_wall(&self, wall: &UnifiedWallData) -> Result<StoreResult>;

    fn load_wall(&self, id: &str) -> Result<UnifiedWallData>;

    /// Batch save; per-item failures abort nothing else.
    fn save_walls(&self, walls: &[UnifiedWallData]) -> Vec<Result<StoreResult>> {
        walls.iter().map(|w| self.save_wall(w)).collect()
    }

    /// Batch load, skipping missing ids.
    fn load_walls(&self, ids: &[WallId]) -> Vec<UnifiedWallData> {
        ids.iter().filter_map(|id| self.load_wall(id).ok()).collect()
    }

    /// Walls intersecting the query box.
    fn query_bbox(&self, bbox: &BoundingBox) -> Result<Vec<UnifiedWallData>>;

    fn delete_wall(&self, id: &str) -> Result<bool>;
}

/// In-memory store for tests and single-process sessions.
#[derive(Debug, Default)]
pub struct MemoryWallStore {
    walls: RwLock<FxHashMap<WallId, (UnifiedWallData, u64)>>,
}

impl MemoryWallStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WallStore for MemoryWallStore {
    fn save_wall(&self, wall: &UnifiedWallData) -> Result<StoreResult> {
        let mut guard = self.walls.write().map_err(|_| Error::Store("poisoned".into()))?;
        let version = guard.get(&wall.id).map_or(1, |(_, v)| v + 1);
        guard.insert(wall.id.clone(), (wall.clone(), version));
        tracing::debug!(wall_id = %wall.id, version, "saved wall");
        Ok(StoreResult {
            wall_id: wall.id.clone(),
            version,
            timestamp_ms: wall_lite_core::now_ms(),
        })
    }

    fn load_wall(&self, id: &str) -> Result<UnifiedWallData> {
        let guard = self.walls.read().map_err(|_| Error::Store("poisoned".into()))?;
        guard
            .get(id)
            .map(|(w, _)| w.clone())
            .ok_or_else(|| Error::UnknownWall(id.to_string()))
    }

    fn query_bbox(&self, bbox: &BoundingBox) -> Result<Vec<UnifiedWallData>> {
        let guard = self.walls.read().map_err(|_| Error::Store("poisoned".into()))?;
        Ok(guard
            .values()
            .filter(|(w, _)| {
                w.basic.nodes.iter().any(|n| {
                    n.x >= bbox.min_x && n.x <= bbox.max_x && n.y >= bbox.min_y && n.y <= bbox.max_y
                })
            })
            .map(|(w, _)| w.clone())
            .collect())
    }

    fn delete_wall(&self, id: &str) -> Result<bool> {
        let mut guard = self.walls.write().map_err(|_| Error::Store("poisoned".into()))?;
        Ok(guard.remove(id).is_some())
    }
}

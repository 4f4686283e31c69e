// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared wall registry with per-wall-id write serialization.
//!
//! Concurrent batch passes may read the registry freely; writes to the same
//! wall id serialize through a striped lock so two workers never interleave
//! a read-modify-write on one wall. Writes to different ids proceed in
//! parallel up to the stripe count.

use crate::error::{Error, Result};
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, RwLock};
use wall_lite_core::{UnifiedWallData, WallRegistry};

const STRIPES: usize = 16;

/// Thread-safe wrapper over [`WallRegistry`].
#[derive(Debug)]
pub struct SharedWallRegistry {
    inner: RwLock<WallRegistry>,
    stripes: [Mutex<()>; STRIPES],
}

impl Default for SharedWallRegistry {
    fn default() -> Self {
        Self {
            inner: RwLock::new(WallRegistry::new()),
            stripes: std::array::from_fn(|_| Mutex::new(())),
        }
    }
}

impl SharedWallRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn stripe_for(&self, id: &str) -> &Mutex<()> {
        let mut hasher = rustc_hash::FxHasher::default();
        id.hash(&mut hasher);
        &self.stripes[(hasher.finish() as usize) % STRIPES]
    }

    /// Shared read access.
    pub fn read<R>(&self, f: impl FnOnce(&WallRegistry) -> R) -> R {
        let guard = self.inner.read().expect("registry lock poisoned");
        f(&guard)
    }

    /// Insert a new wall; duplicate ids are rejected by the registry.
    pub fn insert(&self, wall: UnifiedWallData) -> Result<()> {
        let _stripe = self.stripe_for(&wall.id).lock().expect("stripe poisoned");
        let mut guard = self.inner.write().expect("registry lock poisoned");
        guard.insert(wall)?;
        Ok(())
    }

    /// Mutate one wall under its id stripe. Readers block only for the
    /// duration of the closure.
    pub fn with_wall_mut<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut UnifiedWallData) -> R,
    ) -> Result<R> {
        let _stripe = self.stripe_for(id).lock().expect("stripe poisoned");
        let mut guard = self.inner.write().expect("registry lock poisoned");
        match guard.get_mut(id) {
            Some(wall) => Ok(f(wall)),
            None => Err(Error::UnknownWall(id.to_string())),
        }
    }

    /// Remove a wall and everything derived from it.
    pub fn remove(&self, id: &str) -> Option<UnifiedWallData> {
        let _stripe = self.stripe_for(id).lock().expect("stripe poisoned");
        let mut guard = self.inner.write().expect("registry lock poisoned");
        guard.remove(id)
    }

    /// Snapshot of every wall, for batch passes over immutable input.
    pub fn snapshot(&self) -> Vec<UnifiedWallData> {
        let guard = self.inner.read().expect("registry lock poisoned");
        guard.iter().cloned().collect()
    }

    /// Replace walls wholesale after a batch pass, one stripe at a time.
    pub fn write_back(&self, walls: Vec<UnifiedWallData>) {
        for wall in walls {
            let _stripe = self.stripe_for(&wall.id).lock().expect("stripe poisoned");
            let mut guard = self.inner.write().expect("registry lock poisoned");
            guard.replace(wall);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wall_lite_core::{BasicNode, WallKind};

    fn wall(id: &str) -> UnifiedWallData {
        UnifiedWallData::from_basic(
            id,
            vec![
                BasicNode { id: format!("{id}-a"), x: 0.0, y: 0.0 },
                BasicNode { id: format!("{id}-b"), x: 1000.0, y: 0.0 },
            ],
            150.0,
            WallKind::Interior,
        )
    }

    #[test]
    fn insert_and_read() {
        let reg = SharedWallRegistry::new();
        reg.insert(wall("w1")).unwrap();
        let thickness = reg.read(|r| r.get("w1").map(|w| w.thickness));
        assert_eq!(thickness, Some(150.0));
    }

    #[test]
    fn with_wall_mut_unknown_id_errors() {
        let reg = SharedWallRegistry::new();
        let err = reg.with_wall_mut("ghost", |_| ()).unwrap_err();
        assert!(matches!(err, Error::UnknownWall(_)));
    }

    #[test]
    fn concurrent_writers_to_distinct_walls() {
        let reg = std::sync::Arc::new(SharedWallRegistry::new());
        for i in 0..8 {
            reg.insert(wall(&format!("w{i}"))).unwrap();
        }

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let reg = std::sync::Arc::clone(&reg);
                std::thread::spawn(move || {
                    let id = format!("w{i}");
                    for _ in 0..50 {
                        reg.with_wall_mut(&id, |w| w.thickness += 1.0).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        for i in 0..8 {
            let t = reg.read(|r| r.get(&format!("w{i}")).map(|w| w.thickness));
            assert_eq!(t, Some(200.0));
        }
    }
}

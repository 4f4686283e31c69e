// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Explicitly owned wall collection.
//!
//! Replaces the dynamically-typed id-to-entity registry of earlier documents:
//! one typed map, synchronous accessors, no event listeners. Callers that
//! need change notification observe the return values of the mutating
//! methods.

use crate::curve::BoundingBox;
use crate::error::{Error, Result};
use crate::unified::UnifiedWallData;
use crate::wall::WallId;
use rustc_hash::FxHashMap;

/// Owned collection of unified walls, keyed by wall id.
#[derive(Debug, Default)]
pub struct WallRegistry {
    walls: FxHashMap<WallId, UnifiedWallData>,
}

impl WallRegistry {
    pub fn new() -> Self {
        Self {
            walls: FxHashMap::default(),
        }
    }

    /// Insert a wall. Rejects duplicate ids; the registry never overwrites
    /// silently.
    pub fn insert(&mut self, wall: UnifiedWallData) -> Result<()> {
        if self.walls.contains_key(&wall.id) {
            return Err(Error::validation(
                "registry_insert",
                format!("wall id {} already registered", wall.id),
            )
            .with_fix("remove the existing wall first or use replace"));
        }
        self.walls.insert(wall.id.clone(), wall);
        Ok(())
    }

    /// Insert or overwrite.
    pub fn replace(&mut self, wall: UnifiedWallData) {
        self.walls.insert(wall.id.clone(), wall);
    }

    pub fn get(&self, id: &str) -> Option<&UnifiedWallData> {
        self.walls.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut UnifiedWallData> {
        self.walls.get_mut(id)
    }

    /// Remove a wall; both basic and BIM sides are dropped together.
    pub fn remove(&mut self, id: &str) -> Option<UnifiedWallData> {
        self.walls.remove(id)
    }

    pub fn len(&self) -> usize {
        self.walls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.walls.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &WallId> {
        self.walls.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UnifiedWallData> {
        self.walls.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut UnifiedWallData> {
        self.walls.values_mut()
    }

    /// Walls whose basic nodes fall inside (or touch) the query box.
    pub fn query_bbox(&self, bbox: &BoundingBox) -> Vec<&UnifiedWallData> {
        self.walls
            .values()
            .filter(|w| {
                w.basic
                    .nodes
                    .iter()
                    .any(|n| {
                        n.x >= bbox.min_x && n.x <= bbox.max_x && n.y >= bbox.min_y && n.y <= bbox.max_y
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unified::BasicNode;
    use crate::wall::WallKind;

    fn wall(id: &str, x: f64) -> UnifiedWallData {
        UnifiedWallData::from_basic(
            id,
            vec![
                BasicNode { id: format!("{id}-a"), x, y: 0.0 },
                BasicNode { id: format!("{id}-b"), x: x + 1000.0, y: 0.0 },
            ],
            150.0,
            WallKind::Interior,
        )
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut reg = WallRegistry::new();
        reg.insert(wall("w1", 0.0)).unwrap();
        assert!(reg.insert(wall("w1", 5.0)).is_err());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn remove_drops_both_sides() {
        let mut reg = WallRegistry::new();
        reg.insert(wall("w1", 0.0)).unwrap();
        let removed = reg.remove("w1").unwrap();
        assert_eq!(removed.id, "w1");
        assert!(reg.is_empty());
    }

    #[test]
    fn bbox_query_filters_by_node_position() {
        let mut reg = WallRegistry::new();
        reg.insert(wall("near", 0.0)).unwrap();
        reg.insert(wall("far", 50_000.0)).unwrap();

        let bbox = BoundingBox {
            min_x: -10.0,
            min_y: -10.0,
            max_x: 2000.0,
            max_y: 10.0,
        };
        let hits = reg.query_bbox(&bbox);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "near");
    }
}

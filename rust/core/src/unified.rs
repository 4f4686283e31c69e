// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Unified wall data: lightweight "basic" geometry plus optional full BIM
//! geometry, tracking which side is authoritative.

use crate::intersection::Intersection;
use crate::quality::QualityMetrics;
use crate::wall::{Wall, WallId, WallKind};
use serde::{Deserialize, Serialize};

/// A node in the basic segment graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BasicNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

/// A straight run between two nodes in the basic representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BasicSegment {
    pub start_node: String,
    pub end_node: String,
}

/// Lightweight editor-side wall geometry: a node/segment graph plus an
/// optional display polygon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BasicGeometry {
    pub nodes: Vec<BasicNode>,
    pub segments: Vec<BasicSegment>,
    /// Precomputed display polygon, if any.
    pub polygon: Vec<(f64, f64)>,
}

/// Which representation was last authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncSource {
    Basic,
    Bim,
}

/// Union of basic and BIM geometry for one wall.
///
/// Created at wall authoring; the BIM side is computed lazily by the
/// mode-switch pipeline. Both sides are destroyed together on wall deletion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnifiedWallData {
    pub id: WallId,
    pub thickness: f64,
    pub kind: WallKind,
    pub basic: BasicGeometry,
    /// Full BIM geometry; present after a switch to BIM mode.
    pub bim: Option<BimGeometry>,
    /// Which side was last authoritative.
    pub authoritative: SyncSource,
    /// The stale side must be regenerated before use.
    pub requires_sync: bool,
}

/// The BIM side of a unified wall: resolved solid, junctions, quality.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BimGeometry {
    pub wall: Wall,
    pub intersections: Vec<Intersection>,
    pub quality: Option<QualityMetrics>,
}

impl UnifiedWallData {
    /// Author a wall in basic mode from a node polyline.
    pub fn from_basic(
        id: impl Into<WallId>,
        nodes: Vec<BasicNode>,
        thickness: f64,
        kind: WallKind,
    ) -> Self {
        let segments = nodes
            .windows(2)
            .map(|w| BasicSegment {
                start_node: w[0].id.clone(),
                end_node: w[1].id.clone(),
            })
            .collect();
        Self {
            id: id.into(),
            thickness,
            kind,
            basic: BasicGeometry {
                nodes,
                segments,
                polygon: Vec::new(),
            },
            bim: None,
            authoritative: SyncSource::Basic,
            requires_sync: false,
        }
    }

    /// Attach freshly computed BIM geometry and make it authoritative.
    pub fn attach_bim(&mut self, bim: BimGeometry) {
        self.bim = Some(bim);
        self.authoritative = SyncSource::Bim;
        self.requires_sync = false;
    }

    /// Drop the BIM side, making basic authoritative again.
    pub fn detach_bim(&mut self) {
        self.bim = None;
        self.authoritative = SyncSource::Basic;
        self.requires_sync = false;
    }

    /// Mark the non-authoritative side stale after an edit.
    pub fn mark_edited(&mut self, source: SyncSource) {
        self.authoritative = source;
        self.requires_sync = self.bim.is_some();
    }

    /// Baseline vertex count in the authoritative representation.
    pub fn baseline_point_count(&self) -> usize {
        match (self.authoritative, &self.bim) {
            (SyncSource::Bim, Some(bim)) => bim.wall.baseline.points.len(),
            _ => self.basic.nodes.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unified() -> UnifiedWallData {
        UnifiedWallData::from_basic(
            "w1",
            vec![
                BasicNode { id: "n1".into(), x: 0.0, y: 0.0 },
                BasicNode { id: "n2".into(), x: 5000.0, y: 0.0 },
                BasicNode { id: "n3".into(), x: 5000.0, y: 3000.0 },
            ],
            150.0,
            WallKind::Interior,
        )
    }

    #[test]
    fn from_basic_builds_segments() {
        let u = unified();
        assert_eq!(u.basic.segments.len(), 2);
        assert_eq!(u.basic.segments[0].start_node, "n1");
        assert_eq!(u.baseline_point_count(), 3);
        assert!(!u.requires_sync);
    }

    #[test]
    fn edit_marks_stale_only_with_bim_present() {
        let mut u = unified();
        u.mark_edited(SyncSource::Basic);
        // No BIM side yet, nothing to desynchronize.
        assert!(!u.requires_sync);
    }

    #[test]
    fn serde_round_trip_preserves_flags() {
        let mut u = unified();
        u.requires_sync = true;
        let json = serde_json::to_string(&u).unwrap();
        let back: UnifiedWallData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, u);
    }
}

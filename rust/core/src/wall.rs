// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wall solids: baseline, thickness, offsets, resolved polygons.

use crate::curve::Curve;
use crate::point::Point;
use crate::quality::QualityMetrics;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Identifier for a wall within a document.
pub type WallId = String;

/// Wall classification, typically derived from thickness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WallKind {
    Exterior,
    Interior,
    Partition,
}

/// Join style applied at a baseline vertex when offsetting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinType {
    /// Sharp corner from extended offset lines; falls back to bevel past the
    /// miter limit.
    Miter,
    /// Flat chord between offset segment endpoints.
    Bevel,
    /// Arc approximated with a configured number of segments.
    Round,
}

/// Resolved thick-wall polygon: one outer ring plus holes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct WallSolid {
    /// Outer boundary (counter-clockwise).
    pub outer: Vec<Point>,
    /// Holes (clockwise).
    pub holes: Vec<Vec<Point>>,
}

impl WallSolid {
    pub fn new(outer: Vec<Point>) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.outer.is_empty()
    }

    /// Signed area of the outer ring (shoelace; positive when CCW).
    pub fn signed_area(&self) -> f64 {
        ring_signed_area(&self.outer)
    }

    /// Perimeter of the outer ring.
    pub fn perimeter(&self) -> f64 {
        ring_perimeter(&self.outer)
    }

    pub fn vertex_count(&self) -> usize {
        self.outer.len() + self.holes.iter().map(Vec::len).sum::<usize>()
    }
}

/// Signed area of a closed ring (shoelace formula).
pub fn ring_signed_area(ring: &[Point]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += ring[i].x * ring[j].y - ring[j].x * ring[i].y;
    }
    sum * 0.5
}

/// Perimeter of a closed ring.
pub fn ring_perimeter(ring: &[Point]) -> f64 {
    let n = ring.len();
    if n < 2 {
        return 0.0;
    }
    let mut total = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        total += ring[i].distance_to(&ring[j]);
    }
    total
}

/// One applied healing operation, recorded append-only on the wall.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealingRecord {
    /// Operation name, e.g. "sliver_removal".
    pub operation: String,
    /// Vertices affected by the pass.
    pub affected_vertices: usize,
    /// Milliseconds since the UNIX epoch.
    pub timestamp_ms: u64,
}

/// A solid wall: baseline centerline plus thickness, with derived offsets and
/// resolved geometry attached by the engines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Wall {
    pub id: WallId,
    pub baseline: Curve,
    /// Wall thickness, strictly positive.
    pub thickness: f64,
    pub kind: WallKind,

    /// Left offset curve, populated by the offset engine.
    pub left_offset: Option<Curve>,
    /// Right offset curve, populated by the offset engine.
    pub right_offset: Option<Curve>,
    /// Resolved solid polygon, populated by junction resolution.
    pub solid: Option<WallSolid>,
    /// Join style per baseline vertex.
    pub joins: SmallVec<[JoinType; 8]>,

    /// Intersections this wall participates in, by id (back-references only).
    pub intersection_ids: Vec<String>,
    /// Append-only healing history.
    pub healing_history: Vec<HealingRecord>,

    pub quality: Option<QualityMetrics>,
    /// Time spent resolving this wall, milliseconds.
    pub processing_time_ms: f64,
    /// Baseline vertex count weighted by junction participation.
    pub complexity: f64,
}

impl Wall {
    pub fn new(id: impl Into<WallId>, baseline: Curve, thickness: f64, kind: WallKind) -> Self {
        let joins = baseline
            .points
            .iter()
            .map(|_| JoinType::Miter)
            .collect::<SmallVec<[JoinType; 8]>>();
        Self {
            id: id.into(),
            baseline,
            thickness,
            kind,
            left_offset: None,
            right_offset: None,
            solid: None,
            joins,
            intersection_ids: Vec::new(),
            healing_history: Vec::new(),
            quality: None,
            processing_time_ms: 0.0,
            complexity: 0.0,
        }
    }

    /// Straight wall between two points.
    pub fn straight(
        id: impl Into<WallId>,
        start: (f64, f64),
        end: (f64, f64),
        thickness: f64,
        kind: WallKind,
    ) -> Self {
        let id = id.into();
        let baseline = Curve::polyline(vec![
            Point::new(start.0, start.1, format!("{id}-a")),
            Point::new(end.0, end.1, format!("{id}-b")),
        ]);
        Self::new(id, baseline, thickness, kind)
    }

    /// Validates the invariants every engine relies on: positive finite
    /// thickness, at least 2 baseline points, all coordinates finite.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.baseline.points.len() < 2 {
            return Err(crate::error::Error::degenerate(
                "wall_validate",
                format!(
                    "wall {} baseline has {} point(s), need at least 2",
                    self.id,
                    self.baseline.points.len()
                ),
            )
            .with_fix("add baseline points before resolving"));
        }
        if !(self.thickness.is_finite() && self.thickness > 0.0) {
            return Err(crate::error::Error::validation(
                "wall_validate",
                format!("wall {} thickness {} is not positive", self.id, self.thickness),
            ));
        }
        if !self.baseline.is_finite() {
            return Err(crate::error::Error::validation(
                "wall_validate",
                format!("wall {} baseline contains non-finite coordinates", self.id),
            ));
        }
        Ok(())
    }

    /// Half of the wall thickness; the perpendicular offset distance.
    pub fn half_thickness(&self) -> f64 {
        self.thickness * 0.5
    }

    pub fn record_healing(&mut self, operation: impl Into<String>, affected_vertices: usize) {
        self.healing_history.push(HealingRecord {
            operation: operation.into(),
            affected_vertices,
            timestamp_ms: crate::now_ms(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn straight_wall_validates() {
        let w = Wall::straight("w1", (0.0, 0.0), (5000.0, 0.0), 150.0, WallKind::Interior);
        assert!(w.validate().is_ok());
        assert_relative_eq!(w.half_thickness(), 75.0);
    }

    #[test]
    fn single_point_baseline_is_degenerate() {
        let baseline = Curve::polyline(vec![Point::new(0.0, 0.0, "a")]);
        let w = Wall::new("w2", baseline, 100.0, WallKind::Interior);
        let err = w.validate().unwrap_err();
        assert!(matches!(err, crate::error::Error::DegenerateGeometry { .. }));
    }

    #[test]
    fn zero_thickness_is_rejected() {
        let w = Wall::straight("w3", (0.0, 0.0), (1.0, 0.0), 0.0, WallKind::Partition);
        assert!(w.validate().is_err());
    }

    #[test]
    fn ccw_square_has_positive_area() {
        let solid = WallSolid::new(vec![
            Point::new(0.0, 0.0, "a"),
            Point::new(10.0, 0.0, "b"),
            Point::new(10.0, 10.0, "c"),
            Point::new(0.0, 10.0, "d"),
        ]);
        assert_relative_eq!(solid.signed_area(), 100.0);
        assert_relative_eq!(solid.perimeter(), 40.0);
    }

    #[test]
    fn healing_history_is_append_only() {
        let mut w = Wall::straight("w4", (0.0, 0.0), (1.0, 0.0), 100.0, WallKind::Interior);
        w.record_healing("micro_gap_elimination", 2);
        w.record_healing("edge_merge", 1);
        assert_eq!(w.healing_history.len(), 2);
        assert_eq!(w.healing_history[0].operation, "micro_gap_elimination");
    }
}

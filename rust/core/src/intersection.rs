// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Junctions where two or more walls meet.

use crate::point::Point;
use crate::wall::{WallId, WallSolid};
use serde::{Deserialize, Serialize};

/// Topological configuration of a junction. Matched exhaustively in the
/// resolver so new kinds are compile-time-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JunctionKind {
    /// One wall terminates against the side of another.
    T,
    /// Two walls meet end-to-end at a corner.
    L,
    /// Three or more walls share a point.
    Cross,
    /// Two near-parallel walls overlap end-to-end.
    ParallelOverlap,
}

impl JunctionKind {
    /// Stable tag used in cache keys and logs.
    pub fn tag(&self) -> &'static str {
        match self {
            JunctionKind::T => "t",
            JunctionKind::L => "l",
            JunctionKind::Cross => "cross",
            JunctionKind::ParallelOverlap => "parallel_overlap",
        }
    }
}

/// How a junction was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionMethod {
    /// Exact offset-line intersection.
    OffsetIntersection,
    /// Miter apex plus piercing points.
    MiterApex,
    /// Boolean union across participating strips.
    BooleanUnion,
    /// Approximate join after a degenerate-input fallback.
    ApproximateFallback,
}

/// A resolved (or pending) junction between walls.
///
/// Holds back-references to participating walls by id only; walls own their
/// geometry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Intersection {
    pub id: String,
    pub kind: JunctionKind,
    /// Participating walls. Invariant: at least 2.
    pub wall_ids: Vec<WallId>,
    /// Baseline intersection point.
    pub point: Point,
    /// Miter apex; expected for T and L junctions (absence is a warning,
    /// not an error).
    pub miter_apex: Option<Point>,
    /// Intersections of the participating offset lines.
    pub offset_points: Vec<Point>,
    /// Resolved junction polygon.
    pub resolved: Option<WallSolid>,
    pub method: ResolutionMethod,
    /// Geometric accuracy score, 0.0 - 1.0.
    pub accuracy: f64,
    pub validated: bool,
    /// Whether the resolved polygon came from the computation cache.
    pub cached: bool,
    /// Deterministic cache key; identical junction inputs collide.
    pub cache_key: String,
    pub created_ms: u64,
    pub modified_ms: u64,
}

impl Intersection {
    /// Create a pending junction. Wall ids are stored sorted so the cache key
    /// is order-independent.
    pub fn new(
        id: impl Into<String>,
        kind: JunctionKind,
        mut wall_ids: Vec<WallId>,
        point: Point,
    ) -> crate::error::Result<Self> {
        if wall_ids.len() < 2 {
            return Err(crate::error::Error::degenerate(
                "intersection_new",
                format!("junction needs at least 2 walls, got {}", wall_ids.len()),
            ));
        }
        wall_ids.sort();
        let cache_key = Self::make_cache_key(&wall_ids, kind, &point, point.tolerance);
        let now = crate::now_ms();
        Ok(Self {
            id: id.into(),
            kind,
            wall_ids,
            point,
            miter_apex: None,
            offset_points: Vec::new(),
            resolved: None,
            method: ResolutionMethod::OffsetIntersection,
            accuracy: 0.0,
            validated: false,
            cached: false,
            cache_key,
            created_ms: now,
            modified_ms: now,
        })
    }

    /// Deterministic cache key over sorted wall ids, junction kind, the
    /// intersection point rounded to the tolerance grid, and the tolerance
    /// itself. `{A,B}` and `{B,A}` produce the same key.
    pub fn make_cache_key(
        wall_ids: &[WallId],
        kind: JunctionKind,
        point: &Point,
        tolerance: f64,
    ) -> String {
        let mut sorted: Vec<&str> = wall_ids.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        let grid = if tolerance > 0.0 { tolerance } else { 1e-6 };
        let gx = (point.x / grid).round() as i64;
        let gy = (point.y / grid).round() as i64;
        format!("ix:{}:{}:{gx}:{gy}:{grid:e}", sorted.join(","), kind.tag())
    }

    /// Touch the modified timestamp.
    pub fn mark_modified(&mut self) {
        self.modified_ms = crate::now_ms();
    }
}

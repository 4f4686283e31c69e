// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Intersection resolver - junction classification and resolution.
//!
//! Four junction topologies (T, L, cross, parallel-overlap) each get a
//! dedicated resolution method; extreme angles degrade to approximate joins
//! with warnings instead of failing. Every entry point probes the injected
//! computation cache first and never panics on malformed-but-parseable
//! geometry.

mod cross_junction;
mod l_junction;
mod network;
mod parallel_overlap;
mod t_junction;

#[cfg(test)]
mod tests;

pub use network::{CancelToken, NetworkOutcome};

use crate::cache::GeometryCache;
use crate::offset::{offset_curve, OffsetConfig};
use crate::tolerance::ToleranceContext;
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use wall_lite_core::{Intersection, JunctionKind, JoinType, Wall, WallSolid};

/// Configuration for junction resolution
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Wall count past which a cross junction emits a complexity warning.
    /// Default: 4
    pub cross_complexity_warning: usize,

    /// Angles below this (degrees) are "sharp" and resolved with a bevel
    /// fallback. Default: 15
    pub sharp_angle_deg: f64,

    /// Angles above this (degrees) are "near-straight" pass-throughs.
    /// Default: 165
    pub straight_angle_deg: f64,

    /// Baseline direction difference (radians) under which two walls count
    /// as parallel. Default: 0.15 (~8.6 degrees)
    pub parallel_angle_tol: f64,

    /// Overlap-ratio thresholds splitting low / medium / high ambiguity.
    pub overlap_medium: f64,
    pub overlap_high: f64,

    /// Ceiling on strip vertices fed into one boolean union; beyond it the
    /// resolver switches to a bounded approximate join. Default: 512
    pub max_complexity: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cross_complexity_warning: 4,
            sharp_angle_deg: 15.0,
            straight_angle_deg: 165.0,
            parallel_angle_tol: 0.15,
            overlap_medium: 0.25,
            overlap_high: 0.75,
            max_complexity: 512,
        }
    }
}

/// Result of one resolution entry point.
#[derive(Debug, Clone)]
pub struct ResolutionOutcome {
    pub success: bool,
    pub result_solid: Option<WallSolid>,
    /// The junction record, populated on success.
    pub intersection: Option<Intersection>,
    pub warnings: Vec<String>,
    pub processing_time_ms: f64,
    pub operation: String,
}

impl ResolutionOutcome {
    fn failure(operation: &str, warnings: Vec<String>, started: Instant) -> Self {
        Self {
            success: false,
            result_solid: None,
            intersection: None,
            warnings,
            processing_time_ms: elapsed_ms(started),
            operation: operation.to_string(),
        }
    }
}

/// Junction resolver with an injected computation cache.
pub struct IntersectionResolver {
    pub(crate) tolerance: ToleranceContext,
    pub(crate) offset_config: OffsetConfig,
    pub(crate) config: ResolverConfig,
    pub(crate) cache: Arc<GeometryCache>,
}

impl IntersectionResolver {
    pub fn new(
        tolerance: ToleranceContext,
        offset_config: OffsetConfig,
        config: ResolverConfig,
        cache: Arc<GeometryCache>,
    ) -> Self {
        Self {
            tolerance,
            offset_config,
            config,
            cache,
        }
    }

    pub fn with_cache(cache: Arc<GeometryCache>) -> Self {
        Self::new(
            ToleranceContext::default(),
            OffsetConfig::default(),
            ResolverConfig::default(),
            cache,
        )
    }

    pub fn cache(&self) -> &GeometryCache {
        &self.cache
    }

    /// Classify the junction formed by the given walls, or None when they do
    /// not meet.
    pub fn classify(&self, walls: &[&Wall]) -> Option<JunctionKind> {
        if walls.len() >= 3 {
            return Some(JunctionKind::Cross);
        }
        if walls.len() != 2 {
            return None;
        }
        let (a, b) = (walls[0], walls[1]);

        let tol = self.contact_tolerance(a, b);
        if let Some((angle, _)) = baseline_angle(a, b) {
            let parallel = angle < self.config.parallel_angle_tol
                || (std::f64::consts::PI - angle) < self.config.parallel_angle_tol;
            if parallel
                && parallel_overlap::overlap_ratio(a, b) > 0.0
                && parallel_overlap::strips_touch(a, b, tol)
            {
                return Some(JunctionKind::ParallelOverlap);
            }
        }

        if shared_endpoint(a, b, tol).is_some() {
            return Some(JunctionKind::L);
        }
        if t_junction::find_t_contact(a, b, tol).is_some()
            || t_junction::find_t_contact(b, a, tol).is_some()
        {
            return Some(JunctionKind::T);
        }
        None
    }

    /// Dispatch on the measured inter-wall angle: sharp angles degrade to a
    /// bevel fallback, near-straight ones pass through, anything else goes
    /// to the matching resolution method.
    pub fn handle_extreme_angles(&self, walls: &[&Wall], angle_deg: f64) -> ResolutionOutcome {
        let started = Instant::now();
        if angle_deg < self.config.sharp_angle_deg {
            let mut outcome = self.approximate_union(walls, "handle_extreme_angles", started);
            outcome
                .warnings
                .push(format!("sharp angle {angle_deg:.1} deg resolved with bevel fallback"));
            return outcome;
        }
        if angle_deg > self.config.straight_angle_deg {
            let mut outcome = self.approximate_union(walls, "handle_extreme_angles", started);
            outcome.warnings.push(format!(
                "near-straight angle {angle_deg:.1} deg passed through as continuous run"
            ));
            return outcome;
        }

        match self.classify(walls) {
            Some(JunctionKind::L) => self.resolve_l_junction(walls[0], walls[1]),
            Some(JunctionKind::T) => self.resolve_t_junction(walls[0], walls[1]),
            Some(JunctionKind::Cross) => self.resolve_cross_junction(walls),
            Some(JunctionKind::ParallelOverlap) => {
                self.resolve_parallel_overlap(walls[0], walls[1])
            }
            None => ResolutionOutcome::failure(
                "handle_extreme_angles",
                vec!["walls do not form a recognizable junction".to_string()],
                started,
            ),
        }
    }

    /// Merge tolerance at the contact of two walls.
    pub(crate) fn contact_tolerance(&self, a: &Wall, b: &Wall) -> f64 {
        let thickness = a.thickness.max(b.thickness);
        let angle = baseline_angle(a, b).map_or(std::f64::consts::FRAC_PI_2, |(ang, _)| ang);
        self.tolerance.vertex_merge_tolerance(thickness, angle)
    }

    /// Offset curves for a wall, computed on demand when the offset engine
    /// has not populated them yet.
    pub(crate) fn ensure_offsets(&self, wall: &Wall, warnings: &mut Vec<String>) -> Option<Wall> {
        if wall.left_offset.is_some() && wall.right_offset.is_some() {
            return Some(wall.clone());
        }
        let tol = self
            .tolerance
            .offset_tolerance(wall.thickness, wall.baseline.curvatures().iter().cloned().fold(0.0, f64::max));
        let result = offset_curve(
            &wall.baseline,
            wall.half_thickness(),
            JoinType::Miter,
            tol,
            &self.offset_config,
        );
        warnings.extend(result.warnings.iter().cloned());
        if !result.success {
            warnings.push(format!("wall {} could not be offset", wall.id));
            return None;
        }
        let mut owned = wall.clone();
        owned.left_offset = result.left_offset;
        owned.right_offset = result.right_offset;
        Some(owned)
    }

    /// Bounded-complexity fallback: union whatever strips are available and
    /// tag the result approximate. Used for extreme angles and oversized
    /// input.
    pub(crate) fn approximate_union(
        &self,
        walls: &[&Wall],
        operation: &str,
        started: Instant,
    ) -> ResolutionOutcome {
        let mut warnings = Vec::new();
        let mut strips = Vec::with_capacity(walls.len());
        for wall in walls {
            if let Some(w) = self.ensure_offsets(wall, &mut warnings) {
                if let Some(strip) = crate::bool2d::wall_strip(&w) {
                    strips.push(strip);
                }
            }
        }
        match crate::bool2d::union_strips(&strips)
            .and_then(|shapes| crate::bool2d::shapes_to_solid(&shapes, self.tolerance.config().base_precision))
        {
            Ok(solid) => ResolutionOutcome {
                success: true,
                result_solid: Some(solid),
                intersection: None,
                warnings,
                processing_time_ms: elapsed_ms(started),
                operation: operation.to_string(),
            },
            Err(e) => {
                warnings.push(format!("approximate union failed: {e}"));
                ResolutionOutcome::failure(operation, warnings, started)
            }
        }
    }

    /// Probe the cache for an identical junction; a hit returns the stored
    /// record with `cached` set.
    pub(crate) fn probe(
        &self,
        key: &str,
        operation: &str,
        started: Instant,
    ) -> Option<ResolutionOutcome> {
        let list = self.cache.get_intersections(key)?;
        let first = list.into_iter().next()?;
        tracing::debug!(key = %key, operation, "junction cache hit");
        let mut cached = first;
        cached.cached = true;
        Some(ResolutionOutcome {
            success: true,
            result_solid: cached.resolved.clone(),
            intersection: Some(cached),
            warnings: Vec::new(),
            processing_time_ms: elapsed_ms(started),
            operation: operation.to_string(),
        })
    }

    /// Store a freshly resolved junction. Failed results are never cached.
    pub(crate) fn store(&self, intersection: &Intersection) {
        if intersection.resolved.is_some() {
            self.cache
                .put_intersections(intersection.cache_key.clone(), vec![intersection.clone()]);
        }
    }
}

/// Angle between the dominant directions of two baselines, in [0, PI],
/// plus the two unit directions.
pub(crate) fn baseline_angle(a: &Wall, b: &Wall) -> Option<(f64, (Vector2<f64>, Vector2<f64>))> {
    let da = baseline_direction(a)?;
    let db = baseline_direction(b)?;
    let cos = da.dot(&db).clamp(-1.0, 1.0);
    Some((cos.acos(), (da, db)))
}

/// Unit direction from first to last baseline point.
pub(crate) fn baseline_direction(wall: &Wall) -> Option<Vector2<f64>> {
    let first = wall.baseline.points.first()?;
    let last = wall.baseline.points.last()?;
    let d = Vector2::new(last.x - first.x, last.y - first.y);
    let len = d.norm();
    if len < f64::EPSILON {
        return None;
    }
    Some(d / len)
}

/// Endpoints of a wall baseline as 2D points.
pub(crate) fn endpoints(wall: &Wall) -> Option<(Point2<f64>, Point2<f64>)> {
    let first = wall.baseline.points.first()?;
    let last = wall.baseline.points.last()?;
    Some((
        Point2::new(first.x, first.y),
        Point2::new(last.x, last.y),
    ))
}

/// Endpoint pair of two walls within `tol` of each other, if any.
/// Returns the shared corner (midpoint of the pair).
pub(crate) fn shared_endpoint(a: &Wall, b: &Wall, tol: f64) -> Option<Point2<f64>> {
    let (a0, a1) = endpoints(a)?;
    let (b0, b1) = endpoints(b)?;
    for pa in [a0, a1] {
        for pb in [b0, b1] {
            if (pa - pb).norm() <= tol {
                return Some(Point2::new((pa.x + pb.x) * 0.5, (pa.y + pb.y) * 0.5));
            }
        }
    }
    None
}

/// Intersection of two infinite lines given as point + direction.
pub(crate) fn line_intersection(
    p1: Point2<f64>,
    d1: Vector2<f64>,
    p2: Point2<f64>,
    d2: Vector2<f64>,
) -> Option<Point2<f64>> {
    let cross = d1.x * d2.y - d1.y * d2.x;
    if cross.abs() < 1e-12 {
        return None;
    }
    let diff = p2 - p1;
    let t = (diff.x * d2.y - diff.y * d2.x) / cross;
    Some(p1 + t * d1)
}

pub(crate) fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Offset-curve computation: baseline to left/right parallel curves.
//!
//! Per interior vertex the configured join style applies on the outside of
//! the turn; the inside uses the offset-line intersection. Miter joins whose
//! apex lands too far out fall back to bevel with a warning. Degenerate
//! input (duplicate points, zero-length baselines, hairpin turns) never
//! panics: the best tolerance-relative approximation is returned alongside
//! warnings.

use crate::tolerance::ToleranceContext;
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::time::Instant;
use wall_lite_core::{CreationMethod, Curve, CurveType, JoinType, Point};

/// Configuration for offset computation
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OffsetConfig {
    /// Miter apex distance limit as a multiple of the wall thickness
    /// (twice the offset distance). Past it, miter falls back to bevel.
    /// Default: 2.0
    pub miter_limit: f64,

    /// Number of segments approximating a round join. Default: 8
    pub round_join_segments: usize,

    /// Maximum vertices to flatten an arc baseline to before offsetting.
    /// Default: 64
    pub arc_flatten_segments: usize,
}

impl Default for OffsetConfig {
    fn default() -> Self {
        Self {
            miter_limit: 2.0,
            round_join_segments: 8,
            arc_flatten_segments: 64,
        }
    }
}

/// Outcome of one offset computation.
#[derive(Debug, Clone)]
pub struct OffsetResult {
    pub success: bool,
    pub left_offset: Option<Curve>,
    pub right_offset: Option<Curve>,
    pub warnings: Vec<String>,
    /// A miter join degraded to bevel somewhere along the curve.
    pub fallback_used: bool,
    pub processing_time_ms: f64,
}

/// Compute both offset curves of a baseline at the given perpendicular
/// distance. The left side lies at +distance along the segment normals
/// (baseline direction rotated 90 degrees counter-clockwise), the right at
/// -distance.
pub fn offset_curve(
    baseline: &Curve,
    distance: f64,
    join: JoinType,
    tolerance: f64,
    config: &OffsetConfig,
) -> OffsetResult {
    let started = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let mut fallback_used = false;

    let points = dedup_points(baseline, tolerance, &mut warnings);

    if points.len() < 2 {
        warnings.push(format!(
            "baseline has {} distinct point(s) after dedup; cannot offset",
            points.len()
        ));
        return OffsetResult {
            success: false,
            left_offset: None,
            right_offset: None,
            warnings,
            fallback_used,
            processing_time_ms: elapsed_ms(started),
        };
    }

    let left = offset_side(&points, distance, join, tolerance, config, &mut warnings, &mut fallback_used);
    let right = offset_side(&points, -distance, join, tolerance, config, &mut warnings, &mut fallback_used);

    if fallback_used {
        tracing::debug!(
            warnings = warnings.len(),
            "offset fell back to bevel at one or more joins"
        );
    }

    OffsetResult {
        success: true,
        left_offset: Some(make_curve(left, tolerance, baseline.closed)),
        right_offset: Some(make_curve(right, tolerance, baseline.closed)),
        warnings,
        fallback_used,
        processing_time_ms: elapsed_ms(started),
    }
}

/// Drop consecutive duplicates (within tolerance) and flatten non-polyline
/// baselines to plain point runs.
fn dedup_points(baseline: &Curve, tolerance: f64, warnings: &mut Vec<String>) -> Vec<Point2<f64>> {
    if baseline.curve_type != CurveType::Polyline {
        // Arc/spline baselines arrive pre-sampled; offsetting treats the
        // samples as a polyline at the offset tolerance.
        warnings.push("non-polyline baseline flattened to its samples".to_string());
    }

    let mut out: Vec<Point2<f64>> = Vec::with_capacity(baseline.points.len());
    for p in &baseline.points {
        if !p.is_finite() {
            warnings.push(format!("skipping non-finite baseline point {}", p.id));
            continue;
        }
        let q = Point2::new(p.x, p.y);
        if let Some(last) = out.last() {
            if (q - last).norm() <= tolerance {
                warnings.push(format!("duplicate consecutive point {} dropped", p.id));
                continue;
            }
        }
        out.push(q);
    }
    out
}

/// One side of the offset. Positive `offset` is the left side.
#[allow(clippy::too_many_arguments)]
fn offset_side(
    points: &[Point2<f64>],
    offset: f64,
    join: JoinType,
    tolerance: f64,
    config: &OffsetConfig,
    warnings: &mut Vec<String>,
    fallback_used: &mut bool,
) -> Vec<Point2<f64>> {
    let n = points.len();

    // Unit normal per segment: direction rotated 90 degrees CCW. Degenerate
    // segments reuse the previous normal.
    let mut normals: SmallVec<[Vector2<f64>; 16]> = SmallVec::with_capacity(n - 1);
    for i in 0..n - 1 {
        let d = points[i + 1] - points[i];
        let len = d.norm();
        if len > tolerance {
            normals.push(Vector2::new(-d.y / len, d.x / len));
        } else if let Some(&prev) = normals.last() {
            normals.push(prev);
        } else {
            normals.push(Vector2::new(0.0, 1.0));
        }
    }

    let mut result: Vec<Point2<f64>> = Vec::with_capacity(n + 4);
    result.push(points[0] + offset * normals[0]);

    for i in 1..n - 1 {
        let prev_normal = normals[i - 1];
        let next_normal = normals[i];
        let joined = compute_join(
            points[i],
            prev_normal,
            next_normal,
            offset,
            join,
            tolerance,
            config,
            warnings,
            fallback_used,
        );
        result.extend(joined);
    }

    result.push(points[n - 1] + offset * normals[n - 2]);
    result
}

/// Join points at an interior vertex.
#[allow(clippy::too_many_arguments)]
fn compute_join(
    vertex: Point2<f64>,
    prev_normal: Vector2<f64>,
    next_normal: Vector2<f64>,
    offset: f64,
    join: JoinType,
    tolerance: f64,
    config: &OffsetConfig,
    warnings: &mut Vec<String>,
    fallback_used: &mut bool,
) -> SmallVec<[Point2<f64>; 4]> {
    let cross = prev_normal.x * next_normal.y - prev_normal.y * next_normal.x;

    // Near-collinear turn: one averaged offset point is the best available
    // approximation at this tolerance.
    if cross.abs() < 1e-9 {
        let avg = prev_normal + next_normal;
        let len = avg.norm();
        let normal = if len > tolerance { avg / len } else { prev_normal };
        if prev_normal.dot(&next_normal) < 0.0 {
            // Hairpin: segments reverse onto each other.
            warnings.push("near-180-degree turn approximated with single offset point".to_string());
        }
        return SmallVec::from_slice(&[vertex + offset * normal]);
    }

    // Positive cross means a left (CCW) turn, whose outer side is the right
    // offset (negative distance).
    let is_outer = cross * offset < 0.0;

    // Inside of the turn always takes the offset-line intersection.
    if !is_outer {
        if let Some(apex) = miter_apex(vertex, prev_normal, next_normal, offset) {
            return SmallVec::from_slice(&[apex]);
        }
        return bevel_points(vertex, prev_normal, next_normal, offset);
    }

    match join {
        JoinType::Miter => {
            if let Some(apex) = miter_apex(vertex, prev_normal, next_normal, offset) {
                let apex_dist = (apex - vertex).norm();
                let thickness = 2.0 * offset.abs();
                if apex_dist > config.miter_limit * thickness {
                    warnings.push(format!(
                        "miter apex at distance {apex_dist:.3} exceeds limit; beveled"
                    ));
                    *fallback_used = true;
                    return bevel_points(vertex, prev_normal, next_normal, offset);
                }
                SmallVec::from_slice(&[apex])
            } else {
                warnings.push("near-collinear miter degenerated to bevel".to_string());
                *fallback_used = true;
                bevel_points(vertex, prev_normal, next_normal, offset)
            }
        }
        JoinType::Bevel => bevel_points(vertex, prev_normal, next_normal, offset),
        JoinType::Round => round_points(vertex, prev_normal, next_normal, offset, config.round_join_segments),
    }
}

/// Intersection of the two offset lines around a vertex.
fn miter_apex(
    vertex: Point2<f64>,
    prev_normal: Vector2<f64>,
    next_normal: Vector2<f64>,
    offset: f64,
) -> Option<Point2<f64>> {
    // Tangents are the normals rotated back 90 degrees.
    let prev_tangent = Vector2::new(prev_normal.y, -prev_normal.x);
    let next_tangent = Vector2::new(next_normal.y, -next_normal.x);

    let cross = prev_tangent.x * next_tangent.y - prev_tangent.y * next_tangent.x;
    if cross.abs() < 1e-12 {
        return None;
    }

    let p1 = vertex + offset * prev_normal;
    let p2 = vertex + offset * next_normal;
    let d = p2 - p1;
    let t = (d.x * next_tangent.y - d.y * next_tangent.x) / cross;
    Some(p1 + t * prev_tangent)
}

/// Direct chord between the two offset endpoints.
fn bevel_points(
    vertex: Point2<f64>,
    prev_normal: Vector2<f64>,
    next_normal: Vector2<f64>,
    offset: f64,
) -> SmallVec<[Point2<f64>; 4]> {
    SmallVec::from_slice(&[vertex + offset * prev_normal, vertex + offset * next_normal])
}

/// N-segment arc from the previous normal to the next around the vertex.
fn round_points(
    vertex: Point2<f64>,
    prev_normal: Vector2<f64>,
    next_normal: Vector2<f64>,
    offset: f64,
    segments: usize,
) -> SmallVec<[Point2<f64>; 4]> {
    let start = prev_normal.y.atan2(prev_normal.x);
    let mut end = next_normal.y.atan2(next_normal.x);

    // Walk the short way around.
    let mut sweep = end - start;
    if sweep > std::f64::consts::PI {
        sweep -= 2.0 * std::f64::consts::PI;
    } else if sweep < -std::f64::consts::PI {
        sweep += 2.0 * std::f64::consts::PI;
    }
    end = start + sweep;

    let radius = offset.abs();
    let steps = segments.max(2);
    let mut out: SmallVec<[Point2<f64>; 4]> = SmallVec::new();
    for s in 0..=steps {
        let angle = start + (end - start) * (s as f64 / steps as f64);
        let dir = Vector2::new(angle.cos(), angle.sin());
        out.push(vertex + offset.signum() * radius * dir);
    }
    out
}

fn make_curve(points: Vec<Point2<f64>>, tolerance: f64, closed: bool) -> Curve {
    let pts = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            Point::computed(
                p.x,
                p.y,
                format!("off-{i}"),
                CreationMethod::Computed,
                tolerance,
                1.0,
            )
        })
        .collect();
    if closed {
        Curve::closed_polyline(pts)
    } else {
        Curve::polyline(pts)
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

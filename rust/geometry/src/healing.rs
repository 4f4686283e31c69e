// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shape healing: post-resolution cleanup of wall solids.
//!
//! Three independently toggleable passes run in order: sliver-face removal,
//! micro-gap elimination, near-collinear edge merge. Healing is idempotent;
//! running it on an already-healed solid applies nothing.

use crate::tolerance::ToleranceContext;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use wall_lite_core::wall::{ring_perimeter, ring_signed_area};
use wall_lite_core::{Point, Wall, WallSolid};

/// Configuration for shape healing
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HealingConfig {
    /// Remove hole faces whose area/perimeter ratio falls below
    /// `sliver_ratio` x tolerance. Default: on
    pub remove_slivers: bool,

    /// Snap ring endpoints closer than the tolerance onto each other.
    /// Default: on
    pub close_micro_gaps: bool,

    /// Collapse consecutive near-collinear edges. Default: on
    pub merge_edges: bool,

    /// Sliver threshold multiplier over the tolerance. Default: 1.0
    pub sliver_ratio: f64,

    /// Angular deviation (radians) under which consecutive edges merge.
    /// Default: 1e-3
    pub collinear_angle: f64,
}

impl Default for HealingConfig {
    fn default() -> Self {
        Self {
            remove_slivers: true,
            close_micro_gaps: true,
            merge_edges: true,
            sliver_ratio: 1.0,
            collinear_angle: 1e-3,
        }
    }
}

/// Outcome of one healing run.
#[derive(Debug, Clone)]
pub struct HealingOutcome {
    pub success: bool,
    pub healed_solid: WallSolid,
    /// Names of passes that changed geometry, in execution order.
    pub operations_applied: Vec<String>,
    pub processing_time_ms: f64,
}

/// Heal a wall's resolved solid. The wall itself is not mutated; the caller
/// attaches the healed solid and records history via
/// [`Wall::record_healing`].
pub fn heal_shape(
    wall: &Wall,
    tolerance_ctx: &ToleranceContext,
    config: &HealingConfig,
) -> HealingOutcome {
    let started = Instant::now();
    let Some(solid) = wall.solid.as_ref() else {
        return HealingOutcome {
            success: false,
            healed_solid: WallSolid::default(),
            operations_applied: Vec::new(),
            processing_time_ms: elapsed_ms(started),
        };
    };

    let tolerance = tolerance_ctx.vertex_merge_tolerance(wall.thickness, std::f64::consts::FRAC_PI_2);
    let mut healed = solid.clone();
    let mut applied: Vec<String> = Vec::new();

    if config.remove_slivers {
        let before = healed.holes.len();
        healed.holes.retain(|hole| !is_sliver(hole, tolerance * config.sliver_ratio));
        if healed.holes.len() != before {
            applied.push("sliver_removal".to_string());
        }
    }

    if config.close_micro_gaps {
        let mut changed = snap_ring_gaps(&mut healed.outer, tolerance);
        for hole in &mut healed.holes {
            changed |= snap_ring_gaps(hole, tolerance);
        }
        if changed {
            applied.push("micro_gap_elimination".to_string());
        }
    }

    if config.merge_edges {
        let mut changed = false;
        let merged = merge_collinear_ring(&healed.outer, config.collinear_angle);
        if merged.len() != healed.outer.len() {
            healed.outer = merged;
            changed = true;
        }
        for hole in &mut healed.holes {
            let merged = merge_collinear_ring(hole, config.collinear_angle);
            if merged.len() != hole.len() {
                *hole = merged;
                changed = true;
            }
        }
        if changed {
            applied.push("edge_merge".to_string());
        }
    }

    if !applied.is_empty() {
        tracing::debug!(wall_id = %wall.id, passes = ?applied, "healed wall solid");
    }

    HealingOutcome {
        success: true,
        healed_solid: healed,
        operations_applied: applied,
        processing_time_ms: elapsed_ms(started),
    }
}

/// Near-zero-area fragment: area/perimeter ratio below the threshold.
fn is_sliver(ring: &[Point], threshold: f64) -> bool {
    if ring.len() < 3 {
        return true;
    }
    let area = ring_signed_area(ring).abs();
    let perimeter = ring_perimeter(ring);
    if perimeter <= f64::EPSILON {
        return true;
    }
    area / perimeter < threshold
}

/// Merge vertices closer than the tolerance onto their predecessor.
/// Returns whether anything changed.
fn snap_ring_gaps(ring: &mut Vec<Point>, tolerance: f64) -> bool {
    if ring.len() < 4 {
        return false;
    }
    let before = ring.len();
    let mut out: Vec<Point> = Vec::with_capacity(before);
    for p in ring.iter() {
        if let Some(last) = out.last() {
            if last.distance_to(p) < tolerance {
                continue;
            }
        }
        out.push(p.clone());
    }
    // Closing gap between last and first.
    while out.len() >= 4 {
        let gap = out
            .last()
            .zip(out.first())
            .map(|(l, f)| l.distance_to(f))
            .unwrap_or(f64::MAX);
        if gap < tolerance {
            out.pop();
        } else {
            break;
        }
    }
    if out.len() != before {
        *ring = out;
        true
    } else {
        false
    }
}

/// Drop vertices whose adjacent edges continue within `angle` radians of
/// each other.
fn merge_collinear_ring(ring: &[Point], angle: f64) -> Vec<Point> {
    let n = ring.len();
    if n <= 3 {
        return ring.to_vec();
    }
    let mut out: Vec<Point> = Vec::with_capacity(n);
    for i in 0..n {
        let prev = &ring[(i + n - 1) % n];
        let curr = &ring[i];
        let next = &ring[(i + 1) % n];
        let v1x = curr.x - prev.x;
        let v1y = curr.y - prev.y;
        let v2x = next.x - curr.x;
        let v2y = next.y - curr.y;
        let l1 = (v1x * v1x + v1y * v1y).sqrt();
        let l2 = (v2x * v2x + v2y * v2y).sqrt();
        if l1 < f64::EPSILON || l2 < f64::EPSILON {
            continue;
        }
        let cos = ((v1x * v2x + v1y * v2y) / (l1 * l2)).clamp(-1.0, 1.0);
        if cos.acos() > angle {
            out.push(curr.clone());
        }
    }
    if out.len() < 3 {
        return ring.to_vec();
    }
    out
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use wall_lite_core::WallKind;

    fn pt(x: f64, y: f64, i: usize) -> Point {
        Point::new(x, y, format!("p{i}"))
    }

    fn wall_with_solid(outer: Vec<Point>) -> Wall {
        let mut w = Wall::straight("w", (0.0, 0.0), (1000.0, 0.0), 150.0, WallKind::Interior);
        w.solid = Some(WallSolid::new(outer));
        w
    }

    fn square(size: f64) -> Vec<Point> {
        vec![
            pt(0.0, 0.0, 0),
            pt(size, 0.0, 1),
            pt(size, size, 2),
            pt(0.0, size, 3),
        ]
    }

    #[test]
    fn clean_solid_needs_no_healing() {
        let wall = wall_with_solid(square(1000.0));
        let outcome = heal_shape(&wall, &ToleranceContext::default(), &HealingConfig::default());
        assert!(outcome.success);
        assert!(outcome.operations_applied.is_empty());
        assert_eq!(outcome.healed_solid.outer.len(), 4);
    }

    #[test]
    fn healing_is_idempotent() {
        // Solid with a duplicate vertex and a collinear midpoint.
        let mut outer = square(1000.0);
        outer.insert(1, pt(500.0, 0.0, 9)); // collinear
        outer.insert(3, pt(1000.0, 1e-9, 10)); // micro gap near (1000, 0)
        let wall = wall_with_solid(outer);

        let ctx = ToleranceContext::default();
        let cfg = HealingConfig::default();
        let first = heal_shape(&wall, &ctx, &cfg);
        assert!(!first.operations_applied.is_empty());

        let mut healed_wall = wall.clone();
        healed_wall.solid = Some(first.healed_solid.clone());
        let second = heal_shape(&healed_wall, &ctx, &cfg);
        assert!(second.operations_applied.is_empty());
        assert_eq!(second.healed_solid, first.healed_solid);
    }

    #[test]
    fn sliver_hole_is_removed() {
        let mut wall = wall_with_solid(square(1000.0));
        // Hole 500 long and 1e-9 wide: area/perimeter ~ 5e-10.
        wall.solid.as_mut().unwrap().holes.push(vec![
            pt(100.0, 100.0, 20),
            pt(600.0, 100.0, 21),
            pt(600.0, 100.0 + 1e-9, 22),
            pt(100.0, 100.0 + 1e-9, 23),
        ]);
        let outcome = heal_shape(&wall, &ToleranceContext::default(), &HealingConfig::default());
        assert!(outcome.healed_solid.holes.is_empty());
        assert!(outcome
            .operations_applied
            .contains(&"sliver_removal".to_string()));
    }

    #[test]
    fn real_hole_survives() {
        let mut wall = wall_with_solid(square(1000.0));
        wall.solid.as_mut().unwrap().holes.push(vec![
            pt(400.0, 400.0, 20),
            pt(400.0, 600.0, 21),
            pt(600.0, 600.0, 22),
            pt(600.0, 400.0, 23),
        ]);
        let outcome = heal_shape(&wall, &ToleranceContext::default(), &HealingConfig::default());
        assert_eq!(outcome.healed_solid.holes.len(), 1);
    }

    #[test]
    fn passes_can_be_disabled() {
        let mut outer = square(1000.0);
        outer.insert(1, pt(500.0, 0.0, 9));
        let wall = wall_with_solid(outer);
        let cfg = HealingConfig {
            merge_edges: false,
            ..Default::default()
        };
        let outcome = heal_shape(&wall, &ToleranceContext::default(), &cfg);
        // Collinear vertex stays because the pass is off.
        assert_eq!(outcome.healed_solid.outer.len(), 5);
    }

    #[test]
    fn missing_solid_reports_failure() {
        let wall = Wall::straight("w", (0.0, 0.0), (1.0, 0.0), 150.0, WallKind::Interior);
        let outcome = heal_shape(&wall, &ToleranceContext::default(), &HealingConfig::default());
        assert!(!outcome.success);
    }
}

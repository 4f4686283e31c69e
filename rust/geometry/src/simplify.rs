// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry simplification: vertex reduction under a deviation budget.
//!
//! Removes near-collinear and near-duplicate vertices whose perpendicular
//! deviation from the simplified edge stays under the budget.
//! Architecturally significant points (manual corners and junction-produced
//! vertices) are pinned and never removed.

use serde::{Deserialize, Serialize};
use std::time::Instant;
use wall_lite_core::{CreationMethod, Point, Wall, WallSolid};

/// Configuration for simplification
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimplifyConfig {
    /// Accuracy floor: when the mean retained-point accuracy would drop
    /// below this, `accuracy_preserved` is reported false. Default: 0.8
    pub accuracy_floor: f64,
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        Self { accuracy_floor: 0.8 }
    }
}

/// Outcome of one simplification run.
#[derive(Debug, Clone)]
pub struct SimplificationOutcome {
    pub success: bool,
    pub simplified_solid: WallSolid,
    pub points_removed: usize,
    /// False when the projected accuracy fell below the configured floor.
    pub accuracy_preserved: bool,
    pub processing_time_ms: f64,
}

/// Simplify a wall's resolved solid under `max_deviation`.
pub fn simplify_wall_geometry(
    wall: &Wall,
    max_deviation: f64,
    config: &SimplifyConfig,
) -> SimplificationOutcome {
    let started = Instant::now();
    let Some(solid) = wall.solid.as_ref() else {
        return SimplificationOutcome {
            success: false,
            simplified_solid: WallSolid::default(),
            points_removed: 0,
            accuracy_preserved: true,
            processing_time_ms: elapsed_ms(started),
        };
    };

    let mut removed = 0usize;
    let mut simplified = solid.clone();
    simplified.outer = simplify_ring(&solid.outer, max_deviation, &mut removed);
    for (i, hole) in solid.holes.iter().enumerate() {
        simplified.holes[i] = simplify_ring(hole, max_deviation, &mut removed);
    }

    let accuracy = mean_accuracy(&simplified);
    let accuracy_preserved = accuracy >= config.accuracy_floor;
    if !accuracy_preserved {
        tracing::warn!(
            wall_id = %wall.id,
            accuracy,
            floor = config.accuracy_floor,
            "simplification dropped accuracy below the floor"
        );
    }

    SimplificationOutcome {
        success: true,
        simplified_solid: simplified,
        points_removed: removed,
        accuracy_preserved,
        processing_time_ms: elapsed_ms(started),
    }
}

/// A point the simplifier must never remove: explicit user corners and
/// junction endpoints.
fn is_pinned(p: &Point) -> bool {
    matches!(
        p.creation_method,
        CreationMethod::Manual | CreationMethod::Intersection | CreationMethod::Imported
    )
}

/// Greedy ring pass: a removable vertex goes when its perpendicular
/// deviation from the chord of its neighbors stays under the budget.
fn simplify_ring(ring: &[Point], max_deviation: f64, removed: &mut usize) -> Vec<Point> {
    if ring.len() <= 3 {
        return ring.to_vec();
    }

    let mut keep: Vec<bool> = vec![true; ring.len()];
    let n = ring.len();

    for i in 0..n {
        if is_pinned(&ring[i]) {
            continue;
        }
        // Neighbors among currently kept vertices.
        let prev = match (1..n).map(|d| (i + n - d) % n).find(|&j| keep[j]) {
            Some(j) => j,
            None => continue,
        };
        let next = match (1..n).map(|d| (i + d) % n).find(|&j| keep[j]) {
            Some(j) => j,
            None => continue,
        };
        if prev == next {
            continue;
        }
        let deviation = perpendicular_distance(&ring[i], &ring[prev], &ring[next]);
        let kept_count = keep.iter().filter(|&&k| k).count();
        if deviation <= max_deviation && kept_count > 3 {
            keep[i] = false;
            *removed += 1;
        }
    }

    ring.iter()
        .zip(keep.iter())
        .filter(|(_, &k)| k)
        .map(|(p, _)| p.clone())
        .collect()
}

/// Distance from `p` to the line through `a` and `b`.
fn perpendicular_distance(p: &Point, a: &Point, b: &Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len < f64::EPSILON {
        return p.distance_to(a);
    }
    ((p.x - a.x) * dy - (p.y - a.y) * dx).abs() / len
}

fn mean_accuracy(solid: &WallSolid) -> f64 {
    let points: Vec<&Point> = solid
        .outer
        .iter()
        .chain(solid.holes.iter().flatten())
        .collect();
    if points.is_empty() {
        return 1.0;
    }
    points.iter().map(|p| p.accuracy).sum::<f64>() / points.len() as f64
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

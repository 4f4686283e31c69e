// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cross-junction resolution: three or more walls sharing a point.

use super::{elapsed_ms, endpoints, IntersectionResolver, ResolutionOutcome};
use crate::bool2d;
use nalgebra::Point2;
use std::time::Instant;
use wall_lite_core::{
    CreationMethod, Intersection, JunctionKind, Point, ResolutionMethod, Wall,
};

impl IntersectionResolver {
    /// Resolve a junction of three or more walls into one unified polygon
    /// by unioning every participating strip.
    pub fn resolve_cross_junction(&self, walls: &[&Wall]) -> ResolutionOutcome {
        let started = Instant::now();
        let operation = "resolve_cross_junction";
        let mut warnings: Vec<String> = Vec::new();

        if walls.len() < 3 {
            return ResolutionOutcome::failure(
                operation,
                vec![format!(
                    "cross junction needs at least 3 walls, got {}",
                    walls.len()
                )],
                started,
            );
        }
        for wall in walls {
            if let Err(e) = wall.validate() {
                return ResolutionOutcome::failure(operation, vec![e.to_string()], started);
            }
        }
        if walls.len() > self.config.cross_complexity_warning {
            warnings.push(format!(
                "cross junction with {} walls exceeds the complexity threshold of {}",
                walls.len(),
                self.config.cross_complexity_warning
            ));
        }

        let Some(center) = common_point(walls) else {
            return ResolutionOutcome::failure(
                operation,
                vec!["participating walls share no common point".to_string()],
                started,
            );
        };

        let thickness = walls.iter().map(|w| w.thickness).fold(0.0, f64::max);
        let tol = self
            .tolerance
            .vertex_merge_tolerance(thickness, std::f64::consts::FRAC_PI_2);
        let center_pt = Point::computed(
            center.x,
            center.y,
            "cross-center",
            CreationMethod::Intersection,
            tol,
            1.0,
        );
        let ids: Vec<String> = walls.iter().map(|w| w.id.clone()).collect();
        let key = Intersection::make_cache_key(&ids, JunctionKind::Cross, &center_pt, tol);
        if let Some(hit) = self.probe(&key, operation, started) {
            return hit;
        }

        // Gather strips; a wall that cannot be offset fails only itself.
        let mut strips = Vec::with_capacity(walls.len());
        let mut vertex_budget = 0usize;
        for wall in walls {
            let Some(owned) = self.ensure_offsets(wall, &mut warnings) else {
                warnings.push(format!("wall {} excluded from union", wall.id));
                continue;
            };
            if let Some(strip) = bool2d::wall_strip(&owned) {
                vertex_budget += strip.len();
                strips.push(strip);
            }
        }
        if strips.len() < 2 {
            return ResolutionOutcome::failure(
                operation,
                vec!["fewer than 2 usable strips after offsetting".to_string()],
                started,
            );
        }
        if vertex_budget > self.config.max_complexity {
            // Bounded fallback instead of an unbounded boolean cascade.
            warnings.push(format!(
                "strip complexity {vertex_budget} exceeds {}; using approximate join",
                self.config.max_complexity
            ));
            let mut outcome = self.approximate_union(walls, operation, started);
            outcome.warnings.extend(warnings);
            return outcome;
        }

        let solid = match bool2d::union_strips(&strips)
            .and_then(|shapes| bool2d::shapes_to_solid(&shapes, tol))
        {
            Ok(s) => s,
            Err(e) => {
                return ResolutionOutcome::failure(
                    operation,
                    vec![format!("boolean union failed: {e}")],
                    started,
                );
            }
        };

        let mut intersection = match Intersection::new(
            format!("ix-cross-{}", ids.join("-")),
            JunctionKind::Cross,
            ids,
            center_pt,
        ) {
            Ok(ix) => ix,
            Err(e) => return ResolutionOutcome::failure(operation, vec![e.to_string()], started),
        };
        intersection.cache_key = key;
        intersection.resolved = Some(solid.clone());
        intersection.method = ResolutionMethod::BooleanUnion;
        intersection.accuracy = 0.9;
        intersection.validated = true;
        self.store(&intersection);

        tracing::debug!(
            walls = intersection.wall_ids.len(),
            vertices = solid.vertex_count(),
            "resolved cross junction"
        );

        ResolutionOutcome {
            success: true,
            result_solid: Some(solid),
            intersection: Some(intersection),
            warnings,
            processing_time_ms: elapsed_ms(started),
            operation: operation.to_string(),
        }
    }
}

/// The point all walls touch: the endpoint cluster with the smallest spread.
fn common_point(walls: &[&Wall]) -> Option<Point2<f64>> {
    let ends: Vec<(Point2<f64>, Point2<f64>)> =
        walls.iter().filter_map(|w| endpoints(w)).collect();
    if ends.len() != walls.len() {
        return None;
    }

    // Try every endpoint of the first wall as a candidate center and pick
    // the one every other wall has an endpoint near.
    let (f0, f1) = ends[0];
    let mut best: Option<(Point2<f64>, f64)> = None;
    for candidate in [f0, f1] {
        let mut max_dist = 0.0f64;
        for (e0, e1) in &ends[1..] {
            let d = (e0 - candidate).norm().min((e1 - candidate).norm());
            max_dist = max_dist.max(d);
        }
        if best.map_or(true, |(_, d)| max_dist < d) {
            best = Some((candidate, max_dist));
        }
    }

    // A spread beyond the largest wall thickness means no shared point.
    let spread_limit = walls.iter().map(|w| w.thickness).fold(0.0, f64::max).max(1.0);
    best.filter(|(_, d)| *d <= spread_limit).map(|(c, _)| c)
}

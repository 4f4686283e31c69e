// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parallel-overlap resolution: two near-parallel walls overlapping
//! end-to-end, merged with a boolean union.

use super::{
    baseline_direction, elapsed_ms, endpoints, IntersectionResolver, ResolutionOutcome,
};
use crate::bool2d;
use std::time::Instant;
use wall_lite_core::{
    CreationMethod, Intersection, JunctionKind, Point, ResolutionMethod, Wall,
};

/// Perpendicular distance between the two baselines, measured from the
/// midpoint of `b` to the line of `a`. Walls further apart than their
/// combined half-thicknesses are parallel neighbors, not an overlap.
pub(crate) fn perpendicular_gap(a: &Wall, b: &Wall) -> f64 {
    let (Some(dir), Some((a0, _)), Some((b0, b1))) =
        (baseline_direction(a), endpoints(a), endpoints(b))
    else {
        return f64::MAX;
    };
    let mid = nalgebra::center(&b0, &b1);
    let to_mid = mid - a0;
    (to_mid - to_mid.dot(&dir) * dir).norm()
}

/// True when the walls are close enough sideways to physically overlap.
pub(crate) fn strips_touch(a: &Wall, b: &Wall, tol: f64) -> bool {
    perpendicular_gap(a, b) <= a.half_thickness() + b.half_thickness() + tol
}

/// Fraction of the shorter wall covered by the overlap, 0 when disjoint.
pub(crate) fn overlap_ratio(a: &Wall, b: &Wall) -> f64 {
    let Some(dir) = baseline_direction(a) else {
        return 0.0;
    };
    let (Some((a0, a1)), Some((b0, b1))) = (endpoints(a), endpoints(b)) else {
        return 0.0;
    };

    // Project everything onto wall a's direction.
    let proj = |p: nalgebra::Point2<f64>| (p - a0).dot(&dir);
    let (mut ia0, mut ia1) = (proj(a0), proj(a1));
    let (mut ib0, mut ib1) = (proj(b0), proj(b1));
    if ia0 > ia1 {
        std::mem::swap(&mut ia0, &mut ia1);
    }
    if ib0 > ib1 {
        std::mem::swap(&mut ib0, &mut ib1);
    }

    let overlap = (ia1.min(ib1) - ia0.max(ib0)).max(0.0);
    let shorter = (ia1 - ia0).min(ib1 - ib0);
    if shorter <= f64::EPSILON {
        return 0.0;
    }
    overlap / shorter
}

impl IntersectionResolver {
    /// Merge two near-parallel overlapping walls into one solid via boolean
    /// union. The overlap ratio drives an ambiguity warning: the higher the
    /// overlap, the more likely the duplicate is an authoring mistake.
    pub fn resolve_parallel_overlap(&self, a: &Wall, b: &Wall) -> ResolutionOutcome {
        let started = Instant::now();
        let operation = "resolve_parallel_overlap";
        let mut warnings: Vec<String> = Vec::new();

        if let Err(e) = a.validate().and_then(|_| b.validate()) {
            return ResolutionOutcome::failure(operation, vec![e.to_string()], started);
        }

        let tol = self.contact_tolerance(a, b);
        let ratio = overlap_ratio(a, b);
        if ratio <= 0.0 || !strips_touch(a, b, tol) {
            return ResolutionOutcome::failure(
                operation,
                vec![format!("walls {} and {} do not overlap", a.id, b.id)],
                started,
            );
        }
        let band = if ratio < self.config.overlap_medium {
            "low"
        } else if ratio < self.config.overlap_high {
            "medium"
        } else {
            "high"
        };
        warnings.push(format!(
            "parallel overlap ratio {ratio:.2} ({band}); merged geometry may hide an authoring error"
        ));

        // Midpoint of the shorter wall as the junction anchor.
        let Some((b0, b1)) = endpoints(b) else {
            return ResolutionOutcome::failure(
                operation,
                vec!["degenerate baselines".to_string()],
                started,
            );
        };
        let anchor = nalgebra::center(&b0, &b1);

        let anchor_pt = Point::computed(
            anchor.x,
            anchor.y,
            "overlap-anchor",
            CreationMethod::Intersection,
            tol,
            1.0,
        );
        let key = Intersection::make_cache_key(
            &[a.id.clone(), b.id.clone()],
            JunctionKind::ParallelOverlap,
            &anchor_pt,
            tol,
        );
        if let Some(hit) = self.probe(&key, operation, started) {
            return hit;
        }

        let mut strips = Vec::with_capacity(2);
        for wall in [a, b] {
            let Some(owned) = self.ensure_offsets(wall, &mut warnings) else {
                return ResolutionOutcome::failure(operation, warnings, started);
            };
            match bool2d::wall_strip(&owned) {
                Some(strip) => strips.push(strip),
                None => {
                    warnings.push(format!("wall {} produced no strip", wall.id));
                    return ResolutionOutcome::failure(operation, warnings, started);
                }
            }
        }

        let solid = match bool2d::union_strips(&strips)
            .and_then(|shapes| bool2d::shapes_to_solid(&shapes, tol))
        {
            Ok(s) => s,
            Err(e) => {
                warnings.push(format!("boolean union failed: {e}"));
                return ResolutionOutcome::failure(operation, warnings, started);
            }
        };

        let intersection = self.build_pair_record(
            &key,
            JunctionKind::ParallelOverlap,
            a,
            b,
            anchor_pt,
            None,
            Vec::new(),
            solid.clone(),
            ResolutionMethod::BooleanUnion,
            0.85,
        );
        self.store(&intersection);

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

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! L-junction resolution: two walls meeting end-to-end at a corner.

use super::{
    baseline_direction, elapsed_ms, line_intersection, shared_endpoint, IntersectionResolver,
    ResolutionOutcome,
};
use nalgebra::{Point2, Vector2};
use std::time::Instant;
use wall_lite_core::{
    CreationMethod, Intersection, JunctionKind, Point, ResolutionMethod, Wall, WallSolid,
};

impl IntersectionResolver {
    /// Resolve the corner where two walls meet end-to-end.
    ///
    /// The corner polygon comes from the four pairwise intersections of the
    /// walls' offset lines; the pairing on the outside of the turn is the
    /// miter apex. Near-collinear baselines fall back to an approximate
    /// union with a warning.
    pub fn resolve_l_junction(&self, a: &Wall, b: &Wall) -> ResolutionOutcome {
        let started = Instant::now();
        let operation = "resolve_l_junction";
        let mut warnings: Vec<String> = Vec::new();

        if let Err(e) = a.validate().and_then(|_| b.validate()) {
            return ResolutionOutcome::failure(operation, vec![e.to_string()], started);
        }

        let tol = self.contact_tolerance(a, b);
        let Some(corner) = shared_endpoint(a, b, tol) else {
            return ResolutionOutcome::failure(
                operation,
                vec![format!(
                    "walls {} and {} share no endpoint within {tol:.6}",
                    a.id, b.id
                )],
                started,
            );
        };

        // Probe the cache before any geometry.
        let corner_pt = Point::computed(
            corner.x,
            corner.y,
            "l-corner",
            CreationMethod::Intersection,
            tol,
            1.0,
        );
        let key = Intersection::make_cache_key(
            &[a.id.clone(), b.id.clone()],
            JunctionKind::L,
            &corner_pt,
            tol,
        );
        if let Some(hit) = self.probe(&key, operation, started) {
            return hit;
        }

        // Directions away from the corner.
        let Some(da) = direction_from(a, corner) else {
            return ResolutionOutcome::failure(
                operation,
                vec![format!("wall {} has a degenerate baseline", a.id)],
                started,
            );
        };
        let Some(db) = direction_from(b, corner) else {
            return ResolutionOutcome::failure(
                operation,
                vec![format!("wall {} has a degenerate baseline", b.id)],
                started,
            );
        };

        let cross = da.x * db.y - da.y * db.x;
        if cross.abs() < 1e-6 {
            // Near-collinear corner: no stable offset-line intersection.
            let mut outcome = self.approximate_union(&[a, b], operation, started);
            outcome
                .warnings
                .push("near-collinear L-junction resolved approximately".to_string());
            if let Some(solid) = outcome.result_solid.clone() {
                let intersection = self.build_pair_record(
                    &key,
                    JunctionKind::L,
                    a,
                    b,
                    corner_pt,
                    None,
                    Vec::new(),
                    solid,
                    ResolutionMethod::ApproximateFallback,
                    0.6,
                );
                self.store(&intersection);
                outcome.intersection = Some(intersection);
            }
            return outcome;
        }

        let na = Vector2::new(-da.y, da.x);
        let nb = Vector2::new(-db.y, db.x);
        let (ha, hb) = (a.half_thickness(), b.half_thickness());

        // Four pairwise offset-line intersections around the corner. The
        // pairing consistent with each wall's thickness is exactly the
        // (sign_a, sign_b) grid.
        let mut corners: Vec<Point2<f64>> = Vec::with_capacity(4);
        for sa in [1.0, -1.0] {
            for sb in [1.0, -1.0] {
                let pa = corner + sa * ha * na;
                let pb = corner + sb * hb * nb;
                match line_intersection(pa, da, pb, db) {
                    Some(p) => corners.push(p),
                    None => {
                        warnings.push("offset lines failed to intersect; beveled".to_string());
                    }
                }
            }
        }
        if corners.len() < 3 {
            let mut outcome = self.approximate_union(&[a, b], operation, started);
            outcome.warnings.extend(warnings);
            return outcome;
        }

        // Order the quad counter-clockwise around the corner.
        corners.sort_by(|p, q| {
            let ap = (p - corner).y.atan2((p - corner).x);
            let aq = (q - corner).y.atan2((q - corner).x);
            ap.partial_cmp(&aq).unwrap_or(std::cmp::Ordering::Equal)
        });

        // The miter apex sits opposite the interior bisector.
        let bisector = {
            let s = da + db;
            let len = s.norm();
            if len > f64::EPSILON {
                s / len
            } else {
                na
            }
        };
        let apex = corners
            .iter()
            .cloned()
            .min_by(|p, q| {
                let dp = (p - corner).dot(&bisector);
                let dq = (q - corner).dot(&bisector);
                dp.partial_cmp(&dq).unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(corner);

        let offset_points: Vec<Point> = corners
            .iter()
            .enumerate()
            .map(|(i, p)| {
                Point::computed(p.x, p.y, format!("l-off-{i}"), CreationMethod::Intersection, tol, 1.0)
            })
            .collect();
        let solid = WallSolid::new(offset_points.clone());

        let apex_pt = Point::computed(
            apex.x,
            apex.y,
            "l-apex",
            CreationMethod::Intersection,
            tol,
            1.0,
        );
        let intersection = self.build_pair_record(
            &key,
            JunctionKind::L,
            a,
            b,
            corner_pt,
            Some(apex_pt),
            offset_points,
            solid.clone(),
            ResolutionMethod::OffsetIntersection,
            1.0,
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

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn build_pair_record(
        &self,
        key: &str,
        kind: JunctionKind,
        a: &Wall,
        b: &Wall,
        point: Point,
        miter_apex: Option<Point>,
        offset_points: Vec<Point>,
        solid: WallSolid,
        method: ResolutionMethod,
        accuracy: f64,
    ) -> Intersection {
        let mut intersection = Intersection::new(
            format!("ix-{}-{}-{}", kind.tag(), a.id, b.id),
            kind,
            vec![a.id.clone(), b.id.clone()],
            point,
        )
        .expect("two wall ids satisfy the >=2 invariant");
        intersection.cache_key = key.to_string();
        intersection.miter_apex = miter_apex;
        intersection.offset_points = offset_points;
        intersection.resolved = Some(solid);
        intersection.method = method;
        intersection.accuracy = accuracy;
        intersection.validated = true;
        intersection
    }
}

/// Unit direction of the wall pointing away from the given corner.
fn direction_from(wall: &Wall, corner: Point2<f64>) -> Option<Vector2<f64>> {
    let (first, last) = super::endpoints(wall)?;
    let dir = baseline_direction(wall)?;
    // If the wall starts at the corner, its direction already points away;
    // if it ends there, flip it.
    if (first - corner).norm() <= (last - corner).norm() {
        Some(dir)
    } else {
        Some(-dir)
    }
}

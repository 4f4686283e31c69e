// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! T-junction resolution: one wall terminating against the side of another.

use super::{elapsed_ms, endpoints, line_intersection, IntersectionResolver, ResolutionOutcome};
use nalgebra::{Point2, Vector2};
use std::time::Instant;
use wall_lite_core::{
    CreationMethod, Intersection, JunctionKind, Point, ResolutionMethod, Wall, WallSolid,
};

/// Where a terminating wall touches a host wall: the terminator endpoint,
/// the host segment index, and the parameter along that segment.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TContact {
    pub terminator_end: Point2<f64>,
    pub host_segment: usize,
    pub host_t: f64,
}

/// Find the contact of `terminator` against the interior of `host`, if any.
/// Endpoint-on-endpoint contact classifies as L, not T, so strictly
/// interior parameters only.
pub(crate) fn find_t_contact(terminator: &Wall, host: &Wall, tol: f64) -> Option<TContact> {
    let (t0, t1) = endpoints(terminator)?;
    let pts = &host.baseline.points;

    for end in [t0, t1] {
        for i in 0..pts.len().saturating_sub(1) {
            let a = Point2::new(pts[i].x, pts[i].y);
            let b = Point2::new(pts[i + 1].x, pts[i + 1].y);
            let d = b - a;
            let len_sq = d.norm_squared();
            if len_sq < f64::EPSILON {
                continue;
            }
            let t = ((end - a).dot(&d) / len_sq).clamp(0.0, 1.0);
            let foot = a + t * d;
            // Interior contact: away from both host endpoints.
            let margin = (tol / len_sq.sqrt()).min(0.25);
            if (end - foot).norm() <= tol.max(host.half_thickness() + tol)
                && t > margin
                && t < 1.0 - margin
            {
                return Some(TContact {
                    terminator_end: end,
                    host_segment: i,
                    host_t: t,
                });
            }
        }
    }
    None
}

impl IntersectionResolver {
    /// Resolve a T junction: the terminating wall's miter apex plus its two
    /// piercing points on the host wall's offset lines.
    pub fn resolve_t_junction(&self, a: &Wall, b: &Wall) -> ResolutionOutcome {
        let started = Instant::now();
        let operation = "resolve_t_junction";
        let mut warnings: Vec<String> = Vec::new();

        if let Err(e) = a.validate().and_then(|_| b.validate()) {
            return ResolutionOutcome::failure(operation, vec![e.to_string()], started);
        }

        let tol = self.contact_tolerance(a, b);
        let (terminator, host, contact) = match find_t_contact(a, b, tol) {
            Some(c) => (a, b, c),
            None => match find_t_contact(b, a, tol) {
                Some(c) => (b, a, c),
                None => {
                    return ResolutionOutcome::failure(
                        operation,
                        vec![format!(
                            "neither wall {} nor {} terminates on the other",
                            a.id, b.id
                        )],
                        started,
                    );
                }
            },
        };

        let host_pts = &host.baseline.points;
        let seg_a = Point2::new(host_pts[contact.host_segment].x, host_pts[contact.host_segment].y);
        let seg_b = Point2::new(
            host_pts[contact.host_segment + 1].x,
            host_pts[contact.host_segment + 1].y,
        );
        let host_dir = {
            let d = seg_b - seg_a;
            let len = d.norm();
            if len < f64::EPSILON {
                return ResolutionOutcome::failure(
                    operation,
                    vec![format!("host wall {} segment is degenerate", host.id)],
                    started,
                );
            }
            d / len
        };
        let host_normal = Vector2::new(-host_dir.y, host_dir.x);
        let foot = seg_a + contact.host_t * (seg_b - seg_a);

        let junction_pt = Point::computed(
            foot.x,
            foot.y,
            "t-foot",
            CreationMethod::Intersection,
            tol,
            1.0,
        );
        let key = Intersection::make_cache_key(
            &[terminator.id.clone(), host.id.clone()],
            JunctionKind::T,
            &junction_pt,
            tol,
        );
        if let Some(hit) = self.probe(&key, operation, started) {
            return hit;
        }

        // Terminating wall direction pointing into the host.
        let term_dir = {
            let (first, last) = match endpoints(terminator) {
                Some(e) => e,
                None => {
                    return ResolutionOutcome::failure(
                        operation,
                        vec![format!("wall {} has no endpoints", terminator.id)],
                        started,
                    );
                }
            };
            let toward = if (first - contact.terminator_end).norm()
                < (last - contact.terminator_end).norm()
            {
                first - last
            } else {
                last - first
            };
            let len = toward.norm();
            if len < f64::EPSILON {
                return ResolutionOutcome::failure(
                    operation,
                    vec![format!("wall {} baseline is degenerate", terminator.id)],
                    started,
                );
            }
            toward / len
        };

        // Near-parallel approach cannot pierce the host cleanly.
        if host_dir.dot(&term_dir).abs() > (1.0 - 1e-6) {
            let mut outcome = self.approximate_union(&[terminator, host], operation, started);
            outcome
                .warnings
                .push("terminator runs along the host; resolved approximately".to_string());
            return outcome;
        }

        let term_normal = Vector2::new(-term_dir.y, term_dir.x);
        let ht = terminator.half_thickness();
        let hh = host.half_thickness();

        // Host offset lines on both sides; the near line faces the
        // terminator.
        let approach = -term_dir; // from host toward terminator body
        let near_sign = if host_normal.dot(&approach) >= 0.0 { 1.0 } else { -1.0 };
        let near_line = foot + near_sign * hh * host_normal;
        let far_line = foot - near_sign * hh * host_normal;

        // Piercing points: terminator offset lines crossing the host's near
        // offset line, then the far line for the full penetration quad.
        let mut quad: Vec<Point2<f64>> = Vec::with_capacity(4);
        let mut piercing: Vec<Point2<f64>> = Vec::with_capacity(2);
        for (line_pt, collect) in [(near_line, true), (far_line, false)] {
            for st in [1.0, -1.0] {
                let p_off = contact.terminator_end + st * ht * term_normal;
                match line_intersection(p_off, term_dir, line_pt, host_dir) {
                    Some(p) => {
                        if collect {
                            piercing.push(p);
                        }
                        quad.push(p);
                    }
                    None => warnings.push(
                        "terminator offset parallel to host line; skipped".to_string(),
                    ),
                }
            }
        }
        if quad.len() < 3 {
            let mut outcome = self.approximate_union(&[terminator, host], operation, started);
            outcome.warnings.extend(warnings);
            return outcome;
        }

        // Quad order: near-left, near-right, far-right, far-left.
        if quad.len() == 4 {
            quad.swap(2, 3);
        }

        // Miter apex: the terminating baseline driven through to the host's
        // far offset line.
        let apex = line_intersection(contact.terminator_end, term_dir, far_line, host_dir);
        if apex.is_none() {
            warnings.push("t-junction miter apex unavailable".to_string());
        }

        let offset_points: Vec<Point> = piercing
            .iter()
            .enumerate()
            .map(|(i, p)| {
                Point::computed(p.x, p.y, format!("t-pierce-{i}"), CreationMethod::Intersection, tol, 1.0)
            })
            .collect();
        let solid_points: Vec<Point> = quad
            .iter()
            .enumerate()
            .map(|(i, p)| {
                Point::computed(p.x, p.y, format!("t-quad-{i}"), CreationMethod::Intersection, tol, 1.0)
            })
            .collect();
        let solid = WallSolid::new(solid_points);

        let apex_pt = apex.map(|p| {
            Point::computed(p.x, p.y, "t-apex", CreationMethod::Intersection, tol, 1.0)
        });
        let intersection = self.build_pair_record(
            &key,
            JunctionKind::T,
            terminator,
            host,
            junction_pt,
            apex_pt,
            offset_points,
            solid.clone(),
            ResolutionMethod::MiterApex,
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
}

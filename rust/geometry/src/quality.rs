// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Quality assessment for resolved walls.
//!
//! The geometric-accuracy score is a weighted sum of mean point accuracy, a
//! resolution-method bonus and a processing-time bonus. The weighting is a
//! compatibility heuristic, kept tunable through [`QualityWeights`].

use crate::bool2d;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use wall_lite_core::{
    Intersection, Issue, IssueKind, IssueSeverity, JunctionKind, QualityMetrics, ResolutionMethod,
    Wall,
};

/// Weights for the geometric-accuracy heuristic
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QualityWeights {
    /// Weight of the mean per-point accuracy. Default: 0.5
    pub point_accuracy: f64,
    /// Weight of the resolution-method bonus. Default: 0.3
    pub method_bonus: f64,
    /// Weight of the processing-time bonus. Default: 0.2
    pub time_bonus: f64,
    /// Processing time (ms) at which the time bonus reaches zero.
    /// Default: 1000
    pub time_budget_ms: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            point_accuracy: 0.5,
            method_bonus: 0.3,
            time_bonus: 0.2,
            time_budget_ms: 1000.0,
        }
    }
}

/// Bonus for how a junction was resolved; exact methods score higher.
fn method_bonus(method: ResolutionMethod) -> f64 {
    match method {
        ResolutionMethod::OffsetIntersection => 1.0,
        ResolutionMethod::MiterApex => 0.95,
        ResolutionMethod::BooleanUnion => 0.85,
        ResolutionMethod::ApproximateFallback => 0.5,
    }
}

/// Assess a resolved wall and its junctions.
pub fn assess_wall_quality(
    wall: &Wall,
    intersections: &[Intersection],
    weights: &QualityWeights,
) -> QualityMetrics {
    let mut metrics = QualityMetrics::default();
    let mut issues: Vec<Issue> = Vec::new();

    let Some(solid) = wall.solid.as_ref() else {
        metrics.degenerate_count = 1;
        metrics.issues.push(Issue {
            kind: IssueKind::DegenerateElement,
            severity: IssueSeverity::Critical,
            location: None,
            suggested_fix: "run offset and junction resolution first".to_string(),
            auto_fixable: false,
        });
        return metrics;
    };

    // Mean point accuracy over the resolved geometry.
    let points: Vec<_> = solid.outer.iter().chain(solid.holes.iter().flatten()).collect();
    let mean_accuracy = if points.is_empty() {
        0.0
    } else {
        points.iter().map(|p| p.accuracy).sum::<f64>() / points.len() as f64
    };

    // Method bonus over this wall's junctions; a wall with no junctions
    // scores a clean offset as exact.
    let own: Vec<&Intersection> = intersections
        .iter()
        .filter(|ix| ix.wall_ids.iter().any(|id| id == &wall.id))
        .collect();
    let method = if own.is_empty() {
        1.0
    } else {
        own.iter().map(|ix| method_bonus(ix.method)).sum::<f64>() / own.len() as f64
    };

    let time_bonus = (1.0 - wall.processing_time_ms / weights.time_budget_ms).clamp(0.0, 1.0);

    metrics.geometric_accuracy = (weights.point_accuracy * mean_accuracy
        + weights.method_bonus * method
        + weights.time_bonus * time_bonus)
        .clamp(0.0, 1.0);

    // Defect counters.
    let outer: Vec<Point2<f64>> = solid.outer.iter().map(|p| Point2::new(p.x, p.y)).collect();
    if !bool2d::is_valid_contour(&outer) {
        metrics.degenerate_count += 1;
        issues.push(Issue {
            kind: IssueKind::DegenerateElement,
            severity: IssueSeverity::Critical,
            location: solid.outer.first().cloned(),
            suggested_fix: "rebuild the wall solid from its offsets".to_string(),
            auto_fixable: false,
        });
    }
    // Sliver holes: area vanishing relative to perimeter.
    for hole in &solid.holes {
        let ring: Vec<Point2<f64>> = hole.iter().map(|p| Point2::new(p.x, p.y)).collect();
        let perimeter = wall_lite_core::wall::ring_perimeter(hole);
        if perimeter > 0.0 && bool2d::signed_area(&ring).abs() / perimeter < 1e-6 * wall.thickness {
            metrics.sliver_count += 1;
            issues.push(Issue {
                kind: IssueKind::SliverFace,
                severity: IssueSeverity::Warning,
                location: hole.first().cloned(),
                suggested_fix: "run shape healing".to_string(),
                auto_fixable: true,
            });
        }
    }

    // Micro gaps: consecutive outer vertices collapsing within tolerance.
    let gap_tol = solid
        .outer
        .first()
        .map_or(1e-6, |p| p.tolerance.max(1e-6));
    for w in solid.outer.windows(2) {
        if w[0].distance_to(&w[1]) < gap_tol {
            metrics.micro_gap_count += 1;
        }
    }
    if metrics.micro_gap_count > 0 {
        issues.push(Issue {
            kind: IssueKind::MicroGap,
            severity: IssueSeverity::Info,
            location: None,
            suggested_fix: "run shape healing".to_string(),
            auto_fixable: true,
        });
    }

    metrics.self_intersection_count = count_self_intersections(&outer);
    if metrics.self_intersection_count > 0 {
        issues.push(Issue {
            kind: IssueKind::SelfIntersection,
            severity: IssueSeverity::Critical,
            location: None,
            suggested_fix: "re-run junction resolution with a wider tolerance".to_string(),
            auto_fixable: false,
        });
    }
    for ix in &own {
        if matches!(ix.kind, JunctionKind::T | JunctionKind::L) && ix.miter_apex.is_none() {
            issues.push(Issue {
                kind: IssueKind::MissingMiterApex,
                severity: IssueSeverity::Warning,
                location: Some(ix.point.clone()),
                suggested_fix: "re-resolve the junction".to_string(),
                auto_fixable: true,
            });
        }
    }

    // Topological consistency: closed, correctly wound, no self-crossings.
    let wound_ccw = bool2d::signed_area(&outer) > 0.0;
    metrics.topological_consistency = match (wound_ccw, metrics.self_intersection_count) {
        (true, 0) => 1.0,
        (false, 0) => 0.7,
        (_, _) => 0.3,
    };

    // Manufacturability degrades with very thin solids and sliver debris.
    let area = bool2d::signed_area(&outer).abs();
    let perimeter = wall_lite_core::wall::ring_perimeter(&solid.outer);
    metrics.manufacturability = if perimeter > 0.0 {
        ((4.0 * area) / (perimeter * wall.thickness)).clamp(0.0, 1.0)
    } else {
        0.0
    };

    // Architectural compliance: thickness within common construction range.
    metrics.architectural_compliance = if (50.0..=600.0).contains(&wall.thickness) {
        1.0
    } else {
        0.6
    };

    metrics.complexity = wall.baseline.points.len() as f64 + own.len() as f64 * 2.0;
    metrics.processing_efficiency = if wall.processing_time_ms > 0.0 {
        (solid.vertex_count() as f64 / wall.processing_time_ms).min(1000.0)
    } else {
        1000.0
    };
    metrics.memory_estimate_bytes = solid.vertex_count() * 96 + 256;
    metrics.issues = issues;
    metrics
}

/// Count proper crossings between non-adjacent edges of a ring.
fn count_self_intersections(ring: &[Point2<f64>]) -> usize {
    let n = ring.len();
    if n < 4 {
        return 0;
    }
    let mut count = 0;
    for i in 0..n {
        for j in i + 2..n {
            // Skip adjacent edges (and the closing adjacency).
            if i == 0 && j == n - 1 {
                continue;
            }
            let (a1, a2) = (ring[i], ring[(i + 1) % n]);
            let (b1, b2) = (ring[j], ring[(j + 1) % n]);
            if segments_cross(a1, a2, b1, b2) {
                count += 1;
            }
        }
    }
    count
}

fn segments_cross(a1: Point2<f64>, a2: Point2<f64>, b1: Point2<f64>, b2: Point2<f64>) -> bool {
    let d = |p: Point2<f64>, q: Point2<f64>, r: Point2<f64>| {
        (q.x - p.x) * (r.y - p.y) - (q.y - p.y) * (r.x - p.x)
    };
    let d1 = d(b1, b2, a1);
    let d2 = d(b1, b2, a2);
    let d3 = d(a1, a2, b1);
    let d4 = d(a1, a2, b2);
    (d1 * d2 < 0.0) && (d3 * d4 < 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wall_lite_core::{Point, WallKind, WallSolid};

    fn resolved_wall() -> Wall {
        let mut w = Wall::straight("w", (0.0, 0.0), (1000.0, 0.0), 150.0, WallKind::Interior);
        w.solid = Some(WallSolid::new(vec![
            Point::new(0.0, 75.0, "a"),
            Point::new(0.0, -75.0, "b"),
            Point::new(1000.0, -75.0, "c"),
            Point::new(1000.0, 75.0, "d"),
        ]));
        w.processing_time_ms = 5.0;
        w
    }

    #[test]
    fn clean_wall_scores_high() {
        let m = assess_wall_quality(&resolved_wall(), &[], &QualityWeights::default());
        assert!(m.geometric_accuracy > 0.9, "score {}", m.geometric_accuracy);
        assert_eq!(m.self_intersection_count, 0);
        assert!(m.issues.is_empty());
        assert_eq!(m.architectural_compliance, 1.0);
    }

    #[test]
    fn missing_solid_is_degenerate() {
        let w = Wall::straight("w", (0.0, 0.0), (1.0, 0.0), 150.0, WallKind::Interior);
        let m = assess_wall_quality(&w, &[], &QualityWeights::default());
        assert_eq!(m.degenerate_count, 1);
        assert_eq!(m.geometric_accuracy, 0.0);
    }

    #[test]
    fn bowtie_counts_self_intersection() {
        let mut w = resolved_wall();
        w.solid = Some(WallSolid::new(vec![
            Point::new(0.0, 0.0, "a"),
            Point::new(100.0, 100.0, "b"),
            Point::new(100.0, 0.0, "c"),
            Point::new(0.0, 100.0, "d"),
        ]));
        let m = assess_wall_quality(&w, &[], &QualityWeights::default());
        assert!(m.self_intersection_count > 0);
        assert!(m.topological_consistency < 0.5);
    }

    #[test]
    fn missing_apex_on_l_junction_warns() {
        let w = resolved_wall();
        let ix = Intersection::new(
            "i1",
            JunctionKind::L,
            vec!["w".into(), "other".into()],
            Point::new(0.0, 0.0, "j"),
        )
        .unwrap();
        let m = assess_wall_quality(&w, &[ix], &QualityWeights::default());
        assert!(m
            .issues
            .iter()
            .any(|i| i.kind == IssueKind::MissingMiterApex && i.severity == IssueSeverity::Warning));
    }

    #[test]
    fn sliver_hole_is_counted() {
        let mut w = resolved_wall();
        w.solid.as_mut().unwrap().holes.push(vec![
            Point::new(100.0, 0.0, "h0"),
            Point::new(600.0, 0.0, "h1"),
            Point::new(600.0, 1e-9, "h2"),
            Point::new(100.0, 1e-9, "h3"),
        ]);
        let m = assess_wall_quality(&w, &[], &QualityWeights::default());
        assert_eq!(m.sliver_count, 1);
        assert!(m.issues.iter().any(|i| i.kind == IssueKind::SliverFace));
        assert!(m.defect_count() > 0);
    }

    #[test]
    fn fallback_method_lowers_score() {
        let w = resolved_wall();
        let mut ix = Intersection::new(
            "i1",
            JunctionKind::L,
            vec!["w".into(), "other".into()],
            Point::new(0.0, 0.0, "j"),
        )
        .unwrap();
        ix.method = ResolutionMethod::ApproximateFallback;
        ix.miter_apex = Some(Point::new(0.0, 0.0, "apex"));
        let fallback = assess_wall_quality(&w, &[ix.clone()], &QualityWeights::default());

        ix.method = ResolutionMethod::OffsetIntersection;
        let exact = assess_wall_quality(&w, &[ix], &QualityWeights::default());
        assert!(exact.geometric_accuracy > fallback.geometric_accuracy);
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::*;
use crate::cache::GeometryCache;
use std::sync::Arc;
use wall_lite_core::{JunctionKind, Wall, WallKind};

fn resolver() -> IntersectionResolver {
    IntersectionResolver::with_cache(Arc::new(GeometryCache::default()))
}

fn wall(id: &str, start: (f64, f64), end: (f64, f64), thickness: f64) -> Wall {
    Wall::straight(id, start, end, thickness, WallKind::Interior)
}

#[test]
fn l_junction_at_right_angle() {
    // Two 150mm walls meeting at 90 degrees at (1000, 0).
    let a = wall("a", (0.0, 0.0), (1000.0, 0.0), 150.0);
    let b = wall("b", (1000.0, 0.0), (1000.0, 1000.0), 150.0);

    let r = resolver();
    let outcome = r.resolve_l_junction(&a, &b);

    assert!(outcome.success, "warnings: {:?}", outcome.warnings);
    let solid = outcome.result_solid.expect("solid defined");
    assert!(solid.outer.len() >= 3);
    assert!(outcome.processing_time_ms < 1000.0);

    let ix = outcome.intersection.expect("junction record");
    assert_eq!(ix.kind, JunctionKind::L);
    assert!(ix.miter_apex.is_some(), "L junction carries a miter apex");
    assert_eq!(ix.wall_ids, vec!["a".to_string(), "b".to_string()]);

    // Corner quad spans the walls' thicknesses around (1000, 0).
    let apex = ix.miter_apex.unwrap();
    assert!((apex.x - 1075.0).abs() < 1.0 && (apex.y + 75.0).abs() < 1.0,
        "outer apex near (1075, -75), got ({}, {})", apex.x, apex.y);
}

#[test]
fn l_junction_resolution_is_idempotent_via_cache() {
    let a = wall("a", (0.0, 0.0), (1000.0, 0.0), 150.0);
    let b = wall("b", (1000.0, 0.0), (1000.0, 1000.0), 150.0);

    let r = resolver();
    let first = r.resolve_l_junction(&a, &b);
    let second = r.resolve_l_junction(&a, &b);

    assert!(second.success);
    let ix2 = second.intersection.unwrap();
    assert!(ix2.cached, "second resolution served from cache");
    assert_eq!(second.result_solid, first.result_solid);
    assert!(r.cache().stats().hits >= 1);
}

#[test]
fn t_junction_produces_apex_and_piercings() {
    let host = wall("host", (-1000.0, 0.0), (1000.0, 0.0), 150.0);
    let term = wall("term", (0.0, 500.0), (0.0, 0.0), 100.0);

    let r = resolver();
    let outcome = r.resolve_t_junction(&term, &host);

    assert!(outcome.success, "warnings: {:?}", outcome.warnings);
    let ix = outcome.intersection.unwrap();
    assert_eq!(ix.kind, JunctionKind::T);
    assert_eq!(ix.offset_points.len(), 2, "two piercing points");

    // Apex: terminating baseline pushed through to the host's far face.
    let apex = ix.miter_apex.expect("T junction carries a miter apex");
    assert!((apex.x - 0.0).abs() < 1e-6);
    assert!((apex.y + 75.0).abs() < 1e-6);

    // Piercing points on the near face at +/- half the terminator width.
    for p in &ix.offset_points {
        assert!((p.y - 75.0).abs() < 1e-6);
        assert!((p.x.abs() - 50.0).abs() < 1e-6);
    }
}

#[test]
fn cross_junction_of_three_walls() {
    // Three walls sharing (0, 0) at 0/90/180 degrees.
    let a = wall("a", (0.0, 0.0), (1000.0, 0.0), 150.0);
    let b = wall("b", (0.0, 0.0), (0.0, 1000.0), 150.0);
    let c = wall("c", (0.0, 0.0), (-1000.0, 0.0), 150.0);

    let r = resolver();
    let outcome = r.resolve_cross_junction(&[&a, &b, &c]);

    assert!(outcome.success, "warnings: {:?}", outcome.warnings);
    assert!(outcome.result_solid.is_some());
    // Three walls stay under the complexity threshold; no complexity warning.
    assert!(!outcome
        .warnings
        .iter()
        .any(|w| w.contains("complexity threshold")));
    let ix = outcome.intersection.unwrap();
    assert_eq!(ix.kind, JunctionKind::Cross);
    assert_eq!(ix.wall_ids.len(), 3);
}

#[test]
fn cross_junction_warns_past_threshold() {
    let walls: Vec<Wall> = (0..5)
        .map(|i| {
            let angle = i as f64 * std::f64::consts::PI * 2.0 / 5.0;
            wall(
                &format!("w{i}"),
                (0.0, 0.0),
                (1000.0 * angle.cos(), 1000.0 * angle.sin()),
                150.0,
            )
        })
        .collect();
    let refs: Vec<&Wall> = walls.iter().collect();

    let outcome = resolver().resolve_cross_junction(&refs);
    assert!(outcome.success);
    assert!(outcome
        .warnings
        .iter()
        .any(|w| w.contains("complexity threshold")));
}

#[test]
fn cross_junction_rejects_two_walls() {
    let a = wall("a", (0.0, 0.0), (1000.0, 0.0), 150.0);
    let b = wall("b", (0.0, 0.0), (0.0, 1000.0), 150.0);
    let outcome = resolver().resolve_cross_junction(&[&a, &b]);
    assert!(!outcome.success);
}

#[test]
fn parallel_overlap_merges_with_warning() {
    let a = wall("a", (0.0, 0.0), (2000.0, 0.0), 150.0);
    let b = wall("b", (1500.0, 20.0), (3500.0, 20.0), 150.0);

    let r = resolver();
    let outcome = r.resolve_parallel_overlap(&a, &b);

    assert!(outcome.success, "warnings: {:?}", outcome.warnings);
    assert!(outcome
        .warnings
        .iter()
        .any(|w| w.contains("parallel overlap ratio")));
    let solid = outcome.result_solid.unwrap();
    // Merged solid spans both walls.
    let xs: Vec<f64> = solid.outer.iter().map(|p| p.x).collect();
    let min_x = xs.iter().cloned().fold(f64::MAX, f64::min);
    let max_x = xs.iter().cloned().fold(f64::MIN, f64::max);
    assert!(min_x < 100.0 && max_x > 3400.0);
}

#[test]
fn disjoint_parallels_do_not_overlap() {
    let a = wall("a", (0.0, 0.0), (1000.0, 0.0), 150.0);
    let b = wall("b", (2000.0, 20.0), (3000.0, 20.0), 150.0);
    let outcome = resolver().resolve_parallel_overlap(&a, &b);
    assert!(!outcome.success);
}

#[test]
fn sharp_angle_uses_bevel_fallback() {
    // ~10 degrees between baselines.
    let a = wall("a", (0.0, 0.0), (1000.0, 0.0), 150.0);
    let b = wall("b", (0.0, 0.0), (985.0, 174.0), 150.0);

    let outcome = resolver().handle_extreme_angles(&[&a, &b], 10.0);
    assert!(outcome.success, "warnings: {:?}", outcome.warnings);
    assert!(outcome.warnings.iter().any(|w| w.contains("sharp angle")));
}

#[test]
fn near_straight_angle_passes_through() {
    let a = wall("a", (0.0, 0.0), (1000.0, 0.0), 150.0);
    let b = wall("b", (1000.0, 0.0), (2000.0, 30.0), 150.0);

    let outcome = resolver().handle_extreme_angles(&[&a, &b], 178.0);
    assert!(outcome.success);
    assert!(outcome.warnings.iter().any(|w| w.contains("near-straight")));
}

#[test]
fn moderate_angle_dispatches_to_l() {
    let a = wall("a", (0.0, 0.0), (1000.0, 0.0), 150.0);
    let b = wall("b", (1000.0, 0.0), (1000.0, 1000.0), 150.0);

    let outcome = resolver().handle_extreme_angles(&[&a, &b], 90.0);
    assert!(outcome.success);
    assert_eq!(outcome.operation, "resolve_l_junction");
}

#[test]
fn degenerate_wall_fails_without_panic() {
    let a = wall("a", (0.0, 0.0), (1000.0, 0.0), 150.0);
    let mut b = wall("b", (1000.0, 0.0), (1000.0, 1000.0), 150.0);
    b.thickness = f64::NAN;

    let outcome = resolver().resolve_l_junction(&a, &b);
    assert!(!outcome.success);
    assert!(!outcome.warnings.is_empty());
}

#[test]
fn network_pass_resolves_a_small_plan() {
    // A square room with one partition: four L corners and two T joints.
    let walls = vec![
        wall("south", (0.0, 0.0), (5000.0, 0.0), 200.0),
        wall("east", (5000.0, 0.0), (5000.0, 4000.0), 200.0),
        wall("north", (5000.0, 4000.0), (0.0, 4000.0), 200.0),
        wall("west", (0.0, 4000.0), (0.0, 0.0), 200.0),
        wall("partition", (2500.0, 0.0), (2500.0, 4000.0), 100.0),
    ];

    let r = resolver();
    let outcome = r.optimize_intersection_network(&walls, &CancelToken::new());

    assert!(!outcome.cancelled);
    assert_eq!(outcome.original_complexity, 10);
    assert!(outcome.resolved.len() >= 4, "resolved {} junctions", outcome.resolved.len());
    assert!(outcome.failed_pairs.is_empty(), "failed: {:?}", outcome.failed_pairs);
    assert!(outcome.performance_gain >= 1.0);
}

#[test]
fn network_pass_honors_cancellation() {
    let walls: Vec<Wall> = (0..40)
        .map(|i| wall(&format!("w{i}"), (i as f64 * 100.0, 0.0), (i as f64 * 100.0 + 100.0, 0.0), 150.0))
        .collect();
    let cancel = CancelToken::new();
    cancel.cancel();

    let outcome = resolver().optimize_intersection_network(&walls, &cancel);
    assert!(outcome.cancelled);
    assert!(outcome.resolved.is_empty());
}

#[test]
fn classify_recognizes_each_topology() {
    let r = resolver();

    let a = wall("a", (0.0, 0.0), (1000.0, 0.0), 150.0);
    let b = wall("b", (1000.0, 0.0), (1000.0, 1000.0), 150.0);
    assert_eq!(r.classify(&[&a, &b]), Some(JunctionKind::L));

    let host = wall("h", (-1000.0, 0.0), (1000.0, 0.0), 150.0);
    let term = wall("t", (0.0, 500.0), (0.0, 0.0), 100.0);
    assert_eq!(r.classify(&[&term, &host]), Some(JunctionKind::T));

    let p1 = wall("p1", (0.0, 0.0), (2000.0, 0.0), 150.0);
    let p2 = wall("p2", (1000.0, 10.0), (3000.0, 10.0), 150.0);
    assert_eq!(r.classify(&[&p1, &p2]), Some(JunctionKind::ParallelOverlap));

    let c = wall("c", (0.0, 0.0), (0.0, 1000.0), 150.0);
    assert_eq!(r.classify(&[&a, &b, &c]), Some(JunctionKind::Cross));

    let far = wall("far", (9000.0, 9000.0), (9500.0, 9000.0), 150.0);
    assert_eq!(r.classify(&[&a, &far]), None);
}

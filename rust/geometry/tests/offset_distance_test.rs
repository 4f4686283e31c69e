// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Offset distance property: for every valid baseline, the minimum distance
//! from each offset vertex to the baseline approximates the requested
//! distance within tolerance.

use wall_lite_core::{Curve, JoinType, Point};
use wall_lite_geometry::{offset_curve, OffsetConfig};

fn baseline(pts: &[(f64, f64)]) -> Curve {
    Curve::polyline(
        pts.iter()
            .enumerate()
            .map(|(i, &(x, y))| Point::new(x, y, format!("p{i}")))
            .collect(),
    )
}

fn min_distance_to_polyline(p: (f64, f64), pts: &[(f64, f64)]) -> f64 {
    let mut best = f64::MAX;
    for w in pts.windows(2) {
        let (ax, ay) = w[0];
        let (bx, by) = w[1];
        let (dx, dy) = (bx - ax, by - ay);
        let len_sq = dx * dx + dy * dy;
        let t = if len_sq > 0.0 {
            (((p.0 - ax) * dx + (p.1 - ay) * dy) / len_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let (fx, fy) = (ax + dx * t, ay + dy * t);
        best = best.min(((p.0 - fx).powi(2) + (p.1 - fy).powi(2)).sqrt());
    }
    best
}

#[test]
fn offsets_keep_the_requested_distance() {
    let cases: Vec<(Vec<(f64, f64)>, f64)> = vec![
        // Straight run.
        (vec![(0.0, 0.0), (5000.0, 0.0)], 75.0),
        // Right angle.
        (vec![(0.0, 0.0), (2000.0, 0.0), (2000.0, 1500.0)], 100.0),
        // Gentle zig-zag.
        (
            vec![(0.0, 0.0), (1000.0, 200.0), (2000.0, 0.0), (3000.0, 300.0)],
            50.0,
        ),
        // Diagonal run.
        (vec![(0.0, 0.0), (3000.0, 3000.0)], 125.0),
    ];

    for (pts, distance) in cases {
        let b = baseline(&pts);
        let result = offset_curve(&b, distance, JoinType::Bevel, 1e-6, &OffsetConfig::default());
        assert!(result.success, "offset failed for {pts:?}");

        for side in [
            result.left_offset.expect("left"),
            result.right_offset.expect("right"),
        ] {
            for p in &side.points {
                let d = min_distance_to_polyline((p.x, p.y), &pts);
                // Bevel joins never undershoot the offset distance; segment
                // interiors sit exactly at it.
                assert!(
                    d <= distance + 1e-6,
                    "offset point ({}, {}) at distance {d}, requested {distance}",
                    p.x,
                    p.y
                );
            }
            // Endpoint vertices are exact.
            let first = side.points.first().expect("nonempty offset");
            let d = min_distance_to_polyline((first.x, first.y), &pts);
            assert!(
                (d - distance).abs() < 1e-6,
                "endpoint distance {d} != {distance}"
            );
        }
    }
}

#[test]
fn both_sides_bracket_the_baseline() {
    let pts = vec![(0.0, 0.0), (4000.0, 0.0)];
    let b = baseline(&pts);
    let result = offset_curve(&b, 60.0, JoinType::Miter, 1e-6, &OffsetConfig::default());
    let left = result.left_offset.expect("left");
    let right = result.right_offset.expect("right");

    for (l, r) in left.points.iter().zip(right.points.iter()) {
        // Midpoint of corresponding offset vertices recovers the baseline.
        let mid_y = (l.y + r.y) * 0.5;
        assert!(mid_y.abs() < 1e-9);
        assert!((l.y - 60.0).abs() < 1e-9);
        assert!((r.y + 60.0).abs() < 1e-9);
    }
}

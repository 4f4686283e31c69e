// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D boolean operations over wall strips.
//!
//! Junction resolution works on "strips": the quadrilateral-ish polygons a
//! wall covers once its baseline is offset both ways. Cross junctions and
//! parallel overlaps merge strips with a boolean union; this module wraps
//! the i_overlay crate for those operations and converts between the wall
//! solid model and i_overlay's path format.

use crate::error::{Error, Result};
use nalgebra::Point2;
use wall_lite_core::{CreationMethod, Point, WallSolid};

/// Polygons smaller than this are considered degenerate
const MIN_AREA_THRESHOLD: f64 = 1e-10;

/// Union an arbitrary set of strip contours into merged shapes.
///
/// Returns one entry per disjoint result shape; each entry is the shape's
/// contour list (first contour outer, rest holes).
pub fn union_strips(strips: &[Vec<Point2<f64>>]) -> Result<Vec<Vec<Vec<Point2<f64>>>>> {
    use i_overlay::core::fill_rule::FillRule;
    use i_overlay::core::overlay_rule::OverlayRule;
    use i_overlay::float::single::SingleFloatOverlay;

    let valid: Vec<&Vec<Point2<f64>>> = strips.iter().filter(|c| c.len() >= 3).collect();
    if valid.is_empty() {
        return Err(Error::BooleanFailure(
            "no valid strip contours to union".to_string(),
        ));
    }
    if valid.len() == 1 {
        return Ok(vec![vec![ensure_ccw(valid[0])]]);
    }

    // Subject is the first strip; everything else is clip.
    let subject: Vec<Vec<[f64; 2]>> = vec![contour_to_path(valid[0])];
    let clip: Vec<Vec<[f64; 2]>> = valid[1..].iter().map(|c| contour_to_path(c)).collect();

    let result = subject.overlay(&clip, OverlayRule::Union, FillRule::EvenOdd);

    if result.is_empty() {
        return Err(Error::BooleanFailure(
            "strip union produced empty geometry".to_string(),
        ));
    }

    let mut shapes = Vec::with_capacity(result.len());
    for shape in result {
        let mut contours = Vec::with_capacity(shape.len());
        for contour in shape {
            let points: Vec<Point2<f64>> =
                contour.into_iter().map(|p| Point2::new(p[0], p[1])).collect();
            if points.len() >= 3 {
                contours.push(points);
            }
        }
        if !contours.is_empty() {
            shapes.push(contours);
        }
    }
    Ok(shapes)
}

/// Convert union output to a wall solid, selecting the largest shape by
/// outer-boundary area. Smaller disjoint fragments are sliver debris from
/// the boolean and are dropped.
pub fn shapes_to_solid(shapes: &[Vec<Vec<Point2<f64>>>], tolerance: f64) -> Result<WallSolid> {
    if shapes.is_empty() {
        return Err(Error::EmptySolid(
            "boolean result contained no shapes".to_string(),
        ));
    }

    let mut best_idx = 0;
    let mut largest = 0.0f64;
    for (idx, shape) in shapes.iter().enumerate() {
        if shape.is_empty() {
            continue;
        }
        let area = signed_area(&shape[0]).abs();
        if area > largest {
            largest = area;
            best_idx = idx;
        }
    }

    let best = &shapes[best_idx];
    if best.is_empty() || largest < MIN_AREA_THRESHOLD {
        return Err(Error::EmptySolid(
            "boolean result shape is degenerate".to_string(),
        ));
    }

    let outer = ensure_ccw(&best[0]);
    let mut solid = WallSolid::new(contour_to_points(&outer, tolerance));
    for contour in best.iter().skip(1) {
        if is_valid_contour(contour) {
            let hole = ensure_cw(contour);
            solid.holes.push(contour_to_points(&hole, tolerance));
        }
    }
    Ok(solid)
}

/// Signed area of a contour. Positive = counter-clockwise.
pub fn signed_area(contour: &[Point2<f64>]) -> f64 {
    if contour.len() < 3 {
        return 0.0;
    }
    let n = contour.len();
    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += contour[i].x * contour[j].y;
        area -= contour[j].x * contour[i].y;
    }
    area * 0.5
}

/// Contour has at least 3 points and non-degenerate area.
pub fn is_valid_contour(contour: &[Point2<f64>]) -> bool {
    contour.len() >= 3 && signed_area(contour).abs() > MIN_AREA_THRESHOLD
}

/// Ensure counter-clockwise winding (outer boundaries).
pub fn ensure_ccw(contour: &[Point2<f64>]) -> Vec<Point2<f64>> {
    if signed_area(contour) < 0.0 {
        contour.iter().rev().cloned().collect()
    } else {
        contour.to_vec()
    }
}

/// Ensure clockwise winding (holes).
pub fn ensure_cw(contour: &[Point2<f64>]) -> Vec<Point2<f64>> {
    if signed_area(contour) > 0.0 {
        contour.iter().rev().cloned().collect()
    } else {
        contour.to_vec()
    }
}

/// Ray-cast point-in-contour test.
pub fn point_in_contour(point: &Point2<f64>, contour: &[Point2<f64>]) -> bool {
    if contour.len() < 3 {
        return false;
    }
    let mut inside = false;
    let n = contour.len();
    let mut j = n - 1;
    for i in 0..n {
        let pi = &contour[i];
        let pj = &contour[j];
        if ((pi.y > point.y) != (pj.y > point.y))
            && (point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// The strip polygon a wall covers: its solid outer ring if resolved,
/// otherwise the quad spanned by its offset curves.
pub fn wall_strip(wall: &wall_lite_core::Wall) -> Option<Vec<Point2<f64>>> {
    if let Some(solid) = &wall.solid {
        if !solid.is_empty() {
            return Some(solid.outer.iter().map(|p| Point2::new(p.x, p.y)).collect());
        }
    }
    let left = wall.left_offset.as_ref()?;
    let right = wall.right_offset.as_ref()?;
    if left.points.is_empty() || right.points.is_empty() {
        return None;
    }
    let mut strip: Vec<Point2<f64>> =
        left.points.iter().map(|p| Point2::new(p.x, p.y)).collect();
    strip.extend(right.points.iter().rev().map(|p| Point2::new(p.x, p.y)));
    Some(strip)
}

fn contour_to_path(contour: &[Point2<f64>]) -> Vec<[f64; 2]> {
    contour.iter().map(|p| [p.x, p.y]).collect()
}

fn contour_to_points(contour: &[Point2<f64>], tolerance: f64) -> Vec<Point> {
    contour
        .iter()
        .enumerate()
        .map(|(i, p)| {
            Point::computed(
                p.x,
                p.y,
                format!("bool-{i}"),
                CreationMethod::Intersection,
                tolerance,
                1.0,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64, size: f64) -> Vec<Point2<f64>> {
        vec![
            Point2::new(x, y),
            Point2::new(x + size, y),
            Point2::new(x + size, y + size),
            Point2::new(x, y + size),
        ]
    }

    #[test]
    fn union_of_overlapping_squares_is_one_shape() {
        let shapes = union_strips(&[square(0.0, 0.0, 2.0), square(1.0, 1.0, 2.0)]).unwrap();
        assert_eq!(shapes.len(), 1);
        // L-shaped union: area 2*2 + 2*2 - 1*1 = 7
        let area = signed_area(&ensure_ccw(&shapes[0][0]));
        assert!((area - 7.0).abs() < 1e-9);
    }

    #[test]
    fn union_of_disjoint_squares_keeps_both() {
        let shapes = union_strips(&[square(0.0, 0.0, 1.0), square(10.0, 10.0, 1.0)]).unwrap();
        assert_eq!(shapes.len(), 2);
    }

    #[test]
    fn shapes_to_solid_picks_largest() {
        let shapes = union_strips(&[square(0.0, 0.0, 4.0), square(100.0, 100.0, 1.0)]).unwrap();
        let solid = shapes_to_solid(&shapes, 1e-6).unwrap();
        let area = wall_lite_core::wall::ring_signed_area(&solid.outer).abs();
        assert!((area - 16.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_contours_are_filtered() {
        let collinear = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
        ];
        assert!(!is_valid_contour(&collinear));
        assert!(union_strips(&[vec![Point2::new(0.0, 0.0)]]).is_err());
    }

    #[test]
    fn point_in_contour_basics() {
        let sq = square(0.0, 0.0, 10.0);
        assert!(point_in_contour(&Point2::new(5.0, 5.0), &sq));
        assert!(!point_in_contour(&Point2::new(15.0, 5.0), &sq));
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Curves: ordered point sequences with derived metrics.

use crate::point::Point;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Geometric interpretation of a point sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurveType {
    /// Straight segments between consecutive points.
    Polyline,
    /// Points sample a circular arc.
    Arc,
    /// Points are spline control samples.
    Spline,
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Empty box that grows on the first `expand`.
    pub fn empty() -> Self {
        Self {
            min_x: f64::MAX,
            min_y: f64::MAX,
            max_x: f64::MIN,
            max_y: f64::MIN,
        }
    }

    pub fn expand(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Grow the box by `margin` on every side.
    pub fn inflated(&self, margin: f64) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }
}

/// Ordered point sequence owned by its producing wall.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Curve {
    pub points: Vec<Point>,
    pub curve_type: CurveType,
    pub closed: bool,
}

impl Curve {
    pub fn polyline(points: Vec<Point>) -> Self {
        Self {
            points,
            curve_type: CurveType::Polyline,
            closed: false,
        }
    }

    pub fn closed_polyline(points: Vec<Point>) -> Self {
        Self {
            points,
            curve_type: CurveType::Polyline,
            closed: true,
        }
    }

    /// Total chord length across consecutive points (including the closing
    /// segment for closed curves).
    pub fn length(&self) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        let mut total = 0.0;
        for i in 0..self.points.len() - 1 {
            total += self.points[i].distance_to(&self.points[i + 1]);
        }
        if self.closed {
            if let (Some(first), Some(last)) = (self.points.first(), self.points.last()) {
                total += last.distance_to(first);
            }
        }
        total
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox::empty();
        for p in &self.points {
            bbox.expand(p.x, p.y);
        }
        bbox
    }

    /// Unit tangent at each point. Interior points average the two adjacent
    /// segment directions; endpoints use their single segment. Degenerate
    /// segments reuse the previous tangent.
    pub fn tangents(&self) -> Vec<Vector2<f64>> {
        let n = self.points.len();
        if n < 2 {
            return vec![Vector2::new(1.0, 0.0); n];
        }

        let mut seg_dirs: Vec<Vector2<f64>> = Vec::with_capacity(n - 1);
        for i in 0..n - 1 {
            let d = Vector2::new(
                self.points[i + 1].x - self.points[i].x,
                self.points[i + 1].y - self.points[i].y,
            );
            let len = d.norm();
            if len > f64::EPSILON {
                seg_dirs.push(d / len);
            } else if let Some(&prev) = seg_dirs.last() {
                seg_dirs.push(prev);
            } else {
                seg_dirs.push(Vector2::new(1.0, 0.0));
            }
        }

        let mut tangents = Vec::with_capacity(n);
        tangents.push(seg_dirs[0]);
        for i in 1..n - 1 {
            let avg = seg_dirs[i - 1] + seg_dirs[i];
            let len = avg.norm();
            if len > f64::EPSILON {
                tangents.push(avg / len);
            } else {
                // 180-degree reversal: keep the incoming direction.
                tangents.push(seg_dirs[i - 1]);
            }
        }
        tangents.push(seg_dirs[n - 2]);
        tangents
    }

    /// Discrete curvature at each point: turning angle divided by the mean of
    /// the adjacent segment lengths. Endpoints have zero curvature.
    pub fn curvatures(&self) -> Vec<f64> {
        let n = self.points.len();
        let mut out = vec![0.0; n];
        if n < 3 {
            return out;
        }
        for i in 1..n - 1 {
            let a = &self.points[i - 1];
            let b = &self.points[i];
            let c = &self.points[i + 1];
            let v1 = Vector2::new(b.x - a.x, b.y - a.y);
            let v2 = Vector2::new(c.x - b.x, c.y - b.y);
            let l1 = v1.norm();
            let l2 = v2.norm();
            if l1 < f64::EPSILON || l2 < f64::EPSILON {
                continue;
            }
            let cos = (v1.dot(&v2) / (l1 * l2)).clamp(-1.0, 1.0);
            let angle = cos.acos();
            out[i] = angle / ((l1 + l2) * 0.5);
        }
        out
    }

    /// Turning angle at interior vertex `i` in radians; 0 for endpoints.
    pub fn turn_angle_at(&self, i: usize) -> f64 {
        if i == 0 || i + 1 >= self.points.len() {
            return 0.0;
        }
        let a = &self.points[i - 1];
        let b = &self.points[i];
        let c = &self.points[i + 1];
        let v1 = Vector2::new(b.x - a.x, b.y - a.y);
        let v2 = Vector2::new(c.x - b.x, c.y - b.y);
        let l1 = v1.norm();
        let l2 = v2.norm();
        if l1 < f64::EPSILON || l2 < f64::EPSILON {
            return 0.0;
        }
        let cos = (v1.dot(&v2) / (l1 * l2)).clamp(-1.0, 1.0);
        cos.acos()
    }

    /// All points have finite coordinates.
    pub fn is_finite(&self) -> bool {
        self.points.iter().all(Point::is_finite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn curve(pts: &[(f64, f64)]) -> Curve {
        Curve::polyline(
            pts.iter()
                .enumerate()
                .map(|(i, &(x, y))| Point::new(x, y, format!("p{i}")))
                .collect(),
        )
    }

    #[test]
    fn length_of_l_shape() {
        let c = curve(&[(0.0, 0.0), (10.0, 0.0), (10.0, 5.0)]);
        assert_relative_eq!(c.length(), 15.0);
    }

    #[test]
    fn closed_curve_includes_closing_segment() {
        let mut c = curve(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        c.closed = true;
        assert_relative_eq!(c.length(), 40.0);
    }

    #[test]
    fn tangents_follow_segments() {
        let c = curve(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        let t = c.tangents();
        assert_relative_eq!(t[0].x, 1.0);
        assert_relative_eq!(t[0].y, 0.0);
        assert_relative_eq!(t[2].x, 0.0);
        assert_relative_eq!(t[2].y, 1.0);
        // Interior tangent bisects the corner.
        assert_relative_eq!(t[1].x, t[1].y, epsilon = 1e-12);
    }

    #[test]
    fn straight_line_has_zero_curvature() {
        let c = curve(&[(0.0, 0.0), (5.0, 0.0), (10.0, 0.0)]);
        assert!(c.curvatures().iter().all(|&k| k.abs() < 1e-12));
    }

    #[test]
    fn right_angle_turn_is_half_pi() {
        let c = curve(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        assert_relative_eq!(c.turn_angle_at(1), std::f64::consts::FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn bbox_covers_all_points() {
        let c = curve(&[(-2.0, 1.0), (3.0, -4.0), (0.5, 7.0)]);
        let b = c.bounding_box();
        assert_relative_eq!(b.min_x, -2.0);
        assert_relative_eq!(b.min_y, -4.0);
        assert_relative_eq!(b.max_x, 3.0);
        assert_relative_eq!(b.max_y, 7.0);
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Annotated 2D points. Immutable once created.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Identifier for a point within a document.
pub type PointId = String;

/// How a point came into existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreationMethod {
    /// Placed directly by the user.
    Manual,
    /// Produced by an offset or other derived computation.
    Computed,
    /// Produced by junction resolution.
    Intersection,
    /// Produced by the shape healing engine.
    Healed,
    /// Produced by the simplification engine.
    Simplified,
    /// Loaded from an external document.
    Imported,
}

/// A 2D point with provenance and accuracy annotations.
///
/// Points are immutable: engines that move a vertex create a new point with
/// the appropriate creation method rather than mutating in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub id: PointId,
    /// Context tolerance the point was created under.
    pub tolerance: f64,
    pub creation_method: CreationMethod,
    /// Confidence in the coordinates, 0.0 - 1.0.
    pub accuracy: f64,
    pub validated: bool,
}

impl Point {
    /// Create a manually placed point with full accuracy.
    pub fn new(x: f64, y: f64, id: impl Into<PointId>) -> Self {
        Self {
            x,
            y,
            id: id.into(),
            tolerance: 1e-6,
            creation_method: CreationMethod::Manual,
            accuracy: 1.0,
            validated: true,
        }
    }

    /// Create a computed point with the given provenance and accuracy.
    pub fn computed(
        x: f64,
        y: f64,
        id: impl Into<PointId>,
        method: CreationMethod,
        tolerance: f64,
        accuracy: f64,
    ) -> Self {
        Self {
            x,
            y,
            id: id.into(),
            tolerance,
            creation_method: method,
            accuracy: accuracy.clamp(0.0, 1.0),
            validated: false,
        }
    }

    /// Both coordinates are finite (no NaN, no infinity).
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn to_nalgebra(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    pub fn from_nalgebra(p: &Point2<f64>, id: impl Into<PointId>, method: CreationMethod) -> Self {
        Self::computed(p.x, p.y, id, method, 1e-6, 1.0)
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_points_are_validated() {
        let p = Point::new(1.0, 2.0, "p1");
        assert!(p.validated);
        assert_eq!(p.creation_method, CreationMethod::Manual);
        assert!(p.is_finite());
    }

    #[test]
    fn computed_accuracy_is_clamped() {
        let p = Point::computed(0.0, 0.0, "p2", CreationMethod::Healed, 1e-3, 1.7);
        assert_eq!(p.accuracy, 1.0);
        assert!(!p.validated);
    }

    #[test]
    fn nan_is_not_finite() {
        let p = Point::new(f64::NAN, 0.0, "bad");
        assert!(!p.is_finite());
    }
}

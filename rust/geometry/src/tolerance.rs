// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Context-sensitive epsilon computation.
//!
//! Every other engine asks this module how close two quantities must be to
//! count as equal. Tolerances scale with wall thickness and with how sharply
//! the baseline turns locally, and are floored at the configured document
//! precision so they never collapse to zero.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use wall_lite_core::{Point, Wall};

/// Configuration for tolerance computation
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ToleranceConfig {
    /// Base document precision (model units). Every computed tolerance is
    /// floored here. Default: 1e-6
    pub base_precision: f64,

    /// Fraction of the wall thickness contributed to the vertex-merge
    /// tolerance. Default: 1e-3
    pub thickness_factor: f64,

    /// Multiplier applied as the local turn approaches 0 or 180 degrees,
    /// where offset intersections become ill-conditioned. Default: 4.0
    pub angle_factor: f64,

    /// Multiplier applied per unit of curvature·thickness. Default: 2.0
    pub curvature_factor: f64,

    /// Ceiling on tolerance growth, as a multiple of the thickness-scaled
    /// base. Default: 16.0
    pub max_scale: f64,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            base_precision: 1e-6,
            thickness_factor: 1e-3,
            angle_factor: 4.0,
            curvature_factor: 2.0,
            max_scale: 16.0,
        }
    }
}

/// Stateless tolerance computer shared by every engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToleranceContext {
    config: ToleranceConfig,
}

impl ToleranceContext {
    pub fn new(config: ToleranceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ToleranceConfig {
        &self.config
    }

    /// Tolerance below which two vertices merge, given the wall thickness and
    /// the local turning angle (radians, 0 = straight through).
    ///
    /// Grows as the turn approaches 0 or PI where join geometry degenerates,
    /// capped at `max_scale` times the thickness-scaled base.
    pub fn vertex_merge_tolerance(&self, thickness: f64, local_angle: f64) -> f64 {
        let thickness = thickness.abs().max(self.config.base_precision);
        let base = self.config.base_precision.max(thickness * self.config.thickness_factor);

        // sin of the turn is the conditioning of the offset intersection;
        // near-collinear turns (sin -> 0) need a wider net.
        let angle = local_angle.abs().min(PI);
        let sin = angle.sin().max(1.0 / self.config.max_scale.max(1.0));
        let scaled = base * (1.0 + self.config.angle_factor * (1.0 - sin));

        scaled.min(base * self.config.max_scale).max(self.config.base_precision)
    }

    /// Tolerance for offset-curve approximation, given thickness and local
    /// curvature (1/length units).
    pub fn offset_tolerance(&self, thickness: f64, curvature: f64) -> f64 {
        let thickness = thickness.abs().max(self.config.base_precision);
        let base = self.config.base_precision.max(thickness * self.config.thickness_factor);
        let scaled = base * (1.0 + self.config.curvature_factor * curvature.abs() * thickness);
        scaled.min(base * self.config.max_scale).max(self.config.base_precision)
    }

    /// Band polygon around the baseline at the vertex-merge tolerance,
    /// consumed read-only by tolerance-zone visualization.
    ///
    /// Returns one quad (4 corners) per baseline segment.
    pub fn tolerance_zone(&self, wall: &Wall) -> Vec<[(f64, f64); 4]> {
        let pts: &[Point] = &wall.baseline.points;
        let mut quads = Vec::with_capacity(pts.len().saturating_sub(1));
        for i in 0..pts.len().saturating_sub(1) {
            let a = &pts[i];
            let b = &pts[i + 1];
            let dx = b.x - a.x;
            let dy = b.y - a.y;
            let len = (dx * dx + dy * dy).sqrt();
            if len < self.config.base_precision {
                continue;
            }
            let angle = wall.baseline.turn_angle_at(i + 1);
            let eps = self.vertex_merge_tolerance(wall.thickness, angle);
            let half = wall.half_thickness() + eps;
            let nx = -dy / len * half;
            let ny = dx / len * half;
            quads.push([
                (a.x + nx, a.y + ny),
                (b.x + nx, b.y + ny),
                (b.x - nx, b.y - ny),
                (a.x - nx, a.y - ny),
            ]);
        }
        quads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wall_lite_core::WallKind;

    #[test]
    fn tolerance_is_never_below_base_precision() {
        let ctx = ToleranceContext::default();
        let eps = ctx.vertex_merge_tolerance(0.0, 0.0);
        assert!(eps >= ctx.config().base_precision);
        assert!(eps > 0.0);
    }

    #[test]
    fn tolerance_scales_with_thickness() {
        let ctx = ToleranceContext::default();
        let thin = ctx.vertex_merge_tolerance(100.0, PI / 2.0);
        let thick = ctx.vertex_merge_tolerance(300.0, PI / 2.0);
        assert!(thick > thin);
    }

    #[test]
    fn near_collinear_turn_widens_tolerance() {
        let ctx = ToleranceContext::default();
        let right_angle = ctx.vertex_merge_tolerance(150.0, PI / 2.0);
        let near_straight = ctx.vertex_merge_tolerance(150.0, 0.01);
        assert!(near_straight > right_angle);
    }

    #[test]
    fn tolerance_growth_is_capped() {
        let cfg = ToleranceConfig::default();
        let ctx = ToleranceContext::new(cfg);
        let base = cfg.base_precision.max(150.0 * cfg.thickness_factor);
        let eps = ctx.vertex_merge_tolerance(150.0, 1e-9);
        assert!(eps <= base * cfg.max_scale + 1e-12);
    }

    #[test]
    fn offset_tolerance_grows_with_curvature() {
        let ctx = ToleranceContext::default();
        let flat = ctx.offset_tolerance(150.0, 0.0);
        let curved = ctx.offset_tolerance(150.0, 0.05);
        assert!(curved > flat);
    }

    #[test]
    fn zone_has_one_quad_per_segment() {
        let ctx = ToleranceContext::default();
        let wall = Wall::straight("w", (0.0, 0.0), (1000.0, 0.0), 150.0, WallKind::Interior);
        let quads = ctx.tolerance_zone(&wall);
        assert_eq!(quads.len(), 1);
        // Band is wider than the bare half-thickness.
        let (_, y) = quads[0][0];
        assert!(y > 75.0);
    }
}

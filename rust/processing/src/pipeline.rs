// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mode-switching orchestration.
//!
//! Per wall the pipeline runs Offset -> Intersection -> Healing ->
//! Simplification, attaches the results and updates validity flags.
//! Independent walls convert in parallel; junction resolution runs over the
//! converted batch afterwards because it needs every participant. One
//! malformed wall fails only itself.

use crate::types::{Mode, ModeSwitchResult, SyncOutcome, ValidationReport};
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use wall_lite_core::{
    BasicNode, CreationMethod, Curve, Intersection, Point, UnifiedWallData, Wall, WallSolid,
};
use wall_lite_core::unified::BimGeometry;
use wall_lite_core::wall::ring_signed_area;
use wall_lite_geometry::resolver::CancelToken;
use wall_lite_geometry::{
    assess_wall_quality, heal_shape, offset_curve, simplify_wall_geometry, GeometryCache,
    HealingConfig, IntersectionResolver, OffsetConfig, QualityWeights, ResolverConfig,
    SimplifyConfig, ToleranceConfig, ToleranceContext,
};

/// Configuration for the conversion pipeline
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    pub tolerance: ToleranceConfig,
    pub offset: OffsetConfig,
    pub resolver: ResolverConfig,
    pub healing: HealingConfig,
    pub simplify: SimplifyConfig,
    pub quality: QualityWeights,

    /// Perpendicular deviation budget handed to simplification.
    /// Default: 0.5 model units
    pub simplify_max_deviation: f64,

    /// Convert independent walls on the rayon pool. Default: true
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tolerance: ToleranceConfig::default(),
            offset: OffsetConfig::default(),
            resolver: ResolverConfig::default(),
            healing: HealingConfig::default(),
            simplify: SimplifyConfig::default(),
            quality: QualityWeights::default(),
            simplify_max_deviation: 0.5,
            parallel: true,
        }
    }
}

/// Orchestrates basic-to-BIM conversion over the geometry engines.
pub struct ModeSwitchPipeline {
    tolerance: ToleranceContext,
    resolver: IntersectionResolver,
    cache: Arc<GeometryCache>,
    config: PipelineConfig,
}

/// Per-wall conversion result before junction resolution.
struct ConvertedWall {
    index: usize,
    wall: Wall,
    warnings: Vec<String>,
    approximations: Vec<String>,
}

impl ModeSwitchPipeline {
    pub fn new(config: PipelineConfig, cache: Arc<GeometryCache>) -> Self {
        let tolerance = ToleranceContext::new(config.tolerance);
        let resolver = IntersectionResolver::new(
            tolerance,
            config.offset,
            config.resolver,
            Arc::clone(&cache),
        );
        Self {
            tolerance,
            resolver,
            cache,
            config,
        }
    }

    pub fn cache(&self) -> &GeometryCache {
        &self.cache
    }

    /// Convert every wall's basic geometry into full BIM geometry.
    pub fn switch_to_bim_mode(
        &self,
        walls: &mut [UnifiedWallData],
        cancel: &CancelToken,
    ) -> ModeSwitchResult {
        let started = Instant::now();
        let mut warnings: Vec<String> = Vec::new();
        let mut approximations: Vec<String> = Vec::new();
        let mut failed: Vec<(String, String)> = Vec::new();

        // Phase 1: independent per-wall conversion, parallel over the batch.
        let convert = |(index, unified): (usize, &UnifiedWallData)| {
            self.convert_one(index, unified)
                .map_err(|e| (unified.id.clone(), e))
        };
        let outcomes: Vec<std::result::Result<ConvertedWall, (String, String)>> =
            if self.config.parallel {
                walls.par_iter().enumerate().map(convert).collect()
            } else {
                walls.iter().enumerate().map(convert).collect()
            };

        let mut converted: Vec<ConvertedWall> = Vec::with_capacity(walls.len());
        for outcome in outcomes {
            match outcome {
                Ok(c) => converted.push(c),
                Err(pair) => failed.push(pair),
            }
        }

        // Phase 2: junction resolution over the converted batch.
        let batch: Vec<Wall> = converted.iter().map(|c| c.wall.clone()).collect();
        let network = self.resolver.optimize_intersection_network(&batch, cancel);
        warnings.extend(network.warnings.iter().cloned());
        if network.cancelled {
            warnings.push("junction resolution cancelled mid-batch".to_string());
        }

        // Phase 3: attach BIM geometry, quality and junction back-references.
        for c in &mut converted {
            let own_junctions: Vec<Intersection> = network
                .resolved
                .iter()
                .filter(|ix| ix.wall_ids.iter().any(|id| id == &c.wall.id))
                .cloned()
                .collect();
            c.wall.intersection_ids = own_junctions.iter().map(|ix| ix.id.clone()).collect();
            let quality = assess_wall_quality(&c.wall, &own_junctions, &self.config.quality);
            c.wall.quality = Some(quality.clone());
            self.cache.put_quality(&c.wall.id, quality.clone());

            warnings.append(&mut c.warnings);
            approximations.append(&mut c.approximations);

            walls[c.index].attach_bim(BimGeometry {
                wall: c.wall.clone(),
                intersections: own_junctions,
                quality: c.wall.quality.clone(),
            });
        }

        let success = failed.is_empty() && !network.cancelled;
        tracing::info!(
            walls = walls.len(),
            converted = converted.len(),
            failed = failed.len(),
            junctions = network.resolved.len(),
            "switched batch to BIM mode"
        );

        ModeSwitchResult {
            success,
            converted_walls: converted.iter().map(|c| c.wall.id.clone()).collect(),
            failed_walls: failed,
            warnings,
            preserved_data: true,
            data_loss: false,
            processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
            approximations_used: approximations,
        }
    }

    /// Drop back to basic mode, regenerating the lightweight geometry from
    /// the BIM side.
    pub fn switch_to_basic_mode(&self, walls: &mut [UnifiedWallData]) -> ModeSwitchResult {
        let started = Instant::now();
        let mut converted: Vec<String> = Vec::new();
        let mut failed: Vec<(String, String)> = Vec::new();
        let warnings: Vec<String> = Vec::new();
        let mut approximations: Vec<String> = Vec::new();
        let mut data_loss = false;

        for unified in walls.iter_mut() {
            let Some(bim) = unified.bim.as_ref() else {
                // Already basic; nothing to regenerate.
                converted.push(unified.id.clone());
                continue;
            };

            let nodes: Vec<BasicNode> = bim
                .wall
                .baseline
                .points
                .iter()
                .map(|p| BasicNode {
                    id: p.id.clone(),
                    x: p.x,
                    y: p.y,
                })
                .collect();
            if nodes.len() < 2 {
                failed.push((
                    unified.id.clone(),
                    "BIM baseline has fewer than 2 points".to_string(),
                ));
                continue;
            }

            let polygon: Vec<(f64, f64)> = bim
                .wall
                .solid
                .as_ref()
                .map(|s| s.outer.iter().map(|p| (p.x, p.y)).collect())
                .unwrap_or_default();
            if bim.wall.solid.as_ref().is_some_and(|s| !s.holes.is_empty()) {
                // Basic polygons carry no holes.
                approximations.push(format!(
                    "wall {}: solid holes dropped in basic polygon",
                    unified.id
                ));
                data_loss = true;
            }

            let thickness = bim.wall.thickness;
            let kind = bim.wall.kind;
            let rebuilt = UnifiedWallData::from_basic(unified.id.clone(), nodes, thickness, kind);
            unified.basic = rebuilt.basic;
            unified.basic.polygon = polygon;
            unified.thickness = thickness;
            unified.kind = kind;
            unified.detach_bim();
            self.cache.invalidate_wall(&unified.id);
            converted.push(unified.id.clone());
        }

        let success = failed.is_empty();
        ModeSwitchResult {
            success,
            converted_walls: converted,
            failed_walls: failed,
            warnings,
            preserved_data: !data_loss,
            data_loss,
            processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
            approximations_used: approximations,
        }
    }

    /// Non-mutating dry run: report compatibility, potential data loss and
    /// an estimated cost for the prospective switch.
    pub fn validate_mode_switch(
        &self,
        from: Mode,
        to: Mode,
        walls: &[UnifiedWallData],
    ) -> ValidationReport {
        let mut incompatible: Vec<(String, String)> = Vec::new();
        let mut potential_loss: Vec<String> = Vec::new();

        for unified in walls {
            match (from, to) {
                (Mode::Basic, Mode::Bim) => {
                    if unified.basic.nodes.len() < 2 {
                        incompatible.push((
                            unified.id.clone(),
                            format!("{} basic node(s), need at least 2", unified.basic.nodes.len()),
                        ));
                    }
                    if !(unified.thickness.is_finite() && unified.thickness > 0.0) {
                        incompatible.push((
                            unified.id.clone(),
                            format!("thickness {} is not positive", unified.thickness),
                        ));
                    }
                    if unified
                        .basic
                        .nodes
                        .iter()
                        .any(|n| !(n.x.is_finite() && n.y.is_finite()))
                    {
                        incompatible
                            .push((unified.id.clone(), "non-finite node coordinates".to_string()));
                    }
                }
                (Mode::Bim, Mode::Basic) => match unified.bim.as_ref() {
                    None => incompatible
                        .push((unified.id.clone(), "no BIM geometry present".to_string())),
                    Some(bim) => {
                        if bim.wall.solid.as_ref().is_some_and(|s| !s.holes.is_empty()) {
                            potential_loss.push(format!(
                                "wall {}: solid holes are not representable in basic mode",
                                unified.id
                            ));
                        }
                        if !bim.intersections.is_empty() {
                            potential_loss.push(format!(
                                "wall {}: {} resolved junction(s) become implicit",
                                unified.id,
                                bim.intersections.len()
                            ));
                        }
                    }
                },
                _ => {}
            }
        }

        // Rough per-wall cost model: offsetting dominates, junctions scale
        // with the pairing fan-out.
        let node_count: usize = walls.iter().map(|w| w.basic.nodes.len()).sum();
        let estimated_time_ms = walls.len() as f64 * 2.0 + node_count as f64 * 0.05;

        ValidationReport {
            compatible: incompatible.is_empty(),
            incompatible_walls: incompatible,
            potential_data_loss: potential_loss,
            estimated_time_ms,
        }
    }

    /// Regenerate the stale representation from the authoritative one.
    pub fn synchronize_modes(&self, unified: &mut UnifiedWallData) -> crate::Result<SyncOutcome> {
        if !unified.requires_sync {
            return Ok(SyncOutcome {
                wall_id: unified.id.clone(),
                regenerated: false,
                warnings: Vec::new(),
            });
        }

        let mut warnings = Vec::new();
        match unified.authoritative {
            wall_lite_core::SyncSource::Basic => {
                // Basic edits invalidate derived BIM geometry.
                self.cache.invalidate_wall(&unified.id);
                let converted = self
                    .convert_one(0, unified)
                    .map_err(crate::Error::Conversion)?;
                warnings.extend(converted.warnings);
                unified.attach_bim(BimGeometry {
                    quality: converted.wall.quality.clone(),
                    wall: converted.wall,
                    intersections: Vec::new(),
                });
                warnings.push(
                    "junctions not re-resolved during single-wall sync; run a batch pass"
                        .to_string(),
                );
            }
            wall_lite_core::SyncSource::Bim => {
                let single = std::slice::from_mut(unified);
                let result = self.switch_to_basic_mode(single);
                if let Some((id, msg)) = result.failed_walls.into_iter().next() {
                    return Err(crate::Error::Conversion(format!("sync of {id} failed: {msg}")));
                }
                warnings.extend(result.warnings);
            }
        }

        Ok(SyncOutcome {
            wall_id: unified.id.clone(),
            regenerated: true,
            warnings,
        })
    }

    /// Offset -> solid -> heal -> simplify for one wall. Junctions are the
    /// batch's business.
    fn convert_one(&self, index: usize, unified: &UnifiedWallData) -> Result<ConvertedWall, String> {
        let started = Instant::now();
        let mut warnings: Vec<String> = Vec::new();
        let mut approximations: Vec<String> = Vec::new();

        let points: Vec<Point> = unified
            .basic
            .nodes
            .iter()
            .map(|n| Point::new(n.x, n.y, n.id.clone()))
            .collect();
        let baseline = Curve::polyline(points);
        let mut wall = Wall::new(unified.id.clone(), baseline, unified.thickness, unified.kind);
        wall.validate().map_err(|e| e.to_string())?;

        // Offset.
        let max_curvature = wall
            .baseline
            .curvatures()
            .into_iter()
            .fold(0.0f64, f64::max);
        let tol = self.tolerance.offset_tolerance(wall.thickness, max_curvature);
        let offset = offset_curve(
            &wall.baseline,
            wall.half_thickness(),
            wall_lite_core::JoinType::Miter,
            tol,
            &self.config.offset,
        );
        if !offset.success {
            return Err(format!(
                "offset failed: {}",
                offset.warnings.join("; ")
            ));
        }
        warnings.extend(offset.warnings);
        if offset.fallback_used {
            approximations.push(format!("wall {}: bevel fallback at a miter join", wall.id));
        }
        wall.left_offset = offset.left_offset;
        wall.right_offset = offset.right_offset;

        // Strip solid from the two offsets.
        wall.solid = Some(strip_solid(&wall, tol)?);

        // Healing.
        let healed = heal_shape(&wall, &self.tolerance, &self.config.healing);
        if healed.success {
            for op in &healed.operations_applied {
                wall.record_healing(op.clone(), healed.healed_solid.vertex_count());
            }
            wall.solid = Some(healed.healed_solid);
        }

        // Simplification.
        let simplified = simplify_wall_geometry(
            &wall,
            self.config.simplify_max_deviation,
            &self.config.simplify,
        );
        if simplified.success {
            if simplified.points_removed > 0 {
                approximations.push(format!(
                    "wall {}: {} vertices simplified away",
                    wall.id, simplified.points_removed
                ));
            }
            if !simplified.accuracy_preserved {
                warnings.push(format!(
                    "wall {}: simplification reduced accuracy below the floor",
                    wall.id
                ));
            } else {
                wall.solid = Some(simplified.simplified_solid);
            }
        }

        wall.complexity = wall.baseline.points.len() as f64;
        wall.processing_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.cache.put_wall(wall.clone());

        Ok(ConvertedWall {
            index,
            wall,
            warnings,
            approximations,
        })
    }
}

/// Quad-ish solid covering the wall between its two offsets.
fn strip_solid(wall: &Wall, tolerance: f64) -> Result<WallSolid, String> {
    let left = wall.left_offset.as_ref().ok_or("missing left offset")?;
    let right = wall.right_offset.as_ref().ok_or("missing right offset")?;

    let mut ring: Vec<Point> = Vec::with_capacity(left.points.len() + right.points.len());
    ring.extend(left.points.iter().cloned());
    ring.extend(right.points.iter().rev().cloned());
    let mut ring: Vec<Point> = ring
        .into_iter()
        .enumerate()
        .map(|(i, p)| {
            Point::computed(
                p.x,
                p.y,
                format!("{}-s{i}", wall.id),
                CreationMethod::Computed,
                tolerance,
                1.0,
            )
        })
        .collect();
    if ring.len() < 3 {
        return Err("offset strip degenerated below 3 vertices".to_string());
    }
    if ring_signed_area(&ring) < 0.0 {
        ring.reverse();
    }
    Ok(WallSolid::new(ring))
}

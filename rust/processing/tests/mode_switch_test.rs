// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mode-switch round trip over a small floor plan.

use std::sync::Arc;
use wall_lite_core::{BasicNode, SyncSource, UnifiedWallData, WallKind};
use wall_lite_geometry::{CancelToken, GeometryCache};
use wall_lite_processing::{Mode, ModeSwitchPipeline, PipelineConfig};

fn node(id: &str, x: f64, y: f64) -> BasicNode {
    BasicNode { id: id.to_string(), x, y }
}

fn straight(id: &str, start: (f64, f64), end: (f64, f64), thickness: f64) -> UnifiedWallData {
    UnifiedWallData::from_basic(
        id,
        vec![
            node(&format!("{id}-a"), start.0, start.1),
            node(&format!("{id}-b"), end.0, end.1),
        ],
        thickness,
        WallKind::Interior,
    )
}

fn pipeline() -> ModeSwitchPipeline {
    let config = PipelineConfig {
        parallel: false,
        ..Default::default()
    };
    ModeSwitchPipeline::new(config, Arc::new(GeometryCache::default()))
}

fn room() -> Vec<UnifiedWallData> {
    vec![
        straight("south", (0.0, 0.0), (5000.0, 0.0), 200.0),
        straight("east", (5000.0, 0.0), (5000.0, 4000.0), 200.0),
        straight("north", (5000.0, 4000.0), (0.0, 4000.0), 200.0),
        straight("west", (0.0, 4000.0), (0.0, 0.0), 200.0),
    ]
}

#[test]
fn bim_switch_attaches_full_geometry() {
    let mut walls = room();
    let p = pipeline();

    let result = p.switch_to_bim_mode(&mut walls, &CancelToken::new());
    assert!(result.success, "failed: {:?}", result.failed_walls);
    assert_eq!(result.converted_walls.len(), 4);
    assert_eq!(result.failed_count(), 0);

    for wall in &walls {
        let bim = wall.bim.as_ref().expect("BIM side attached");
        assert!(bim.wall.left_offset.is_some());
        assert!(bim.wall.right_offset.is_some());
        assert!(bim.wall.solid.is_some());
        assert!(bim.quality.is_some());
        // Every room wall joins its two neighbors.
        assert!(
            !bim.intersections.is_empty(),
            "wall {} resolved no junctions",
            wall.id
        );
        assert_eq!(wall.authoritative, SyncSource::Bim);
    }
}

#[test]
fn round_trip_preserves_wall_identity() {
    let mut walls = room();
    let original: Vec<(String, f64, WallKind, usize)> = walls
        .iter()
        .map(|w| (w.id.clone(), w.thickness, w.kind, w.basic.nodes.len()))
        .collect();

    let p = pipeline();
    let to_bim = p.switch_to_bim_mode(&mut walls, &CancelToken::new());
    assert!(to_bim.success);
    let to_basic = p.switch_to_basic_mode(&mut walls);
    assert!(to_basic.success);
    assert!(!to_basic.data_loss, "unexpected loss: {:?}", to_basic.approximations_used);

    for (wall, (id, thickness, kind, node_count)) in walls.iter().zip(original) {
        assert_eq!(wall.id, id);
        assert_eq!(wall.thickness, thickness);
        assert_eq!(wall.kind, kind);
        assert_eq!(wall.basic.nodes.len(), node_count);
        assert!(wall.bim.is_none());
    }
}

#[test]
fn one_bad_wall_fails_alone() {
    let mut walls = room();
    walls.push(UnifiedWallData::from_basic(
        "broken",
        vec![node("broken-a", 0.0, 0.0)],
        150.0,
        WallKind::Partition,
    ));

    let p = pipeline();
    let result = p.switch_to_bim_mode(&mut walls, &CancelToken::new());

    assert!(!result.success);
    assert_eq!(result.failed_count(), 1);
    assert_eq!(result.failed_walls[0].0, "broken");
    assert_eq!(result.converted_walls.len(), 4);
    // Healthy walls still carry BIM geometry.
    assert!(walls[0].bim.is_some());
    assert!(walls[4].bim.is_none());
}

#[test]
fn validation_dry_run_is_non_mutating() {
    let walls = room();
    let p = pipeline();

    let report = p.validate_mode_switch(Mode::Basic, Mode::Bim, &walls);
    assert!(report.compatible);
    assert!(report.incompatible_walls.is_empty());
    assert!(report.estimated_time_ms > 0.0);
    // Dry run attaches nothing.
    assert!(walls.iter().all(|w| w.bim.is_none()));
}

#[test]
fn validation_flags_bad_thickness() {
    let mut walls = room();
    walls[0].thickness = 0.0;
    let report = pipeline().validate_mode_switch(Mode::Basic, Mode::Bim, &walls);
    assert!(!report.compatible);
    assert_eq!(report.incompatible_walls.len(), 1);
}

#[test]
fn synchronize_regenerates_stale_bim() {
    let mut walls = room();
    let p = pipeline();
    p.switch_to_bim_mode(&mut walls, &CancelToken::new());

    // Basic edit leaves the BIM side stale.
    walls[0].basic.nodes[1].x = 6000.0;
    walls[0].mark_edited(SyncSource::Basic);
    assert!(walls[0].requires_sync);

    let outcome = p.synchronize_modes(&mut walls[0]).unwrap();
    assert!(outcome.regenerated);
    assert!(!walls[0].requires_sync);
    let bim = walls[0].bim.as_ref().unwrap();
    let end = bim.wall.baseline.points.last().unwrap();
    assert_eq!(end.x, 6000.0);
}

#[test]
fn synchronize_is_a_noop_when_fresh() {
    let mut walls = room();
    let p = pipeline();
    p.switch_to_bim_mode(&mut walls, &CancelToken::new());

    let outcome = p.synchronize_modes(&mut walls[0]).unwrap();
    assert!(!outcome.regenerated);
}

#[test]
fn cache_is_reused_across_switches() {
    let mut walls = room();
    let p = pipeline();
    p.switch_to_bim_mode(&mut walls, &CancelToken::new());
    let misses_after_first = p.cache().stats().misses;

    // Re-running the batch hits the junction cache.
    let mut walls2 = room();
    p.switch_to_bim_mode(&mut walls2, &CancelToken::new());
    let stats = p.cache().stats();
    assert!(stats.hits > 0, "expected junction cache hits, stats: {stats:?}");
    assert!(stats.misses >= misses_after_first);
}

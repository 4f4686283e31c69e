// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Batch junction resolution over a whole floor plan.
//!
//! Candidate pairs come from spatial bucketing of baseline cells instead of
//! all-pairs testing, so large plans stay tractable. Cancellation is checked
//! between wall pairs, never inside a polygon computation.

use super::{IntersectionResolver, ResolutionOutcome};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use wall_lite_core::{Intersection, JunctionKind, Wall};

/// Cooperative cancellation flag shared with batch passes.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Result of one batch optimization pass.
#[derive(Debug, Clone)]
pub struct NetworkOutcome {
    /// Ratio of all-pairs work to the pairs actually examined.
    pub performance_gain: f64,
    /// Human-readable notes on what the pass did.
    pub optimizations_applied: Vec<String>,
    /// All-pairs candidate count before bucketing.
    pub original_complexity: usize,
    /// Junctions resolved by the pass.
    pub resolved: Vec<Intersection>,
    /// Per-pair outcomes that failed, by wall-id pair.
    pub failed_pairs: Vec<(String, String)>,
    pub warnings: Vec<String>,
    pub cancelled: bool,
    pub processing_time_ms: f64,
}

impl IntersectionResolver {
    /// Resolve every junction in a wall network.
    ///
    /// Baselines are hashed into grid cells sized by the largest wall
    /// thickness; only walls sharing a cell neighborhood are paired. The
    /// token is polled between pairs.
    pub fn optimize_intersection_network(
        &self,
        walls: &[Wall],
        cancel: &CancelToken,
    ) -> NetworkOutcome {
        let started = Instant::now();
        let n = walls.len();
        let original_complexity = n.saturating_mul(n.saturating_sub(1)) / 2;
        let mut optimizations: Vec<String> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();

        // Cell size: generous multiple of the thickest wall so touching
        // walls always land in neighboring cells.
        let cell = walls
            .iter()
            .map(|w| w.thickness)
            .fold(0.0f64, f64::max)
            .max(1.0)
            * 4.0;

        // Bucket wall indices by every cell their baseline passes through,
        // so a wall terminating mid-span of another still pairs with it.
        let mut buckets: FxHashMap<(i64, i64), Vec<usize>> = FxHashMap::default();
        let mut membership: FxHashSet<((i64, i64), usize)> = FxHashSet::default();
        for (idx, wall) in walls.iter().enumerate() {
            for seg in wall.baseline.points.windows(2) {
                let (ax, ay) = (seg[0].x, seg[0].y);
                let (bx, by) = (seg[1].x, seg[1].y);
                let len = ((bx - ax).powi(2) + (by - ay).powi(2)).sqrt();
                let steps = (len / cell).ceil() as usize + 1;
                for s in 0..=steps {
                    let t = s as f64 / steps as f64;
                    let x = ax + (bx - ax) * t;
                    let y = ay + (by - ay) * t;
                    let key = ((x / cell).floor() as i64, (y / cell).floor() as i64);
                    if membership.insert((key, idx)) {
                        buckets.entry(key).or_default().push(idx);
                    }
                }
            }
        }
        optimizations.push(format!(
            "spatial bucketing: {} cells over {} walls",
            buckets.len(),
            n
        ));

        // Candidate pairs: walls sharing a cell or one of its 8 neighbors.
        let mut candidates: FxHashSet<(usize, usize)> = FxHashSet::default();
        for (&(cx, cy), members) in &buckets {
            for dx in -1..=1 {
                for dy in -1..=1 {
                    let Some(neighbors) = buckets.get(&(cx + dx, cy + dy)) else {
                        continue;
                    };
                    for &i in members {
                        for &j in neighbors {
                            if i < j {
                                candidates.insert((i, j));
                            }
                        }
                    }
                }
            }
        }
        let examined = candidates.len();

        let mut resolved: Vec<Intersection> = Vec::new();
        let mut failed_pairs: Vec<(String, String)> = Vec::new();
        let mut cancelled = false;
        let mut seen_keys: FxHashSet<String> = FxHashSet::default();
        let mut cross_pairs: FxHashSet<(usize, usize)> = FxHashSet::default();

        // Cells where three or more walls meet resolve as one cross
        // junction; their member pairs are excluded from pairwise handling.
        for members in buckets.values() {
            if cancel.is_cancelled() {
                cancelled = true;
                warnings.push("network optimization cancelled".to_string());
                break;
            }
            let mut unique: Vec<usize> = members.clone();
            unique.sort_unstable();
            unique.dedup();
            if unique.len() < 3 {
                continue;
            }
            let refs: Vec<&Wall> = unique.iter().map(|&i| &walls[i]).collect();
            let outcome = self.resolve_cross_junction(&refs);
            if outcome.success {
                for (a, &i) in unique.iter().enumerate() {
                    for &j in &unique[a + 1..] {
                        cross_pairs.insert((i, j));
                    }
                }
                if let Some(ix) = outcome.intersection {
                    if seen_keys.insert(ix.cache_key.clone()) {
                        resolved.push(ix);
                    }
                }
            }
            // A cell whose walls share no common point is not a cross; its
            // pairs fall through to pairwise handling.
        }

        for (i, j) in candidates {
            if cross_pairs.contains(&(i, j)) {
                continue;
            }
            // Cancellation between wall pairs only.
            if cancel.is_cancelled() {
                if !cancelled {
                    cancelled = true;
                    warnings.push("network optimization cancelled".to_string());
                }
                break;
            }
            let (a, b) = (&walls[i], &walls[j]);
            let outcome = match self.classify(&[a, b]) {
                Some(JunctionKind::L) => self.resolve_l_junction(a, b),
                Some(JunctionKind::T) => self.resolve_t_junction(a, b),
                Some(JunctionKind::ParallelOverlap) => self.resolve_parallel_overlap(a, b),
                Some(JunctionKind::Cross) | None => continue,
            };
            record_pair(outcome, a, b, &mut resolved, &mut failed_pairs, &mut seen_keys, &mut warnings);
        }

        let performance_gain = if examined > 0 {
            original_complexity as f64 / examined as f64
        } else {
            1.0
        };
        optimizations.push(format!(
            "examined {examined} of {original_complexity} candidate pairs"
        ));

        tracing::info!(
            walls = n,
            examined,
            resolved = resolved.len(),
            cancelled,
            "network optimization pass finished"
        );

        NetworkOutcome {
            performance_gain,
            optimizations_applied: optimizations,
            original_complexity,
            resolved,
            failed_pairs,
            warnings,
            cancelled,
            processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
        }
    }
}

/// Per-pair failure isolation: a failed pair is recorded, not fatal.
fn record_pair(
    outcome: ResolutionOutcome,
    a: &Wall,
    b: &Wall,
    resolved: &mut Vec<Intersection>,
    failed: &mut Vec<(String, String)>,
    seen: &mut FxHashSet<String>,
    warnings: &mut Vec<String>,
) {
    if outcome.success {
        if let Some(ix) = outcome.intersection {
            if seen.insert(ix.cache_key.clone()) {
                resolved.push(ix);
            }
        }
    } else {
        // Pairs that simply do not meet are not failures.
        let real_failure = outcome
            .warnings
            .iter()
            .any(|w| !w.contains("share no endpoint") && !w.contains("terminates on the other") && !w.contains("do not overlap"));
        if real_failure {
            failed.push((a.id.clone(), b.id.clone()));
            warnings.extend(outcome.warnings);
        }
    }
}

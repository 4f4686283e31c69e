// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Result types for the orchestration layer.

use serde::{Deserialize, Serialize};
use wall_lite_core::WallId;

/// The two interchangeable wall representations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Basic,
    Bim,
}

/// Aggregate outcome of a batch mode switch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeSwitchResult {
    /// True when every wall converted; per-wall failures leave this false
    /// but never abort the batch.
    pub success: bool,
    pub converted_walls: Vec<WallId>,
    /// Failed walls with their error messages.
    pub failed_walls: Vec<(WallId, String)>,
    pub warnings: Vec<String>,
    /// No information was discarded during conversion.
    pub preserved_data: bool,
    /// A representable-but-lossy feature was simplified away.
    pub data_loss: bool,
    pub processing_time_ms: f64,
    /// Approximations taken, e.g. arc flattening or bevel fallbacks.
    pub approximations_used: Vec<String>,
}

impl ModeSwitchResult {
    pub fn failed_count(&self) -> usize {
        self.failed_walls.len()
    }
}

/// Non-mutating dry-run report for a prospective mode switch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub compatible: bool,
    /// Walls that would fail outright.
    pub incompatible_walls: Vec<(WallId, String)>,
    /// Features that would be approximated or dropped.
    pub potential_data_loss: Vec<String>,
    /// Rough cost estimate for the real switch.
    pub estimated_time_ms: f64,
}

/// Outcome of synchronizing one wall's stale representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub wall_id: WallId,
    /// False when the wall was already in sync (no-op).
    pub regenerated: bool,
    pub warnings: Vec<String>,
}

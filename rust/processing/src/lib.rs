// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wall-Lite Processing
//!
//! Orchestration layer over the geometry engines: basic-to-BIM mode
//! switching, batch conversion with per-wall failure isolation, registry
//! synchronization and the persistence contract.

pub mod error;
pub mod pipeline;
pub mod registry_sync;
pub mod store;
pub mod types;

pub use error::{Error, Result};
pub use pipeline::{ModeSwitchPipeline, PipelineConfig};
pub use registry_sync::SharedWallRegistry;
pub use store::{MemoryWallStore, StoreResult, WallStore};
pub use types::{Mode, ModeSwitchResult, SyncOutcome, ValidationReport};

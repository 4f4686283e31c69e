//! Wall-Lite Core
//!
//! Data model for architectural walls modeled as thick polygons derived from
//! centerline baselines. Holds the entity types shared by the geometry and
//! processing crates plus the wall registry; no geometric algorithms live
//! here.

pub mod curve;
pub mod error;
pub mod intersection;
pub mod point;
pub mod quality;
pub mod registry;
pub mod unified;
pub mod wall;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Vector2};

pub use curve::{BoundingBox, Curve, CurveType};
pub use error::{Error, ErrorSeverity, Result};
pub use intersection::{Intersection, JunctionKind, ResolutionMethod};
pub use point::{CreationMethod, Point, PointId};
pub use quality::{Issue, IssueKind, IssueSeverity, QualityMetrics};
pub use registry::WallRegistry;
pub use unified::{BasicGeometry, BasicNode, BasicSegment, SyncSource, UnifiedWallData};
pub use wall::{HealingRecord, JoinType, Wall, WallId, WallKind, WallSolid};

/// Current timestamp in milliseconds since the UNIX epoch.
///
/// Entities carry plain integer timestamps so they stay serde-transparent.
pub fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

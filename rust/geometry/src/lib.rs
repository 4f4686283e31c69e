//! Wall-Lite Geometry Processing
//!
//! Geometric resolution engine for thick walls: offset-curve computation,
//! junction resolution, tolerance management, shape healing, simplification
//! and the computation cache behind repeated geometric queries.

pub mod bool2d;
pub mod cache;
pub mod error;
pub mod healing;
pub mod offset;
pub mod quality;
pub mod resolver;
pub mod simplify;
pub mod tolerance;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Vector2};

pub use cache::{CacheStats, EvictionPolicy, GeometryCache, GeometryCacheConfig};
pub use error::{Error, Result};
pub use healing::{heal_shape, HealingConfig, HealingOutcome};
pub use offset::{offset_curve, OffsetConfig, OffsetResult};
pub use quality::{assess_wall_quality, QualityWeights};
pub use resolver::{
    CancelToken, IntersectionResolver, NetworkOutcome, ResolutionOutcome, ResolverConfig,
};
pub use simplify::{simplify_wall_geometry, SimplifyConfig, SimplificationOutcome};
pub use tolerance::{ToleranceConfig, ToleranceContext};

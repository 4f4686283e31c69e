use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during geometric resolution
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid baseline: {0}")]
    InvalidBaseline(String),

    #[error("Offset computation failed: {0}")]
    OffsetFailure(String),

    #[error("Boolean operation failed: {0}")]
    BooleanFailure(String),

    #[error("Empty solid: {0}")]
    EmptySolid(String),

    #[error("Core model error: {0}")]
    CoreError(#[from] wall_lite_core::Error),
}

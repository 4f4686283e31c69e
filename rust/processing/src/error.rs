use thiserror::Error;

/// Result type for processing operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during orchestration
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown wall: {0}")]
    UnknownWall(String),

    #[error("Wall {0} has no BIM geometry to convert from")]
    MissingBimGeometry(String),

    #[error("Conversion failed: {0}")]
    Conversion(String),

    #[error("Store failure: {0}")]
    Store(String),

    #[error("Core model error: {0}")]
    CoreError(#[from] wall_lite_core::Error),
}

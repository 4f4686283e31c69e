// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error taxonomy for wall geometry resolution.
//!
//! Three failure classes: degenerate geometry (unusable input), boolean
//! failure (non-convergent resolution), validation failure (post-hoc
//! rejection). Boundary inputs that can be approximated are handled locally
//! by the engines and surfaced as warnings, not errors; only unrecoverable
//! input (NaN/infinite coordinates, missing required fields, empty geometry)
//! reaches the caller through this type.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// How severe a failure is for the surrounding batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    /// Result is usable but degraded.
    Warning,
    /// The single operation failed; siblings in a batch are unaffected.
    Error,
    /// The input can never be processed (NaN coordinates, empty geometry).
    Fatal,
}

/// Errors that can occur during wall geometry processing
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum Error {
    #[error("Degenerate geometry in {operation}: {detail}")]
    DegenerateGeometry {
        operation: String,
        detail: String,
        severity: ErrorSeverity,
        /// Offending input, serialized for diagnostics.
        input_snapshot: Option<String>,
        suggested_fix: Option<String>,
        recoverable: bool,
    },

    #[error("Boolean operation failed in {operation}: {detail}")]
    BooleanFailure {
        operation: String,
        detail: String,
        severity: ErrorSeverity,
        input_snapshot: Option<String>,
        suggested_fix: Option<String>,
        recoverable: bool,
    },

    #[error("Validation failed in {operation}: {detail}")]
    ValidationFailure {
        operation: String,
        detail: String,
        severity: ErrorSeverity,
        input_snapshot: Option<String>,
        suggested_fix: Option<String>,
        recoverable: bool,
    },
}

impl Error {
    /// Degenerate-geometry error with no snapshot or fix attached.
    pub fn degenerate(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::DegenerateGeometry {
            operation: operation.into(),
            detail: detail.into(),
            severity: ErrorSeverity::Error,
            input_snapshot: None,
            suggested_fix: None,
            recoverable: false,
        }
    }

    /// Boolean-failure error with no snapshot or fix attached.
    pub fn boolean(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::BooleanFailure {
            operation: operation.into(),
            detail: detail.into(),
            severity: ErrorSeverity::Error,
            input_snapshot: None,
            suggested_fix: None,
            recoverable: false,
        }
    }

    /// Validation-failure error with no snapshot or fix attached.
    pub fn validation(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::ValidationFailure {
            operation: operation.into(),
            detail: detail.into(),
            severity: ErrorSeverity::Error,
            input_snapshot: None,
            suggested_fix: None,
            recoverable: false,
        }
    }

    /// Attach a serialized snapshot of the offending input.
    pub fn with_snapshot(mut self, snapshot: impl Into<String>) -> Self {
        match &mut self {
            Error::DegenerateGeometry { input_snapshot, .. }
            | Error::BooleanFailure { input_snapshot, .. }
            | Error::ValidationFailure { input_snapshot, .. } => {
                *input_snapshot = Some(snapshot.into());
            }
        }
        self
    }

    /// Attach a human-readable suggested fix.
    pub fn with_fix(mut self, fix: impl Into<String>) -> Self {
        match &mut self {
            Error::DegenerateGeometry { suggested_fix, .. }
            | Error::BooleanFailure { suggested_fix, .. }
            | Error::ValidationFailure { suggested_fix, .. } => {
                *suggested_fix = Some(fix.into());
            }
        }
        self
    }

    /// Mark the error as recoverable by a fallback path.
    pub fn recoverable(mut self) -> Self {
        match &mut self {
            Error::DegenerateGeometry { recoverable, severity, .. }
            | Error::BooleanFailure { recoverable, severity, .. }
            | Error::ValidationFailure { recoverable, severity, .. } => {
                *recoverable = true;
                *severity = ErrorSeverity::Warning;
            }
        }
        self
    }

    /// Whether a fallback path can still produce usable output.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::DegenerateGeometry { recoverable, .. }
            | Error::BooleanFailure { recoverable, .. }
            | Error::ValidationFailure { recoverable, .. } => *recoverable,
        }
    }

    /// The operation that produced the error.
    pub fn operation(&self) -> &str {
        match self {
            Error::DegenerateGeometry { operation, .. }
            | Error::BooleanFailure { operation, .. }
            | Error::ValidationFailure { operation, .. } => operation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_attaches_context() {
        let err = Error::degenerate("offset_curve", "baseline has 1 point")
            .with_snapshot("{\"points\":1}")
            .with_fix("provide at least 2 baseline points")
            .recoverable();

        assert!(err.is_recoverable());
        assert_eq!(err.operation(), "offset_curve");
        assert!(err.to_string().contains("baseline has 1 point"));
    }

    #[test]
    fn serde_round_trip() {
        let err = Error::boolean("resolve_cross_junction", "union did not converge");
        let json = serde_json::to_string(&err).unwrap();
        let back: Error = serde_json::from_str(&json).unwrap();
        assert_eq!(back.operation(), "resolve_cross_junction");
        assert!(!back.is_recoverable());
    }
}

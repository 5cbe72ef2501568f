//! Camera-to-table projection and the calibration record it is built from.

mod calibration;
mod homography;

pub use calibration::{Calibration, FrameSize, order_corners};
pub use homography::Homography;

use std::path::PathBuf;

/// Startup failures while building the projector. None of these can occur
/// once a [`Homography`] exists.
#[derive(Debug, thiserror::Error)]
pub enum CalibrationError {
    #[error("failed to access calibration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed calibration record: {0}")]
    Json(#[from] serde_json::Error),
    #[error("table corners are degenerate (three or more are collinear)")]
    DegenerateCorners,
    #[error("homography matrix is singular")]
    SingularMatrix,
    #[error("homography matrix contains non-finite values")]
    NonFiniteMatrix,
    #[error("invalid table dimensions {width}x{height}")]
    InvalidDimensions { width: f64, height: f64 },
}

//! Persisted calibration record.
//!
//! The record is produced once by an operator clicking the four table corners
//! and is loaded at startup. Field names follow the JSON files written by the
//! calibration tool, so existing files load unchanged.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{CalibrationError, Homography};
use crate::geometry::TableGeometry;

/// Size of the camera frame the corners were clicked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// Pixel corners ordered top-left, top-right, bottom-right, bottom-left.
    pub table_points: [[f64; 2]; 4],
    /// Row-major pixel → table-plane matrix.
    pub homography_matrix: [[f64; 3]; 3],
    /// Table-plane rectangle `(width, height)` the corners map onto.
    pub table_view_size: (f64, f64),
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub net_points: Vec<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_size: Option<FrameSize>,
}

impl Calibration {
    /// Build a record from four clicked corners in any order.
    pub fn from_clicked_corners(
        clicked: [[f64; 2]; 4],
        table: &TableGeometry,
    ) -> Result<Self, CalibrationError> {
        if !table.is_valid() {
            return Err(CalibrationError::InvalidDimensions {
                width: table.width,
                height: table.height,
            });
        }

        let ordered = order_corners(clicked);
        let target = [
            [0.0, 0.0],
            [table.width, 0.0],
            [table.width, table.height],
            [0.0, table.height],
        ];
        let homography = Homography::from_correspondences(&ordered, &target)?;

        Ok(Self {
            table_points: ordered,
            homography_matrix: homography.to_rows(),
            table_view_size: (table.width, table.height),
            net_points: Vec::new(),
            frame_size: None,
        })
    }

    pub fn with_frame_size(mut self, width: u32, height: u32) -> Self {
        self.frame_size = Some(FrameSize { width, height });
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, CalibrationError> {
        let calibration: Calibration = serde_json::from_str(json)?;
        calibration.validate()?;
        Ok(calibration)
    }

    /// Load and validate a calibration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CalibrationError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CalibrationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let calibration = Self::from_json_str(&raw)?;
        debug!(path = %path.display(), "loaded table calibration");
        Ok(calibration)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CalibrationError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| CalibrationError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check the startup preconditions: usable dimensions and an invertible,
    /// finite matrix.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        let (width, height) = self.table_view_size;
        if !TableGeometry::new(width, height).is_valid() {
            return Err(CalibrationError::InvalidDimensions { width, height });
        }
        let homography = Homography::from_rows(&self.homography_matrix)?;

        // A stale matrix that no longer matches the stored corners still
        // works, but the overlay will drift.
        let corner = homography.project(crate::geometry::PixelPoint::new(
            self.table_points[0][0] as f32,
            self.table_points[0][1] as f32,
        ));
        if corner.x.hypot(corner.y) > 0.05 * width.max(height) {
            warn!(
                x = corner.x,
                y = corner.y,
                "top-left calibration corner does not project near the table origin"
            );
        }
        Ok(())
    }

    pub fn projector(&self) -> Result<Homography, CalibrationError> {
        Homography::from_rows(&self.homography_matrix)
    }

    /// Table model sized to the calibrated view, default net margin.
    pub fn table_geometry(&self) -> TableGeometry {
        TableGeometry::new(self.table_view_size.0, self.table_view_size.1)
    }
}

/// Order four corners as top-left, top-right, bottom-right, bottom-left.
///
/// The two points with the smallest y form the top edge; each edge is then
/// sorted by x.
pub fn order_corners(points: [[f64; 2]; 4]) -> [[f64; 2]; 4] {
    let mut by_y = points;
    by_y.sort_by(|a, b| a[1].total_cmp(&b[1]));

    let mut top = [by_y[0], by_y[1]];
    let mut bottom = [by_y[2], by_y[3]];
    top.sort_by(|a, b| a[0].total_cmp(&b[0]));
    bottom.sort_by(|a, b| a[0].total_cmp(&b[0]));

    [top[0], top[1], bottom[1], bottom[0]]
}

//! Planar homography using nalgebra (pure Rust, no BLAS/LAPACK).

use nalgebra::{Matrix3, SMatrix, SVector, Vector3};

use super::CalibrationError;
use crate::geometry::{PixelPoint, TablePoint};

/// Smallest homogeneous scale used when projecting. Points on the line at
/// infinity are pushed far away instead of producing NaN.
const MIN_W: f64 = 1e-12;

/// Twice the triangle area below which three corners count as collinear.
const COLLINEAR_EPS: f64 = 1e-6;

/// Fixed projective transform from camera pixels to the table plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography {
    matrix: Matrix3<f64>,
}

impl Homography {
    /// Solve the transform mapping each `src[i]` onto `dst[i]`.
    ///
    /// Uses the direct linear formulation with `h33 = 1`, i.e. an 8×8 system
    /// solved by LU decomposition.
    pub fn from_correspondences(
        src: &[[f64; 2]; 4],
        dst: &[[f64; 2]; 4],
    ) -> Result<Self, CalibrationError> {
        if is_degenerate(src) || is_degenerate(dst) {
            return Err(CalibrationError::DegenerateCorners);
        }

        let mut a = SMatrix::<f64, 8, 8>::zeros();
        let mut b = SVector::<f64, 8>::zeros();
        for i in 0..4 {
            let [x, y] = src[i];
            let [u, v] = dst[i];
            let r = 2 * i;
            a[(r, 0)] = x;
            a[(r, 1)] = y;
            a[(r, 2)] = 1.0;
            a[(r, 6)] = -u * x;
            a[(r, 7)] = -u * y;
            b[r] = u;

            a[(r + 1, 3)] = x;
            a[(r + 1, 4)] = y;
            a[(r + 1, 5)] = 1.0;
            a[(r + 1, 6)] = -v * x;
            a[(r + 1, 7)] = -v * y;
            b[r + 1] = v;
        }

        let h = a.lu().solve(&b).ok_or(CalibrationError::SingularMatrix)?;
        let matrix = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0);
        Self::from_matrix(matrix)
    }

    /// Build from a persisted row-major matrix.
    pub fn from_rows(rows: &[[f64; 3]; 3]) -> Result<Self, CalibrationError> {
        let matrix = Matrix3::from_fn(|r, c| rows[r][c]);
        Self::from_matrix(matrix)
    }

    fn from_matrix(matrix: Matrix3<f64>) -> Result<Self, CalibrationError> {
        if matrix.iter().any(|v| !v.is_finite()) {
            return Err(CalibrationError::NonFiniteMatrix);
        }
        if matrix.determinant().abs() < f64::EPSILON {
            return Err(CalibrationError::SingularMatrix);
        }
        Ok(Self { matrix })
    }

    /// Row-major copy of the matrix, as persisted in the calibration record.
    pub fn to_rows(&self) -> [[f64; 3]; 3] {
        let m = &self.matrix;
        [
            [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
            [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
            [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
        ]
    }

    /// Map a camera pixel onto the table plane.
    pub fn project(&self, point: PixelPoint) -> TablePoint {
        let (x, y) = apply(&self.matrix, point.x as f64, point.y as f64);
        TablePoint::new(x, y)
    }

    /// The transform from the table plane back into camera pixels.
    pub fn inverse(&self) -> Option<Homography> {
        self.matrix
            .try_inverse()
            .map(|matrix| Homography { matrix })
    }

    /// Map a table-plane point back into pixel coordinates.
    pub fn unproject(&self, point: TablePoint) -> Option<PixelPoint> {
        let inv = self.matrix.try_inverse()?;
        let (x, y) = apply(&inv, point.x, point.y);
        Some(PixelPoint::new(x as f32, y as f32))
    }
}

fn apply(m: &Matrix3<f64>, x: f64, y: f64) -> (f64, f64) {
    let v = m * Vector3::new(x, y, 1.0);
    let w = if v.z.abs() < MIN_W {
        MIN_W.copysign(v.z)
    } else {
        v.z
    };
    (v.x / w, v.y / w)
}

fn is_degenerate(points: &[[f64; 2]; 4]) -> bool {
    const TRIPLES: [(usize, usize, usize); 4] = [(0, 1, 2), (0, 1, 3), (0, 2, 3), (1, 2, 3)];
    TRIPLES.iter().any(|&(i, j, k)| {
        let [ax, ay] = points[i];
        let [bx, by] = points[j];
        let [cx, cy] = points[k];
        ((bx - ax) * (cy - ay) - (by - ay) * (cx - ax)).abs() < COLLINEAR_EPS
    })
}

//! Constant-velocity Kalman filter over table-plane ball positions, using
//! ndarray for state and a nalgebra-based 2x2 inverse.
//!
//! State is `[x, y, vx, vy]`; measurements are `[x, y]`. The time step varies
//! per frame, so the motion matrix is built on every prediction.

use ndarray::{Array1, Array2};

#[derive(Debug, Clone)]
pub struct KalmanFilter {
    update_mat: Array2<f64>,
    /// Measurement noise (table units).
    std_measurement: f64,
    /// Initial velocity uncertainty (table units / s).
    std_velocity: f64,
    /// Process noise; bounces and hits show up as large accelerations.
    std_acceleration: f64,
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::new(5.0, 500.0, 3000.0)
    }
}

impl KalmanFilter {
    pub fn new(std_measurement: f64, std_velocity: f64, std_acceleration: f64) -> Self {
        let mut update_mat = Array2::zeros((2, 4));
        update_mat[[0, 0]] = 1.0;
        update_mat[[1, 1]] = 1.0;

        Self {
            update_mat,
            std_measurement,
            std_velocity,
            std_acceleration,
        }
    }

    pub fn initiate(&self, measurement: [f64; 2]) -> (Array1<f64>, Array2<f64>) {
        let mean = Array1::from_vec(vec![measurement[0], measurement[1], 0.0, 0.0]);

        let std = [
            2.0 * self.std_measurement,
            2.0 * self.std_measurement,
            self.std_velocity,
            self.std_velocity,
        ];
        let mut cov = Array2::zeros((4, 4));
        for i in 0..4 {
            cov[[i, i]] = std[i] * std[i];
        }

        (mean, cov)
    }

    fn motion_mat(dt: f64) -> Array2<f64> {
        let mut m = Array2::eye(4);
        m[[0, 2]] = dt;
        m[[1, 3]] = dt;
        m
    }

    pub fn predict(
        &self,
        mean: &Array1<f64>,
        covariance: &Array2<f64>,
        dt: f64,
    ) -> (Array1<f64>, Array2<f64>) {
        let dt = dt.max(0.0);
        let motion_mat = Self::motion_mat(dt);

        let pos = 0.5 * self.std_acceleration * dt * dt;
        let vel = self.std_acceleration * dt;
        let std = [pos, pos, vel, vel];
        let mut motion_cov = Array2::zeros((4, 4));
        for i in 0..4 {
            motion_cov[[i, i]] = std[i] * std[i];
        }

        let new_mean = motion_mat.dot(mean);
        let new_covariance = motion_mat.dot(covariance).dot(&motion_mat.t()) + motion_cov;

        (new_mean, new_covariance)
    }

    pub fn project(
        &self,
        mean: &Array1<f64>,
        covariance: &Array2<f64>,
    ) -> (Array1<f64>, Array2<f64>) {
        let r = self.std_measurement * self.std_measurement;
        let innovation_cov = Array2::from_diag(&Array1::from_elem(2, r));

        let mean_proj = self.update_mat.dot(mean);
        let covariance_proj =
            self.update_mat.dot(covariance).dot(&self.update_mat.t()) + innovation_cov;

        (mean_proj, covariance_proj)
    }

    /// Correct the state with a measurement. Returns the input unchanged if
    /// the innovation covariance cannot be inverted.
    pub fn update(
        &self,
        mean: &Array1<f64>,
        covariance: &Array2<f64>,
        measurement: [f64; 2],
    ) -> (Array1<f64>, Array2<f64>) {
        let (projected_mean, projected_cov) = self.project(mean, covariance);

        let measurement_arr = Array1::from_vec(measurement.to_vec());
        let innovation = measurement_arr - projected_mean;

        // K = P * H^T * S^-1
        let Some(s_inv) = invert_2x2(&projected_cov) else {
            return (mean.clone(), covariance.clone());
        };

        let pht = covariance.dot(&self.update_mat.t()); // 4x2
        let kalman_gain = pht.dot(&s_inv); // 4x2

        let new_mean = mean + &kalman_gain.dot(&innovation);
        let new_covariance = covariance - &kalman_gain.dot(&projected_cov).dot(&kalman_gain.t());

        (new_mean, new_covariance)
    }
}

fn invert_2x2(m: &Array2<f64>) -> Option<Array2<f64>> {
    let nm = nalgebra::Matrix2::new(m[[0, 0]], m[[0, 1]], m[[1, 0]], m[[1, 1]]);
    let inv = nm.try_inverse()?;
    let mut res = Array2::zeros((2, 2));
    for i in 0..2 {
        for j in 0..2 {
            res[[i, j]] = inv[(i, j)];
        }
    }
    Some(res)
}

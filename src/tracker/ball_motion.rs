//! Filtered motion state of the single tracked ball.

use ndarray::{Array1, Array2};

use crate::geometry::TablePoint;
use crate::tracker::kalman_filter::KalmanFilter;

#[derive(Debug, Clone, Default)]
pub struct BallMotion {
    /// Kalman filter state mean (4-dim)
    mean: Option<Array1<f64>>,
    /// Kalman filter state covariance (4x4)
    covariance: Option<Array2<f64>>,
    /// Timestamp of the last measurement folded in
    last_timestamp: f64,
}

impl BallMotion {
    pub fn new() -> Self {
        Self::default()
    }

    fn activate(&mut self, kalman_filter: &KalmanFilter, position: TablePoint, timestamp: f64) {
        let (mean, covariance) = kalman_filter.initiate([position.x, position.y]);
        self.mean = Some(mean);
        self.covariance = Some(covariance);
        self.last_timestamp = timestamp;
    }

    /// Fold in a new measurement and return the filtered velocity.
    ///
    /// Out-of-order timestamps are treated as a zero time step.
    pub fn update(
        &mut self,
        kalman_filter: &KalmanFilter,
        position: TablePoint,
        timestamp: f64,
    ) -> (f64, f64) {
        let (mean, cov) = match (&self.mean, &self.covariance) {
            (Some(mean), Some(cov)) => (mean, cov),
            _ => {
                self.activate(kalman_filter, position, timestamp);
                return (0.0, 0.0);
            }
        };

        let dt = timestamp - self.last_timestamp;
        let (predicted_mean, predicted_cov) = kalman_filter.predict(mean, cov, dt);
        let (new_mean, new_cov) =
            kalman_filter.update(&predicted_mean, &predicted_cov, [position.x, position.y]);

        let velocity = (new_mean[2], new_mean[3]);
        self.mean = Some(new_mean);
        self.covariance = Some(new_cov);
        if dt > 0.0 {
            self.last_timestamp = timestamp;
        }
        velocity
    }

    pub fn velocity(&self) -> (f64, f64) {
        match &self.mean {
            Some(mean) => (mean[2], mean[3]),
            None => (0.0, 0.0),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

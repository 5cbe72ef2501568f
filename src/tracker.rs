mod ball_history;
mod ball_motion;
mod detection;
mod kalman_filter;
mod object_tracker;
mod observation;

pub use ball_history::BallHistory;
pub use detection::{Detection, ObjectClass};
pub use kalman_filter::KalmanFilter;
pub use object_tracker::{ObjectTracker, TrackerConfig};
pub use observation::{BallObservation, FrameObservation, PlayerObservation, RacketObservation};

//! Single-ball tracker: associates per-frame detections into one coherent
//! ball trajectory on the table plane and tags rackets/players by side.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::geometry::{PixelPoint, Side};
use crate::projection::Homography;
use crate::tracker::ball_history::BallHistory;
use crate::tracker::ball_motion::BallMotion;
use crate::tracker::detection::{Detection, ObjectClass};
use crate::tracker::kalman_filter::KalmanFilter;
use crate::tracker::observation::{
    BallObservation, FrameObservation, PlayerObservation, RacketObservation,
};

/// Configuration for the ObjectTracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Number of ball observations kept in the trajectory.
    pub history_capacity: usize,
    /// How many consecutive frames the last ball may be carried forward.
    /// `None` carries it forward until the next detection or reset.
    pub max_stale_frames: Option<u32>,
    /// Ball candidates scoring below this are ignored.
    pub min_ball_confidence: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            history_capacity: 60,
            max_stale_frames: None,
            min_ball_confidence: 0.0,
        }
    }
}

pub struct ObjectTracker {
    projector: Homography,
    frame_width: f32,
    config: TrackerConfig,
    history: BallHistory,
    last_ball: Option<BallObservation>,
    stale_frames: u32,
    motion: BallMotion,
    kalman_filter: KalmanFilter,
    frame_id: u64,
}

impl ObjectTracker {
    /// `frame_width` is the camera frame width in pixels; rackets and players
    /// left of its midpoint belong to the left side.
    pub fn new(projector: Homography, frame_width: u32, config: TrackerConfig) -> Self {
        Self {
            projector,
            frame_width: frame_width as f32,
            history: BallHistory::new(config.history_capacity),
            config,
            last_ball: None,
            stale_frames: 0,
            motion: BallMotion::new(),
            kalman_filter: KalmanFilter::default(),
            frame_id: 0,
        }
    }

    /// Process one frame of detections. Frames must arrive in non-decreasing
    /// timestamp order; earlier timestamps only degrade speed to zero.
    pub fn observe(&mut self, detections: &[Detection], timestamp: f64) -> FrameObservation {
        self.frame_id += 1;

        let mut ball_candidates = Vec::new();
        let mut rackets = Vec::new();
        let mut players = Vec::new();

        for det in detections {
            match det.class {
                ObjectClass::Ball => {
                    if det.score >= self.config.min_ball_confidence {
                        ball_candidates.push(det);
                    }
                }
                ObjectClass::Racket => rackets.push(self.racket_observation(det)),
                ObjectClass::Player => players.push(self.player_observation(det)),
            }
        }

        let ball = match self.select_ball(&ball_candidates) {
            Some(det) => Some(self.resolve_ball(det, timestamp)),
            None => self.carry_forward(),
        };

        FrameObservation {
            timestamp,
            ball,
            rackets,
            players,
        }
    }

    /// Nearest candidate (pixel distance) to the last known ball, or the
    /// first candidate when there is no previous ball.
    fn select_ball<'a>(&self, candidates: &[&'a Detection]) -> Option<&'a Detection> {
        match &self.last_ball {
            Some(last) => candidates.iter().copied().min_by(|a, b| {
                let da = a.bbox.center().distance_to(&last.pixel_center);
                let db = b.bbox.center().distance_to(&last.pixel_center);
                da.total_cmp(&db)
            }),
            None => candidates.first().copied(),
        }
    }

    fn resolve_ball(&mut self, det: &Detection, timestamp: f64) -> BallObservation {
        let pixel_center = det.bbox.center();
        let table_position = self.projector.project(pixel_center);

        let speed = match self.history.latest() {
            Some(prev) => {
                let dt = timestamp - prev.timestamp;
                let speed = table_position.distance_to(&prev.table_position) / dt;
                if dt > 0.0 && speed.is_finite() {
                    speed
                } else {
                    0.0
                }
            }
            None => 0.0,
        };
        let velocity = self
            .motion
            .update(&self.kalman_filter, table_position, timestamp);

        let observation = BallObservation {
            table_position,
            pixel_center,
            timestamp,
            speed,
            velocity,
            confidence: det.score,
            is_stale: false,
        };
        trace!(
            frame = self.frame_id,
            x = table_position.x,
            y = table_position.y,
            speed,
            "ball resolved"
        );

        self.stale_frames = 0;
        self.last_ball = Some(observation);
        self.history.push(observation);
        observation
    }

    fn carry_forward(&mut self) -> Option<BallObservation> {
        let last = self.last_ball?;

        self.stale_frames = self.stale_frames.saturating_add(1);
        if let Some(max) = self.config.max_stale_frames {
            if self.stale_frames > max {
                debug!(
                    frame = self.frame_id,
                    stale_frames = self.stale_frames,
                    "ball lost, dropping carried-forward position"
                );
                self.last_ball = None;
                self.motion.reset();
                return None;
            }
        }

        let ghost = BallObservation {
            is_stale: true,
            ..last
        };
        self.history.push(ghost);
        Some(ghost)
    }

    fn side_of_pixel(&self, p: &PixelPoint) -> Side {
        if p.x < self.frame_width / 2.0 {
            Side::Left
        } else {
            Side::Right
        }
    }

    fn racket_observation(&self, det: &Detection) -> RacketObservation {
        let pixel_center = det.bbox.center();
        RacketObservation {
            pixel_center,
            table_position: self.projector.project(pixel_center),
            side: self.side_of_pixel(&pixel_center),
            confidence: det.score,
        }
    }

    fn player_observation(&self, det: &Detection) -> PlayerObservation {
        let pixel_center = det.bbox.center();
        PlayerObservation {
            pixel_center,
            table_position: self.projector.project(pixel_center),
            side: self.side_of_pixel(&pixel_center),
            confidence: det.score,
        }
    }

    /// Forget the trajectory and the last known ball.
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.last_ball = None;
        self.stale_frames = 0;
        self.motion.reset();
        debug!("ball tracking history cleared");
    }

    /// Read-only view of the ball trajectory, oldest first.
    pub fn trajectory(&self) -> &BallHistory {
        &self.history
    }

    pub fn last_ball(&self) -> Option<&BallObservation> {
        self.last_ball.as_ref()
    }

    /// Filtered ball velocity in table units per second.
    pub fn ball_velocity(&self) -> (f64, f64) {
        self.motion.velocity()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_id
    }

    pub fn projector(&self) -> &Homography {
        &self.projector
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }
}

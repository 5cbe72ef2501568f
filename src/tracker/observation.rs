//! Per-frame tracker output consumed by the rally state machine.

use serde::{Deserialize, Serialize};

use crate::geometry::{PixelPoint, Side, TablePoint};

/// Resolved ball position for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallObservation {
    pub table_position: TablePoint,
    pub pixel_center: PixelPoint,
    /// Timestamp of the frame the ball was actually seen in (seconds).
    pub timestamp: f64,
    /// Table units per second, never negative.
    pub speed: f64,
    /// Filtered velocity `(vx, vy)` in table units per second.
    pub velocity: (f64, f64),
    pub confidence: f32,
    /// Carried forward from an earlier frame because no ball was detected.
    pub is_stale: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RacketObservation {
    pub pixel_center: PixelPoint,
    pub table_position: TablePoint,
    pub side: Side,
    pub confidence: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerObservation {
    pub pixel_center: PixelPoint,
    pub table_position: TablePoint,
    pub side: Side,
    pub confidence: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameObservation {
    /// Timestamp of the frame this observation was produced for.
    pub timestamp: f64,
    pub ball: Option<BallObservation>,
    pub rackets: Vec<RacketObservation>,
    pub players: Vec<PlayerObservation>,
}

impl FrameObservation {
    /// A freshly detected ball, ignoring carried-forward ghosts.
    pub fn fresh_ball(&self) -> Option<&BallObservation> {
        self.ball.as_ref().filter(|b| !b.is_stale)
    }

    /// Table positions of every racket and player with their side, rackets
    /// first.
    pub fn hitter_candidates(&self) -> impl Iterator<Item = (Side, TablePoint)> + '_ {
        self.rackets
            .iter()
            .map(|r| (r.side, r.table_position))
            .chain(self.players.iter().map(|p| (p.side, p.table_position)))
    }
}

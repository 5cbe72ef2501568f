use serde::{Deserialize, Serialize};

use crate::geometry::{PerSide, Side, TablePoint};

/// Why a rally ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointEndReason {
    /// The ball bounced twice on `side`'s half.
    DoubleBounce { side: Side },
    OutOfBounds,
    NetTouch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    ServeStarted {
        server: Side,
    },
    NetCrossed {
        into: Side,
    },
    Hit {
        side: Side,
        hit_count: u32,
    },
    Bounce {
        side: Side,
        position: TablePoint,
        consecutive: u32,
    },
    /// `winner` is `None` when the point was replayed.
    PointEnded {
        winner: Option<Side>,
        reason: PointEndReason,
    },
    GameWon {
        side: Side,
        points: PerSide<u32>,
        games: PerSide<u32>,
    },
    MatchWon {
        side: Side,
        games: PerSide<u32>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    pub timestamp: f64,
    #[serde(flatten)]
    pub kind: EventKind,
}

/// Summary of one finished point, kept for analytics export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    pub number: usize,
    pub server: Side,
    pub start_time: Option<f64>,
    pub end_time: f64,
    pub duration: f64,
    pub winner: Option<Side>,
    pub reason: PointEndReason,
    pub hit_count: u32,
    pub max_speed: f64,
    pub avg_speed: f64,
    pub events: Vec<GameEvent>,
}

//! Rally and scoring state machine.
//!
//! Interprets the tracker's per-frame observations as serves, hits, bounces
//! and net crossings, decides who wins each point and keeps the match score.

mod events;
mod rally_state;
mod score;
mod state_machine;

pub use events::{EventKind, GameEvent, PointEndReason, PointRecord};
pub use rally_state::RallyState;
pub use score::{GameResult, MatchScore, PointOutcome, ScoreError, ScoringRules};
pub use state_machine::{MatchSnapshot, RallyConfig, RallyStateMachine, UnattributedPointPolicy};

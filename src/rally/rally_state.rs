use serde::{Deserialize, Serialize};

/// Rally lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RallyState {
    /// Waiting for the ball to be put into play
    #[default]
    WaitingForServe,
    /// Ball in play
    InRally,
    /// Point just scored; left on the next observation
    PointOver,
    /// Match decided, no further transitions
    MatchOver,
}

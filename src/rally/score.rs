//! Match score and serve rotation.

use serde::{Deserialize, Serialize};

use crate::geometry::{PerSide, Side};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    pub points_to_win_game: u32,
    /// Required lead over the opponent to close out a game.
    pub min_lead: u32,
    pub games_to_win_match: u32,
    pub serves_per_turn: u32,
    /// Alternate the serve every point once both sides reach
    /// `points_to_win_game - 1`.
    pub alternate_serve_at_deuce: bool,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            points_to_win_game: 11,
            min_lead: 2,
            games_to_win_match: 3,
            serves_per_turn: 2,
            alternate_serve_at_deuce: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ScoreError {
    #[error("match already won by the {0} side")]
    MatchConcluded(Side),
}

/// What a single awarded point led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointOutcome {
    Point,
    GameWon { side: Side, final_points: PerSide<u32> },
    MatchWon { side: Side, final_points: PerSide<u32> },
}

/// Final score of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub winner: Side,
    pub points: PerSide<u32>,
}

/// Points and games for both sides. Mutated only through
/// [`MatchScore::award_point`]; once a winner is set every further award is
/// rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchScore {
    rules: ScoringRules,
    points: PerSide<u32>,
    games: PerSide<u32>,
    winner: Option<Side>,
    server: Side,
    serves_in_row: u32,
    game_first_server: Side,
    completed_games: Vec<GameResult>,
}

impl MatchScore {
    pub fn new(rules: ScoringRules, first_server: Side) -> Self {
        Self {
            rules,
            points: PerSide::default(),
            games: PerSide::default(),
            winner: None,
            server: first_server,
            serves_in_row: 0,
            game_first_server: first_server,
            completed_games: Vec::new(),
        }
    }

    pub fn award_point(&mut self, side: Side) -> Result<PointOutcome, ScoreError> {
        if let Some(winner) = self.winner {
            return Err(ScoreError::MatchConcluded(winner));
        }

        self.points[side] += 1;

        let own = self.points[side];
        let other = self.points[side.opponent()];
        if own >= self.rules.points_to_win_game && own >= other + self.rules.min_lead {
            return Ok(self.close_game(side));
        }

        self.rotate_serve();
        Ok(PointOutcome::Point)
    }

    fn close_game(&mut self, side: Side) -> PointOutcome {
        let final_points = self.points;
        self.completed_games.push(GameResult {
            winner: side,
            points: final_points,
        });
        self.games[side] += 1;
        self.points = PerSide::default();

        // Service opens each game from alternating ends.
        self.game_first_server = self.game_first_server.opponent();
        self.server = self.game_first_server;
        self.serves_in_row = 0;

        if self.games[side] >= self.rules.games_to_win_match {
            self.winner = Some(side);
            PointOutcome::MatchWon { side, final_points }
        } else {
            PointOutcome::GameWon { side, final_points }
        }
    }

    fn rotate_serve(&mut self) {
        let deuce_at = self.rules.points_to_win_game.saturating_sub(1);
        let at_deuce = self.rules.alternate_serve_at_deuce
            && self.points.left >= deuce_at
            && self.points.right >= deuce_at;

        self.serves_in_row += 1;
        if at_deuce || self.serves_in_row >= self.rules.serves_per_turn.max(1) {
            self.server = self.server.opponent();
            self.serves_in_row = 0;
        }
    }

    pub fn points(&self) -> PerSide<u32> {
        self.points
    }

    pub fn games(&self) -> PerSide<u32> {
        self.games
    }

    pub fn winner(&self) -> Option<Side> {
        self.winner
    }

    pub fn server(&self) -> Side {
        self.server
    }

    pub fn completed_games(&self) -> &[GameResult] {
        &self.completed_games
    }

    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(score: &mut MatchScore, left: u32, right: u32) {
        // Alternate so neither side closes the game early.
        let (mut l, mut r) = (0, 0);
        while l < left || r < right {
            if l < left && (l <= r || r >= right) {
                score.award_point(Side::Left).unwrap();
                l += 1;
            } else {
                score.award_point(Side::Right).unwrap();
                r += 1;
            }
        }
    }

    #[test]
    fn test_game_requires_two_point_lead() {
        let mut score = MatchScore::new(ScoringRules::default(), Side::Left);
        play(&mut score, 10, 10);
        assert_eq!(score.award_point(Side::Left), Ok(PointOutcome::Point));
        assert_eq!(score.points(), PerSide::new(11, 10));
        assert_eq!(score.award_point(Side::Right), Ok(PointOutcome::Point));
        score.award_point(Side::Right).unwrap();
        let outcome = score.award_point(Side::Right).unwrap();
        assert_eq!(
            outcome,
            PointOutcome::GameWon {
                side: Side::Right,
                final_points: PerSide::new(11, 13)
            }
        );
        assert_eq!(score.points(), PerSide::new(0, 0));
        assert_eq!(score.games(), PerSide::new(0, 1));
    }

    #[test]
    fn test_serve_rotation() {
        let mut score = MatchScore::new(ScoringRules::default(), Side::Left);
        assert_eq!(score.server(), Side::Left);
        score.award_point(Side::Left).unwrap();
        assert_eq!(score.server(), Side::Left);
        score.award_point(Side::Right).unwrap();
        assert_eq!(score.server(), Side::Right);
        score.award_point(Side::Right).unwrap();
        score.award_point(Side::Right).unwrap();
        assert_eq!(score.server(), Side::Left);
    }

    #[test]
    fn test_serve_alternates_at_deuce() {
        let mut score = MatchScore::new(ScoringRules::default(), Side::Left);
        play(&mut score, 10, 10);
        let at_ten_all = score.server();
        score.award_point(Side::Left).unwrap();
        assert_eq!(score.server(), at_ten_all.opponent());
        score.award_point(Side::Right).unwrap();
        assert_eq!(score.server(), at_ten_all);
    }

    #[test]
    fn test_next_game_opened_by_other_side() {
        let mut score = MatchScore::new(ScoringRules::default(), Side::Left);
        play(&mut score, 11, 3);
        assert_eq!(score.games(), PerSide::new(1, 0));
        assert_eq!(score.server(), Side::Right);
    }

    #[test]
    fn test_winner_is_terminal() {
        let rules = ScoringRules {
            games_to_win_match: 1,
            ..ScoringRules::default()
        };
        let mut score = MatchScore::new(rules, Side::Left);
        play(&mut score, 11, 0);
        assert_eq!(score.winner(), Some(Side::Left));

        let frozen = score.clone();
        assert_eq!(
            score.award_point(Side::Right),
            Err(ScoreError::MatchConcluded(Side::Left))
        );
        assert_eq!(score, frozen);
        assert_eq!(score.completed_games().len(), 1);
    }
}

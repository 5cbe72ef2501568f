//! Rally state machine: serve detection, event detectors and point scoring.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::geometry::{PerSide, Side, TableGeometry, TablePoint};
use crate::rally::events::{EventKind, GameEvent, PointEndReason, PointRecord};
use crate::rally::rally_state::RallyState;
use crate::rally::score::{MatchScore, PointOutcome, ScoringRules};
use crate::tracker::{BallObservation, FrameObservation};

/// Samples kept for event detection; bounce detection needs three.
const WINDOW_LEN: usize = 3;

/// Who gets a point that ends before anyone is recorded as hitting the ball.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnattributedPointPolicy {
    AwardTo(Side),
    /// Score nothing and replay the serve.
    Replay,
}

impl Default for UnattributedPointPolicy {
    fn default() -> Self {
        UnattributedPointPolicy::AwardTo(Side::Left)
    }
}

/// Configuration for the RallyStateMachine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RallyConfig {
    pub table: TableGeometry,
    /// Ball speed (table units / s) that starts a rally.
    pub serve_speed_threshold: f64,
    /// Dead time after a point ends before the next serve is accepted.
    pub serve_cooldown_secs: f64,
    /// Max table distance between racket/player and ball to count a hit.
    pub hit_proximity: f64,
    /// Minimum time between two recorded hits.
    pub hit_refractory_secs: f64,
    /// Minimum depth change per sample for a bounce.
    pub bounce_noise: f64,
    /// How far outside the table a bounce point may lie.
    pub bounce_tolerance: f64,
    /// Slack around the table before the ball counts as out of bounds.
    pub out_of_bounds_margin: f64,
    pub first_server: Side,
    pub unattributed_point: UnattributedPointPolicy,
    pub rules: ScoringRules,
}

impl Default for RallyConfig {
    fn default() -> Self {
        Self {
            table: TableGeometry::default(),
            serve_speed_threshold: 50.0,
            serve_cooldown_secs: 2.0,
            hit_proximity: 100.0,
            hit_refractory_secs: 0.3,
            bounce_noise: 5.0,
            bounce_tolerance: 30.0,
            out_of_bounds_margin: 0.0,
            first_server: Side::Left,
            unattributed_point: UnattributedPointPolicy::default(),
            rules: ScoringRules::default(),
        }
    }
}

/// Side-effect-free view of the match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub rally_state: RallyState,
    pub points: PerSide<u32>,
    pub games: PerSide<u32>,
    pub winner: Option<Side>,
    pub server: Side,
    pub rally_hits: u32,
    /// Ball speed over the rally in progress; zero between rallies.
    pub rally_max_speed: f64,
    pub rally_avg_speed: f64,
    pub total_points: usize,
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    position: TablePoint,
}

/// Everything that belongs to the rally in progress. Dropped wholesale on
/// every point boundary.
#[derive(Debug, Clone, Default)]
struct RallyContext {
    window: VecDeque<Sample>,
    start_time: Option<f64>,
    server: Option<Side>,
    last_hitter: Option<Side>,
    last_hit_time: Option<f64>,
    hit_count: u32,
    bounces: PerSide<u32>,
    speeds: Vec<f64>,
    events: Vec<GameEvent>,
}

pub struct RallyStateMachine {
    config: RallyConfig,
    state: RallyState,
    score: MatchScore,
    rally: RallyContext,
    history: Vec<PointRecord>,
    last_point_end: Option<f64>,
}

impl RallyStateMachine {
    pub fn new(config: RallyConfig) -> Self {
        let score = MatchScore::new(config.rules.clone(), config.first_server);
        Self {
            config,
            state: RallyState::WaitingForServe,
            score,
            rally: RallyContext::default(),
            history: Vec::new(),
            last_point_end: None,
        }
    }

    /// Feed one frame. Returns the events it produced, in detection order.
    pub fn update(&mut self, observation: &FrameObservation) -> Vec<GameEvent> {
        let mut events = Vec::new();

        match self.state {
            RallyState::MatchOver => return events,
            RallyState::PointOver => {
                self.state = RallyState::WaitingForServe;
                return events;
            }
            RallyState::WaitingForServe | RallyState::InRally => {}
        }

        // Carried-forward ghosts repeat old data; nothing can happen on them.
        let Some(ball) = observation.fresh_ball() else {
            return events;
        };

        match self.state {
            RallyState::WaitingForServe => {
                if self.is_serve(ball) {
                    self.start_rally(ball, &mut events);
                }
            }
            RallyState::InRally => self.advance_rally(ball, observation, &mut events),
            RallyState::PointOver | RallyState::MatchOver => {}
        }

        events
    }

    /// A fast ball over the table, once the post-point cooldown has run out.
    /// A ball still flying away after the last point fails the table check.
    fn is_serve(&self, ball: &BallObservation) -> bool {
        if ball.speed <= self.config.serve_speed_threshold {
            return false;
        }
        if let Some(ended) = self.last_point_end {
            if ball.timestamp - ended < self.config.serve_cooldown_secs {
                return false;
            }
        }
        self.config
            .table
            .bounds()
            .expanded(self.config.bounce_tolerance)
            .contains(&ball.table_position)
    }

    fn start_rally(&mut self, ball: &BallObservation, events: &mut Vec<GameEvent>) {
        let server = self.score.server();
        self.rally = RallyContext {
            start_time: Some(ball.timestamp),
            server: Some(server),
            last_hitter: Some(server),
            last_hit_time: Some(ball.timestamp),
            hit_count: 1,
            ..RallyContext::default()
        };
        self.push_sample(ball);
        self.state = RallyState::InRally;

        debug!(%server, speed = ball.speed, "serve detected, rally started");
        self.emit(events, ball.timestamp, EventKind::ServeStarted { server });
    }

    fn advance_rally(
        &mut self,
        ball: &BallObservation,
        observation: &FrameObservation,
        events: &mut Vec<GameEvent>,
    ) {
        let timestamp = ball.timestamp;
        let position = ball.table_position;
        self.push_sample(ball);

        let crossed_into = self.detect_net_crossing();
        if let Some(side) = crossed_into {
            self.rally.bounces[side] = 0;
            debug!(into = %side, "ball crossed the net");
            self.emit(events, timestamp, EventKind::NetCrossed { into: side });
        }

        if let Some(side) = self.detect_hit(observation, &position, timestamp) {
            self.rally.last_hitter = Some(side);
            self.rally.last_hit_time = Some(timestamp);
            self.rally.hit_count += 1;
            self.rally.bounces[side] = 0;
            let hit_count = self.rally.hit_count;
            debug!(%side, hit_count, "hit");
            self.emit(events, timestamp, EventKind::Hit { side, hit_count });
        }

        if let Some((side, at)) = self.detect_bounce() {
            self.rally.bounces[side] += 1;
            let consecutive = self.rally.bounces[side];
            debug!(%side, consecutive, x = at.x, y = at.y, "bounce");
            self.emit(
                events,
                timestamp,
                EventKind::Bounce {
                    side,
                    position: at,
                    consecutive,
                },
            );
        }

        if let Some(reason) = self.terminal_condition(&position, crossed_into.is_some()) {
            events.extend(self.end_point(reason, timestamp));
        }
    }

    fn push_sample(&mut self, ball: &BallObservation) {
        if self.rally.window.len() == WINDOW_LEN {
            self.rally.window.pop_front();
        }
        self.rally.window.push_back(Sample {
            position: ball.table_position,
        });
        self.rally.speeds.push(ball.speed);
    }

    /// Side the ball entered, if the last two samples lie on different halves.
    fn detect_net_crossing(&self) -> Option<Side> {
        let n = self.rally.window.len();
        if n < 2 {
            return None;
        }
        let table = &self.config.table;
        let from = table.side_of(&self.rally.window[n - 2].position);
        let to = table.side_of(&self.rally.window[n - 1].position);
        (from != to).then_some(to)
    }

    /// Nearest racket or player within reach of the ball, outside the
    /// refractory interval of the previous hit.
    fn detect_hit(
        &self,
        observation: &FrameObservation,
        ball: &TablePoint,
        timestamp: f64,
    ) -> Option<Side> {
        if let Some(last) = self.rally.last_hit_time {
            if timestamp - last < self.config.hit_refractory_secs {
                return None;
            }
        }

        observation
            .hitter_candidates()
            .map(|(side, at)| (side, at.distance_to(ball)))
            .filter(|(_, d)| *d <= self.config.hit_proximity)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(side, _)| side)
    }

    /// A change of sign in depth velocity over the last three samples, large
    /// enough to beat noise, with the turning point near the table.
    fn detect_bounce(&self) -> Option<(Side, TablePoint)> {
        let n = self.rally.window.len();
        if n < 3 {
            return None;
        }
        let p1 = self.rally.window[n - 3].position;
        let p2 = self.rally.window[n - 2].position;
        let p3 = self.rally.window[n - 1].position;

        let dy1 = p2.y - p1.y;
        let dy2 = p3.y - p2.y;
        let noise = self.config.bounce_noise;
        if dy1 * dy2 >= 0.0 || dy1.abs() <= noise || dy2.abs() <= noise {
            return None;
        }

        let table = &self.config.table;
        if !table
            .bounds()
            .expanded(self.config.bounce_tolerance)
            .contains(&p2)
        {
            return None;
        }
        Some((table.side_of(&p2), p2))
    }

    /// Double bounce, then out of bounds, then net touch.
    fn terminal_condition(&self, position: &TablePoint, crossed: bool) -> Option<PointEndReason> {
        for side in [Side::Left, Side::Right] {
            if self.rally.bounces[side] >= 2 {
                return Some(PointEndReason::DoubleBounce { side });
            }
        }

        let table = &self.config.table;
        let valid = table.bounds().expanded(self.config.out_of_bounds_margin);
        if !valid.contains(position) {
            return Some(PointEndReason::OutOfBounds);
        }

        if crossed && table.in_net_zone(position) {
            return Some(PointEndReason::NetTouch);
        }
        None
    }

    /// Side that wins a point ending for `reason`, before the unattributed
    /// point policy is applied.
    fn point_winner(&self, reason: PointEndReason) -> Option<Side> {
        match reason {
            PointEndReason::DoubleBounce { side } => Some(side.opponent()),
            PointEndReason::OutOfBounds | PointEndReason::NetTouch => {
                self.rally.last_hitter.map(Side::opponent)
            }
        }
    }

    /// End the current point for `reason` and apply the score.
    ///
    /// Also usable to record a point the detectors missed. Ignored once the
    /// match is over.
    pub fn end_point(&mut self, reason: PointEndReason, timestamp: f64) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if let Some(winner) = self.score.winner() {
            warn!(%winner, "point ended after the match was decided, ignoring");
            return events;
        }

        let winner = self
            .point_winner(reason)
            .or(match self.config.unattributed_point {
                UnattributedPointPolicy::AwardTo(side) => Some(side),
                UnattributedPointPolicy::Replay => None,
            });
        self.emit(&mut events, timestamp, EventKind::PointEnded { winner, reason });

        if let Some(side) = winner {
            match self.score.award_point(side) {
                Ok(PointOutcome::Point) => {}
                Ok(PointOutcome::GameWon { side, final_points }) => {
                    let games = self.score.games();
                    info!(%side, left = final_points.left, right = final_points.right, "game won");
                    self.emit(
                        &mut events,
                        timestamp,
                        EventKind::GameWon {
                            side,
                            points: final_points,
                            games,
                        },
                    );
                }
                Ok(PointOutcome::MatchWon { side, final_points }) => {
                    let games = self.score.games();
                    info!(%side, left = games.left, right = games.right, "match won");
                    self.emit(
                        &mut events,
                        timestamp,
                        EventKind::GameWon {
                            side,
                            points: final_points,
                            games,
                        },
                    );
                    self.emit(&mut events, timestamp, EventKind::MatchWon { side, games });
                }
                Err(err) => warn!(%err, "score rejected point"),
            }
        }

        let points = self.score.points();
        info!(
            ?winner,
            ?reason,
            left = points.left,
            right = points.right,
            hits = self.rally.hit_count,
            "point over"
        );

        self.archive_point(reason, winner, timestamp);
        self.last_point_end = Some(timestamp);
        self.state = if self.score.winner().is_some() {
            RallyState::MatchOver
        } else {
            RallyState::PointOver
        };
        events
    }

    fn archive_point(&mut self, reason: PointEndReason, winner: Option<Side>, timestamp: f64) {
        let rally = std::mem::take(&mut self.rally);

        let max_speed = rally.speeds.iter().copied().fold(0.0, f64::max);
        let avg_speed = mean(&rally.speeds);

        let number = self.history.len() + 1;
        let server = rally.server.unwrap_or(self.score.server());
        self.history.push(PointRecord {
            number,
            server,
            start_time: rally.start_time,
            end_time: timestamp,
            duration: rally.start_time.map_or(0.0, |start| (timestamp - start).max(0.0)),
            winner,
            reason,
            hit_count: rally.hit_count,
            max_speed,
            avg_speed,
            events: rally.events,
        });
    }

    fn emit(&mut self, events: &mut Vec<GameEvent>, timestamp: f64, kind: EventKind) {
        let event = GameEvent { timestamp, kind };
        self.rally.events.push(event.clone());
        events.push(event);
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            rally_state: self.state,
            points: self.score.points(),
            games: self.score.games(),
            winner: self.score.winner(),
            server: self.score.server(),
            rally_hits: self.rally.hit_count,
            rally_max_speed: self.rally.speeds.iter().copied().fold(0.0, f64::max),
            rally_avg_speed: mean(&self.rally.speeds),
            total_points: self.history.len(),
        }
    }

    /// Start a fresh match with the same configuration.
    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
        info!("match reset");
    }

    pub fn state(&self) -> RallyState {
        self.state
    }

    pub fn score(&self) -> &MatchScore {
        &self.score
    }

    pub fn last_hitter(&self) -> Option<Side> {
        self.rally.last_hitter
    }

    /// Consecutive bounces on each half in the current rally.
    pub fn bounces(&self) -> PerSide<u32> {
        self.rally.bounces
    }

    pub fn point_history(&self) -> &[PointRecord] {
        &self.history
    }

    pub fn config(&self) -> &RallyConfig {
        &self.config
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

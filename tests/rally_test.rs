use rallyscope::rally::PointOutcome;
use rallyscope::{
    Calibration, Detection, EventKind, MatchPipeline, MatchScore, PointEndReason, RallyState,
    RefereeConfig, ScoreError, ScoringRules, Side, TableGeometry,
};

struct ReplayDetector {
    frames: std::vec::IntoIter<Vec<Detection>>,
}

impl rallyscope::DetectionSource for ReplayDetector {
    type Error = std::convert::Infallible;

    fn detect(
        &mut self,
        _input: &[u8],
        _width: u32,
        _height: u32,
    ) -> Result<Vec<Detection>, Self::Error> {
        Ok(self.frames.next().unwrap_or_default())
    }
}

fn ball_at(x: f32, y: f32) -> Detection {
    Detection::ball(x - 4.0, y - 4.0, x + 4.0, y + 4.0, 0.9)
}

fn racket_at(x: f32, y: f32) -> Detection {
    Detection::racket(x - 15.0, y - 15.0, x + 15.0, y + 15.0, 0.8)
}

/// Camera looking straight down: pixels equal table units.
fn pipeline(frames: Vec<Vec<Detection>>) -> MatchPipeline<ReplayDetector> {
    let corners = [[0.0, 0.0], [1000.0, 0.0], [1000.0, 500.0], [0.0, 500.0]];
    let calibration = Calibration::from_clicked_corners(corners, &TableGeometry::default())
        .unwrap()
        .with_frame_size(1000, 500);
    let detector = ReplayDetector {
        frames: frames.into_iter(),
    };
    MatchPipeline::from_calibration(detector, &calibration, &RefereeConfig::default()).unwrap()
}

fn run(pipeline: &mut MatchPipeline<ReplayDetector>, times: &[f64]) -> Vec<EventKind> {
    let mut kinds = Vec::new();
    for &t in times {
        let report = pipeline.process_frame(&[], 1000, 500, t).unwrap();
        kinds.extend(report.events.into_iter().map(|e| e.kind));
    }
    kinds
}

#[test]
fn test_double_bounce_after_return() {
    let frames = vec![
        vec![ball_at(150.0, 250.0)],
        // serve from the left
        vec![ball_at(200.0, 250.0)],
        vec![ball_at(700.0, 250.0)],
        // right player returns
        vec![ball_at(850.0, 250.0), racket_at(860.0, 250.0)],
        vec![ball_at(400.0, 250.0)],
        vec![ball_at(350.0, 200.0)],
        vec![ball_at(300.0, 260.0)],
        vec![ball_at(250.0, 200.0)],
    ];
    let mut pipeline = pipeline(frames);
    let kinds = run(&mut pipeline, &[0.0, 0.1, 0.3, 0.5, 0.6, 0.7, 0.8, 0.9]);

    assert_eq!(kinds[0], EventKind::ServeStarted { server: Side::Left });
    assert!(kinds.contains(&EventKind::NetCrossed { into: Side::Right }));
    assert!(kinds.contains(&EventKind::Hit {
        side: Side::Right,
        hit_count: 2
    }));
    assert!(kinds.contains(&EventKind::NetCrossed { into: Side::Left }));

    let bounces: Vec<_> = kinds
        .iter()
        .filter_map(|k| match k {
            EventKind::Bounce {
                side, consecutive, ..
            } => Some((*side, *consecutive)),
            _ => None,
        })
        .collect();
    assert_eq!(bounces, vec![(Side::Left, 1), (Side::Left, 2)]);

    assert_eq!(
        kinds.last(),
        Some(&EventKind::PointEnded {
            winner: Some(Side::Right),
            reason: PointEndReason::DoubleBounce { side: Side::Left },
        })
    );

    let snapshot = pipeline.snapshot();
    assert_eq!(snapshot.rally_state, RallyState::PointOver);
    assert_eq!(snapshot.points.right, 1);
    assert_eq!(snapshot.points.left, 0);

    let record = &pipeline.referee().point_history()[0];
    assert_eq!(record.hit_count, 2);
    assert_eq!(record.server, Side::Left);
    assert_eq!(record.start_time, Some(0.1));
    assert!((record.duration - 0.8).abs() < 1e-9);
    assert!(record.max_speed > 0.0);
}

#[test]
fn test_serve_out_of_bounds() {
    let frames = vec![
        vec![ball_at(150.0, 250.0)],
        vec![ball_at(250.0, 250.0)],
        vec![ball_at(1100.0, 250.0)],
        Vec::new(),
        vec![ball_at(300.0, 250.0)],
        vec![ball_at(600.0, 250.0)],
    ];
    let mut pipeline = pipeline(frames);
    let kinds = run(&mut pipeline, &[0.0, 0.1, 0.2]);

    assert_eq!(
        kinds.last(),
        Some(&EventKind::PointEnded {
            winner: Some(Side::Right),
            reason: PointEndReason::OutOfBounds,
        })
    );

    // Point over is shown for one frame, then the next serve is awaited
    run(&mut pipeline, &[0.3]);
    assert_eq!(pipeline.snapshot().rally_state, RallyState::WaitingForServe);

    // Fast and over the table, but still inside the post-point cooldown
    assert!(run(&mut pipeline, &[0.4]).is_empty());

    // Cooldown over; still served from the left after a single point
    let kinds = run(&mut pipeline, &[2.5]);
    assert_eq!(kinds, vec![EventKind::ServeStarted { server: Side::Left }]);
    assert_eq!(pipeline.referee().point_history().len(), 1);
}

#[test]
fn test_ball_flying_off_scores_once() {
    let mut frames = vec![vec![ball_at(150.0, 250.0)], vec![ball_at(250.0, 250.0)]];
    let mut times = vec![0.0, 0.1];
    for i in 0..6 {
        frames.push(vec![ball_at(1100.0 + 100.0 * i as f32, 250.0)]);
        times.push(0.2 + 0.1 * i as f64);
    }
    let mut pipeline = pipeline(frames);
    let kinds = run(&mut pipeline, &times);

    let ended = kinds
        .iter()
        .filter(|k| matches!(k, EventKind::PointEnded { .. }))
        .count();
    assert_eq!(ended, 1);
    assert_eq!(pipeline.snapshot().points.right, 1);
    assert_eq!(pipeline.snapshot().points.left, 0);
}

#[test]
fn test_ghost_frames_do_not_advance_rally() {
    let frames = vec![
        vec![ball_at(150.0, 250.0)],
        vec![ball_at(250.0, 250.0)],
    ];
    let mut pipeline = pipeline(frames);
    run(&mut pipeline, &[0.0, 0.1]);
    assert_eq!(pipeline.snapshot().rally_state, RallyState::InRally);

    let before = pipeline.snapshot();
    for i in 0..20 {
        let report = pipeline.process_frame(&[], 1000, 500, 0.2 + i as f64 * 0.05).unwrap();
        assert!(report.observation.ball.unwrap().is_stale);
        assert!(report.events.is_empty());
    }
    assert_eq!(pipeline.snapshot(), before);
}

#[test]
fn test_match_conclusion_freezes_score() {
    let rules = ScoringRules {
        games_to_win_match: 2,
        ..ScoringRules::default()
    };
    let mut score = MatchScore::new(rules, Side::Left);

    let play_game = |score: &mut MatchScore, winner_points: u32, loser_points: u32| {
        let mut last = None;
        // Interleave so neither side gets an early lead of two past eleven
        for i in 0..winner_points.max(loser_points) {
            if i < loser_points {
                last = Some(score.award_point(Side::Right).unwrap());
            }
            if i < winner_points {
                last = Some(score.award_point(Side::Left).unwrap());
            }
        }
        last
    };

    let first = play_game(&mut score, 11, 5);
    assert!(matches!(first, Some(PointOutcome::GameWon { side: Side::Left, .. })));
    assert_eq!(score.points().left, 0);
    assert_eq!(score.games().left, 1);

    let second = play_game(&mut score, 11, 9);
    assert!(matches!(second, Some(PointOutcome::MatchWon { side: Side::Left, .. })));
    assert_eq!(score.winner(), Some(Side::Left));
    assert_eq!(score.games().left, 2);
    assert_eq!(score.games().right, 0);
    assert_eq!(score.completed_games().len(), 2);

    let frozen = score.clone();
    assert_eq!(
        score.award_point(Side::Right),
        Err(ScoreError::MatchConcluded(Side::Left))
    );
    assert_eq!(score, frozen);
}

#[test]
fn test_snapshot_is_idempotent() {
    let frames = vec![
        vec![ball_at(150.0, 250.0)],
        vec![ball_at(250.0, 250.0)],
    ];
    let mut pipeline = pipeline(frames);
    run(&mut pipeline, &[0.0, 0.1]);

    let a = pipeline.snapshot();
    let b = pipeline.snapshot();
    assert_eq!(a, b);
    assert_eq!(a.rally_hits, 1);
}

#[test]
fn test_events_serialize_as_tagged_json() {
    let frames = vec![
        vec![ball_at(150.0, 250.0)],
        vec![ball_at(250.0, 250.0)],
    ];
    let mut pipeline = pipeline(frames);
    pipeline.process_frame(&[], 1000, 500, 0.0).unwrap();
    let report = pipeline.process_frame(&[], 1000, 500, 0.1).unwrap();

    let json = serde_json::to_value(&report.events[0]).unwrap();
    assert_eq!(json["kind"], "serve_started");
    assert_eq!(json["server"], "left");
    assert_eq!(json["timestamp"], 0.1);
}

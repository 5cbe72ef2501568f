//! Ball tracking and rally refereeing for table-tennis video.
//!
//! Per frame, an external detector's bounding boxes go through the
//! [`ObjectTracker`], which projects them onto the table plane and keeps a
//! single coherent ball trajectory, and then through the
//! [`RallyStateMachine`], which turns that trajectory into serves, hits,
//! bounces, net crossings and points, and keeps the match score.
//!
//! ```ignore
//! use rallyscope::{Calibration, MatchPipeline, RefereeConfig};
//!
//! let calibration = Calibration::load("calibration.json")?;
//! let config = RefereeConfig::from_json_file("referee.json")?;
//! let mut pipeline = MatchPipeline::from_calibration(detector, &calibration, &config)?;
//!
//! for (frame, timestamp) in frames {
//!     let report = pipeline.process_frame(&frame.data, frame.width, frame.height, timestamp)?;
//!     for event in &report.events {
//!         println!("{:?}", event);
//!     }
//! }
//! ```

pub mod config;
pub mod geometry;
pub mod integration;
pub mod projection;
pub mod rally;
pub mod tracker;

pub use config::{ConfigError, RefereeConfig};
pub use geometry::{PerSide, PixelPoint, Side, TableGeometry, TablePoint};
pub use integration::{
    ClassMap, DetectionBuilder, DetectionSource, FrameReport, IntoDetections, MatchPipeline,
    RawDetection,
};
pub use projection::{Calibration, CalibrationError, Homography};
pub use rally::{
    EventKind, GameEvent, MatchScore, MatchSnapshot, PointEndReason, PointRecord, RallyConfig,
    RallyState, RallyStateMachine, ScoreError, ScoringRules, UnattributedPointPolicy,
};
pub use tracker::{
    BallObservation, Detection, FrameObservation, ObjectClass, ObjectTracker, TrackerConfig,
};

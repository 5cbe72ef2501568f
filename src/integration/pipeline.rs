//! MatchPipeline for combining detection, tracking and refereeing.

use serde::Serialize;
use tracing::warn;

use crate::config::RefereeConfig;
use crate::projection::{Calibration, CalibrationError};
use crate::rally::{GameEvent, MatchSnapshot, RallyConfig, RallyStateMachine};
use crate::tracker::{Detection, FrameObservation, ObjectTracker};

use super::{ClassMap, DetectionSource, IntoDetections};

/// Used for the racket/player side split when neither the calibration nor
/// the config knows the camera frame size.
const DEFAULT_FRAME_WIDTH: u32 = 1920;

/// Everything the core produced for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    pub observation: FrameObservation,
    pub events: Vec<GameEvent>,
    pub snapshot: MatchSnapshot,
}

/// Runs detector → tracker → rally state machine, one frame at a time.
///
/// All updates and resets take `&mut self`, so frames are processed strictly
/// in the order they are fed and a reset can never interleave with a frame.
pub struct MatchPipeline<D: DetectionSource> {
    detector: D,
    classes: ClassMap,
    tracker: ObjectTracker,
    referee: RallyStateMachine,
}

impl<D: DetectionSource> MatchPipeline<D> {
    pub fn new(detector: D, tracker: ObjectTracker, referee: RallyStateMachine) -> Self {
        Self {
            detector,
            classes: ClassMap::default(),
            tracker,
            referee,
        }
    }

    /// Class ids used by [`process_output`](Self::process_output).
    pub fn with_classes(mut self, classes: ClassMap) -> Self {
        self.classes = classes;
        self
    }

    /// Build the pipeline from a loaded calibration. The table size comes
    /// from the calibration; the net margin and all thresholds from `config`.
    pub fn from_calibration(
        detector: D,
        calibration: &Calibration,
        config: &RefereeConfig,
    ) -> Result<Self, CalibrationError> {
        calibration.validate()?;
        let projector = calibration.projector()?;

        let frame_width = match (calibration.frame_size, config.frame_width) {
            (Some(size), _) => size.width,
            (None, Some(width)) => width,
            (None, None) => {
                warn!(
                    frame_width = DEFAULT_FRAME_WIDTH,
                    "frame size unknown, assuming default width for side split"
                );
                DEFAULT_FRAME_WIDTH
            }
        };

        let table = calibration
            .table_geometry()
            .with_net_margin(config.rally.table.net_margin);
        let rally = RallyConfig {
            table,
            ..config.rally.clone()
        };

        Ok(Self::new(
            detector,
            ObjectTracker::new(projector, frame_width, config.tracker.clone()),
            RallyStateMachine::new(rally),
        )
        .with_classes(config.classes))
    }

    /// Detect, track and referee a single frame.
    ///
    /// # Arguments
    /// * `input` - Raw image bytes
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    /// * `timestamp` - Capture time in seconds, non-decreasing across calls
    pub fn process_frame(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
        timestamp: f64,
    ) -> Result<FrameReport, D::Error> {
        let detections = self.detector.detect(input, width, height)?;
        Ok(self.process_detections(&detections, timestamp))
    }

    /// Track and referee detections produced outside the pipeline.
    pub fn process_detections(&mut self, detections: &[Detection], timestamp: f64) -> FrameReport {
        let observation = self.tracker.observe(detections, timestamp);
        let events = self.referee.update(&observation);
        FrameReport {
            observation,
            events,
            snapshot: self.referee.snapshot(),
        }
    }

    /// Tag raw model output with the configured class ids, then track and
    /// referee it.
    pub fn process_output(&mut self, output: impl IntoDetections, timestamp: f64) -> FrameReport {
        let detections = output.into_detections(&self.classes);
        self.process_detections(&detections, timestamp)
    }

    /// Start a new match: clears the ball trajectory and the score.
    pub fn reset(&mut self) {
        self.tracker.clear_history();
        self.referee.reset();
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        self.referee.snapshot()
    }

    /// Get a reference to the underlying detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Get a mutable reference to the underlying detector.
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    pub fn classes(&self) -> &ClassMap {
        &self.classes
    }

    pub fn tracker(&self) -> &ObjectTracker {
        &self.tracker
    }

    pub fn referee(&self) -> &RallyStateMachine {
        &self.referee
    }
}

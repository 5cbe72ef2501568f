//! Seam between an external detection model and the tracker.

use serde::{Deserialize, Serialize};

use super::ClassMap;
use crate::tracker::Detection;

/// A detection model that sees balls, rackets and players in a frame.
///
/// ```ignore
/// use rallyscope::{Detection, DetectionSource};
///
/// struct OnnxDetector { /* session, input buffers */ }
///
/// impl DetectionSource for OnnxDetector {
///     type Error = std::io::Error;
///
///     fn detect(&mut self, input: &[u8], width: u32, height: u32) -> Result<Vec<Detection>, Self::Error> {
///         Ok(vec![])
///     }
/// }
/// ```
pub trait DetectionSource {
    type Error;

    /// Detections for one frame of raw image bytes, in model output order.
    /// The first ball in this order wins when the tracker has no previous
    /// position to compare against.
    fn detect(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<Detection>, Self::Error>;
}

/// One box as most detection heads emit it: numeric class, corners, score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub class_id: u32,
    /// `[x1, y1, x2, y2]` in pixels.
    pub tlbr: [f32; 4],
    pub score: f32,
}

/// Model output that can be tagged into tracker detections.
pub trait IntoDetections {
    /// Ids missing from `classes` are dropped.
    fn into_detections(self, classes: &ClassMap) -> Vec<Detection>;
}

impl IntoDetections for Vec<Detection> {
    fn into_detections(self, _classes: &ClassMap) -> Vec<Detection> {
        self
    }
}

impl IntoDetections for &[RawDetection] {
    fn into_detections(self, classes: &ClassMap) -> Vec<Detection> {
        self.iter()
            .filter_map(|raw| {
                let [x1, y1, x2, y2] = raw.tlbr;
                classes
                    .builder(raw.class_id)
                    .map(|b| b.tlbr(x1, y1, x2, y2).score(raw.score).build())
            })
            .collect()
    }
}

impl IntoDetections for Vec<RawDetection> {
    fn into_detections(self, classes: &ClassMap) -> Vec<Detection> {
        self.as_slice().into_detections(classes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::ObjectClass;

    #[test]
    fn test_raw_output_is_tagged_in_order() {
        let raw = vec![
            RawDetection { class_id: 3, tlbr: [0.0, 0.0, 80.0, 300.0], score: 0.7 },
            RawDetection { class_id: 9, tlbr: [5.0, 5.0, 9.0, 9.0], score: 0.9 },
            RawDetection { class_id: 2, tlbr: [96.0, 46.0, 104.0, 54.0], score: 0.9 },
        ];
        let dets = raw.into_detections(&ClassMap::default());

        assert_eq!(dets.len(), 2);
        assert_eq!(dets[0].class, ObjectClass::Player);
        assert_eq!(dets[1].class, ObjectClass::Ball);
        assert_eq!(dets[1].bbox.center().x, 100.0);
    }
}

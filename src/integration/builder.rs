//! Fluent construction of [`Detection`]s from model boxes.

use crate::geometry::Rect;
use crate::tracker::{Detection, ObjectClass};

#[derive(Debug, Clone)]
pub struct DetectionBuilder {
    class: ObjectClass,
    bbox: Rect,
    score: f32,
}

impl DetectionBuilder {
    pub fn new(class: ObjectClass) -> Self {
        Self {
            class,
            bbox: Rect::default(),
            score: 0.0,
        }
    }

    /// Corner format (x1, y1, x2, y2).
    pub fn tlbr(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.bbox = Rect::from_tlbr(x1, y1, x2, y2);
        self
    }

    /// Center format (cx, cy, w, h), as YOLO-style heads emit it.
    pub fn xywh(mut self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.bbox = Rect::from_xywh(cx, cy, w, h);
        self
    }

    /// Confidence, clamped to [0, 1].
    pub fn score(mut self, score: f32) -> Self {
        self.score = score.clamp(0.0, 1.0);
        self
    }

    pub fn build(self) -> Detection {
        Detection::from_rect(self.class, self.bbox, self.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_builder() {
        let det = DetectionBuilder::new(ObjectClass::Racket)
            .tlbr(10.0, 20.0, 50.0, 80.0)
            .score(0.95)
            .build();

        assert_eq!(det.class, ObjectClass::Racket);
        assert_eq!(det.score, 0.95);
        assert_eq!(det.bbox.to_tlbr(), [10.0, 20.0, 50.0, 80.0]);
    }

    #[test]
    fn test_xywh_and_clamped_score() {
        let det = DetectionBuilder::new(ObjectClass::Ball)
            .xywh(500.0, 300.0, 10.0, 10.0)
            .score(1.7)
            .build();

        assert_eq!(det.bbox.center().x, 500.0);
        assert_eq!(det.bbox.center().y, 300.0);
        assert_eq!(det.score, 1.0);
    }
}

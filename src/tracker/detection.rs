//! Detection input for the tracker.

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// What a detection is. Resolved once when detections enter the crate; the
/// tracker dispatches on this tag and nowhere re-checks raw class ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectClass {
    Ball,
    Racket,
    Player,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class: ObjectClass,
    /// Bounding box in pixel space
    pub bbox: Rect,
    /// Detection confidence score in [0, 1]
    pub score: f32,
}

impl Detection {
    pub fn new(class: ObjectClass, x1: f32, y1: f32, x2: f32, y2: f32, score: f32) -> Self {
        Self {
            class,
            bbox: Rect::from_tlbr(x1, y1, x2, y2),
            score,
        }
    }

    pub fn from_rect(class: ObjectClass, bbox: Rect, score: f32) -> Self {
        Self { class, bbox, score }
    }

    pub fn ball(x1: f32, y1: f32, x2: f32, y2: f32, score: f32) -> Self {
        Self::new(ObjectClass::Ball, x1, y1, x2, y2, score)
    }

    pub fn racket(x1: f32, y1: f32, x2: f32, y2: f32, score: f32) -> Self {
        Self::new(ObjectClass::Racket, x1, y1, x2, y2, score)
    }

    pub fn player(x1: f32, y1: f32, x2: f32, y2: f32, score: f32) -> Self {
        Self::new(ObjectClass::Player, x1, y1, x2, y2, score)
    }
}

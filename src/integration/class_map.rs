use serde::{Deserialize, Serialize};

use super::DetectionBuilder;
use crate::tracker::ObjectClass;

/// Model class ids for the three object kinds the core understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassMap {
    pub ball: u32,
    pub racket: u32,
    pub player: u32,
}

impl Default for ClassMap {
    fn default() -> Self {
        Self {
            ball: 2,
            racket: 1,
            player: 3,
        }
    }
}

impl ClassMap {
    /// Tag a raw class id. Ids the core does not use map to `None`.
    pub fn classify(&self, class_id: u32) -> Option<ObjectClass> {
        if class_id == self.ball {
            Some(ObjectClass::Ball)
        } else if class_id == self.racket {
            Some(ObjectClass::Racket)
        } else if class_id == self.player {
            Some(ObjectClass::Player)
        } else {
            None
        }
    }

    pub fn builder(&self, class_id: u32) -> Option<DetectionBuilder> {
        self.classify(class_id).map(DetectionBuilder::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ids() {
        let map = ClassMap::default();
        assert_eq!(map.classify(2), Some(ObjectClass::Ball));
        assert_eq!(map.classify(1), Some(ObjectClass::Racket));
        assert_eq!(map.classify(3), Some(ObjectClass::Player));
        assert_eq!(map.classify(0), None);
    }

    #[test]
    fn test_builder_from_id() {
        let det = ClassMap::default()
            .builder(2)
            .map(|b| b.tlbr(0.0, 0.0, 4.0, 4.0).score(0.8).build());
        assert_eq!(det.map(|d| d.class), Some(ObjectClass::Ball));
        assert!(ClassMap::default().builder(7).is_none());
    }
}

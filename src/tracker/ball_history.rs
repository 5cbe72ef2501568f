use std::collections::VecDeque;

use super::observation::BallObservation;

/// Bounded ball trajectory; the oldest entry is evicted once full.
#[derive(Debug, Clone)]
pub struct BallHistory {
    entries: VecDeque<BallObservation>,
    capacity: usize,
}

impl BallHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, observation: BallObservation) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(observation);
    }

    pub fn latest(&self) -> Option<&BallObservation> {
        self.entries.back()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &BallObservation> + ExactSizeIterator {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{PixelPoint, TablePoint};

    fn obs(t: f64) -> BallObservation {
        BallObservation {
            table_position: TablePoint::new(t, t),
            pixel_center: PixelPoint::default(),
            timestamp: t,
            speed: 0.0,
            velocity: (0.0, 0.0),
            confidence: 1.0,
            is_stale: false,
        }
    }

    #[test]
    fn test_evicts_oldest() {
        let mut history = BallHistory::new(3);
        for t in 0..5 {
            history.push(obs(t as f64));
        }
        assert_eq!(history.len(), 3);
        let times: Vec<f64> = history.iter().map(|o| o.timestamp).collect();
        assert_eq!(times, vec![2.0, 3.0, 4.0]);
        assert_eq!(history.latest().unwrap().timestamp, 4.0);
    }

    #[test]
    fn test_clear() {
        let mut history = BallHistory::new(2);
        history.push(obs(1.0));
        history.clear();
        assert!(history.is_empty());
        assert!(history.latest().is_none());
    }
}

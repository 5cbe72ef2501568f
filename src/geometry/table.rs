use serde::{Deserialize, Serialize};

use super::point::{Side, TablePoint};
use super::rect::{TableRect, near_line};

/// Top-down table model: a `width` × `height` rectangle with the net running
/// parallel to the y axis at `x = width / 2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableGeometry {
    pub width: f64,
    pub height: f64,
    /// Half-width of the band around the net line treated as the net zone.
    pub net_margin: f64,
}

impl Default for TableGeometry {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 500.0,
            net_margin: 20.0,
        }
    }
}

impl TableGeometry {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_net_margin(mut self, net_margin: f64) -> Self {
        self.net_margin = net_margin;
        self
    }

    pub fn bounds(&self) -> TableRect {
        TableRect::new(0.0, 0.0, self.width, self.height)
    }

    #[inline]
    pub fn net_x(&self) -> f64 {
        self.width / 2.0
    }

    /// Which half of the table a point falls on. The net line itself belongs
    /// to the right half.
    #[inline]
    pub fn side_of(&self, p: &TablePoint) -> Side {
        if p.x < self.net_x() {
            Side::Left
        } else {
            Side::Right
        }
    }

    #[inline]
    pub fn in_bounds(&self, p: &TablePoint) -> bool {
        self.bounds().contains(p)
    }

    /// Inside the net band and within the table's depth.
    pub fn in_net_zone(&self, p: &TablePoint) -> bool {
        near_line(p.x, self.net_x(), self.net_margin) && p.y >= 0.0 && p.y <= self.height
    }

    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

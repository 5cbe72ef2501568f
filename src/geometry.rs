//! Geometry shared by the tracker and the rally state machine.
//!
//! Everything here is a plain value type or a pure function: table-plane and
//! pixel points, pixel bounding boxes, the table rectangle and the side split.

mod point;
mod rect;
mod table;

pub use point::{PerSide, PixelPoint, Side, TablePoint, distance};
pub use rect::{Rect, TableRect, near_line};
pub use table::TableGeometry;

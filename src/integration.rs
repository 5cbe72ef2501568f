//! Integration module for connecting an object detection backend to the
//! tracker and the rally state machine.
//!
//! The detector itself is external; this module provides the trait it plugs
//! into, helpers for turning raw model output into [`Detection`]s and the
//! per-frame pipeline that drives the core.
//!
//! [`Detection`]: crate::tracker::Detection

mod builder;
mod class_map;
mod detector;
mod pipeline;

pub use builder::DetectionBuilder;
pub use class_map::ClassMap;
pub use detector::{DetectionSource, IntoDetections, RawDetection};
pub use pipeline::{FrameReport, MatchPipeline};

use crate::shared::frame::Frame;
use crate::shared::geometry::BoundingBox;

/// What one frame contributed to the motion picture.
#[derive(Clone, Debug, PartialEq)]
pub struct MotionSample {
    /// Fraction of grid cells that changed since the previous frame, in [0,1].
    pub level: f32,
    /// True when `level` reached the detector's trigger threshold.
    pub triggered: bool,
    /// Extent of the changed cells in source-frame pixels, present only
    /// when triggered.
    pub region: Option<BoundingBox>,
}

impl MotionSample {
    /// A no-motion sample, also what baseline frames report.
    pub fn still() -> Self {
        Self {
            level: 0.0,
            triggered: false,
            region: None,
        }
    }
}

/// Estimates inter-frame motion.
///
/// Stateful: implementations compare each frame against what they saw
/// before, so samples must be taken in stream order.
pub trait MotionDetector: Send {
    fn sample(&mut self, frame: &Frame) -> MotionSample;

    /// Drops accumulated reference frames, e.g. after a source switch.
    fn reset(&mut self);
}

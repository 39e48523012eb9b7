use crate::shared::frame::Frame;

/// Supplies the frames the demo hosts poll.
///
/// Implementations handle decoding and pacing details while the pipeline
/// works with the abstract `Frame` type. Sources are polled, not pushed:
/// hosts ask for the next frame at their own rate.
pub trait VideoSource: Send {
    /// Current frame dimensions in pixels as (width, height).
    fn dimensions(&self) -> (u32, u32);

    /// Returns the next frame, or None once the source is exhausted.
    /// Looping sources never return None.
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>>;
}

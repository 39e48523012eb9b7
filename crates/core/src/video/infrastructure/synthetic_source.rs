use crate::shared::frame::Frame;
use crate::video::domain::video_source::VideoSource;

const BACKGROUND_LUMA: u8 = 24;
const BLOCK_LUMA: u8 = 230;
const STEP_X: u32 = 4;
const STEP_Y: u32 = 2;

/// Deterministic stand-in for a camera: a bright block drifting over a dark
/// background. Gives the motion detector something to trigger on and lets
/// both hosts run without capture hardware. Never exhausts.
pub struct SyntheticSource {
    width: u32,
    height: u32,
    block: u32,
    index: usize,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32) -> Self {
        let block = (height / 8).max(8).min(width.max(1));
        Self {
            width,
            height,
            block,
            index: 0,
        }
    }

    fn block_origin(&self, index: usize) -> (u32, u32) {
        let travel_x = (self.width - self.block).max(1);
        let travel_y = (self.height - self.block).max(1);
        let x = (index as u32 * STEP_X) % travel_x;
        let y = (index as u32 * STEP_Y) % travel_y;
        (x, y)
    }
}

impl VideoSource for SyntheticSource {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let (bx, by) = self.block_origin(self.index);
        let mut data = vec![BACKGROUND_LUMA; (self.width * self.height * 3) as usize];
        for y in by..(by + self.block).min(self.height) {
            for x in bx..(bx + self.block).min(self.width) {
                let offset = ((y * self.width + x) * 3) as usize;
                data[offset..offset + 3].fill(BLOCK_LUMA);
            }
        }
        let frame = Frame::new(data, self.width, self.height, 3, self.index);
        self.index += 1;
        Ok(Some(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_requested_dimensions() {
        let source = SyntheticSource::new(320, 240);
        assert_eq!(source.dimensions(), (320, 240));
    }

    #[test]
    fn test_block_is_brighter_than_background() {
        let mut source = SyntheticSource::new(64, 64);
        let frame = source.next_frame().unwrap().unwrap();
        // First frame places the block at the origin
        assert_eq!(frame.as_ndarray()[[0, 0, 0]], BLOCK_LUMA);
        assert_eq!(frame.as_ndarray()[[63, 63, 0]], BACKGROUND_LUMA);
    }

    #[test]
    fn test_consecutive_frames_differ() {
        let mut source = SyntheticSource::new(64, 64);
        let first = source.next_frame().unwrap().unwrap();
        let second = source.next_frame().unwrap().unwrap();
        assert_ne!(first.data(), second.data());
        assert_eq!(first.index(), 0);
        assert_eq!(second.index(), 1);
    }

    #[test]
    fn test_never_exhausts() {
        let mut source = SyntheticSource::new(32, 32);
        for _ in 0..100 {
            assert!(source.next_frame().unwrap().is_some());
        }
    }

    #[test]
    fn test_same_index_is_reproducible() {
        let mut a = SyntheticSource::new(48, 48);
        let mut b = SyntheticSource::new(48, 48);
        for _ in 0..5 {
            let fa = a.next_frame().unwrap().unwrap();
            let fb = b.next_frame().unwrap().unwrap();
            assert_eq!(fa.data(), fb.data());
        }
    }
}

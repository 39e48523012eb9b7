use crate::motion::domain::motion_detector::{MotionDetector, MotionSample};
use crate::shared::frame::Frame;
use crate::shared::geometry::BoundingBox;

/// Default grid-cell edge length in pixels.
pub const DEFAULT_CELL_SIZE: u32 = 8;

/// Default per-cell intensity delta considered a change.
pub const DEFAULT_PIXEL_THRESHOLD: u8 = 25;

/// Default changed-cell fraction that raises the trigger.
pub const DEFAULT_TRIGGER_RATIO: f32 = 0.02;

/// Frame-differencing motion detector.
///
/// Reduces each frame to a downsampled grayscale grid (one averaged luma
/// value per `cell_size` square) and compares cells against the previous
/// frame's grid. The changed-cell fraction is the motion level; crossing
/// `trigger_ratio` raises the trigger and reports the bounding box of the
/// changed cells. The first frame only establishes the baseline.
pub struct FrameDiffDetector {
    cell_size: u32,
    pixel_threshold: u8,
    trigger_ratio: f32,
    prev: Option<GrayGrid>,
}

struct GrayGrid {
    cells: Vec<u8>,
    cols: u32,
    rows: u32,
    frame_width: u32,
    frame_height: u32,
}

impl FrameDiffDetector {
    pub fn new(
        cell_size: u32,
        pixel_threshold: u8,
        trigger_ratio: f32,
    ) -> Result<Self, &'static str> {
        if cell_size == 0 {
            return Err("cell_size must be at least 1");
        }
        if !(trigger_ratio > 0.0 && trigger_ratio <= 1.0) {
            return Err("trigger_ratio must be in (0, 1]");
        }
        Ok(Self {
            cell_size,
            pixel_threshold,
            trigger_ratio,
            prev: None,
        })
    }

    fn grid(&self, frame: &Frame) -> GrayGrid {
        let cell = self.cell_size;
        let cols = frame.width().div_ceil(cell);
        let rows = frame.height().div_ceil(cell);
        let data = frame.data();
        let channels = frame.channels() as usize;
        let stride = frame.width() as usize * channels;

        let mut cells = Vec::with_capacity((cols * rows) as usize);
        for row in 0..rows {
            for col in 0..cols {
                let x0 = (col * cell) as usize;
                let y0 = (row * cell) as usize;
                let x1 = ((col + 1) * cell).min(frame.width()) as usize;
                let y1 = ((row + 1) * cell).min(frame.height()) as usize;

                let mut sum: u32 = 0;
                for y in y0..y1 {
                    for x in x0..x1 {
                        let base = y * stride + x * channels;
                        // Integer luma approximation of Rec. 601 weights
                        let luma = (data[base] as u32 * 77
                            + data[base + 1] as u32 * 150
                            + data[base + 2] as u32 * 29)
                            >> 8;
                        sum += luma;
                    }
                }
                let count = ((x1 - x0) * (y1 - y0)) as u32;
                cells.push((sum / count.max(1)) as u8);
            }
        }

        GrayGrid {
            cells,
            cols,
            rows,
            frame_width: frame.width(),
            frame_height: frame.height(),
        }
    }
}

impl Default for FrameDiffDetector {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            pixel_threshold: DEFAULT_PIXEL_THRESHOLD,
            trigger_ratio: DEFAULT_TRIGGER_RATIO,
            prev: None,
        }
    }
}

impl MotionDetector for FrameDiffDetector {
    fn sample(&mut self, frame: &Frame) -> MotionSample {
        let current = self.grid(frame);

        let Some(prev) = self.prev.as_ref() else {
            self.prev = Some(current);
            return MotionSample::still();
        };
        if prev.cols != current.cols || prev.rows != current.rows {
            // Resolution changed; the old baseline is meaningless
            log::debug!("motion baseline reset: grid {}x{} -> {}x{}",
                prev.cols, prev.rows, current.cols, current.rows);
            self.prev = Some(current);
            return MotionSample::still();
        }

        let mut changed = 0u32;
        let mut min_col = u32::MAX;
        let mut max_col = 0u32;
        let mut min_row = u32::MAX;
        let mut max_row = 0u32;
        for row in 0..current.rows {
            for col in 0..current.cols {
                let i = (row * current.cols + col) as usize;
                let delta = current.cells[i].abs_diff(prev.cells[i]);
                if delta > self.pixel_threshold {
                    changed += 1;
                    min_col = min_col.min(col);
                    max_col = max_col.max(col);
                    min_row = min_row.min(row);
                    max_row = max_row.max(row);
                }
            }
        }

        let total = (current.cols * current.rows).max(1);
        let level = changed as f32 / total as f32;
        let triggered = level >= self.trigger_ratio;
        let region = if triggered {
            Some(
                BoundingBox::from_corners(
                    (min_col * self.cell_size) as f32,
                    (min_row * self.cell_size) as f32,
                    ((max_col + 1) * self.cell_size) as f32,
                    ((max_row + 1) * self.cell_size) as f32,
                )
                .clamped(current.frame_width, current.frame_height),
            )
        } else {
            None
        };

        self.prev = Some(current);
        MotionSample {
            level,
            triggered,
            region,
        }
    }

    fn reset(&mut self) {
        self.prev = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn flat_frame(width: u32, height: u32, value: u8) -> Frame {
        Frame::new(vec![value; (width * height * 3) as usize], width, height, 3, 0)
    }

    /// Frame that is dark except for a bright square at (x0, y0)..(x1, y1).
    fn frame_with_block(width: u32, height: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> Frame {
        let mut data = vec![10u8; (width * height * 3) as usize];
        for y in y0..y1 {
            for x in x0..x1 {
                let base = ((y * width + x) * 3) as usize;
                data[base] = 250;
                data[base + 1] = 250;
                data[base + 2] = 250;
            }
        }
        Frame::new(data, width, height, 3, 0)
    }

    #[rstest]
    #[case::zero_cell(0, 25, 0.1)]
    #[case::zero_ratio(8, 25, 0.0)]
    #[case::ratio_above_one(8, 25, 1.5)]
    fn test_new_rejects_invalid_params(
        #[case] cell: u32,
        #[case] thresh: u8,
        #[case] ratio: f32,
    ) {
        assert!(FrameDiffDetector::new(cell, thresh, ratio).is_err());
    }

    #[test]
    fn test_first_frame_is_baseline_only() {
        let mut detector = FrameDiffDetector::new(4, 25, 0.02).unwrap();
        let sample = detector.sample(&flat_frame(32, 32, 100));
        assert_eq!(sample, MotionSample::still());
    }

    #[test]
    fn test_identical_frames_report_no_motion() {
        let mut detector = FrameDiffDetector::new(4, 25, 0.02).unwrap();
        detector.sample(&flat_frame(32, 32, 100));
        let sample = detector.sample(&flat_frame(32, 32, 100));
        assert_relative_eq!(sample.level, 0.0);
        assert!(!sample.triggered);
        assert!(sample.region.is_none());
    }

    #[test]
    fn test_full_frame_change_reports_level_one() {
        let mut detector = FrameDiffDetector::new(4, 25, 0.02).unwrap();
        detector.sample(&flat_frame(32, 32, 10));
        let sample = detector.sample(&flat_frame(32, 32, 200));
        assert_relative_eq!(sample.level, 1.0);
        assert!(sample.triggered);
    }

    #[test]
    fn test_moving_block_triggers_with_local_region() {
        let mut detector = FrameDiffDetector::new(4, 25, 0.02).unwrap();
        detector.sample(&flat_frame(64, 64, 10));
        // Bright 16x16 block appears in the top-left quadrant
        let sample = detector.sample(&frame_with_block(64, 64, 8, 8, 24, 24));

        assert!(sample.triggered);
        let region = sample.region.expect("triggered sample carries a region");
        // Region covers the block, aligned to 4px cells
        assert!(region.x <= 8.0 && region.right() >= 24.0);
        assert!(region.y <= 8.0 && region.bottom() >= 24.0);
        assert!(region.width <= 32.0, "region should stay local to the block");
        // 4x4 changed cells out of 16x16
        assert_relative_eq!(sample.level, 16.0 / 256.0, epsilon = 1e-6);
    }

    #[test]
    fn test_sub_threshold_change_does_not_trigger() {
        // Trigger needs 50% of cells; a small block changes far fewer
        let mut detector = FrameDiffDetector::new(4, 25, 0.5).unwrap();
        detector.sample(&flat_frame(64, 64, 10));
        let sample = detector.sample(&frame_with_block(64, 64, 0, 0, 8, 8));
        assert!(sample.level > 0.0);
        assert!(!sample.triggered);
        assert!(sample.region.is_none());
    }

    #[test]
    fn test_resolution_change_resets_baseline() {
        let mut detector = FrameDiffDetector::new(4, 25, 0.02).unwrap();
        detector.sample(&flat_frame(32, 32, 10));
        let sample = detector.sample(&flat_frame(64, 64, 250));
        assert_eq!(sample, MotionSample::still());
    }

    #[test]
    fn test_reset_forgets_baseline() {
        let mut detector = FrameDiffDetector::new(4, 25, 0.02).unwrap();
        detector.sample(&flat_frame(32, 32, 10));
        detector.reset();
        let sample = detector.sample(&flat_frame(32, 32, 250));
        assert_eq!(sample, MotionSample::still());
    }

    #[test]
    fn test_intensity_drop_counts_as_change() {
        let mut detector = FrameDiffDetector::new(4, 25, 0.02).unwrap();
        detector.sample(&flat_frame(32, 32, 200));
        let sample = detector.sample(&flat_frame(32, 32, 10));
        assert_relative_eq!(sample.level, 1.0);
    }
}

use std::time::Instant;

use crate::detection::domain::face_analyzer::FaceAnalyzer;
use crate::detection::domain::face_record::FaceRecord;
use crate::overlay::canvas::OverlayCanvas;
use crate::overlay::font::OverlayFont;
use crate::overlay::renderer::{self, RenderOptions};
use crate::shared::frame::Frame;

/// Why a cycle did not run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    ModelsNotReady,
    DetectionDisabled,
    NoFrame,
    NoSurface,
}

/// What one scheduled cycle did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A precondition failed. Nothing ran and nothing changed.
    Skipped(SkipReason),
    /// Analysis ran and the published records and overlay are fresh.
    Completed { faces: usize },
    /// The analyzer failed. The previously published records and the
    /// previously rendered overlay are left as they were.
    Failed,
}

/// One detection-and-render cycle, driven at a fixed cadence by the host.
///
/// Sole writer of the published face records and of the overlay surface.
/// Hosts hand it a frame and a surface each tick; everything between the
/// analyzer call and the redraw happens synchronously inside `run_cycle`,
/// so cycles can never overlap on the same surface.
pub struct DetectionLoop {
    analyzer: Box<dyn FaceAnalyzer>,
    min_confidence: f32,
    records: Vec<FaceRecord>,
}

impl DetectionLoop {
    pub fn new(analyzer: Box<dyn FaceAnalyzer>, min_confidence: f32) -> Self {
        Self {
            analyzer,
            min_confidence: min_confidence.clamp(0.0, 1.0),
            records: Vec::new(),
        }
    }

    /// Records published by the most recent successful cycle.
    pub fn records(&self) -> &[FaceRecord] {
        &self.records
    }

    /// Published face count. Always equals `records().len()`.
    pub fn face_count(&self) -> usize {
        self.records.len()
    }

    pub fn min_confidence(&self) -> f32 {
        self.min_confidence
    }

    /// Runs one cycle against the given frame and surface.
    ///
    /// Precondition failures are silent no-ops. On success the record
    /// collection is replaced wholesale (an empty result empties it) and
    /// the overlay is redrawn from scratch. On analyzer failure the error
    /// is logged and previously published state stays visible.
    pub fn run_cycle(
        &mut self,
        models_ready: bool,
        detection_enabled: bool,
        frame: Option<&Frame>,
        surface: Option<&mut OverlayCanvas>,
        options: &RenderOptions,
        font: Option<&OverlayFont>,
    ) -> CycleOutcome {
        if !models_ready {
            return CycleOutcome::Skipped(SkipReason::ModelsNotReady);
        }
        if !detection_enabled {
            return CycleOutcome::Skipped(SkipReason::DetectionDisabled);
        }
        let Some(frame) = frame else {
            return CycleOutcome::Skipped(SkipReason::NoFrame);
        };
        let Some(surface) = surface else {
            return CycleOutcome::Skipped(SkipReason::NoSurface);
        };

        // The surface follows the video size before anything is drawn
        surface.match_dimensions(frame.width(), frame.height());

        let started = Instant::now();
        match self.analyzer.analyze(frame, self.min_confidence) {
            Ok(detections) => {
                self.records = detections.iter().map(FaceRecord::from_detection).collect();
                renderer::render(surface, &detections, &self.records, options, font);
                log::debug!(
                    "cycle: {} face(s) in {:.0?}",
                    detections.len(),
                    started.elapsed()
                );
                CycleOutcome::Completed {
                    faces: detections.len(),
                }
            }
            Err(err) => {
                log::warn!("detection cycle failed: {err}");
                CycleOutcome::Failed
            }
        }
    }
}

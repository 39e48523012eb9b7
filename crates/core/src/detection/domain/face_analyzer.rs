use crate::detection::domain::face_detection::FaceDetection;
use crate::shared::frame::Frame;

/// Finds faces in a frame and attributes each with landmarks, expression
/// probabilities, age and gender.
///
/// The seam between the pipeline and model inference: production
/// implementations run trained networks, tests substitute stubs returning
/// fixed detections. `min_confidence` filters face candidates before any
/// attribute inference runs.
pub trait FaceAnalyzer: Send {
    fn analyze(
        &mut self,
        frame: &Frame,
        min_confidence: f32,
    ) -> Result<Vec<FaceDetection>, Box<dyn std::error::Error>>;
}

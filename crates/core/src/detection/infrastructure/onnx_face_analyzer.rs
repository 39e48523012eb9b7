/// Face analyzer backed by ONNX Runtime via `ort`.
///
/// Runs a four-stage cascade: whole-frame face detection with NMS, then
/// landmark, expression, and age/gender heads on an expanded crop of each
/// accepted candidate. Sessions are built from a resolved [`ModelSet`];
/// the recognition artifact in the set has no session here because the
/// pipeline never executes it.
use std::path::Path;

use crate::detection::domain::expression::ExpressionScores;
use crate::detection::domain::face_analyzer::FaceAnalyzer;
use crate::detection::domain::face_detection::{FaceDetection, Gender};
use crate::detection::infrastructure::model_set::{ModelArtifact, ModelSet};
use crate::shared::constants::LANDMARK_POINT_COUNT;
use crate::shared::frame::Frame;
use crate::shared::geometry::{BoundingBox, Point2};

/// Detector input resolution (square, stretched; no letterboxing).
const DETECTOR_INPUT_SIZE: u32 = 320;

/// Landmark head input resolution.
const LANDMARK_INPUT_SIZE: u32 = 112;

/// Expression head input resolution.
const EXPRESSION_INPUT_SIZE: u32 = 64;

/// Age/gender head input resolution.
const AGE_GENDER_INPUT_SIZE: u32 = 64;

/// NMS IoU threshold for detector candidates.
const NMS_IOU_THRESH: f32 = 0.45;

/// Margin added around a detection box before attribute crops, as a
/// fraction of the box size on each side.
const CROP_MARGIN: f32 = 0.2;

pub struct OnnxFaceAnalyzer {
    detector: ort::session::Session,
    landmarks: ort::session::Session,
    expression: ort::session::Session,
    age_gender: ort::session::Session,
}

impl OnnxFaceAnalyzer {
    /// Builds sessions for the four heads the pipeline executes.
    pub fn new(models: &ModelSet) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            detector: load_session(models.path(ModelArtifact::Detector))?,
            landmarks: load_session(models.path(ModelArtifact::Landmarks))?,
            expression: load_session(models.path(ModelArtifact::Expression))?,
            age_gender: load_session(models.path(ModelArtifact::AgeGender))?,
        })
    }

    /// Whole-frame detection: stretch-resize, run the detector, decode the
    /// score/box outputs, suppress overlaps.
    fn detect_faces(
        &mut self,
        frame: &Frame,
        min_confidence: f32,
    ) -> Result<Vec<(BoundingBox, f32)>, Box<dyn std::error::Error>> {
        let input = resize_to_tensor(frame, DETECTOR_INPUT_SIZE);
        let input_value = ort::value::Tensor::from_array(input)?;
        let outputs = self.detector.run(ort::inputs![input_value])?;
        if outputs.len() < 2 {
            return Err("face detector must produce score and box outputs".into());
        }

        // outputs: scores [1, N], boxes [1, N, 4] with normalized corners
        let scores = outputs[0].try_extract_array::<f32>()?;
        let boxes = outputs[1].try_extract_array::<f32>()?;
        let scores = scores.as_slice().ok_or("cannot get score tensor slice")?;
        let boxes = boxes.as_slice().ok_or("cannot get box tensor slice")?;
        if boxes.len() != scores.len() * 4 {
            return Err(format!(
                "detector output mismatch: {} scores vs {} box values",
                scores.len(),
                boxes.len()
            )
            .into());
        }

        let candidates = decode_detections(
            scores,
            boxes,
            frame.width(),
            frame.height(),
            min_confidence,
        );
        Ok(nms(candidates, NMS_IOU_THRESH))
    }

    /// Landmark head: 136 values in [0,1] relative to the crop, mapped back
    /// into source-frame coordinates.
    fn infer_landmarks(
        &mut self,
        crop: &Frame,
        crop_rect: &BoundingBox,
    ) -> Result<Vec<Point2>, Box<dyn std::error::Error>> {
        let input = resize_to_tensor(crop, LANDMARK_INPUT_SIZE);
        let input_value = ort::value::Tensor::from_array(input)?;
        let outputs = self.landmarks.run(ort::inputs![input_value])?;
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let values = tensor.as_slice().ok_or("cannot get landmark tensor slice")?;
        if values.len() != LANDMARK_POINT_COUNT * 2 {
            return Err(format!(
                "landmark head produced {} values, expected {}",
                values.len(),
                LANDMARK_POINT_COUNT * 2
            )
            .into());
        }
        Ok(map_crop_points(values, crop_rect))
    }

    fn infer_expression(
        &mut self,
        crop: &Frame,
    ) -> Result<ExpressionScores, Box<dyn std::error::Error>> {
        let input = resize_to_tensor(crop, EXPRESSION_INPUT_SIZE);
        let input_value = ort::value::Tensor::from_array(input)?;
        let outputs = self.expression.run(ort::inputs![input_value])?;
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let logits = tensor.as_slice().ok_or("cannot get expression tensor slice")?;
        if logits.len() != 7 {
            return Err(format!("expression head produced {} logits, expected 7", logits.len()).into());
        }
        let probs = softmax(logits);
        let mut values = [0.0f32; 7];
        values.copy_from_slice(&probs);
        Ok(ExpressionScores::new(values))
    }

    /// Age/gender head: age in years as output 0, gender logits
    /// `[male, female]` as output 1.
    fn infer_age_gender(
        &mut self,
        crop: &Frame,
    ) -> Result<(f32, Gender), Box<dyn std::error::Error>> {
        let input = resize_to_tensor(crop, AGE_GENDER_INPUT_SIZE);
        let input_value = ort::value::Tensor::from_array(input)?;
        let outputs = self.age_gender.run(ort::inputs![input_value])?;
        if outputs.len() < 2 {
            return Err("age/gender head must produce age and gender outputs".into());
        }

        let age_tensor = outputs[0].try_extract_array::<f32>()?;
        let age = *age_tensor
            .as_slice()
            .and_then(|s| s.first())
            .ok_or("age output is empty")?;

        let gender_tensor = outputs[1].try_extract_array::<f32>()?;
        let logits = gender_tensor.as_slice().ok_or("cannot get gender tensor slice")?;
        if logits.len() != 2 {
            return Err(format!("gender output has {} logits, expected 2", logits.len()).into());
        }
        let probs = softmax(logits);
        let gender = if probs[0] >= probs[1] {
            Gender::Male
        } else {
            Gender::Female
        };

        Ok((age.max(0.0), gender))
    }
}

impl FaceAnalyzer for OnnxFaceAnalyzer {
    fn analyze(
        &mut self,
        frame: &Frame,
        min_confidence: f32,
    ) -> Result<Vec<FaceDetection>, Box<dyn std::error::Error>> {
        let started = std::time::Instant::now();
        let candidates = self.detect_faces(frame, min_confidence)?;

        let mut detections = Vec::with_capacity(candidates.len());
        for (bounding_box, score) in candidates {
            let crop_box = expanded_crop_box(&bounding_box, frame.width(), frame.height());
            let (cx, cy, cw, ch) = crop_box.to_pixel_rect();
            let Some(crop) = frame.crop(cx, cy, cw, ch) else {
                // Degenerate candidate entirely outside the frame
                continue;
            };
            let crop_rect = BoundingBox::new(
                cx.max(0) as f32,
                cy.max(0) as f32,
                crop.width() as f32,
                crop.height() as f32,
            );

            let landmarks = self.infer_landmarks(&crop, &crop_rect)?;
            let expressions = self.infer_expression(&crop)?;
            let (age, gender) = self.infer_age_gender(&crop)?;

            detections.push(FaceDetection {
                bounding_box: bounding_box.clamped(frame.width(), frame.height()),
                landmarks,
                expressions,
                age,
                gender,
                score,
            });
        }

        log::debug!(
            "frame {}: {} faces in {:?}",
            frame.index(),
            detections.len(),
            started.elapsed()
        );
        Ok(detections)
    }
}

fn load_session(path: &Path) -> Result<ort::session::Session, Box<dyn std::error::Error>> {
    Ok(ort::session::Session::builder()?.commit_from_file(path)?)
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Stretch-resize a frame to `size` x `size` and normalize to [0,1] as an
/// NCHW float32 tensor. Nearest-neighbor sampling; aspect ratio is not
/// preserved (all four heads take stretched inputs).
fn resize_to_tensor(frame: &Frame, size: u32) -> ndarray::Array4<f32> {
    let src = frame.as_ndarray(); // [H, W, C] u8
    let src_w = frame.width() as usize;
    let src_h = frame.height() as usize;
    let target = size as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, target, target));
    for y in 0..target {
        let src_y = (y * src_h / target).min(src_h - 1);
        for x in 0..target {
            let src_x = (x * src_w / target).min(src_w - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }
    tensor
}

/// Numerically stable softmax.
fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|v| v / sum).collect()
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Turn raw detector outputs into pixel-space candidates.
///
/// `boxes` holds normalized `[x1, y1, x2, y2]` per score. Entries below
/// `min_confidence` and boxes that collapse to zero area are dropped.
fn decode_detections(
    scores: &[f32],
    boxes: &[f32],
    frame_width: u32,
    frame_height: u32,
    min_confidence: f32,
) -> Vec<(BoundingBox, f32)> {
    let fw = frame_width as f32;
    let fh = frame_height as f32;

    let mut candidates = Vec::new();
    for (i, &score) in scores.iter().enumerate() {
        if score < min_confidence {
            continue;
        }
        let b = &boxes[i * 4..i * 4 + 4];
        let x1 = b[0].clamp(0.0, 1.0) * fw;
        let y1 = b[1].clamp(0.0, 1.0) * fh;
        let x2 = b[2].clamp(0.0, 1.0) * fw;
        let y2 = b[3].clamp(0.0, 1.0) * fh;
        let bbox = BoundingBox::from_corners(x1, y1, x2, y2);
        if bbox.area() <= 0.0 {
            continue;
        }
        candidates.push((bbox, score));
    }
    candidates
}

/// Greedy NMS: sort by confidence descending, suppress overlapping boxes.
fn nms(mut candidates: Vec<(BoundingBox, f32)>, iou_thresh: f32) -> Vec<(BoundingBox, f32)> {
    candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut keep: Vec<(BoundingBox, f32)> = Vec::new();
    for (bbox, score) in candidates {
        if keep.iter().all(|(kept, _)| kept.iou(&bbox) <= iou_thresh) {
            keep.push((bbox, score));
        }
    }
    keep
}

/// Expand a detection box by [`CROP_MARGIN`] on every side and clamp to the
/// frame, giving the attribute heads context around the face.
fn expanded_crop_box(bbox: &BoundingBox, frame_width: u32, frame_height: u32) -> BoundingBox {
    let mx = bbox.width * CROP_MARGIN;
    let my = bbox.height * CROP_MARGIN;
    BoundingBox::from_corners(
        bbox.x - mx,
        bbox.y - my,
        bbox.right() + mx,
        bbox.bottom() + my,
    )
    .clamped(frame_width, frame_height)
}

/// Map crop-relative normalized coordinate pairs into frame coordinates.
fn map_crop_points(values: &[f32], crop_rect: &BoundingBox) -> Vec<Point2> {
    values
        .chunks_exact(2)
        .map(|pair| {
            Point2::new(
                crop_rect.x + pair[0] * crop_rect.width,
                crop_rect.y + pair[1] * crop_rect.height,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_resize_to_tensor_shape_and_normalization() {
        let data = vec![255u8; 10 * 4 * 3];
        let frame = Frame::new(data, 10, 4, 3, 0);
        let tensor = resize_to_tensor(&frame, 8);
        assert_eq!(tensor.shape(), &[1, 3, 8, 8]);
        assert_relative_eq!(tensor[[0, 0, 0, 0]], 1.0);
        assert_relative_eq!(tensor[[0, 2, 7, 7]], 1.0);
    }

    #[test]
    fn test_resize_to_tensor_stretches_both_axes() {
        // 2x1 frame: left pixel red, right pixel blue
        let data = vec![255, 0, 0, 0, 0, 255];
        let frame = Frame::new(data, 2, 1, 3, 0);
        let tensor = resize_to_tensor(&frame, 4);
        // Left half samples the red pixel
        assert_relative_eq!(tensor[[0, 0, 0, 0]], 1.0);
        assert_relative_eq!(tensor[[0, 2, 0, 0]], 0.0);
        // Right half samples the blue pixel
        assert_relative_eq!(tensor[[0, 0, 0, 3]], 0.0);
        assert_relative_eq!(tensor[[0, 2, 0, 3]], 1.0);
    }

    #[test]
    fn test_softmax_sums_to_one_and_orders() {
        let probs = softmax(&[1.0, 3.0, 2.0]);
        let sum: f32 = probs.iter().sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-6);
        assert!(probs[1] > probs[2] && probs[2] > probs[0]);
    }

    #[test]
    fn test_softmax_stable_for_large_logits() {
        let probs = softmax(&[1000.0, 1000.0]);
        assert_relative_eq!(probs[0], 0.5, epsilon = 1e-6);
        assert_relative_eq!(probs[1], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_decode_detections_scales_and_filters() {
        let scores = [0.9, 0.3];
        // First box: quarter of the frame; second would pass geometry but
        // fails the confidence cut
        let boxes = [0.0, 0.0, 0.5, 0.5, 0.1, 0.1, 0.9, 0.9];
        let candidates = decode_detections(&scores, &boxes, 200, 100, 0.5);
        assert_eq!(candidates.len(), 1);
        let (bbox, score) = candidates[0];
        assert_relative_eq!(score, 0.9);
        assert_relative_eq!(bbox.x, 0.0);
        assert_relative_eq!(bbox.width, 100.0);
        assert_relative_eq!(bbox.height, 50.0);
    }

    #[test]
    fn test_decode_detections_drops_collapsed_boxes() {
        let scores = [0.9];
        let boxes = [0.5, 0.5, 0.5, 0.5]; // zero-area box
        let candidates = decode_detections(&scores, &boxes, 100, 100, 0.5);
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_decode_detections_clamps_out_of_range_coords() {
        let scores = [0.9];
        let boxes = [-0.2, -0.2, 1.5, 0.5];
        let candidates = decode_detections(&scores, &boxes, 100, 100, 0.5);
        assert_eq!(candidates.len(), 1);
        let (bbox, _) = candidates[0];
        assert_relative_eq!(bbox.x, 0.0);
        assert_relative_eq!(bbox.right(), 100.0);
    }

    #[test]
    fn test_nms_suppresses_overlapping_keeps_highest() {
        let candidates = vec![
            (BoundingBox::new(0.0, 0.0, 100.0, 100.0), 0.8),
            (BoundingBox::new(5.0, 5.0, 100.0, 100.0), 0.9),
        ];
        let kept = nms(candidates, 0.3);
        assert_eq!(kept.len(), 1);
        assert_relative_eq!(kept[0].1, 0.9);
    }

    #[test]
    fn test_nms_keeps_non_overlapping() {
        let candidates = vec![
            (BoundingBox::new(0.0, 0.0, 50.0, 50.0), 0.9),
            (BoundingBox::new(200.0, 200.0, 50.0, 50.0), 0.8),
        ];
        let kept = nms(candidates, 0.3);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_nms_empty_input() {
        assert!(nms(Vec::new(), 0.3).is_empty());
    }

    #[test]
    fn test_expanded_crop_box_adds_margin() {
        let bbox = BoundingBox::new(100.0, 100.0, 50.0, 100.0);
        let crop = expanded_crop_box(&bbox, 1000, 1000);
        assert_relative_eq!(crop.x, 90.0);
        assert_relative_eq!(crop.y, 80.0);
        assert_relative_eq!(crop.width, 70.0);
        assert_relative_eq!(crop.height, 140.0);
    }

    #[test]
    fn test_expanded_crop_box_clamps_at_frame_edge() {
        let bbox = BoundingBox::new(0.0, 0.0, 50.0, 50.0);
        let crop = expanded_crop_box(&bbox, 100, 100);
        assert_relative_eq!(crop.x, 0.0);
        assert_relative_eq!(crop.y, 0.0);
        assert_relative_eq!(crop.right(), 60.0);
    }

    #[test]
    fn test_map_crop_points() {
        let crop = BoundingBox::new(10.0, 20.0, 100.0, 50.0);
        let points = map_crop_points(&[0.0, 0.0, 0.5, 0.5, 1.0, 1.0], &crop);
        assert_eq!(points.len(), 3);
        assert_relative_eq!(points[0].x, 10.0);
        assert_relative_eq!(points[1].x, 60.0);
        assert_relative_eq!(points[1].y, 45.0);
        assert_relative_eq!(points[2].y, 70.0);
    }
}

use std::fmt;

use serde::Serialize;

use crate::detection::domain::expression::ExpressionScores;
use crate::shared::geometry::{BoundingBox, Point2};

/// Gender label produced by the age/gender head.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    /// Kept for analyzer generality; the current model always commits to
    /// one of the two classes.
    Unknown,
}

impl Gender {
    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Everything the analyzer reports about one face in one frame.
///
/// Ephemeral: produced fresh each detection cycle and owned by the cycle
/// that requested it. Nothing links a detection to the previous cycle's
/// detections; the pipeline replaces the whole collection every cycle.
#[derive(Clone, Debug)]
pub struct FaceDetection {
    /// Face extent in source-frame pixels.
    pub bounding_box: BoundingBox,
    /// Landmark points in source-frame pixels, in the reference-set order.
    pub landmarks: Vec<Point2>,
    /// Probability per expression category.
    pub expressions: ExpressionScores,
    /// Estimated age in years, non-negative.
    pub age: f32,
    pub gender: Gender,
    /// Detector confidence for the face candidate itself.
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_labels() {
        assert_eq!(Gender::Male.label(), "male");
        assert_eq!(Gender::Female.to_string(), "female");
        assert_eq!(Gender::Unknown.label(), "unknown");
    }

    #[test]
    fn test_detection_clone_is_deep() {
        let det = FaceDetection {
            bounding_box: BoundingBox::new(1.0, 2.0, 3.0, 4.0),
            landmarks: vec![Point2::new(1.5, 2.5)],
            expressions: ExpressionScores::default(),
            age: 30.0,
            gender: Gender::Female,
            score: 0.9,
        };
        let mut copy = det.clone();
        copy.landmarks.push(Point2::new(9.0, 9.0));
        assert_eq!(det.landmarks.len(), 1);
        assert_eq!(copy.landmarks.len(), 2);
    }
}

use serde::Serialize;

use crate::detection::domain::expression::emoji_for;
use crate::detection::domain::face_detection::{FaceDetection, Gender};

/// One expression category with its display-rounded probability.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoredExpression {
    pub name: &'static str,
    pub probability: f32,
}

/// Display-ready summary of one detected face.
///
/// Derived from a [`FaceDetection`] with the UI's rounding rules applied:
/// integer age, two-decimal probabilities, dominant category pre-selected.
/// The whole collection is replaced every cycle; an index into it carries
/// no identity across cycles.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FaceRecord {
    pub gender: Gender,
    pub age_years: u32,
    /// Dominant category, `None` when every probability is zero.
    pub dominant_expression: Option<&'static str>,
    /// All categories in model output order, probabilities rounded.
    pub expressions: Vec<ScoredExpression>,
}

impl FaceRecord {
    pub fn from_detection(detection: &FaceDetection) -> Self {
        let expressions = detection
            .expressions
            .iter()
            .map(|(e, p)| ScoredExpression {
                name: e.name(),
                probability: round2(p),
            })
            .collect();

        Self {
            gender: detection.gender,
            age_years: detection.age.max(0.0).round() as u32,
            dominant_expression: detection.expressions.dominant().map(|e| e.name()),
            expressions,
        }
    }

    /// Name of the dominant category, empty for the all-zero edge case.
    pub fn dominant_label(&self) -> &str {
        self.dominant_expression.unwrap_or("")
    }

    /// The two text lines shown in the per-face details panel:
    /// `<age> years, <gender>` and `<emoji> <expression>`.
    pub fn panel_lines(&self) -> [String; 2] {
        let label = self.dominant_label();
        let expression_line = format!("{} {}", emoji_for(label), label);
        [
            format!("{} years, {}", self.age_years, self.gender.label()),
            expression_line.trim_end().to_string(),
        ]
    }
}

/// Round to two decimal places, the precision shown in the UI.
pub fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::expression::ExpressionScores;
    use crate::shared::geometry::BoundingBox;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn detection(age: f32, gender: Gender, scores: [f32; 7]) -> FaceDetection {
        FaceDetection {
            bounding_box: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            landmarks: Vec::new(),
            expressions: ExpressionScores::new(scores),
            age,
            gender,
            score: 0.9,
        }
    }

    #[rstest]
    #[case::repeating_fraction(0.666667, 0.67)]
    #[case::round_down(0.664, 0.66)]
    #[case::exact(0.5, 0.5)]
    #[case::zero(0.0, 0.0)]
    #[case::one(1.0, 1.0)]
    fn test_round2(#[case] input: f32, #[case] expected: f32) {
        assert_relative_eq!(round2(input), expected);
    }

    #[rstest]
    #[case::round_up(23.6, 24)]
    #[case::round_down(23.4, 23)]
    #[case::half_up(23.5, 24)]
    #[case::negative_clamped(-0.3, 0)]
    fn test_age_rounds_to_integer(#[case] age: f32, #[case] expected: u32) {
        let record = FaceRecord::from_detection(&detection(age, Gender::Male, [0.0; 7]));
        assert_eq!(record.age_years, expected);
    }

    #[test]
    fn test_probabilities_rounded_to_two_decimals() {
        let mut scores = [0.0f32; 7];
        scores[0] = 0.666667; // neutral
        scores[1] = 0.123456; // happy
        let record = FaceRecord::from_detection(&detection(30.0, Gender::Female, scores));

        assert_eq!(record.expressions.len(), 7);
        assert_eq!(record.expressions[0].name, "neutral");
        assert_relative_eq!(record.expressions[0].probability, 0.67);
        assert_relative_eq!(record.expressions[1].probability, 0.12);
    }

    #[test]
    fn test_dominant_expression_selected() {
        let mut scores = [0.0f32; 7];
        scores[0] = 0.1; // neutral
        scores[1] = 0.7; // happy
        scores[2] = 0.2; // sad
        let record = FaceRecord::from_detection(&detection(30.0, Gender::Female, scores));
        assert_eq!(record.dominant_expression, Some("happy"));
        assert_eq!(record.dominant_label(), "happy");
    }

    #[test]
    fn test_all_zero_scores_publish_empty_label() {
        let record = FaceRecord::from_detection(&detection(30.0, Gender::Male, [0.0; 7]));
        assert_eq!(record.dominant_expression, None);
        assert_eq!(record.dominant_label(), "");
    }

    #[test]
    fn test_panel_lines() {
        let mut scores = [0.0f32; 7];
        scores[1] = 0.9; // happy
        let record = FaceRecord::from_detection(&detection(33.6, Gender::Female, scores));
        let [first, second] = record.panel_lines();
        assert_eq!(first, "34 years, female");
        assert_eq!(second, "😀 happy");
    }

    #[test]
    fn test_panel_lines_all_zero_fall_back_to_unknown_glyph() {
        let record = FaceRecord::from_detection(&detection(40.0, Gender::Male, [0.0; 7]));
        let [_, second] = record.panel_lines();
        assert_eq!(second, "❓");
    }

    #[test]
    fn test_serializes_to_json() {
        let mut scores = [0.0f32; 7];
        scores[1] = 0.5;
        let record = FaceRecord::from_detection(&detection(25.0, Gender::Male, scores));
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"gender\":\"male\""));
        assert!(json.contains("\"age_years\":25"));
        assert!(json.contains("\"dominant_expression\":\"happy\""));
        assert!(json.contains("\"name\":\"neutral\""));
    }
}

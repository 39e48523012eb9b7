pub mod expression;
pub mod face_analyzer;
pub mod face_detection;
pub mod face_record;

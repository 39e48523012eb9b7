/// Milliseconds between detection-cycle starts.
pub const CYCLE_PERIOD_MS: u64 = 1500;

/// Confidence threshold used for initial face-candidate filtering.
pub const DEFAULT_CONFIDENCE: f32 = 0.5;

/// Points in the face landmark reference set.
pub const LANDMARK_POINT_COUNT: usize = 68;

/// Release location the model artifacts download from on first run.
pub const MODEL_BASE_URL: &str =
    "https://github.com/lenslab-app/lenslab/releases/download/models-v1";

pub const DETECTOR_MODEL_NAME: &str = "face_detector_320.onnx";
pub const LANDMARK_MODEL_NAME: &str = "face_landmarks_68.onnx";
pub const RECOGNITION_MODEL_NAME: &str = "face_recognition_r50.onnx";
pub const EXPRESSION_MODEL_NAME: &str = "face_expression_7.onnx";
pub const AGE_GENDER_MODEL_NAME: &str = "age_gender.onnx";

/// Subdirectory of the OS cache directory holding downloaded artifacts.
pub const MODEL_CACHE_DIR: &str = "LensLab";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

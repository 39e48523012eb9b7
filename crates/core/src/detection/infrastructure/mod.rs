pub mod model_set;
pub mod onnx_face_analyzer;

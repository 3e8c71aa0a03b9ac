pub mod analysis_request;
pub mod detected_face;
pub mod face_analyzer;
pub mod service_error;

pub mod face_api_client;
pub mod retrying_face_analyzer;

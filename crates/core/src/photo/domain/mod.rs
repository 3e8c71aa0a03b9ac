pub mod frame_source;
pub mod photo_encoder;
pub mod photo_sink;

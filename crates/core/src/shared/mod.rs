pub mod captured_frame;
pub mod constants;
pub mod mirror_config;
pub mod mirror_error;

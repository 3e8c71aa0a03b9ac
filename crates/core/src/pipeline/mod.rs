pub mod mirror_controller;
pub mod photo_pipeline;

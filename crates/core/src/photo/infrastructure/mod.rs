pub mod analysis_sink;
pub mod jpeg_reencoder;
pub mod pictures_folder_sink;

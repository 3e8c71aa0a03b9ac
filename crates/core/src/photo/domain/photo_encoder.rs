use thiserror::Error;

use crate::shared::captured_frame::CapturedFrame;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("failed to decode captured photo: {0}")]
    Decode(#[source] image::ImageError),
    #[error("failed to encode photo: {0}")]
    Encode(#[source] image::ImageError),
}

/// Decodes a captured frame and re-encodes it with its orientation metadata.
pub trait PhotoEncoder: Send + Sync {
    fn reencode(&self, frame: &CapturedFrame) -> Result<Vec<u8>, EncodeError>;
}

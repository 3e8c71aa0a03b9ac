use crate::shared::mirror_error::MirrorError;

/// Source of single still photos, as encoded image bytes.
pub trait FrameSource: Send + Sync {
    fn capture_frame(&self) -> Result<Vec<u8>, MirrorError>;
}

use crate::shared::mirror_error::MirrorError;

/// Final destination of a re-encoded photo.
pub trait PhotoSink {
    type Output;

    fn deliver(&self, photo: &[u8]) -> Result<Self::Output, MirrorError>;
}

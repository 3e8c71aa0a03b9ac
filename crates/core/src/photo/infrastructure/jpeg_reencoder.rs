use image::codecs::jpeg::JpegEncoder;
use image::metadata::Orientation;
use image::{ImageEncoder, ImageError};

use crate::photo::domain::photo_encoder::{EncodeError, PhotoEncoder};
use crate::shared::captured_frame::CapturedFrame;
use crate::shared::constants::DEFAULT_JPEG_QUALITY;

/// Transcodes any decodable capture to JPEG using the `image` crate, with
/// the frame's orientation written to the Exif block.
pub struct JpegReencoder {
    quality: u8,
}

impl JpegReencoder {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }
}

impl Default for JpegReencoder {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl PhotoEncoder for JpegReencoder {
    fn reencode(&self, frame: &CapturedFrame) -> Result<Vec<u8>, EncodeError> {
        let img = image::load_from_memory(frame.data()).map_err(EncodeError::Decode)?;

        let mut encoded = Vec::with_capacity(frame.len());
        let mut encoder = JpegEncoder::new_with_quality(&mut encoded, self.quality);
        encoder
            .set_exif_metadata(orientation_exif(frame.orientation()))
            .map_err(|e| EncodeError::Encode(ImageError::Unsupported(e)))?;

        // JPEG has no alpha channel
        image::DynamicImage::ImageRgb8(img.to_rgb8())
            .write_with_encoder(encoder)
            .map_err(EncodeError::Encode)?;
        Ok(encoded)
    }
}

/// Big-endian TIFF header with a single IFD0 entry: Orientation (0x0112),
/// SHORT, count 1.
fn orientation_exif(orientation: Orientation) -> Vec<u8> {
    let mut tiff = Vec::with_capacity(26);
    tiff.extend_from_slice(b"MM");
    tiff.extend_from_slice(&42u16.to_be_bytes());
    tiff.extend_from_slice(&8u32.to_be_bytes());
    tiff.extend_from_slice(&1u16.to_be_bytes());
    tiff.extend_from_slice(&0x0112u16.to_be_bytes());
    tiff.extend_from_slice(&3u16.to_be_bytes());
    tiff.extend_from_slice(&1u32.to_be_bytes());
    // SHORT value left-justified in the 4-byte field
    tiff.extend_from_slice(&u16::from(orientation.to_exif()).to_be_bytes());
    tiff.extend_from_slice(&[0, 0]);
    // no next IFD
    tiff.extend_from_slice(&0u32.to_be_bytes());
    tiff
}

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crossbeam_channel::Sender;
use image::codecs::jpeg::JpegEncoder;
use image::ImageFormat;

use crate::camera::domain::camera_error::{CameraError, DeviceFailure};
use crate::camera::domain::capture_device::CaptureDevice;
use crate::camera::domain::device_info::DeviceInfo;
use crate::detection::domain::detection_event::DetectionEvent;
use crate::detection::domain::effect_definition::EffectDefinition;
use crate::detection::domain::face_presence::{ConstantPresence, FacePresence};
use crate::detection::infrastructure::polling_detection_effect::PollingDetectionEffect;
use crate::shared::constants::DEFAULT_JPEG_QUALITY;

/// Camera whose live stream always shows one image file.
///
/// The device id is the image path. The file is re-read on every capture, so
/// replacing it changes what the camera "sees". Deleting it, or losing read
/// access, behaves like unplugging the device and is reported as a fatal
/// [`DeviceFailure`]. A file that cannot be decoded only fails that capture.
pub struct StillImageCamera {
    presence: Option<Box<dyn FacePresence>>,
    jpeg_quality: u8,
    device_id: Option<String>,
    recording: bool,
    effect: Option<PollingDetectionEffect>,
    failures: Option<Sender<DeviceFailure>>,
}

impl StillImageCamera {
    pub fn new() -> Self {
        Self {
            presence: Some(Box::new(ConstantPresence(true))),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            device_id: None,
            recording: false,
            effect: None,
            failures: None,
        }
    }

    /// Replaces the default "face always present" answer.
    pub fn with_presence(mut self, presence: Box<dyn FacePresence>) -> Self {
        self.presence = Some(presence);
        self
    }

    /// Quality used when the source image has to be transcoded to JPEG.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    fn read_jpeg(&self, device_id: &str) -> Result<Vec<u8>, CameraError> {
        let path = Path::new(device_id);
        let bytes = fs::read(path).map_err(|e| open_error(device_id, path, e))?;

        match image::guess_format(&bytes) {
            Ok(ImageFormat::Jpeg) => Ok(bytes),
            Ok(_) => self.transcode(&bytes),
            Err(e) => Err(CameraError::Device(format!(
                "unrecognized image in {}: {e}",
                path.display()
            ))),
        }
    }

    fn transcode(&self, bytes: &[u8]) -> Result<Vec<u8>, CameraError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| CameraError::Device(format!("failed to decode image: {e}")))?;
        let mut out = Vec::new();
        image::DynamicImage::ImageRgb8(img.to_rgb8())
            .write_with_encoder(JpegEncoder::new_with_quality(&mut out, self.jpeg_quality))
            .map_err(|e| CameraError::Device(format!("failed to encode JPEG: {e}")))?;
        Ok(out)
    }

    fn report_failure(&self, device_id: &str, error: &CameraError) {
        if let Some(tx) = &self.failures {
            let _ = tx.send(DeviceFailure {
                device_id: device_id.to_string(),
                message: error.to_string(),
            });
        }
    }
}

impl Default for StillImageCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureDevice for StillImageCamera {
    fn initialize(
        &mut self,
        device: &DeviceInfo,
        failures: Sender<DeviceFailure>,
    ) -> Result<(), CameraError> {
        self.read_jpeg(&device.id)?;
        self.device_id = Some(device.id.clone());
        self.failures = Some(failures);
        Ok(())
    }

    fn start_recording(&mut self) -> Result<(), CameraError> {
        let device_id = self.device_id.as_ref().ok_or(CameraError::NotInitialized)?;
        log::debug!("Streaming still image {device_id}");
        self.recording = true;
        Ok(())
    }

    fn add_face_detection_effect(
        &mut self,
        definition: &EffectDefinition,
        events: Sender<DetectionEvent>,
    ) -> Result<(), CameraError> {
        if !self.recording {
            return Err(CameraError::NotRecording);
        }
        let presence = self
            .presence
            .take()
            .ok_or_else(|| CameraError::Device("face detection effect already attached".into()))?;
        self.effect = Some(PollingDetectionEffect::start(definition, presence, events));
        Ok(())
    }

    fn capture_photo(&mut self) -> Result<Vec<u8>, CameraError> {
        let device_id = self.device_id.clone().ok_or(CameraError::NotInitialized)?;
        match self.read_jpeg(&device_id) {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                if is_device_lost(&e) {
                    self.report_failure(&device_id, &e);
                }
                Err(e)
            }
        }
    }

    fn shutdown(&mut self) {
        if let Some(mut effect) = self.effect.take() {
            effect.stop();
        }
        self.recording = false;
    }
}

fn is_device_lost(error: &CameraError) -> bool {
    matches!(error, CameraError::NotFound(_) | CameraError::AccessDenied(_))
}

fn open_error(device_id: &str, path: &Path, e: std::io::Error) -> CameraError {
    match e.kind() {
        ErrorKind::PermissionDenied => CameraError::AccessDenied(device_id.to_string()),
        ErrorKind::NotFound => CameraError::NotFound(path.display().to_string()),
        _ => CameraError::Io(e),
    }
}

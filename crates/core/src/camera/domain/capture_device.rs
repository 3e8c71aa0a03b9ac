use crossbeam_channel::Sender;

use crate::camera::domain::camera_error::{CameraError, DeviceFailure};
use crate::camera::domain::device_info::DeviceInfo;
use crate::detection::domain::detection_event::DetectionEvent;
use crate::detection::domain::effect_definition::EffectDefinition;

/// Domain interface for a physical (or simulated) camera.
///
/// A session drives a device through `initialize` → `start_recording` →
/// `add_face_detection_effect`, then calls `capture_photo` any number of
/// times. Callers serialize access; implementations need not be re-entrant.
pub trait CaptureDevice: Send {
    /// Opens the device. Unrecoverable errors that happen later are sent on
    /// `failures` instead of being returned from a call.
    fn initialize(
        &mut self,
        device: &DeviceInfo,
        failures: Sender<DeviceFailure>,
    ) -> Result<(), CameraError>;

    /// Starts the live video stream.
    fn start_recording(&mut self) -> Result<(), CameraError>;

    /// Attaches a face detection stage to the live stream. Each detection is
    /// delivered on `events`.
    fn add_face_detection_effect(
        &mut self,
        definition: &EffectDefinition,
        events: Sender<DetectionEvent>,
    ) -> Result<(), CameraError>;

    /// Captures a single still photo as encoded JPEG bytes.
    fn capture_photo(&mut self) -> Result<Vec<u8>, CameraError>;

    /// Stops the effect and the stream. Default: no-op.
    fn shutdown(&mut self) {}
}

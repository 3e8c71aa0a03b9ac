use thiserror::Error;

use crate::analysis::domain::service_error::ServiceError;
use crate::camera::domain::camera_error::{CameraError, DeviceFailure};
use crate::photo::domain::photo_encoder::EncodeError;
use crate::photo::infrastructure::pictures_folder_sink::PersistError;

/// Caller-visible failure of a session or capture cycle operation.
#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("no video capture device available")]
    DeviceUnavailable,
    #[error("access to camera {device_id} was denied")]
    AccessDenied { device_id: String },
    #[error("capture failed: {0}")]
    Capture(#[source] CameraError),
    #[error("face analysis failed: {0}")]
    Service(#[from] ServiceError),
    #[error("camera session is not ready")]
    NotReady,
    #[error("face detection effect already started for this session")]
    EffectAlreadyStarted,
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error(transparent)]
    DeviceFailed(#[from] DeviceFailure),
}

impl From<CameraError> for MirrorError {
    fn from(e: CameraError) -> Self {
        match e {
            CameraError::AccessDenied(device_id) => MirrorError::AccessDenied { device_id },
            other => MirrorError::Capture(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_denied_keeps_its_own_kind() {
        let err: MirrorError = CameraError::AccessDenied("cam0".into()).into();
        assert!(matches!(err, MirrorError::AccessDenied { ref device_id } if device_id == "cam0"));
    }

    #[test]
    fn test_other_camera_errors_become_capture_errors() {
        let err: MirrorError = CameraError::Device("sensor timeout".into()).into();
        assert!(matches!(err, MirrorError::Capture(_)));
        assert!(err.to_string().contains("sensor timeout"));
    }
}

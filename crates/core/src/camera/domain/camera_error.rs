use thiserror::Error;

/// Errors raised by a capture device backend.
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("access denied to camera {0}")]
    AccessDenied(String),
    #[error("camera {0} not found")]
    NotFound(String),
    #[error("camera is not initialized")]
    NotInitialized,
    #[error("camera stream is not running")]
    NotRecording,
    #[error("camera I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Device(String),
}

/// Unrecoverable device failure reported after the session became ready.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("camera {device_id} failed: {message}")]
pub struct DeviceFailure {
    pub device_id: String,
    pub message: String,
}

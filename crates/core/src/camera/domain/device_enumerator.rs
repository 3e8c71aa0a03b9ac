use crate::camera::domain::camera_error::CameraError;
use crate::camera::domain::device_info::DeviceInfo;

/// Lists the video capture devices available to the process.
pub trait DeviceEnumerator: Send {
    fn find_all(&self) -> Result<Vec<DeviceInfo>, CameraError>;
}

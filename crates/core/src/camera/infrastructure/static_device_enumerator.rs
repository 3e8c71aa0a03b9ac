use crate::camera::domain::camera_error::CameraError;
use crate::camera::domain::device_enumerator::DeviceEnumerator;
use crate::camera::domain::device_info::DeviceInfo;

/// Reports a fixed, caller-supplied device list in order.
pub struct StaticDeviceEnumerator {
    devices: Vec<DeviceInfo>,
}

impl StaticDeviceEnumerator {
    pub fn new(devices: Vec<DeviceInfo>) -> Self {
        Self { devices }
    }
}

impl DeviceEnumerator for StaticDeviceEnumerator {
    fn find_all(&self) -> Result<Vec<DeviceInfo>, CameraError> {
        Ok(self.devices.clone())
    }
}

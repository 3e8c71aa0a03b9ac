pub mod camera_error;
pub mod camera_session;
pub mod capture_device;
pub mod device_enumerator;
pub mod device_info;

pub mod static_device_enumerator;
pub mod still_image_camera;

pub mod analysis;
pub mod camera;
pub mod detection;
pub mod photo;
pub mod pipeline;
pub mod shared;

pub const DEFAULT_PHOTO_NAME: &str = "SimplePhoto.jpeg";

/// Shortest interval between detection events the effect is asked for.
pub const DEFAULT_DETECTION_INTERVAL_MS: u64 = 200;

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

pub const FACE_API_KEY_ENV: &str = "PERSONAL_MIRROR_FACE_API_KEY";
pub const FACE_API_ENDPOINT_ENV: &str = "PERSONAL_MIRROR_FACE_API_ENDPOINT";
pub const DEFAULT_FACE_API_ENDPOINT: &str = "https://westus.api.cognitive.microsoft.com";
pub const FACE_API_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

pub const DEFAULT_ANALYSIS_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_ANALYSIS_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 500;
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 8000;

/// Give up on finding a free photo file name after this many suffixes.
pub const MAX_UNIQUE_NAME_ATTEMPTS: u32 = 10_000;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

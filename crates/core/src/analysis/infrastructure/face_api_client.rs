use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, CONTENT_TYPE, RETRY_AFTER};
use serde::Deserialize;

use crate::analysis::domain::analysis_request::AnalysisRequest;
use crate::analysis::domain::detected_face::DetectedFace;
use crate::analysis::domain::face_analyzer::FaceAnalyzer;
use crate::analysis::domain::service_error::ServiceError;
use crate::shared::constants::FACE_API_KEY_HEADER;

/// Blocking client for the Face API `detect` endpoint.
///
/// Sends raw image bytes as `application/octet-stream` and authenticates
/// with a subscription key header. Every request is bounded by `timeout`.
pub struct FaceApiClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl FaceApiClient {
    pub fn new(endpoint: &str, api_key: String, timeout: Duration) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn detect_url(&self, request: &AnalysisRequest) -> String {
        format!(
            "{}/face/v1.0/detect?returnFaceId={}&returnFaceLandmarks={}&returnFaceAttributes={}",
            self.endpoint,
            request.return_face_id,
            request.landmarks,
            request.attribute_names().join(",")
        )
    }
}

impl FaceAnalyzer for FaceApiClient {
    fn detect(
        &self,
        image: &[u8],
        request: &AnalysisRequest,
    ) -> Result<Vec<DetectedFace>, ServiceError> {
        let url = self.detect_url(request);
        log::debug!("Submitting {} bytes for face analysis", image.len());

        let response = self
            .client
            .post(&url)
            .header(FACE_API_KEY_HEADER, &self.api_key)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(image.to_vec())
            .send()
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers());
            let body = response.text().unwrap_or_default();
            return Err(ServiceError::from_status(
                status.as_u16(),
                retry_after,
                error_message(&body),
            ));
        }

        let body = response
            .bytes()
            .map_err(|e| ServiceError::Network(e.to_string()))?;
        parse_faces(&body)
    }
}

pub fn parse_faces(body: &[u8]) -> Result<Vec<DetectedFace>, ServiceError> {
    serde_json::from_slice(body).map_err(|e| ServiceError::Decode(e.to_string()))
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    message: String,
}

/// Pulls `error.message` out of the service's error envelope, falling back
/// to the raw body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope { error }) => match error.code {
            Some(code) => format!("{code}: {}", error.message),
            None => error.message,
        },
        Err(_) => body.trim().to_string(),
    }
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

use crate::analysis::domain::analysis_request::AnalysisRequest;
use crate::analysis::domain::detected_face::DetectedFace;
use crate::analysis::domain::service_error::ServiceError;

/// Remote face analysis: image bytes in, detected faces out.
pub trait FaceAnalyzer: Send + Sync {
    fn detect(
        &self,
        image: &[u8],
        request: &AnalysisRequest,
    ) -> Result<Vec<DetectedFace>, ServiceError>;
}

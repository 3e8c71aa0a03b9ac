use std::sync::Arc;

use crate::analysis::domain::analysis_request::AnalysisRequest;
use crate::analysis::domain::detected_face::DetectedFace;
use crate::analysis::domain::face_analyzer::FaceAnalyzer;
use crate::photo::domain::photo_sink::PhotoSink;
use crate::shared::mirror_error::MirrorError;

/// Submits photos to a face analyzer and hands back what it found.
pub struct AnalysisSink {
    analyzer: Arc<dyn FaceAnalyzer>,
    request: AnalysisRequest,
}

impl AnalysisSink {
    pub fn new(analyzer: Arc<dyn FaceAnalyzer>, request: AnalysisRequest) -> Self {
        Self { analyzer, request }
    }
}

impl PhotoSink for AnalysisSink {
    type Output = Vec<DetectedFace>;

    fn deliver(&self, photo: &[u8]) -> Result<Vec<DetectedFace>, MirrorError> {
        let faces = self.analyzer.detect(photo, &self.request)?;
        log::debug!("Face analysis found {} face(s)", faces.len());
        Ok(faces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::domain::detected_face::FaceRectangle;
    use crate::analysis::domain::service_error::ServiceError;
    use std::sync::Mutex;

    // --- Stubs ---

    struct RecordingAnalyzer {
        result: Result<Vec<DetectedFace>, ServiceError>,
        seen: Mutex<Vec<(Vec<u8>, AnalysisRequest)>>,
    }

    impl FaceAnalyzer for RecordingAnalyzer {
        fn detect(
            &self,
            image: &[u8],
            request: &AnalysisRequest,
        ) -> Result<Vec<DetectedFace>, ServiceError> {
            self.seen.lock().unwrap().push((image.to_vec(), *request));
            self.result.clone()
        }
    }

    fn face() -> DetectedFace {
        DetectedFace {
            face_id: None,
            face_rectangle: FaceRectangle {
                top: 10,
                left: 20,
                width: 30,
                height: 30,
            },
            face_landmarks: None,
            face_attributes: None,
        }
    }

    #[test]
    fn test_deliver_forwards_bytes_and_request() {
        let analyzer = Arc::new(RecordingAnalyzer {
            result: Ok(vec![face()]),
            seen: Mutex::new(Vec::new()),
        });
        let sink = AnalysisSink::new(analyzer.clone(), AnalysisRequest::MIRROR);

        let faces = sink.deliver(b"jpeg-bytes").unwrap();

        assert_eq!(faces.len(), 1);
        let seen = analyzer.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, b"jpeg-bytes");
        assert_eq!(seen[0].1, AnalysisRequest::MIRROR);
    }

    #[test]
    fn test_service_error_becomes_mirror_error() {
        let analyzer = Arc::new(RecordingAnalyzer {
            result: Err(ServiceError::Unauthorized(401)),
            seen: Mutex::new(Vec::new()),
        });
        let sink = AnalysisSink::new(analyzer, AnalysisRequest::MIRROR);

        let result = sink.deliver(b"jpeg");

        assert!(matches!(
            result,
            Err(MirrorError::Service(ServiceError::Unauthorized(401)))
        ));
    }
}

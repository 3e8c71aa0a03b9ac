use std::path::PathBuf;
use std::sync::Arc;

use crate::analysis::domain::detected_face::DetectedFace;
use crate::photo::domain::frame_source::FrameSource;
use crate::photo::domain::photo_encoder::PhotoEncoder;
use crate::photo::domain::photo_sink::PhotoSink;
use crate::photo::infrastructure::analysis_sink::AnalysisSink;
use crate::photo::infrastructure::pictures_folder_sink::PicturesFolderSink;
use crate::shared::captured_frame::CapturedFrame;
use crate::shared::mirror_error::MirrorError;
use image::metadata::Orientation;

/// Outcome of one capture cycle.
#[derive(Debug)]
pub struct CycleReport {
    pub cycle: usize,
    pub saved: Result<PathBuf, MirrorError>,
    /// `None` when analysis is disabled.
    pub analysis: Option<Result<Vec<DetectedFace>, MirrorError>>,
}

impl CycleReport {
    pub fn is_success(&self) -> bool {
        self.saved.is_ok() && self.analysis.as_ref().map_or(true, |r| r.is_ok())
    }
}

/// Capture → re-encode → deliver.
///
/// Every delivery takes a fresh still from the source, so persisting and
/// analyzing within one cycle use two captures.
#[derive(Clone)]
pub struct PhotoPipeline {
    source: Arc<dyn FrameSource>,
    encoder: Arc<dyn PhotoEncoder>,
}

impl PhotoPipeline {
    pub fn new(source: Arc<dyn FrameSource>, encoder: Arc<dyn PhotoEncoder>) -> Self {
        Self { source, encoder }
    }

    pub fn capture_frame(&self, orientation: Orientation) -> Result<CapturedFrame, MirrorError> {
        let data = self.source.capture_frame()?;
        log::debug!("Captured {} bytes", data.len());
        Ok(CapturedFrame::new(data, orientation))
    }

    pub fn capture_to_sink<S: PhotoSink + ?Sized>(
        &self,
        orientation: Orientation,
        sink: &S,
    ) -> Result<S::Output, MirrorError> {
        let frame = self.capture_frame(orientation)?;
        let photo = self.encoder.reencode(&frame)?;
        sink.deliver(&photo)
    }

    pub fn reencode_and_persist(
        &self,
        orientation: Orientation,
        sink: &PicturesFolderSink,
    ) -> Result<PathBuf, MirrorError> {
        self.capture_to_sink(orientation, sink)
    }

    pub fn reencode_and_analyze(
        &self,
        orientation: Orientation,
        sink: &AnalysisSink,
    ) -> Result<Vec<DetectedFace>, MirrorError> {
        self.capture_to_sink(orientation, sink)
    }

    /// Persists, then analyzes. Step failures are logged and reported,
    /// never propagated.
    pub fn run_cycle(
        &self,
        cycle: usize,
        orientation: Orientation,
        persist: &PicturesFolderSink,
        analysis: Option<&AnalysisSink>,
    ) -> CycleReport {
        let saved = self.reencode_and_persist(orientation, persist);
        if let Err(e) = &saved {
            log::warn!("Cycle {cycle}: photo not saved: {e}");
        }

        let analysis = analysis.map(|sink| {
            let result = self.reencode_and_analyze(orientation, sink);
            if let Err(e) = &result {
                log::warn!("Cycle {cycle}: face analysis failed: {e}");
            }
            result
        });

        CycleReport {
            cycle,
            saved,
            analysis,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::domain::analysis_request::AnalysisRequest;
    use crate::analysis::domain::face_analyzer::FaceAnalyzer;
    use crate::analysis::domain::service_error::ServiceError;
    use crate::camera::domain::camera_error::CameraError;
    use image::codecs::jpeg::JpegDecoder;
    use image::ImageDecoder;
    use crate::photo::infrastructure::jpeg_reencoder::JpegReencoder;
    use std::collections::VecDeque;
    use std::fs;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    // --- Stubs ---

    struct ScriptedSource {
        frames: Mutex<VecDeque<Result<Vec<u8>, ()>>>,
        captures: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(frames: Vec<Result<Vec<u8>, ()>>) -> Self {
            Self {
                frames: Mutex::new(frames.into()),
                captures: AtomicUsize::new(0),
            }
        }
    }

    impl FrameSource for ScriptedSource {
        fn capture_frame(&self) -> Result<Vec<u8>, MirrorError> {
            self.captures.fetch_add(1, Ordering::SeqCst);
            match self.frames.lock().unwrap().pop_front() {
                Some(Ok(bytes)) => Ok(bytes),
                _ => Err(MirrorError::Capture(CameraError::Device(
                    "sensor timeout".into(),
                ))),
            }
        }
    }

    struct StubAnalyzer {
        result: Result<Vec<DetectedFace>, ServiceError>,
    }

    impl FaceAnalyzer for StubAnalyzer {
        fn detect(
            &self,
            _image: &[u8],
            _request: &AnalysisRequest,
        ) -> Result<Vec<DetectedFace>, ServiceError> {
            self.result.clone()
        }
    }

    // --- Helpers ---

    fn png() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(12, 10, image::Rgb([180, 140, 120]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn pipeline(source: Arc<ScriptedSource>) -> PhotoPipeline {
        PhotoPipeline::new(source, Arc::new(JpegReencoder::default()))
    }

    fn analysis_sink(result: Result<Vec<DetectedFace>, ServiceError>) -> AnalysisSink {
        AnalysisSink::new(Arc::new(StubAnalyzer { result }), AnalysisRequest::MIRROR)
    }

    // --- Tests ---

    #[test]
    fn test_persist_writes_tagged_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let sink = PicturesFolderSink::new(dir.path(), "SimplePhoto.jpeg");
        let pipeline = pipeline(Arc::new(ScriptedSource::new(vec![Ok(png())])));

        let path = pipeline
            .reencode_and_persist(Orientation::NoTransforms, &sink)
            .unwrap();

        assert_eq!(path, dir.path().join("SimplePhoto.jpeg"));
        let written = fs::read(&path).unwrap();
        assert_eq!(
            image::guess_format(&written).unwrap(),
            image::ImageFormat::Jpeg
        );
        let orientation = JpegDecoder::new(Cursor::new(&written))
            .unwrap()
            .orientation()
            .unwrap();
        assert_eq!(orientation, Orientation::NoTransforms);
        assert_eq!(orientation.to_exif(), 1);
    }

    #[test]
    fn test_persist_twice_suffixes_second_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = PicturesFolderSink::new(dir.path(), "SimplePhoto.jpeg");
        let pipeline = pipeline(Arc::new(ScriptedSource::new(vec![Ok(png()), Ok(png())])));

        let first = pipeline
            .reencode_and_persist(Orientation::NoTransforms, &sink)
            .unwrap();
        let second = pipeline
            .reencode_and_persist(Orientation::NoTransforms, &sink)
            .unwrap();

        assert_eq!(first, dir.path().join("SimplePhoto.jpeg"));
        assert_eq!(second, dir.path().join("SimplePhoto (1).jpeg"));
    }

    #[test]
    fn test_capture_fault_writes_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = PicturesFolderSink::new(dir.path(), "SimplePhoto.jpeg");
        let pipeline = pipeline(Arc::new(ScriptedSource::new(vec![Err(())])));

        let result = pipeline.reencode_and_persist(Orientation::NoTransforms, &sink);

        assert!(matches!(result, Err(MirrorError::Capture(_))));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_undecodable_capture_is_encode_error() {
        let dir = tempfile::tempdir().unwrap();
        let sink = PicturesFolderSink::new(dir.path(), "SimplePhoto.jpeg");
        let pipeline = pipeline(Arc::new(ScriptedSource::new(vec![Ok(b"garbage".to_vec())])));

        let result = pipeline.reencode_and_persist(Orientation::NoTransforms, &sink);

        assert!(matches!(result, Err(MirrorError::Encode(_))));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_analyze_returns_faces() {
        let pipeline = pipeline(Arc::new(ScriptedSource::new(vec![Ok(png())])));
        let sink = analysis_sink(Ok(vec![]));

        let faces = pipeline
            .reencode_and_analyze(Orientation::NoTransforms, &sink)
            .unwrap();

        assert!(faces.is_empty());
    }

    #[test]
    fn test_cycle_captures_once_per_step() {
        let dir = tempfile::tempdir().unwrap();
        let persist = PicturesFolderSink::new(dir.path(), "SimplePhoto.jpeg");
        let analysis = analysis_sink(Ok(vec![]));
        let source = Arc::new(ScriptedSource::new(vec![Ok(png()), Ok(png())]));
        let pipeline = pipeline(source.clone());

        let report = pipeline.run_cycle(1, Orientation::NoTransforms, &persist, Some(&analysis));

        assert_eq!(report.cycle, 1);
        assert!(report.is_success());
        assert_eq!(source.captures.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_cycle_continues_to_analysis_after_persist_failure() {
        let dir = tempfile::tempdir().unwrap();
        let persist = PicturesFolderSink::new(dir.path(), "SimplePhoto.jpeg");
        let analysis = analysis_sink(Ok(vec![]));
        let pipeline = pipeline(Arc::new(ScriptedSource::new(vec![Err(()), Ok(png())])));

        let report = pipeline.run_cycle(3, Orientation::NoTransforms, &persist, Some(&analysis));

        assert!(report.saved.is_err());
        assert!(matches!(report.analysis, Some(Ok(_))));
        assert!(!report.is_success());
    }

    #[test]
    fn test_cycle_reports_service_error() {
        let dir = tempfile::tempdir().unwrap();
        let persist = PicturesFolderSink::new(dir.path(), "SimplePhoto.jpeg");
        let analysis = analysis_sink(Err(ServiceError::QuotaExceeded { retry_after: None }));
        let pipeline = pipeline(Arc::new(ScriptedSource::new(vec![Ok(png()), Ok(png())])));

        let report = pipeline.run_cycle(1, Orientation::NoTransforms, &persist, Some(&analysis));

        assert!(report.saved.is_ok());
        assert!(matches!(
            report.analysis,
            Some(Err(MirrorError::Service(ServiceError::QuotaExceeded { .. })))
        ));
    }

    #[test]
    fn test_cycle_without_analysis() {
        let dir = tempfile::tempdir().unwrap();
        let persist = PicturesFolderSink::new(dir.path(), "SimplePhoto.jpeg");
        let source = Arc::new(ScriptedSource::new(vec![Ok(png())]));
        let pipeline = pipeline(source.clone());

        let report = pipeline.run_cycle(1, Orientation::NoTransforms, &persist, None);

        assert!(report.is_success());
        assert!(report.analysis.is_none());
        assert_eq!(source.captures.load(Ordering::SeqCst), 1);
    }
}

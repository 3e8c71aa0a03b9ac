use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{select, Receiver, Sender};
use image::metadata::Orientation;

use crate::analysis::domain::detected_face::DetectedFace;
use crate::camera::domain::camera_session::CameraSession;
use crate::camera::domain::device_enumerator::DeviceEnumerator;
use crate::camera::domain::device_info::DeviceInfo;
use crate::detection::domain::detection_gate::{DetectionGate, GatePolicy};
use crate::detection::domain::effect_definition::EffectDefinition;
use crate::photo::domain::photo_encoder::PhotoEncoder;
use crate::photo::infrastructure::analysis_sink::AnalysisSink;
use crate::photo::infrastructure::pictures_folder_sink::PicturesFolderSink;
use crate::pipeline::photo_pipeline::{CycleReport, PhotoPipeline};
use crate::shared::mirror_error::MirrorError;

/// How often the event loop wakes up to check for cancellation.
const STOP_CHECK_INTERVAL: Duration = Duration::from_millis(50);

/// Detection intervals without an event after which the face counts as gone.
const BURST_GAP_INTERVALS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStage {
    Persist,
    Analyze,
    /// The cycle worker died before reporting.
    Worker,
}

impl std::fmt::Display for CycleStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleStage::Persist => write!(f, "persist"),
            CycleStage::Analyze => write!(f, "analyze"),
            CycleStage::Worker => write!(f, "worker"),
        }
    }
}

/// Messages published by the controller while it runs.
#[derive(Debug, Clone)]
pub enum MirrorMessage {
    SessionReady { device: DeviceInfo, mirrored: bool },
    FaceAdmitted { cycle: usize },
    DetectionSuppressed { cycle_in_flight: usize },
    PhotoSaved { cycle: usize, path: PathBuf },
    FacesAnalyzed { cycle: usize, faces: Vec<DetectedFace> },
    CycleFailed {
        cycle: usize,
        stage: CycleStage,
        error: String,
    },
    CycleComplete { cycle: usize, success: bool },
    /// The face left view after a finished cycle; the next detection starts a new one.
    GateRearmed,
}

#[derive(Debug, Clone, Copy)]
pub struct MirrorSettings {
    pub effect: EffectDefinition,
    pub gate_policy: GatePolicy,
    /// Orientation stamped on every saved photo.
    pub orientation: Orientation,
    /// Stop after this many completed cycles.
    pub max_cycles: Option<usize>,
}

impl Default for MirrorSettings {
    fn default() -> Self {
        Self {
            effect: EffectDefinition::default(),
            gate_policy: GatePolicy::default(),
            orientation: Orientation::NoTransforms,
            max_cycles: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorSummary {
    pub detections: usize,
    pub suppressed: usize,
    pub cycles_completed: usize,
    pub photos_saved: usize,
}

struct InFlight {
    cycle: usize,
    handle: JoinHandle<()>,
}

/// Follows the current burst of detection events.
///
/// A face in view keeps raising events, so the gate is reopened only once a
/// cycle has finished and no event arrived for `quiet_period`.
#[derive(Debug)]
struct BurstTracker {
    quiet_period: Duration,
    last_detection: Option<Instant>,
    rearm_pending: bool,
}

impl BurstTracker {
    fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            last_detection: None,
            rearm_pending: false,
        }
    }

    fn detected(&mut self, at: Instant) {
        self.last_detection = Some(self.last_detection.map_or(at, |last| last.max(at)));
    }

    fn cycle_finished(&mut self) {
        self.rearm_pending = true;
    }

    /// True at most once per finished cycle, after the burst went quiet.
    fn take_rearm(&mut self, now: Instant) -> bool {
        let quiet = self
            .last_detection
            .is_none_or(|last| now.saturating_duration_since(last) >= self.quiet_period);
        if self.rearm_pending && quiet {
            self.rearm_pending = false;
            true
        } else {
            false
        }
    }
}

/// Owns the camera session and drives detection → capture cycles.
///
/// Detection events pass through a [`DetectionGate`]; each admitted event
/// starts one cycle on a worker thread. The loop keeps draining events while
/// the worker runs, so suppressed detections are counted rather than queued.
/// Under [`GatePolicy::RearmOnCompletion`] the gate reopens once the cycle is
/// done and the face has left view, giving one cycle per appearance.
pub struct MirrorController {
    session: CameraSession,
    encoder: Arc<dyn PhotoEncoder>,
    persist: Arc<PicturesFolderSink>,
    analysis: Option<Arc<AnalysisSink>>,
    settings: MirrorSettings,
    gate: DetectionGate,
    cancelled: Arc<AtomicBool>,
}

impl MirrorController {
    pub fn new(
        session: CameraSession,
        encoder: Arc<dyn PhotoEncoder>,
        persist: PicturesFolderSink,
        analysis: Option<AnalysisSink>,
        settings: MirrorSettings,
        cancelled: Arc<AtomicBool>,
    ) -> Self {
        Self {
            session,
            encoder,
            persist: Arc::new(persist),
            analysis: analysis.map(Arc::new),
            settings,
            gate: DetectionGate::new(),
            cancelled,
        }
    }

    pub fn session(&self) -> &CameraSession {
        &self.session
    }

    /// Runs until cancelled, `max_cycles` is reached, the detection stream
    /// ends, or the camera fails.
    ///
    /// Waits for the in-flight cycle and shuts the session down before
    /// returning.
    pub fn run(
        &mut self,
        enumerator: &dyn DeviceEnumerator,
        output: &Sender<MirrorMessage>,
    ) -> Result<MirrorSummary, MirrorError> {
        self.session.initialize(enumerator)?;
        let events = self.session.start_effect_pipeline(&self.settings.effect)?;
        if let Some(device) = self.session.selected_device() {
            let _ = output.send(MirrorMessage::SessionReady {
                device: device.clone(),
                mirrored: self.session.should_mirror(),
            });
        }
        let failures = self.session.failures();
        let pipeline = PhotoPipeline::new(
            Arc::new(self.session.capture_handle()?),
            self.encoder.clone(),
        );
        let (done_tx, done_rx) = crossbeam_channel::unbounded::<CycleReport>();
        let ticker = crossbeam_channel::tick(STOP_CHECK_INTERVAL);

        let mut summary = MirrorSummary::default();
        let mut in_flight: Option<InFlight> = None;
        let mut next_cycle = 1;
        let mut burst =
            BurstTracker::new(self.settings.effect.desired_interval * BURST_GAP_INTERVALS);

        let result = loop {
            if self.cancelled.load(Ordering::Relaxed) {
                log::info!("Mirror cancelled");
                break Ok(());
            }
            if matches!(self.settings.max_cycles, Some(max) if summary.cycles_completed >= max) {
                log::info!("Completed {} cycle(s), stopping", summary.cycles_completed);
                break Ok(());
            }

            select! {
                recv(events) -> event => {
                    let Ok(event) = event else {
                        log::info!("Face detection stream ended");
                        break Ok(());
                    };
                    summary.detections += 1;
                    burst.detected(event.detected_at());
                    if self.gate.try_admit() {
                        let cycle = next_cycle;
                        next_cycle += 1;
                        log::info!(
                            "Face detected, starting cycle {cycle} ({} ms after detection)",
                            event.detected_at().elapsed().as_millis()
                        );
                        let _ = output.send(MirrorMessage::FaceAdmitted { cycle });
                        in_flight = Some(self.spawn_cycle(cycle, &pipeline, done_tx.clone()));
                    } else {
                        summary.suppressed += 1;
                        let cycle_in_flight = in_flight.as_ref().map_or(0, |f| f.cycle);
                        log::debug!("Detection suppressed, cycle {cycle_in_flight} in flight");
                        let _ = output.send(MirrorMessage::DetectionSuppressed { cycle_in_flight });
                    }
                }
                recv(done_rx) -> report => {
                    if let Ok(report) = report {
                        if let Some(f) = in_flight.take() {
                            let _ = f.handle.join();
                        }
                        self.complete_cycle(report, &mut summary, output);
                        self.after_cycle(&mut burst, output);
                    }
                }
                recv(failures) -> failure => {
                    if let Ok(failure) = failure {
                        log::error!("{failure}");
                        self.cancelled.store(true, Ordering::Relaxed);
                        break Err(MirrorError::DeviceFailed(failure));
                    }
                }
                recv(ticker) -> _ => {
                    let lost = in_flight.as_ref().is_some_and(|f| f.handle.is_finished())
                        && done_rx.is_empty();
                    if lost {
                        if let Some(f) = in_flight.take() {
                            let _ = f.handle.join();
                            self.report_lost_cycle(f.cycle, &mut summary, output);
                            self.after_cycle(&mut burst, output);
                        }
                    }
                    self.rearm_if_quiet(&mut burst, output);
                }
            }
        };

        self.drain_in_flight(in_flight, &done_rx, &mut summary, output);
        self.session.shutdown();
        log::info!(
            "Mirror stopped: {} detection(s), {} suppressed, {} cycle(s), {} photo(s) saved",
            summary.detections,
            summary.suppressed,
            summary.cycles_completed,
            summary.photos_saved
        );
        result.map(|()| summary)
    }

    fn spawn_cycle(&self, cycle: usize, pipeline: &PhotoPipeline, done: Sender<CycleReport>) -> InFlight {
        let pipeline = pipeline.clone();
        let persist = self.persist.clone();
        let analysis = self.analysis.clone();
        let orientation = self.settings.orientation;

        let handle = thread::spawn(move || {
            let report = pipeline.run_cycle(cycle, orientation, &persist, analysis.as_deref());
            let _ = done.send(report);
        });
        InFlight { cycle, handle }
    }

    fn complete_cycle(
        &self,
        report: CycleReport,
        summary: &mut MirrorSummary,
        output: &Sender<MirrorMessage>,
    ) {
        let cycle = report.cycle;
        let success = report.is_success();

        match report.saved {
            Ok(path) => {
                summary.photos_saved += 1;
                let _ = output.send(MirrorMessage::PhotoSaved { cycle, path });
            }
            Err(e) => {
                let _ = output.send(MirrorMessage::CycleFailed {
                    cycle,
                    stage: CycleStage::Persist,
                    error: e.to_string(),
                });
            }
        }
        match report.analysis {
            Some(Ok(faces)) => {
                let _ = output.send(MirrorMessage::FacesAnalyzed { cycle, faces });
            }
            Some(Err(e)) => {
                let _ = output.send(MirrorMessage::CycleFailed {
                    cycle,
                    stage: CycleStage::Analyze,
                    error: e.to_string(),
                });
            }
            None => {}
        }

        self.finish_cycle(cycle, success, summary, output);
    }

    /// Worker exited without reporting, which only happens if it panicked.
    fn report_lost_cycle(&self, cycle: usize, summary: &mut MirrorSummary, output: &Sender<MirrorMessage>) {
        log::warn!("Cycle {cycle} worker exited without a report");
        let _ = output.send(MirrorMessage::CycleFailed {
            cycle,
            stage: CycleStage::Worker,
            error: "cycle worker panicked".into(),
        });
        self.finish_cycle(cycle, false, summary, output);
    }

    fn finish_cycle(
        &self,
        cycle: usize,
        success: bool,
        summary: &mut MirrorSummary,
        output: &Sender<MirrorMessage>,
    ) {
        summary.cycles_completed += 1;
        let _ = output.send(MirrorMessage::CycleComplete { cycle, success });
    }

    fn after_cycle(&self, burst: &mut BurstTracker, output: &Sender<MirrorMessage>) {
        match self.settings.gate_policy {
            GatePolicy::RearmOnCompletion => {
                burst.cycle_finished();
                self.rearm_if_quiet(burst, output);
            }
            GatePolicy::OneShot => log::debug!("One-shot gate stays closed"),
        }
    }

    fn rearm_if_quiet(&self, burst: &mut BurstTracker, output: &Sender<MirrorMessage>) {
        if burst.take_rearm(Instant::now()) {
            self.gate.reset();
            log::debug!("Face left view, gate re-armed");
            let _ = output.send(MirrorMessage::GateRearmed);
        }
    }

    fn drain_in_flight(
        &self,
        in_flight: Option<InFlight>,
        done_rx: &Receiver<CycleReport>,
        summary: &mut MirrorSummary,
        output: &Sender<MirrorMessage>,
    ) {
        let Some(f) = in_flight else {
            return;
        };
        log::info!("Waiting for cycle {} to finish", f.cycle);
        let _ = f.handle.join();
        match done_rx.try_recv() {
            Ok(report) => self.complete_cycle(report, summary, output),
            Err(_) => self.report_lost_cycle(f.cycle, summary, output),
        }
    }
}

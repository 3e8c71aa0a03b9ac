use std::sync::{Arc, Mutex, MutexGuard};

use crossbeam_channel::{Receiver, Sender};

use crate::camera::domain::camera_error::{CameraError, DeviceFailure};
use crate::camera::domain::capture_device::CaptureDevice;
use crate::camera::domain::device_enumerator::DeviceEnumerator;
use crate::camera::domain::device_info::{select_preferred, DeviceInfo, Panel};
use crate::detection::domain::detection_event::DetectionEvent;
use crate::detection::domain::effect_definition::EffectDefinition;
use crate::photo::domain::frame_source::FrameSource;
use crate::shared::mirror_error::MirrorError;

type SharedDevice = Arc<Mutex<Box<dyn CaptureDevice>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

/// Live binding to one capture device and its video stream.
///
/// The device sits behind a mutex so that still captures issued from cycle
/// workers queue up instead of racing on the hardware.
pub struct CameraSession {
    device: SharedDevice,
    state: SessionState,
    selected: Option<DeviceInfo>,
    is_external: bool,
    effect_started: bool,
    failure_tx: Sender<DeviceFailure>,
    failure_rx: Receiver<DeviceFailure>,
}

impl CameraSession {
    pub fn new(device: Box<dyn CaptureDevice>) -> Self {
        let (failure_tx, failure_rx) = crossbeam_channel::unbounded();
        Self {
            device: Arc::new(Mutex::new(device)),
            state: SessionState::Uninitialized,
            selected: None,
            is_external: false,
            effect_started: false,
            failure_tx,
            failure_rx,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    pub fn selected_device(&self) -> Option<&DeviceInfo> {
        self.selected.as_ref()
    }

    /// True when the device reported no enclosure location.
    pub fn is_external(&self) -> bool {
        self.is_external
    }

    /// Front-mounted integrated cameras are previewed mirrored.
    pub fn should_mirror(&self) -> bool {
        matches!(&self.selected, Some(d) if d.panel == Panel::Front)
    }

    /// Selects a device, opens it and starts the live stream.
    ///
    /// Calling this on a ready session does nothing.
    pub fn initialize(&mut self, enumerator: &dyn DeviceEnumerator) -> Result<(), MirrorError> {
        if self.is_ready() {
            return Ok(());
        }

        let devices = enumerator.find_all().map_err(MirrorError::Capture)?;
        let Some(device) = select_preferred(&devices).cloned() else {
            log::warn!("No camera device found");
            self.state = SessionState::Failed;
            return Err(MirrorError::DeviceUnavailable);
        };

        log::info!(
            "Initializing camera {} ({}, {} panel)",
            device.name,
            device.id,
            device.panel
        );
        self.state = SessionState::Initializing;

        let result = self.lock_device().and_then(|mut dev| {
            dev.initialize(&device, self.failure_tx.clone())?;
            if let Err(e) = dev.start_recording() {
                log::warn!("Camera stream did not start: {e}");
                dev.shutdown();
                return Err(e.into());
            }
            Ok(())
        });

        match result {
            Ok(()) => {
                self.is_external = device.is_external();
                self.selected = Some(device);
                self.state = SessionState::Ready;
                Ok(())
            }
            Err(e) => {
                if let MirrorError::AccessDenied { .. } = e {
                    log::warn!("Access to the camera was denied");
                }
                self.state = SessionState::Failed;
                Err(e)
            }
        }
    }

    /// Attaches the face detection effect and returns the event stream.
    ///
    /// Only valid once per ready session.
    pub fn start_effect_pipeline(
        &mut self,
        definition: &EffectDefinition,
    ) -> Result<Receiver<DetectionEvent>, MirrorError> {
        if !self.is_ready() {
            return Err(MirrorError::NotReady);
        }
        if self.effect_started {
            return Err(MirrorError::EffectAlreadyStarted);
        }

        let (tx, rx) = crossbeam_channel::unbounded();
        self.lock_device()?
            .add_face_detection_effect(definition, tx)?;
        self.effect_started = true;

        log::info!(
            "Face detection started ({:?}, every {} ms)",
            definition.mode,
            definition.desired_interval.as_millis()
        );
        Ok(rx)
    }

    /// Fatal device failures reported after the session became ready.
    pub fn failures(&self) -> Receiver<DeviceFailure> {
        self.failure_rx.clone()
    }

    /// A cloneable handle for capturing stills from worker threads.
    pub fn capture_handle(&self) -> Result<CaptureHandle, MirrorError> {
        if !self.is_ready() {
            return Err(MirrorError::NotReady);
        }
        Ok(CaptureHandle {
            device: self.device.clone(),
        })
    }

    pub fn shutdown(&mut self) {
        if self.state == SessionState::Uninitialized {
            return;
        }
        if let Ok(mut dev) = self.device.lock() {
            dev.shutdown();
        }
        self.state = SessionState::Uninitialized;
        self.effect_started = false;
    }

    fn lock_device(&self) -> Result<MutexGuard<'_, Box<dyn CaptureDevice>>, MirrorError> {
        self.device
            .lock()
            .map_err(|_| MirrorError::Capture(CameraError::Device("camera lock poisoned".into())))
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Serialized access to the session's device for still captures.
#[derive(Clone)]
pub struct CaptureHandle {
    device: SharedDevice,
}

impl FrameSource for CaptureHandle {
    fn capture_frame(&self) -> Result<Vec<u8>, MirrorError> {
        let mut dev = self
            .device
            .lock()
            .map_err(|_| MirrorError::Capture(CameraError::Device("camera lock poisoned".into())))?;
        dev.capture_photo().map_err(MirrorError::Capture)
    }
}

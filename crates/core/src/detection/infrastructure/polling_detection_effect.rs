use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::Sender;

use crate::detection::domain::detection_event::DetectionEvent;
use crate::detection::domain::effect_definition::EffectDefinition;
use crate::detection::domain::face_presence::FacePresence;

/// Upper bound on how long `stop` waits for the polling thread to notice.
const STOP_CHECK_SLICE: Duration = Duration::from_millis(20);

/// Face detection effect that polls a [`FacePresence`] on its own thread.
///
/// Raises one [`DetectionEvent`] per poll that sees a face, at most once per
/// `desired_interval`. Detection never blocks the caller, which matches the
/// non-synchronous mode of platform effects.
pub struct PollingDetectionEffect {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl PollingDetectionEffect {
    pub fn start(
        definition: &EffectDefinition,
        mut presence: Box<dyn FacePresence>,
        events: Sender<DetectionEvent>,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();
        let interval = definition.desired_interval;

        if definition.synchronous {
            log::debug!("Synchronous detection requested; polling effect always runs detached");
        }

        let handle = thread::spawn(move || {
            while !stop_flag.load(Ordering::Relaxed) {
                if presence.face_present() && events.send(DetectionEvent::now()).is_err() {
                    break;
                }
                sleep_unless_stopped(interval, &stop_flag);
            }
        });

        Self {
            stop,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stops polling and waits for the thread. Dropping the effect does the same.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("Detection effect thread panicked");
            }
        }
    }
}

impl Drop for PollingDetectionEffect {
    fn drop(&mut self) {
        self.stop();
    }
}

fn sleep_unless_stopped(total: Duration, stop: &AtomicBool) {
    let mut remaining = total;
    while !remaining.is_zero() && !stop.load(Ordering::Relaxed) {
        let slice = remaining.min(STOP_CHECK_SLICE);
        thread::sleep(slice);
        remaining -= slice;
    }
}

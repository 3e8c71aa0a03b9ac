use std::time::Instant;

/// "A face is present now." Carries nothing beyond when it was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionEvent {
    detected_at: Instant,
}

impl DetectionEvent {
    pub fn now() -> Self {
        Self {
            detected_at: Instant::now(),
        }
    }

    pub fn detected_at(&self) -> Instant {
        self.detected_at
    }
}

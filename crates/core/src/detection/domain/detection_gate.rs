use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

/// When an admitted gate is opened again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatePolicy {
    /// Reset once the capture cycle finishes, whether it succeeded or not,
    /// and the face has left view.
    #[default]
    RearmOnCompletion,
    /// Never reset: only the first face of the session is captured.
    OneShot,
}

/// Admission latch in front of the photo pipeline.
///
/// Detection events arrive every few hundred milliseconds while a face is in
/// view. The gate lets the first one through and turns the rest away until
/// [`DetectionGate::reset`] is called, so capture cycles never overlap.
#[derive(Debug, Default)]
pub struct DetectionGate {
    face_in_view: AtomicBool,
    admissions: AtomicUsize,
}

impl DetectionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the caller was admitted (the latch went false → true).
    pub fn try_admit(&self) -> bool {
        let admitted = self
            .face_in_view
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if admitted {
            self.admissions.fetch_add(1, Ordering::Relaxed);
        }
        admitted
    }

    pub fn reset(&self) {
        self.face_in_view.store(false, Ordering::Release);
    }

    pub fn is_face_in_view(&self) -> bool {
        self.face_in_view.load(Ordering::Acquire)
    }

    /// Total admissions since the gate was created.
    pub fn admissions(&self) -> usize {
        self.admissions.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_first_event_is_admitted() {
        let gate = DetectionGate::new();
        assert!(!gate.is_face_in_view());
        assert!(gate.try_admit());
        assert!(gate.is_face_in_view());
    }

    #[test]
    fn test_events_are_suppressed_until_reset() {
        let gate = DetectionGate::new();
        assert!(gate.try_admit());
        for _ in 0..50 {
            assert!(!gate.try_admit());
        }
        assert_eq!(gate.admissions(), 1);
    }

    #[test]
    fn test_reset_allows_second_admission() {
        let gate = DetectionGate::new();
        assert!(gate.try_admit());
        gate.reset();
        assert!(!gate.is_face_in_view());
        assert!(gate.try_admit());
        assert_eq!(gate.admissions(), 2);
    }

    #[test]
    fn test_reset_on_open_gate_is_harmless() {
        let gate = DetectionGate::new();
        gate.reset();
        assert!(gate.try_admit());
        assert_eq!(gate.admissions(), 1);
    }

    #[test]
    fn test_concurrent_events_admit_exactly_one() {
        let gate = Arc::new(DetectionGate::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = gate.clone();
                std::thread::spawn(move || (0..100).filter(|_| gate.try_admit()).count())
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(admitted, 1);
        assert_eq!(gate.admissions(), 1);
    }

    #[test]
    fn test_policy_default_rearms() {
        assert_eq!(GatePolicy::default(), GatePolicy::RearmOnCompletion);
        let policy: GatePolicy = serde_json::from_str("\"one_shot\"").unwrap();
        assert_eq!(policy, GatePolicy::OneShot);
    }
}

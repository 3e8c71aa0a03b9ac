use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::analysis::domain::analysis_request::AnalysisRequest;
use crate::analysis::domain::detected_face::DetectedFace;
use crate::analysis::domain::face_analyzer::FaceAnalyzer;
use crate::analysis::domain::service_error::ServiceError;
use crate::shared::constants::{
    DEFAULT_ANALYSIS_MAX_ATTEMPTS, DEFAULT_INITIAL_BACKOFF_MS, DEFAULT_MAX_BACKOFF_MS,
};

const CANCEL_CHECK_SLICE: Duration = Duration::from_millis(50);

/// Bounded exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Wait before retry number `retry` (0-based). A server hint wins over
    /// the exponential schedule; both are capped at `max_backoff`.
    pub fn delay_for(&self, retry: u32, hint: Option<Duration>) -> Duration {
        let scheduled = self
            .initial_backoff
            .saturating_mul(2u32.saturating_pow(retry));
        hint.unwrap_or(scheduled).min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_ANALYSIS_MAX_ATTEMPTS,
            initial_backoff: Duration::from_millis(DEFAULT_INITIAL_BACKOFF_MS),
            max_backoff: Duration::from_millis(DEFAULT_MAX_BACKOFF_MS),
        }
    }
}

/// Decorator that retries transient failures of the wrapped analyzer.
///
/// Authentication failures and malformed requests are returned immediately.
/// Setting `cancelled` aborts between attempts and during backoff.
pub struct RetryingFaceAnalyzer {
    inner: Box<dyn FaceAnalyzer>,
    policy: RetryPolicy,
    cancelled: Arc<AtomicBool>,
}

impl RetryingFaceAnalyzer {
    pub fn new(inner: Box<dyn FaceAnalyzer>, policy: RetryPolicy, cancelled: Arc<AtomicBool>) -> Self {
        Self {
            inner,
            policy,
            cancelled,
        }
    }

    fn wait(&self, delay: Duration) -> Result<(), ServiceError> {
        let mut remaining = delay;
        while !remaining.is_zero() {
            if self.cancelled.load(Ordering::Relaxed) {
                return Err(ServiceError::Cancelled);
            }
            let slice = remaining.min(CANCEL_CHECK_SLICE);
            thread::sleep(slice);
            remaining -= slice;
        }
        Ok(())
    }
}

impl FaceAnalyzer for RetryingFaceAnalyzer {
    fn detect(
        &self,
        image: &[u8],
        request: &AnalysisRequest,
    ) -> Result<Vec<DetectedFace>, ServiceError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            if self.cancelled.load(Ordering::Relaxed) {
                return Err(ServiceError::Cancelled);
            }
            attempt += 1;

            match self.inner.detect(image, request) {
                Ok(faces) => return Ok(faces),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.policy.delay_for(attempt - 1, e.retry_after());
                    log::warn!(
                        "Face analysis attempt {attempt}/{max_attempts} failed: {e}; retrying in {} ms",
                        delay.as_millis()
                    );
                    self.wait(delay)?;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    // --- Stubs ---

    struct ScriptedAnalyzer {
        responses: Mutex<VecDeque<Result<Vec<DetectedFace>, ServiceError>>>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedAnalyzer {
        fn new(responses: Vec<Result<Vec<DetectedFace>, ServiceError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl FaceAnalyzer for ScriptedAnalyzer {
        fn detect(
            &self,
            _image: &[u8],
            _request: &AnalysisRequest,
        ) -> Result<Vec<DetectedFace>, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ServiceError::Network("script exhausted".into())))
        }
    }

    // --- Helpers ---

    fn no_wait(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    fn retrying(
        inner: ScriptedAnalyzer,
        policy: RetryPolicy,
    ) -> (RetryingFaceAnalyzer, Arc<AtomicUsize>, Arc<AtomicBool>) {
        let calls = inner.calls.clone();
        let cancelled = Arc::new(AtomicBool::new(false));
        let analyzer = RetryingFaceAnalyzer::new(Box::new(inner), policy, cancelled.clone());
        (analyzer, calls, cancelled)
    }

    // --- Tests ---

    #[test]
    fn test_success_on_first_attempt() {
        let (analyzer, calls, _) = retrying(ScriptedAnalyzer::new(vec![Ok(vec![])]), no_wait(3));

        assert!(analyzer.detect(b"img", &AnalysisRequest::MIRROR).is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_retries_transient_until_success() {
        let inner = ScriptedAnalyzer::new(vec![
            Err(ServiceError::Network("reset".into())),
            Err(ServiceError::Server {
                status: 503,
                message: "busy".into(),
            }),
            Ok(vec![]),
        ]);
        let (analyzer, calls, _) = retrying(inner, no_wait(3));

        assert!(analyzer.detect(b"img", &AnalysisRequest::MIRROR).is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let inner = ScriptedAnalyzer::new(vec![
            Err(ServiceError::QuotaExceeded { retry_after: None }),
            Err(ServiceError::QuotaExceeded { retry_after: None }),
            Err(ServiceError::QuotaExceeded { retry_after: None }),
            Ok(vec![]),
        ]);
        let (analyzer, calls, _) = retrying(inner, no_wait(3));

        let result = analyzer.detect(b"img", &AnalysisRequest::MIRROR);

        assert!(matches!(result, Err(ServiceError::QuotaExceeded { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_unauthorized_is_not_retried() {
        let inner = ScriptedAnalyzer::new(vec![Err(ServiceError::Unauthorized(401)), Ok(vec![])]);
        let (analyzer, calls, _) = retrying(inner, no_wait(5));

        let result = analyzer.detect(b"img", &AnalysisRequest::MIRROR);

        assert_eq!(result, Err(ServiceError::Unauthorized(401)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        let (analyzer, calls, _) = retrying(ScriptedAnalyzer::new(vec![Ok(vec![])]), no_wait(0));

        assert!(analyzer.detect(b"img", &AnalysisRequest::MIRROR).is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancelled_before_first_attempt() {
        let (analyzer, calls, cancelled) =
            retrying(ScriptedAnalyzer::new(vec![Ok(vec![])]), no_wait(3));
        cancelled.store(true, Ordering::SeqCst);

        let result = analyzer.detect(b"img", &AnalysisRequest::MIRROR);

        assert_eq!(result, Err(ServiceError::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cancel_interrupts_backoff() {
        let inner = ScriptedAnalyzer::new(vec![
            Err(ServiceError::Network("down".into())),
            Ok(vec![]),
        ]);
        let policy = RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(30),
            max_backoff: Duration::from_secs(30),
        };
        let (analyzer, calls, cancelled) = retrying(inner, policy);

        let flag = cancelled.clone();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            flag.store(true, Ordering::SeqCst);
        });
        let started = std::time::Instant::now();
        let result = analyzer.detect(b"img", &AnalysisRequest::MIRROR);
        canceller.join().unwrap();

        assert_eq!(result, Err(ServiceError::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(3),
        };
        assert_eq!(policy.delay_for(0, None), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1, None), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2, None), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(3, None), Duration::from_secs(3));
        assert_eq!(policy.delay_for(40, None), Duration::from_secs(3));
    }

    #[test]
    fn test_delay_prefers_server_hint() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.delay_for(0, Some(Duration::from_secs(2))),
            Duration::from_secs(2)
        );
        assert_eq!(
            policy.delay_for(0, Some(Duration::from_secs(600))),
            policy.max_backoff
        );
    }
}

use std::time::Duration;

use thiserror::Error;

/// Failure of a remote face analysis call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("face service rejected the subscription key (HTTP {0})")]
    Unauthorized(u16),
    #[error("face service quota exceeded")]
    QuotaExceeded { retry_after: Option<Duration> },
    #[error("face service error (HTTP {status}): {message}")]
    Server { status: u16, message: String },
    #[error("face service rejected the request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("network error calling face service: {0}")]
    Network(String),
    #[error("failed to decode face service response: {0}")]
    Decode(String),
    #[error("face analysis cancelled")]
    Cancelled,
}

impl ServiceError {
    /// Classifies a non-success HTTP status.
    pub fn from_status(status: u16, retry_after: Option<Duration>, message: String) -> Self {
        match status {
            401 | 403 => ServiceError::Unauthorized(status),
            429 => ServiceError::QuotaExceeded { retry_after },
            500..=599 => ServiceError::Server { status, message },
            _ => ServiceError::Rejected { status, message },
        }
    }

    /// Errors worth retrying: network faults, server errors and throttling.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ServiceError::Network(_)
                | ServiceError::Server { .. }
                | ServiceError::QuotaExceeded { .. }
        )
    }

    /// Server-requested wait before the next attempt.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ServiceError::QuotaExceeded { retry_after } => *retry_after,
            _ => None,
        }
    }
}

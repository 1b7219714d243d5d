//! Errors - service errors and the crate error type.
//!
//! Two layers:
//! - `ServiceError`: what the opaque client reports (the service rejected the
//!   request, or the request never made it).
//! - `JobwatchError`: everything the poll / page / retry machinery can end with.

use std::time::Duration;

use thiserror::Error;

use super::result_set::XmlError;

/// Error codes that mean "slow down" regardless of the HTTP status.
const THROTTLING_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "ThrottledException",
    "TooManyRequestsException",
    "ProvisionedThroughputExceededException",
    "RequestLimitExceeded",
    "RequestThrottled",
    "SlowDown",
];

/// Error reported by a remote service client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The service answered and rejected the request.
    #[error("service error {status} {code}: {message}")]
    Service {
        code: String,
        status: u16,
        message: String,
    },

    /// The request did not get a usable answer (network, malformed response).
    #[error("transport error: {0}")]
    Transport(String),
}

impl ServiceError {
    pub fn service(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service {
            code: code.into(),
            status,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// HTTP status of a service error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Service { status, .. } => Some(*status),
            ServiceError::Transport(_) => None,
        }
    }

    pub fn is_throttling(&self) -> bool {
        match self {
            ServiceError::Service { code, status, .. } => {
                *status == 429 || THROTTLING_CODES.contains(&code.as_str())
            }
            ServiceError::Transport(_) => false,
        }
    }

    /// Throttling and 5xx are worth another attempt; other 4xx are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Service { status, .. } => self.is_throttling() || (500..600).contains(status),
            ServiceError::Transport(_) => true,
        }
    }
}

/// Error type of this crate.
#[derive(Debug, Error)]
pub enum JobwatchError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("{handle} did not reach a terminal status after {attempts} polls ({elapsed:?})")]
    PollTimeout {
        handle: String,
        attempts: u32,
        elapsed: Duration,
    },

    #[error("{handle} ended with status {status}{}", .reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
    JobFailed {
        handle: String,
        status: String,
        reason: Option<String>,
    },

    #[error("{handle} reported unrecognized status {status:?}")]
    UnrecognizedStatus { handle: String, status: String },

    #[error("no terminal notification within {waited:?}")]
    WaitTimeout { waited: Duration },

    #[error("notification watcher stopped before a terminal notification arrived")]
    WatcherClosed,

    #[error("list call returned a page token it had already returned ({token})")]
    PageTokenRepeated { token: String },

    #[error(transparent)]
    Render(#[from] XmlError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl JobwatchError {
    /// The underlying service error, if this is one.
    pub fn as_service(&self) -> Option<&ServiceError> {
        match self {
            JobwatchError::Service(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, JobwatchError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ServiceError::service(503, "ServiceUnavailable", "try later"), true)]
    #[case(ServiceError::service(500, "InternalFailure", "boom"), true)]
    #[case(ServiceError::service(400, "ThrottlingException", "Rate exceeded"), true)]
    #[case(ServiceError::service(429, "TooManyRequests", "slow down"), true)]
    #[case(ServiceError::service(400, "ValidationException", "bad input"), false)]
    #[case(ServiceError::service(404, "ResourceNotFoundException", "no such job"), false)]
    #[case(ServiceError::transport("connection reset"), true)]
    fn retry_classification(#[case] err: ServiceError, #[case] retryable: bool) {
        assert_eq!(err.is_retryable(), retryable);
    }

    #[test]
    fn job_failed_message_includes_reason() {
        let err = JobwatchError::JobFailed {
            handle: "job-1".into(),
            status: "ERROR".into(),
            reason: Some("codec not supported".into()),
        };
        assert_eq!(err.to_string(), "job-1 ended with status ERROR: codec not supported");

        let err = JobwatchError::JobFailed {
            handle: "job-1".into(),
            status: "FAILED".into(),
            reason: None,
        };
        assert_eq!(err.to_string(), "job-1 ended with status FAILED");
    }

    #[test]
    fn service_error_converts_transparently() {
        let err: JobwatchError = ServiceError::service(400, "BadRequest", "nope").into();
        assert_eq!(err.to_string(), "service error 400 BadRequest: nope");
        assert_eq!(err.as_service().and_then(ServiceError::status), Some(400));
    }
}

//! ScriptedCall - a remote call that answers from a script.

use std::future::{Ready, ready};
use std::sync::Mutex;

use crate::domain::ServiceError;

/// Each `call()` returns the next scripted result; the last one repeats.
///
/// ```ignore
/// let call = ScriptedCall::from_status_codes(&[503, 503, 200]);
/// let code = retrier.run(|_| call.call()).await?;
/// ```
#[derive(Debug)]
pub struct ScriptedCall<T> {
    script: Vec<Result<T, ServiceError>>,
    calls: Mutex<usize>,
}

impl<T: Clone> ScriptedCall<T> {
    pub fn new(script: Vec<Result<T, ServiceError>>) -> Self {
        Self {
            script,
            calls: Mutex::new(0),
        }
    }

    pub fn call(&self) -> Ready<Result<T, ServiceError>> {
        let mut calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
        let index = (*calls).min(self.script.len().saturating_sub(1));
        *calls += 1;
        ready(
            self.script
                .get(index)
                .cloned()
                .unwrap_or_else(|| Err(ServiceError::transport("no scripted result"))),
        )
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ScriptedCall<u16> {
    /// 2xx codes succeed with the code itself; anything else is a service
    /// error with that HTTP status.
    pub fn from_status_codes(codes: &[u16]) -> Self {
        Self::new(codes.iter().map(|&code| status_result(code)).collect())
    }
}

fn status_result(code: u16) -> Result<u16, ServiceError> {
    let name = match code {
        200..=299 => return Ok(code),
        429 => "TooManyRequestsException",
        400..=499 => "ValidationException",
        500 => "InternalServerError",
        503 => "ServiceUnavailable",
        _ => "ServiceFailure",
    };
    Err(ServiceError::service(code, name, format!("scripted {code}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_then_repeats_the_last_result() {
        let call = ScriptedCall::from_status_codes(&[500, 200]);
        assert_eq!(call.call().await.unwrap_err().status(), Some(500));
        assert_eq!(call.call().await.unwrap(), 200);
        assert_eq!(call.call().await.unwrap(), 200);
        assert_eq!(call.calls(), 3);
    }

    #[test]
    fn too_many_requests_is_throttling() {
        assert!(status_result(429).unwrap_err().is_throttling());
        assert!(!status_result(404).unwrap_err().is_retryable());
    }
}

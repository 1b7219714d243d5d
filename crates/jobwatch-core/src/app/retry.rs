//! Retry with exponential backoff.
//!
//! Throttling and 5xx responses are retried; other 4xx responses are not.
//! The delay before retry n is `base_delay * multiplier^(n-1)`, so with the
//! standard policy (50 ms, x2) the waits are 50 ms, 100 ms, 200 ms, ...

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::config::{millis, opt_millis};
use crate::domain::{JobwatchError, ServiceError};
use crate::ports::{Sleeper, TokioSleeper};

/// Randomization applied to the computed delay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Jitter {
    #[default]
    None,
    /// Uniform in `[0, delay]`.
    Full,
}

/// Retry policy for calls to a remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    #[serde(rename = "base_delay_ms", with = "millis")]
    pub base_delay: Duration,

    /// Backoff multiplier for exponential backoff.
    pub multiplier: f64,

    /// Total attempts, the first call included.
    pub max_attempts: u32,

    #[serde(rename = "max_delay_ms", with = "opt_millis")]
    pub max_delay: Option<Duration>,

    pub jitter: Jitter,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl RetryPolicy {
    /// 50 ms base, doubling, 3 attempts, no jitter.
    pub fn standard() -> Self {
        Self {
            base_delay: Duration::from_millis(50),
            multiplier: 2.0,
            max_attempts: 3,
            max_delay: None,
            jitter: Jitter::None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn validate(&self) -> Result<(), JobwatchError> {
        if self.max_attempts == 0 {
            return Err(JobwatchError::Config("max_attempts must be at least 1".into()));
        }
        if !(self.multiplier.is_finite() && self.multiplier >= 1.0) {
            return Err(JobwatchError::Config("multiplier must be a finite number >= 1".into()));
        }
        Ok(())
    }

    /// Delay to wait after the given failed attempt (1-indexed), before jitter.
    ///
    /// Example with base_delay=50ms, multiplier=2.0:
    /// - attempt 1: 50ms
    /// - attempt 2: 100ms
    /// - attempt 3: 200ms
    pub fn next_delay(&self, attempts: u32) -> Duration {
        let base_secs = self.base_delay.as_secs_f64();
        let exponent = attempts.saturating_sub(1).min(i32::MAX as u32) as i32;
        let delay_secs = base_secs * self.multiplier.powi(exponent);
        let delay = Duration::try_from_secs_f64(delay_secs).unwrap_or(Duration::MAX);
        match self.max_delay {
            Some(cap) => delay.min(cap),
            None => delay,
        }
    }

    fn jittered(&self, delay: Duration) -> Duration {
        match self.jitter {
            Jitter::None => delay,
            Jitter::Full => {
                let nanos = u64::try_from(delay.as_nanos()).unwrap_or(u64::MAX);
                Duration::from_nanos(rand::thread_rng().gen_range(0..=nanos))
            }
        }
    }
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryDecision {
    Retry { delay: Duration, reason: String },
    GiveUp { reason: String },
}

/// Decides, from the attempt count and the error, whether to try again.
///
/// Deciders are pure: no sleeping, no state.
pub trait Decider: Send + Sync {
    fn decide(&self, attempts: u32, error: &ServiceError) -> RetryDecision;
}

/// Retries retryable errors until the policy's attempt budget is spent.
#[derive(Debug, Clone)]
pub struct DefaultDecider {
    policy: RetryPolicy,
}

impl DefaultDecider {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

impl Default for DefaultDecider {
    fn default() -> Self {
        Self::new(RetryPolicy::standard())
    }
}

impl Decider for DefaultDecider {
    fn decide(&self, attempts: u32, error: &ServiceError) -> RetryDecision {
        if !error.is_retryable() {
            return RetryDecision::GiveUp {
                reason: format!("not retryable: {error}"),
            };
        }
        if attempts >= self.policy.max_attempts {
            return RetryDecision::GiveUp {
                reason: format!(
                    "max attempts reached: {}/{}",
                    attempts, self.policy.max_attempts
                ),
            };
        }
        let delay = self.policy.jittered(self.policy.next_delay(attempts));
        RetryDecision::Retry {
            delay,
            reason: format!(
                "retry attempt {}/{} after {:?}",
                attempts + 1,
                self.policy.max_attempts,
                delay
            ),
        }
    }
}

/// Runs an operation until it succeeds or the decider gives up.
pub struct Retrier<D: Decider = DefaultDecider> {
    decider: D,
    sleeper: Arc<dyn Sleeper>,
}

impl Retrier<DefaultDecider> {
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_decider(DefaultDecider::new(policy))
    }
}

impl<D: Decider> Retrier<D> {
    pub fn with_decider(decider: D) -> Self {
        Self {
            decider,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Call `op` with the 1-indexed attempt number until it returns `Ok`, or
    /// return the last error once the decider gives up.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, ServiceError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            let error = match op(attempts).await {
                Ok(value) => {
                    if attempts > 1 {
                        debug!(attempts, "call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            match self.decider.decide(attempts, &error) {
                RetryDecision::Retry { delay, reason } => {
                    warn!(attempts, error = %error, ?delay, "{reason}");
                    self.sleeper.sleep(delay).await;
                }
                RetryDecision::GiveUp { reason } => {
                    debug!(attempts, error = %error, "giving up: {reason}");
                    return Err(error);
                }
            }
        }
    }
}

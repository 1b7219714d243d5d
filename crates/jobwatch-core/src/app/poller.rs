//! StatusPoller - query a job's status until it is terminal.
//!
//! The loop is always bounded: by a maximum number of queries, a deadline,
//! or both. A job that fails into a status the caller did not anticipate
//! ends in `PollTimeout` instead of spinning forever.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::config::{millis, opt_millis};
use crate::domain::{
    JobHandle, JobStatus, JobwatchError, PollObservation, PollReport, Result, StatusVocabulary,
};
use crate::ports::{Clock, JobService, Sleeper, SystemClock, TokioSleeper};

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 600;

/// What to do with a status the vocabulary does not know.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownStatusPolicy {
    /// Treat it as pending; the attempt/deadline bound still applies.
    #[default]
    KeepPolling,
    /// Stop with `JobwatchError::UnrecognizedStatus`.
    Fail,
}

/// Polling configuration.
///
/// ```ignore
/// let config = PollConfig::builder()
///     .interval(Duration::from_millis(500))
///     .max_attempts(120)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Fixed sleep before the first query (some jobs are never done sooner).
    #[serde(rename = "warm_up_ms", with = "opt_millis")]
    pub warm_up: Option<Duration>,

    #[serde(rename = "interval_ms", with = "millis")]
    pub interval: Duration,

    pub max_attempts: Option<u32>,

    /// Measured from the start of `poll`, warm-up included.
    #[serde(rename = "deadline_ms", with = "opt_millis")]
    pub deadline: Option<Duration>,

    pub unknown: UnknownStatusPolicy,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            warm_up: None,
            interval: DEFAULT_INTERVAL,
            max_attempts: Some(DEFAULT_MAX_ATTEMPTS),
            deadline: None,
            unknown: UnknownStatusPolicy::KeepPolling,
        }
    }
}

impl PollConfig {
    pub fn builder() -> PollConfigBuilder {
        PollConfigBuilder::default()
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PollConfig =
            serde_json::from_str(json).map_err(|e| JobwatchError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        match (self.max_attempts, self.deadline) {
            (None, None) => Err(JobwatchError::Config(
                "polling needs max_attempts or deadline_ms".into(),
            )),
            (Some(0), _) => Err(JobwatchError::Config("max_attempts must be at least 1".into())),
            (_, Some(d)) if d.is_zero() => {
                Err(JobwatchError::Config("deadline_ms must be positive".into()))
            }
            _ => Ok(()),
        }
    }
}

/// Builder for `PollConfig`. Without an explicit bound the poller stops after
/// `DEFAULT_MAX_ATTEMPTS` queries.
#[derive(Debug, Clone, Default)]
pub struct PollConfigBuilder {
    warm_up: Option<Duration>,
    interval: Option<Duration>,
    max_attempts: Option<u32>,
    deadline: Option<Duration>,
    unknown: UnknownStatusPolicy,
}

impl PollConfigBuilder {
    pub fn warm_up(mut self, warm_up: Duration) -> Self {
        self.warm_up = Some(warm_up);
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn unknown(mut self, policy: UnknownStatusPolicy) -> Self {
        self.unknown = policy;
        self
    }

    pub fn build(self) -> Result<PollConfig> {
        let max_attempts = match (self.max_attempts, self.deadline) {
            (None, None) => Some(DEFAULT_MAX_ATTEMPTS),
            (max_attempts, _) => max_attempts,
        };
        let config = PollConfig {
            warm_up: self.warm_up,
            interval: self.interval.unwrap_or(DEFAULT_INTERVAL),
            max_attempts,
            deadline: self.deadline,
            unknown: self.unknown,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Polls `JobService::describe` until the job is terminal.
pub struct StatusPoller {
    config: PollConfig,
    vocabulary: StatusVocabulary,
    sleeper: Arc<dyn Sleeper>,
    clock: Arc<dyn Clock>,
}

impl StatusPoller {
    pub fn new(config: PollConfig, vocabulary: StatusVocabulary) -> Self {
        Self {
            config,
            vocabulary,
            sleeper: Arc::new(TokioSleeper),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub fn vocabulary(&self) -> &StatusVocabulary {
        &self.vocabulary
    }

    /// Poll until a successful terminal status.
    ///
    /// # Errors
    /// - `JobFailed`: a failure-terminal status was observed
    /// - `UnrecognizedStatus`: unknown status under `UnknownStatusPolicy::Fail`
    /// - `PollTimeout`: the attempt bound or deadline ran out first
    /// - `Service`: a describe call failed (not retried here)
    pub async fn poll<S>(&self, service: &S, handle: &JobHandle) -> Result<PollReport>
    where
        S: JobService + ?Sized,
    {
        let started = self.clock.now();

        if let Some(warm_up) = self.config.warm_up {
            // warm-up counts against the deadline
            let warm_up = match self.config.deadline {
                Some(deadline) => warm_up.min(deadline),
                None => warm_up,
            };
            debug!(handle = %handle, ?warm_up, "waiting before first status query");
            self.sleeper.sleep(warm_up).await;
        }

        let mut observations = Vec::new();
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let report = service.describe(handle).await?;
            let status = self.vocabulary.classify(&report);
            debug!(handle = %handle, attempt, status = %status, "status polled");

            observations.push(PollObservation {
                attempt,
                status: status.clone(),
                observed_at: self.clock.now(),
            });

            match status {
                JobStatus::Succeeded { .. } => {
                    let elapsed = self.elapsed_since(started);
                    info!(handle = %handle, attempts = attempt, ?elapsed, status = %status, "job finished");
                    return Ok(PollReport {
                        handle: handle.to_string(),
                        attempts: attempt,
                        observations,
                        final_status: status,
                        elapsed,
                    });
                }
                JobStatus::Failed { raw, reason } => {
                    warn!(handle = %handle, attempts = attempt, status = %raw, ?reason, "job failed");
                    return Err(JobwatchError::JobFailed {
                        handle: handle.to_string(),
                        status: raw,
                        reason,
                    });
                }
                JobStatus::Unknown { raw } => match self.config.unknown {
                    UnknownStatusPolicy::Fail => {
                        warn!(handle = %handle, status = %raw, "unrecognized status");
                        return Err(JobwatchError::UnrecognizedStatus {
                            handle: handle.to_string(),
                            status: raw,
                        });
                    }
                    UnknownStatusPolicy::KeepPolling => {
                        debug!(handle = %handle, status = %raw, "unrecognized status, still polling");
                    }
                },
                JobStatus::Pending { .. } => {}
            }

            let elapsed = self.elapsed_since(started);
            let attempts_exhausted = self.config.max_attempts.is_some_and(|max| attempt >= max);
            let deadline_passed = self.config.deadline.is_some_and(|d| elapsed >= d);
            if attempts_exhausted || deadline_passed {
                warn!(handle = %handle, attempts = attempt, ?elapsed, "gave up waiting for terminal status");
                return Err(JobwatchError::PollTimeout {
                    handle: handle.to_string(),
                    attempts: attempt,
                    elapsed,
                });
            }

            // The last query lands on the deadline rather than past it.
            let delay = match self.config.deadline {
                Some(deadline) => self.config.interval.min(deadline.saturating_sub(elapsed)),
                None => self.config.interval,
            };
            self.sleeper.sleep(delay).await;
        }
    }

    fn elapsed_since(&self, started: chrono::DateTime<chrono::Utc>) -> Duration {
        (self.clock.now() - started).to_std().unwrap_or_default()
    }
}

//! Job status: a closed set of classes over service-specific strings.
//!
//! Every service reports progress with its own vocabulary ("PROGRESSING",
//! "FINISHED", "SUCCEEDED", "ERROR", ...). Comparing against one hardcoded
//! success string leaves every other terminal value unhandled, so the raw
//! string is always classified into a `JobStatus` and matched exhaustively.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification of a raw service status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    Pending,
    Succeeded,
    Failed,
}

/// What a describe call reports: the raw status plus an optional reason
/// (e.g. `StatusDetail`, `Error` or `StatusMessage` fields).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl StatusReport {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Classified status of a job.
///
/// State transitions:
/// - Pending -> Pending (keep polling)
/// - Pending -> Succeeded | Failed (terminal)
/// - Unknown: not in the vocabulary; the poller decides per `UnknownStatusPolicy`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum JobStatus {
    Pending { raw: String },
    Succeeded { raw: String },
    Failed { raw: String, reason: Option<String> },
    Unknown { raw: String },
}

impl JobStatus {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded { .. } | JobStatus::Failed { .. })
    }

    pub fn raw(&self) -> &str {
        match self {
            JobStatus::Pending { raw }
            | JobStatus::Succeeded { raw }
            | JobStatus::Failed { raw, .. }
            | JobStatus::Unknown { raw } => raw,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw())
    }
}

/// Maps raw status strings to a `StatusClass`.
///
/// Lookups trim whitespace and ignore ASCII case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusVocabulary {
    classes: HashMap<String, StatusClass>,
}

const STANDARD_PENDING: &[&str] = &[
    "SUBMITTED",
    "QUEUED",
    "PENDING",
    "PICKED",
    "STARTED",
    "RUNNING",
    "PROGRESSING",
    "IN_PROGRESS",
];

const STANDARD_SUCCEEDED: &[&str] = &["FINISHED", "SUCCEEDED", "COMPLETED", "COMPLETE", "SUCCESS"];

const STANDARD_FAILED: &[&str] = &[
    "FAILED",
    "ERROR",
    "ABORTED",
    "CANCELED",
    "CANCELLED",
    "TIMED_OUT",
];

impl StatusVocabulary {
    /// A vocabulary that knows nothing: every status is `Unknown`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The statuses used by the common job-style APIs.
    pub fn standard() -> Self {
        Self::empty()
            .pending(STANDARD_PENDING.iter().copied())
            .succeeded(STANDARD_SUCCEEDED.iter().copied())
            .failed(STANDARD_FAILED.iter().copied())
    }

    pub fn pending<I, S>(self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.with_class(statuses, StatusClass::Pending)
    }

    pub fn succeeded<I, S>(self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.with_class(statuses, StatusClass::Succeeded)
    }

    pub fn failed<I, S>(self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.with_class(statuses, StatusClass::Failed)
    }

    /// Later registrations win.
    fn with_class<I, S>(mut self, statuses: I, class: StatusClass) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for status in statuses {
            self.classes.insert(normalize(status.as_ref()), class);
        }
        self
    }

    pub fn class_of(&self, raw: &str) -> Option<StatusClass> {
        self.classes.get(&normalize(raw)).copied()
    }

    pub fn classify(&self, report: &StatusReport) -> JobStatus {
        let raw = report.status.clone();
        match self.class_of(&report.status) {
            Some(StatusClass::Pending) => JobStatus::Pending { raw },
            Some(StatusClass::Succeeded) => JobStatus::Succeeded { raw },
            Some(StatusClass::Failed) => JobStatus::Failed {
                raw,
                reason: report.reason.clone(),
            },
            None => JobStatus::Unknown { raw },
        }
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

fn normalize(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

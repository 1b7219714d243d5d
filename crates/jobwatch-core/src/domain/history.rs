//! Poll history: what was observed on each status query.
//!
//! A poll that returns normally hands back a `PollReport`, so a caller can
//! explain after the fact how many queries it took and what the service said
//! along the way.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::JobStatus;

/// A single status query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollObservation {
    /// 1-indexed query number.
    pub attempt: u32,
    pub status: JobStatus,
    pub observed_at: DateTime<Utc>,
}

/// Summary of a poll that reached a successful terminal status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollReport {
    pub handle: String,
    pub attempts: u32,
    pub observations: Vec<PollObservation>,
    pub final_status: JobStatus,
    /// Not serialized; durations are for local reporting only.
    #[serde(skip)]
    pub elapsed: Duration,
}

impl PollReport {
    /// Distinct raw statuses in the order they were first seen.
    ///
    /// `[PROGRESSING, PROGRESSING, FINISHED]` -> `[PROGRESSING, FINISHED]`
    pub fn transitions(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for obs in &self.observations {
            let raw = obs.status.raw();
            if out.last() != Some(&raw) {
                out.push(raw);
            }
        }
        out
    }
}

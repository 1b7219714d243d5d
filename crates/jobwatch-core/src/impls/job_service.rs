//! ScriptedJobService - an in-memory job service with a scripted status
//! sequence.
//!
//! Every submitted job replays the same script from the start; once the
//! script is exhausted the last entry repeats.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use ulid::Ulid;

use crate::domain::{JobHandle, ResultSet, ServiceError, StatusReport};
use crate::ports::JobService;

#[derive(Debug, Default)]
struct State {
    cursors: HashMap<JobHandle, usize>,
    submitted: Vec<serde_json::Value>,
    submit_calls: usize,
    describe_calls: usize,
    fetch_calls: usize,
}

/// # Example
/// ```ignore
/// let svc = ScriptedJobService::from_statuses(&["SUBMITTED", "STARTED", "FINISHED"])
///     .with_output(rows);
/// ```
#[derive(Debug)]
pub struct ScriptedJobService {
    script: Vec<Result<StatusReport, ServiceError>>,
    output: ResultSet,
    submit_error: Option<ServiceError>,
    state: Mutex<State>,
}

impl ScriptedJobService {
    pub fn new(script: Vec<Result<StatusReport, ServiceError>>) -> Self {
        Self {
            script,
            output: ResultSet::default(),
            submit_error: None,
            state: Mutex::new(State::default()),
        }
    }

    pub fn from_statuses(statuses: &[&str]) -> Self {
        Self::new(statuses.iter().map(|s| Ok(StatusReport::new(*s))).collect())
    }

    pub fn with_output(mut self, output: ResultSet) -> Self {
        self.output = output;
        self
    }

    /// Every submit call fails with `error`.
    pub fn with_submit_error(mut self, error: ServiceError) -> Self {
        self.submit_error = Some(error);
        self
    }

    /// Parameters of every submit call, in order.
    pub fn submitted(&self) -> Vec<serde_json::Value> {
        self.state().submitted.clone()
    }

    pub fn submit_calls(&self) -> usize {
        self.state().submit_calls
    }

    pub fn describe_calls(&self) -> usize {
        self.state().describe_calls
    }

    pub fn fetch_calls(&self) -> usize {
        self.state().fetch_calls
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn not_found(handle: &JobHandle) -> ServiceError {
        ServiceError::service(404, "ResourceNotFoundException", format!("job {handle} not found"))
    }
}

#[async_trait]
impl JobService for ScriptedJobService {
    type Params = serde_json::Value;
    type Output = ResultSet;

    async fn submit(&self, params: serde_json::Value) -> Result<JobHandle, ServiceError> {
        let mut state = self.state();
        state.submit_calls += 1;
        if let Some(error) = &self.submit_error {
            return Err(error.clone());
        }
        let handle = JobHandle::new(Ulid::new().to_string());
        state.submitted.push(params);
        state.cursors.insert(handle.clone(), 0);
        Ok(handle)
    }

    async fn describe(&self, handle: &JobHandle) -> Result<StatusReport, ServiceError> {
        let mut state = self.state();
        state.describe_calls += 1;
        let cursor = state.cursors.get_mut(handle).ok_or_else(|| Self::not_found(handle))?;
        let Some(last) = self.script.len().checked_sub(1) else {
            return Ok(StatusReport::new("SUBMITTED"));
        };
        let entry = self.script[(*cursor).min(last)].clone();
        *cursor += 1;
        entry
    }

    async fn fetch_result(&self, handle: &JobHandle) -> Result<ResultSet, ServiceError> {
        let mut state = self.state();
        state.fetch_calls += 1;
        if !state.cursors.contains_key(handle) {
            return Err(Self::not_found(handle));
        }
        Ok(self.output.clone())
    }
}

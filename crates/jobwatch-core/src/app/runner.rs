//! JobRunner - submit, wait, fetch.

use tracing::{debug, info};

use super::poller::StatusPoller;
use crate::domain::{JobHandle, PollReport, Result};
use crate::ports::JobService;

/// A job that reached a successful terminal status, with its payload.
#[derive(Debug, Clone)]
pub struct CompletedJob<O> {
    pub handle: JobHandle,
    pub report: PollReport,
    pub output: O,
}

/// Drives one `JobService` through submit -> poll -> fetch.
///
/// Owns the service handle for its lifetime; dropping the runner releases it.
pub struct JobRunner<S: JobService> {
    service: S,
    poller: StatusPoller,
}

impl<S: JobService> JobRunner<S> {
    pub fn new(service: S, poller: StatusPoller) -> Self {
        Self { service, poller }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn poller(&self) -> &StatusPoller {
        &self.poller
    }

    /// One remote call. Errors are returned as-is; nothing is retried.
    pub async fn submit(&self, params: S::Params) -> Result<JobHandle> {
        let handle = self.service.submit(params).await?;
        info!(handle = %handle, kind = handle.kind(), "job submitted");
        Ok(handle)
    }

    pub async fn wait(&self, handle: &JobHandle) -> Result<PollReport> {
        self.poller.poll(&self.service, handle).await
    }

    /// Read the payload of a terminal job. No caching: every call reads again.
    pub async fn fetch(&self, handle: &JobHandle) -> Result<S::Output> {
        debug!(handle = %handle, "fetching result");
        Ok(self.service.fetch_result(handle).await?)
    }

    pub async fn run(&self, params: S::Params) -> Result<CompletedJob<S::Output>> {
        let handle = self.submit(params).await?;
        let report = self.wait(&handle).await?;
        let output = self.fetch(&handle).await?;
        Ok(CompletedJob {
            handle,
            report,
            output,
        })
    }

    pub fn into_service(self) -> S {
        self.service
    }
}

//! JobService port - submit / describe / fetch for asynchronous remote work.

use async_trait::async_trait;

use crate::domain::{JobHandle, ServiceError, StatusReport};

/// One asynchronous operation family of a remote service, e.g.
/// CreateJob / ReadJob, ExecuteStatement / DescribeStatement /
/// GetStatementResult, StartDocumentAnalysis / GetDocumentAnalysis.
///
/// Implementations make exactly one remote call per method and do not retry;
/// retrying is the caller's decision (see `app::retry`).
#[async_trait]
pub trait JobService: Send + Sync {
    /// Parameters of a submission (file locations, SQL text, ...).
    type Params: Send;

    /// Payload fetched once the job is terminal.
    type Output: Send;

    async fn submit(&self, params: Self::Params) -> Result<JobHandle, ServiceError>;

    async fn describe(&self, handle: &JobHandle) -> Result<StatusReport, ServiceError>;

    /// Must not change remote state: fetching twice returns the same payload.
    async fn fetch_result(&self, handle: &JobHandle) -> Result<Self::Output, ServiceError>;
}

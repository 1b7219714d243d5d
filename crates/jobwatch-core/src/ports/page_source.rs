//! PageSource port - cursor-based list calls.

use async_trait::async_trait;

use crate::domain::{Page, PageToken, ServiceError};

#[async_trait]
pub trait PageSource: Send + Sync {
    type Item: Send;

    /// Fetch one page. `token` is `None` for the first page; `max_results` is
    /// a hint the service may ignore.
    async fn list_page(
        &self,
        token: Option<&PageToken>,
        max_results: Option<u32>,
    ) -> Result<Page<Self::Item>, ServiceError>;
}

//! NotificationSource port - a queue that receives job state changes.

use async_trait::async_trait;

use crate::domain::{Notification, ServiceError, Subscription};

#[async_trait]
pub trait NotificationSource: Send + Sync {
    /// One receive call. An empty batch means nothing arrived this time.
    /// Returned messages are considered consumed.
    async fn receive(&self, subscription: &Subscription) -> Result<Vec<Notification>, ServiceError>;
}

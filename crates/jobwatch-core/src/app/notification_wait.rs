//! NotificationWaiter - wait for a job's completion message on a queue.
//!
//! A background watcher receives batches from the subscription and hands the
//! first terminal notification for the awaited job to the caller through a
//! oneshot channel. The caller waits on that channel with a timeout; on every
//! exit path the watcher is told to stop and is joined before returning.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, warn};

use super::config::millis;
use crate::domain::{
    JobHandle, JobwatchError, Notification, Result, StatusClass, StatusVocabulary, Subscription,
};
use crate::ports::NotificationSource;

pub const DEFAULT_RECEIVE_INTERVAL: Duration = Duration::from_millis(1000);
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    /// Pause between two empty receive calls.
    #[serde(rename = "poll_interval_ms", with = "millis")]
    pub poll_interval: Duration,

    #[serde(rename = "timeout_ms", with = "millis")]
    pub timeout: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_RECEIVE_INTERVAL,
            timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }
}

impl WaitConfig {
    pub fn new(poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            poll_interval,
            timeout,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(JobwatchError::Config("timeout_ms must be positive".into()));
        }
        Ok(())
    }
}

/// Waits for terminal notifications on one subscription.
///
/// ```ignore
/// let waiter = NotificationWaiter::new(queue, subscription, StatusVocabulary::standard());
/// let done = waiter.wait_for(&handle).await?;
/// ```
pub struct NotificationWaiter<N: NotificationSource + 'static> {
    source: Arc<N>,
    subscription: Subscription,
    vocabulary: StatusVocabulary,
    config: WaitConfig,
}

impl<N: NotificationSource + 'static> NotificationWaiter<N> {
    pub fn new(source: Arc<N>, subscription: Subscription, vocabulary: StatusVocabulary) -> Self {
        Self {
            source,
            subscription,
            vocabulary,
            config: WaitConfig::default(),
        }
    }

    pub fn with_config(mut self, config: WaitConfig) -> Self {
        self.config = config;
        self
    }

    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    pub fn source(&self) -> &Arc<N> {
        &self.source
    }

    /// Wait until a terminal notification for `job` arrives.
    ///
    /// Notifications for other jobs and non-terminal states are consumed and
    /// ignored.
    ///
    /// # Errors
    /// - `JobFailed`: the notification carried a failure state
    /// - `WaitTimeout`: nothing terminal arrived within the configured timeout
    /// - `Service`: a receive call failed
    /// - `WatcherClosed`: the watcher ended without reporting
    /// - `Config`: the wait configuration is invalid (zero timeout)
    pub async fn wait_for(&self, job: &JobHandle) -> Result<Notification> {
        self.config.validate()?;

        let (done_tx, done_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let watcher = Watcher {
            source: Arc::clone(&self.source),
            subscription: self.subscription.clone(),
            vocabulary: self.vocabulary.clone(),
            job: job.clone(),
            interval: self.config.poll_interval,
        };
        let join = tokio::spawn(watcher.run(shutdown_rx, done_tx));
        debug!(job = %job, endpoint = %self.subscription.endpoint, "watching for notification");

        let outcome = tokio::time::timeout(self.config.timeout, done_rx).await;

        // ignore send error: the watcher may already have exited
        let _ = shutdown_tx.send(true);
        if let Err(e) = join.await {
            warn!(job = %job, error = %e, "notification watcher did not exit cleanly");
        }

        match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(JobwatchError::WatcherClosed),
            Err(_) => {
                warn!(job = %job, waited = ?self.config.timeout, "timed out waiting for notification");
                Err(JobwatchError::WaitTimeout {
                    waited: self.config.timeout,
                })
            }
        }
    }
}

struct Watcher<N: NotificationSource> {
    source: Arc<N>,
    subscription: Subscription,
    vocabulary: StatusVocabulary,
    job: JobHandle,
    interval: Duration,
}

impl<N: NotificationSource> Watcher<N> {
    async fn run(self, mut shutdown_rx: watch::Receiver<bool>, done: oneshot::Sender<Result<Notification>>) {
        loop {
            if *shutdown_rx.borrow() {
                return;
            }

            let batch = tokio::select! {
                _ = shutdown_rx.changed() => return,
                batch = self.source.receive(&self.subscription) => batch,
            };

            let batch = match batch {
                Ok(batch) => batch,
                Err(e) => {
                    let _ = done.send(Err(e.into()));
                    return;
                }
            };

            for notification in batch {
                if notification.job != self.job {
                    debug!(job = %notification.job, state = %notification.state, "ignoring notification for another job");
                    continue;
                }
                match self.vocabulary.class_of(&notification.state) {
                    Some(StatusClass::Succeeded) => {
                        info!(job = %self.job, state = %notification.state, "job completed");
                        let _ = done.send(Ok(notification));
                        return;
                    }
                    Some(StatusClass::Failed) => {
                        warn!(job = %self.job, state = %notification.state, "job failed");
                        let _ = done.send(Err(JobwatchError::JobFailed {
                            handle: self.job.to_string(),
                            status: notification.state,
                            reason: notification.message,
                        }));
                        return;
                    }
                    _ => {
                        debug!(job = %self.job, state = %notification.state, "non-terminal notification");
                    }
                }
            }

            tokio::select! {
                _ = shutdown_rx.changed() => return,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ServiceError;
    use crate::impls::ScriptedNotificationSource;
    use async_trait::async_trait;

    fn subscription() -> Subscription {
        Subscription::new("arn:topic/jobs", "https://queue/jobs")
    }

    fn waiter(source: Arc<ScriptedNotificationSource>, timeout: Duration) -> NotificationWaiter<ScriptedNotificationSource> {
        NotificationWaiter::new(source, subscription(), StatusVocabulary::standard())
            .with_config(WaitConfig::new(Duration::from_millis(100), timeout))
    }

    #[tokio::test(start_paused = true)]
    async fn returns_the_terminal_notification_for_the_job() {
        let source = Arc::new(ScriptedNotificationSource::new(vec![
            Ok(vec![]),
            Ok(vec![Notification::new("other", "SUCCEEDED"), Notification::new("job-1", "IN_PROGRESS")]),
            Ok(vec![Notification::new("job-1", "SUCCEEDED")]),
        ]));
        let waiter = waiter(source.clone(), Duration::from_secs(5));

        let n = waiter.wait_for(&JobHandle::new("job-1")).await.unwrap();

        assert_eq!(n.state, "SUCCEEDED");
        assert_eq!(source.receive_calls(), 3);
        assert!(source.subscriptions().iter().all(|s| *s == subscription()));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_notification_becomes_job_failed() {
        let source = Arc::new(ScriptedNotificationSource::new(vec![Ok(vec![
            Notification::new("job-1", "FAILED").with_message("unsupported format"),
        ])]));
        let waiter = waiter(source, Duration::from_secs(5));

        let err = waiter.wait_for(&JobHandle::new("job-1")).await.unwrap_err();

        match err {
            JobwatchError::JobFailed { status, reason, .. } => {
                assert_eq!(status, "FAILED");
                assert_eq!(reason.as_deref(), Some("unsupported format"));
            }
            other => panic!("expected JobFailed, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_and_stops_the_watcher() {
        let source = Arc::new(ScriptedNotificationSource::new(vec![]));
        let waiter = waiter(source.clone(), Duration::from_secs(2));

        let started = tokio::time::Instant::now();
        let err = waiter.wait_for(&JobHandle::new("job-1")).await.unwrap_err();

        assert!(matches!(err, JobwatchError::WaitTimeout { waited } if waited == Duration::from_secs(2)));
        assert!(started.elapsed() >= Duration::from_secs(2));

        let calls = source.receive_calls();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(source.receive_calls(), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn receive_error_is_surfaced() {
        let source = Arc::new(ScriptedNotificationSource::new(vec![Err(ServiceError::service(
            403,
            "AccessDenied",
            "queue policy",
        ))]));
        let waiter = waiter(source, Duration::from_secs(5));

        let err = waiter.wait_for(&JobHandle::new("job-1")).await.unwrap_err();
        assert!(matches!(err, JobwatchError::Service(ServiceError::Service { status: 403, .. })));
    }

    struct PanickingSource;

    #[async_trait]
    impl NotificationSource for PanickingSource {
        async fn receive(&self, _: &Subscription) -> std::result::Result<Vec<Notification>, ServiceError> {
            panic!("queue client crashed")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn watcher_crash_is_reported_as_closed() {
        let waiter = NotificationWaiter::new(Arc::new(PanickingSource), subscription(), StatusVocabulary::standard());

        let err = waiter.wait_for(&JobHandle::new("job-1")).await.unwrap_err();
        assert!(matches!(err, JobwatchError::WatcherClosed));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_is_rejected_before_receiving() {
        let source = Arc::new(ScriptedNotificationSource::new(vec![Ok(vec![Notification::new(
            "job-1",
            "SUCCEEDED",
        )])]));
        let waiter = waiter(source.clone(), Duration::ZERO);

        let err = waiter.wait_for(&JobHandle::new("job-1")).await.unwrap_err();

        assert!(matches!(err, JobwatchError::Config(_)));
        assert_eq!(source.receive_calls(), 0);
    }

    #[test]
    fn wait_config_reads_milliseconds() {
        let config: WaitConfig = serde_json::from_str(r#"{"timeout_ms": 1500}"#).unwrap();
        assert_eq!(config.timeout, Duration::from_millis(1500));
        assert_eq!(config.poll_interval, DEFAULT_RECEIVE_INTERVAL);
        assert!(WaitConfig::new(Duration::ZERO, Duration::ZERO).validate().is_err());
    }
}

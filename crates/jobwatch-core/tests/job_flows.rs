use std::sync::Arc;
use std::time::Duration;

use futures::TryStreamExt;
use jobwatch_core::app::{
    JobRunner, NotificationWaiter, Paginator, PollConfig, Retrier, RetryPolicy, StatusPoller,
    StreamRetry, TranscriptStream, WaitConfig,
};
use jobwatch_core::domain::{
    JobHandle, JobStatus, Notification, Page, ResultSet, ServiceError, StatusReport,
    StatusVocabulary, Subscription, TranscriptChunk,
};
use jobwatch_core::impls::{
    InMemoryPageSource, RecordingSleeper, ScriptedCall, ScriptedJobService,
    ScriptedNotificationSource, ScriptedTranscriptSource,
};
use jobwatch_core::ports::JobService;
use jobwatch_core::JobwatchError;

fn quick_poller(max_attempts: u32) -> (StatusPoller, Arc<RecordingSleeper>) {
    let sleeper = Arc::new(RecordingSleeper::new());
    let config = PollConfig::builder()
        .interval(Duration::from_millis(250))
        .max_attempts(max_attempts)
        .build()
        .unwrap();
    let poller = StatusPoller::new(config, StatusVocabulary::standard()).with_sleeper(sleeper.clone());
    (poller, sleeper)
}

#[tokio::test]
async fn statement_runs_to_completion_and_renders() {
    let rows = ResultSet::new(vec!["region".into(), "total".into()])
        .with_row([Some("eu"), Some("12")])
        .with_row([Some("us"), None]);
    let svc = ScriptedJobService::from_statuses(&["SUBMITTED", "PICKED", "STARTED", "FINISHED"])
        .with_output(rows.clone());
    let (poller, sleeper) = quick_poller(20);
    let runner = JobRunner::new(svc, poller);

    let done = runner
        .run(serde_json::json!({"sql": "select region, sum(x) from t group by 1"}))
        .await
        .unwrap();

    assert_eq!(done.report.attempts, 4);
    assert_eq!(done.report.final_status, JobStatus::Succeeded { raw: "FINISHED".into() });
    assert_eq!(sleeper.delays(), vec![Duration::from_millis(250); 3]);
    assert_eq!(done.output, rows);
    assert!(done.output.to_xml().unwrap().contains("<col name=\"total\" null=\"true\"/>"));
    assert_eq!(done.output.to_text().lines().count(), 3);
}

#[tokio::test]
async fn describe_is_never_called_after_terminal() {
    let svc = ScriptedJobService::from_statuses(&["IN_PROGRESS", "SUCCEEDED", "SUCCEEDED"]);
    let (poller, _) = quick_poller(10);
    let handle = svc.submit(serde_json::json!({})).await.unwrap();

    poller.poll(&svc, &handle).await.unwrap();

    assert_eq!(svc.describe_calls(), 2);
}

#[tokio::test]
async fn poll_bound_is_a_hard_ceiling() {
    let svc = ScriptedJobService::from_statuses(&["IN_PROGRESS"]);
    let (poller, sleeper) = quick_poller(7);
    let handle = svc.submit(serde_json::json!({})).await.unwrap();

    let err = poller.poll(&svc, &handle).await.unwrap_err();

    assert!(matches!(err, JobwatchError::PollTimeout { attempts: 7, .. }));
    assert_eq!(svc.describe_calls(), 7);
    assert_eq!(sleeper.delays().len(), 6);
}

#[tokio::test]
async fn job_failure_carries_the_service_reason() {
    let svc = ScriptedJobService::new(vec![
        Ok(StatusReport::new("PROGRESSING")),
        Ok(StatusReport::new("ERROR").with_reason("input file is not a video")),
    ]);
    let (poller, _) = quick_poller(10);
    let runner = JobRunner::new(svc, poller);

    let err = runner.run(serde_json::json!({})).await.unwrap_err();

    assert!(matches!(err, JobwatchError::JobFailed { ref status, .. } if status == "ERROR"));
    assert!(err.to_string().contains("input file is not a video"));
    assert_eq!(runner.service().fetch_calls(), 0);
}

#[tokio::test]
async fn paginator_concatenates_pages_in_order() {
    let source = InMemoryPageSource::from_pages(vec![
        Page::with_next(vec!["alice".to_string(), "bob".to_string()], "t1"),
        Page::with_next(vec!["carol".to_string()], "t2"),
        Page::with_next(vec![], ""),
    ]);
    let pager = Paginator::new(source);

    let names = pager.collect_all().await.unwrap();

    assert_eq!(names, vec!["alice", "bob", "carol"]);
    assert_eq!(pager.source().calls().len(), 3);
}

#[tokio::test]
async fn retry_around_a_describe_style_call() {
    let sleeper = Arc::new(RecordingSleeper::new());
    let retrier = Retrier::new(RetryPolicy::standard().with_max_attempts(5)).with_sleeper(sleeper.clone());
    let call = ScriptedCall::from_status_codes(&[429, 500, 503, 200]);

    let code = retrier.run(|_| call.call()).await.unwrap();

    assert_eq!(code, 200);
    assert_eq!(call.calls(), 4);
    assert_eq!(
        sleeper.delays(),
        vec![Duration::from_millis(50), Duration::from_millis(100), Duration::from_millis(200)]
    );
}

#[tokio::test(start_paused = true)]
async fn notification_wait_then_fetch() {
    let svc = ScriptedJobService::from_statuses(&["SUCCEEDED"]).with_output(ResultSet::new(vec!["text".into()]));
    let handle = svc.submit(serde_json::json!({"document": "s3://bucket/doc.pdf"})).await.unwrap();

    let queue = Arc::new(ScriptedNotificationSource::new(vec![
        Ok(vec![]),
        Ok(vec![Notification::new(handle.clone(), "SUCCEEDED")]),
    ]));
    let waiter = NotificationWaiter::new(
        queue,
        Subscription::new("arn:topic/textract", "https://queue/textract"),
        StatusVocabulary::standard(),
    )
    .with_config(WaitConfig::new(Duration::from_millis(500), Duration::from_secs(30)));

    let notification = waiter.wait_for(&handle).await.unwrap();
    assert_eq!(notification.job, handle);

    let output = svc.fetch_result(&handle).await.unwrap();
    assert_eq!(output.columns, vec!["text"]);
}

#[tokio::test(start_paused = true)]
async fn notification_for_unknown_job_times_out() {
    let queue = Arc::new(ScriptedNotificationSource::new(vec![Ok(vec![Notification::new(
        "someone-else",
        "SUCCEEDED",
    )])]));
    let waiter = NotificationWaiter::new(queue, Subscription::new("t", "q"), StatusVocabulary::standard())
        .with_config(WaitConfig::new(Duration::from_millis(200), Duration::from_secs(1)));

    let err = waiter.wait_for(&JobHandle::new("mine")).await.unwrap_err();
    assert!(matches!(err, JobwatchError::WaitTimeout { .. }));
}

#[tokio::test]
async fn transcript_survives_transient_failures() {
    let source = Arc::new(
        ScriptedTranscriptSource::new()
            .open_error(ServiceError::service(500, "InternalFailureException", "oops"))
            .open_error(ServiceError::service(429, "LimitExceededException", "slow down"))
            .session(vec![
                Ok(TranscriptChunk::partial("good")),
                Ok(TranscriptChunk::final_text("good morning")),
            ]),
    );
    let sleeper = Arc::new(RecordingSleeper::new());

    let chunks: Vec<TranscriptChunk> =
        TranscriptStream::open_with_sleeper(source.clone(), StreamRetry::default(), sleeper.clone())
            .try_collect()
            .await
            .unwrap();

    assert_eq!(chunks.len(), 2);
    assert_eq!(source.opens(), 3);
    assert_eq!(source.active_sessions(), 0);
    assert_eq!(sleeper.delays(), vec![Duration::from_millis(100); 2]);
}

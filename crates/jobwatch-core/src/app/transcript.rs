//! TranscriptStream - consume a streaming transcription, re-opening the
//! session on transient failures.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::stream::BoxStream;
use futures::{Stream, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::config::millis;
use crate::domain::{JobwatchError, Result, TranscriptChunk};
use crate::ports::{Sleeper, TokioSleeper, TranscriptSource};

pub const DEFAULT_STREAM_RETRIES: u32 = 10;
pub const DEFAULT_STREAM_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Re-open ceiling for a transcript stream. The delay is fixed, not
/// exponential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamRetry {
    pub max_retries: u32,
    #[serde(rename = "delay_ms", with = "millis")]
    pub delay: Duration,
}

impl Default for StreamRetry {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_STREAM_RETRIES,
            delay: DEFAULT_STREAM_RETRY_DELAY,
        }
    }
}

impl StreamRetry {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    pub fn never() -> Self {
        Self::new(0, Duration::ZERO)
    }
}

/// Transcript chunks in arrival order.
///
/// Nothing happens until the stream is first polled. A re-opened session
/// starts over from the beginning of the input, so chunks seen before the
/// failure may be delivered again. Dropping the stream ends the session.
pub struct TranscriptStream {
    inner: BoxStream<'static, Result<TranscriptChunk>>,
}

impl TranscriptStream {
    pub fn open<T>(source: Arc<T>, retry: StreamRetry) -> Self
    where
        T: TranscriptSource + ?Sized + 'static,
    {
        Self::open_with_sleeper(source, retry, Arc::new(TokioSleeper))
    }

    pub fn open_with_sleeper<T>(source: Arc<T>, retry: StreamRetry, sleeper: Arc<dyn Sleeper>) -> Self
    where
        T: TranscriptSource + ?Sized + 'static,
    {
        let inner = async_stream::try_stream! {
            let mut retries: u32 = 0;
            loop {
                let failure = match source.open().await {
                    Ok(mut chunks) => {
                        debug!(retries, "transcript session opened");
                        let mut failure = None;
                        while let Some(item) = chunks.next().await {
                            match item {
                                Ok(chunk) => yield chunk,
                                Err(e) => {
                                    failure = Some(e);
                                    break;
                                }
                            }
                        }
                        failure
                    }
                    Err(e) => Some(e),
                };

                let Some(failure) = failure else {
                    debug!("transcript session ended");
                    break;
                };
                if !failure.is_retryable() || retries >= retry.max_retries {
                    warn!(retries, error = %failure, "transcript stream failed");
                    Err::<(), _>(JobwatchError::from(failure))?;
                    break;
                }
                retries += 1;
                warn!(retry = retries, max_retries = retry.max_retries, error = %failure, "re-opening transcript stream");
                sleeper.sleep(retry.delay).await;
            }
        };
        Self { inner: inner.boxed() }
    }

    /// Drain the stream and join the final (non-partial) chunks with spaces.
    pub async fn final_text(self) -> Result<String> {
        let finals: Vec<String> = self
            .try_filter_map(|chunk| async move { Ok((!chunk.is_partial).then_some(chunk.text)) })
            .try_collect()
            .await?;
        Ok(finals.join(" "))
    }
}

impl Stream for TranscriptStream {
    type Item = Result<TranscriptChunk>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

//! TranscriptSource port - a streaming transcription session.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::domain::{ServiceError, TranscriptChunk};

pub type ChunkStream = BoxStream<'static, Result<TranscriptChunk, ServiceError>>;

#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Start a new session from the beginning of the input.
    /// Dropping the returned stream ends the session.
    async fn open(&self) -> Result<ChunkStream, ServiceError>;
}

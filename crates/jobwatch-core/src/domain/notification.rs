//! Notification and transcript payloads.

use serde::{Deserialize, Serialize};

use super::handle::JobHandle;

/// Where notifications for a job are delivered: the topic the service
/// publishes to and the queue/endpoint subscribed to it.
///
/// Passed explicitly to every receive call; nothing is kept in process-wide
/// state between calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub topic: String,
    pub endpoint: String,
}

impl Subscription {
    pub fn new(topic: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            endpoint: endpoint.into(),
        }
    }
}

/// A job state change delivered through a notification queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "jobId")]
    pub job: JobHandle,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Notification {
    pub fn new(job: impl Into<JobHandle>, state: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            state: state.into(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// A piece of transcribed text. Partial chunks may be revised by a later one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptChunk {
    pub text: String,
    #[serde(default)]
    pub is_partial: bool,
}

impl TranscriptChunk {
    pub fn final_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_partial: false,
        }
    }

    pub fn partial(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_partial: true,
        }
    }
}

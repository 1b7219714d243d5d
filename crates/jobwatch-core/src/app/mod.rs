//! App - the interaction loops, built on the ports.
//!
//! # Components
//! - **JobRunner**: submit -> poll -> fetch
//! - **StatusPoller**: bounded status polling
//! - **Paginator**: page-token consumer
//! - **Retrier**: retry with exponential backoff for throttling / 5xx
//! - **NotificationWaiter**: background queue watcher + one-shot completion
//! - **TranscriptStream**: re-opening transcript stream with a retry ceiling

pub mod config;
pub mod notification_wait;
pub mod pager;
pub mod poller;
pub mod retry;
pub mod runner;
pub mod transcript;

pub use self::notification_wait::{NotificationWaiter, WaitConfig};
pub use self::pager::Paginator;
pub use self::poller::{PollConfig, PollConfigBuilder, StatusPoller, UnknownStatusPolicy};
pub use self::retry::{Decider, DefaultDecider, Jitter, Retrier, RetryDecision, RetryPolicy};
pub use self::runner::{CompletedJob, JobRunner};
pub use self::transcript::{StreamRetry, TranscriptStream};

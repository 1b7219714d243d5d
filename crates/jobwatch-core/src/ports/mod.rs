//! Ports - the seam between this crate and the outside world.
//!
//! Each trait stands in for one shape of call a generated service client
//! exposes. The client itself (credentials, signing, wire format) stays
//! behind the trait.
//!
//! # Client-facing ports
//! - `JobService`: submit / describe / fetch_result
//! - `PageSource`: list(pageToken?) -> (items, nextPageToken?)
//! - `NotificationSource`: one receive call against a notification queue
//! - `TranscriptSource`: opens a stream of transcript chunks
//!
//! # Runtime ports
//! - `Clock`, `Sleeper`: swapped for manual implementations in tests

pub mod clock;
pub mod job_service;
pub mod notification_source;
pub mod page_source;
pub mod sleeper;
pub mod transcript_source;

pub use self::clock::{Clock, ManualClock, SystemClock};
pub use self::job_service::JobService;
pub use self::notification_source::NotificationSource;
pub use self::page_source::PageSource;
pub use self::sleeper::{Sleeper, TokioSleeper};
pub use self::transcript_source::{ChunkStream, TranscriptSource};

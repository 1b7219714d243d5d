//! Impls - scripted, in-memory implementations of the ports.
//!
//! Used by the test suites and by the `jobwatch` CLI demos. A real service
//! client lives outside this crate and implements the same traits.
//!
//! # Included
//! - **ScriptedJobService**: replays a status sequence, returns a fixed result set
//! - **InMemoryPageSource**: serves pages keyed by token
//! - **ScriptedNotificationSource**: replays receive batches
//! - **ScriptedTranscriptSource**: replays transcript sessions, tracks open ones
//! - **RecordingSleeper**: records delays instead of sleeping
//! - **ScriptedCall**: a sequence of results for retry loops

pub mod call;
pub mod job_service;
pub mod notification_source;
pub mod page_source;
pub mod sleeper;
pub mod transcript_source;

pub use self::call::ScriptedCall;
pub use self::job_service::ScriptedJobService;
pub use self::notification_source::ScriptedNotificationSource;
pub use self::page_source::InMemoryPageSource;
pub use self::sleeper::RecordingSleeper;
pub use self::transcript_source::ScriptedTranscriptSource;

//! jobwatch-core
//!
//! Building blocks for driving asynchronous cloud jobs through an opaque
//! service client: submit, poll until terminal, fetch, paginate, retry.
//!
//! # Modules
//! - **domain**: handles, statuses, pages, result sets, errors, poll history
//! - **ports**: the client seam (JobService, PageSource, NotificationSource,
//!   TranscriptSource) plus Clock and Sleeper
//! - **app**: JobRunner, StatusPoller, Paginator, Retrier, NotificationWaiter,
//!   TranscriptStream
//! - **impls**: scripted in-memory services for tests and demos

pub mod domain;
pub mod ports;
pub mod app;
pub mod impls;

pub use domain::errors::{JobwatchError, Result, ServiceError};

//! Domain model (handles, statuses, pages, payloads, errors, ...).

pub mod errors;
pub mod handle;
pub mod history;
pub mod notification;
pub mod page;
pub mod result_set;
pub mod status;

pub use self::errors::{JobwatchError, Result, ServiceError};
pub use self::handle::{AnalysisId, Handle, HandleKind, JobHandle, StatementId};
pub use self::history::{PollObservation, PollReport};
pub use self::notification::{Notification, Subscription, TranscriptChunk};
pub use self::page::{Page, PageToken};
pub use self::result_set::{ResultSet, XmlError};
pub use self::status::{JobStatus, StatusClass, StatusReport, StatusVocabulary};

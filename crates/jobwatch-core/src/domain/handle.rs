//! Opaque job handles (strongly-typed identifiers).
//!
//! A submit call hands back an identifier the caller must never interpret: a
//! transcoding job id, a SQL statement id, a document analysis job id. It is
//! passed back verbatim to the describe and fetch calls.
//!
//! `Handle<K>` keeps the raw string and uses a phantom marker so that a
//! statement id cannot be passed where a transcoding job handle is expected.
//! The marker costs nothing at runtime.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Marker trait for handle kinds.
pub trait HandleKind: Send + Sync + 'static {
    /// Short name used in log fields and error messages.
    fn name() -> &'static str;
}

/// An opaque identifier issued by a remote service.
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle<K: HandleKind> {
    raw: String,
    #[serde(skip)]
    _marker: PhantomData<K>,
}

impl<K: HandleKind> Handle<K> {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            _marker: PhantomData,
        }
    }

    /// The identifier exactly as the service returned it.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> &'static str {
        K::name()
    }

    pub fn into_inner(self) -> String {
        self.raw
    }
}

// Manual impls: deriving would put bounds on `K`, which is never instantiated.
impl<K: HandleKind> Clone for Handle<K> {
    fn clone(&self) -> Self {
        Self::new(self.raw.clone())
    }
}

impl<K: HandleKind> PartialEq for Handle<K> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<K: HandleKind> Eq for Handle<K> {}

impl<K: HandleKind> std::hash::Hash for Handle<K> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<K: HandleKind> fmt::Debug for Handle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", K::name(), self.raw)
    }
}

impl<K: HandleKind> fmt::Display for Handle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl<K: HandleKind> From<String> for Handle<K> {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl<K: HandleKind> From<&str> for Handle<K> {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

// ========================================
// Kinds
// ========================================

/// Generic asynchronous job (transcoding, batch operations, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Job {}

impl HandleKind for Job {
    fn name() -> &'static str {
        "job"
    }
}

/// Submitted SQL statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statement {}

impl HandleKind for Statement {
    fn name() -> &'static str {
        "statement"
    }
}

/// Document analysis task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Analysis {}

impl HandleKind for Analysis {
    fn name() -> &'static str {
        "analysis"
    }
}

pub type JobHandle = Handle<Job>;
pub type StatementId = Handle<Statement>;
pub type AnalysisId = Handle<Analysis>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_the_raw_identifier() {
        let handle = JobHandle::new("1522353214563-abcdef");
        assert_eq!(handle.to_string(), "1522353214563-abcdef");
        assert_eq!(handle.kind(), "job");

        let stmt = StatementId::new("d9b6c0c9-0747-4bf4-b142-e8883122f766");
        assert_eq!(stmt.kind(), "statement");
        assert_eq!(format!("{stmt:?}"), "statement(\"d9b6c0c9-0747-4bf4-b142-e8883122f766\")");

        // let _: JobHandle = stmt; // <- does not compile
    }

    #[test]
    fn serializes_as_plain_string() {
        let handle = AnalysisId::new("abc123");
        let s = serde_json::to_string(&handle).unwrap();
        assert_eq!(s, "\"abc123\"");

        let back: AnalysisId = serde_json::from_str(&s).unwrap();
        assert_eq!(back, handle);
    }

    #[test]
    fn phantom_marker_does_not_consume_memory() {
        use std::mem::size_of;
        assert_eq!(size_of::<JobHandle>(), size_of::<String>());
    }
}

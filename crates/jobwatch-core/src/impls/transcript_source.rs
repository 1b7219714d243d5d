//! ScriptedTranscriptSource - replays transcript sessions.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;

use crate::domain::{ServiceError, TranscriptChunk};
use crate::ports::{ChunkStream, TranscriptSource};

#[derive(Debug)]
enum Session {
    OpenError(ServiceError),
    Chunks {
        items: Vec<Result<TranscriptChunk, ServiceError>>,
        hang: bool,
    },
}

/// Decrements the open-session count when the stream holding it is dropped.
struct SessionGuard(Arc<AtomicUsize>);

impl SessionGuard {
    fn new(active: &Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(active))
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Each `open` takes the next scripted session. Past the script, sessions are
/// empty and end immediately.
#[derive(Debug, Default)]
pub struct ScriptedTranscriptSource {
    sessions: Mutex<VecDeque<Session>>,
    opens: AtomicUsize,
    active: Arc<AtomicUsize>,
}

impl ScriptedTranscriptSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A session that yields `items` and then ends.
    pub fn session(self, items: Vec<Result<TranscriptChunk, ServiceError>>) -> Self {
        self.push(Session::Chunks { items, hang: false })
    }

    /// A session that yields `chunks` and then stays open without output.
    pub fn hanging_session(self, chunks: Vec<TranscriptChunk>) -> Self {
        self.push(Session::Chunks {
            items: chunks.into_iter().map(Ok).collect(),
            hang: true,
        })
    }

    /// An open call that fails with `error`.
    pub fn open_error(self, error: ServiceError) -> Self {
        self.push(Session::OpenError(error))
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Sessions whose stream has not been dropped yet.
    pub fn active_sessions(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    fn push(self, session: Session) -> Self {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner()).push_back(session);
        self
    }
}

#[async_trait]
impl TranscriptSource for ScriptedTranscriptSource {
    async fn open(&self) -> Result<ChunkStream, ServiceError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let next = self.sessions.lock().unwrap_or_else(|e| e.into_inner()).pop_front();
        let (items, hang) = match next {
            Some(Session::OpenError(error)) => return Err(error),
            Some(Session::Chunks { items, hang }) => (items, hang),
            None => (Vec::new(), false),
        };

        let guard = SessionGuard::new(&self.active);
        let tail = if hang { stream::pending().boxed() } else { stream::empty().boxed() };
        Ok(stream::iter(items)
            .chain(tail)
            .map(move |item| {
                let _session = &guard;
                item
            })
            .boxed())
    }
}

//! Paginator - follow page tokens until the service says there are no more.

use std::collections::HashSet;

use futures::{Stream, TryStreamExt};
use tracing::debug;

use crate::domain::{JobwatchError, PageToken, Result};
use crate::ports::PageSource;

/// Consumes a `PageSource` page by page.
///
/// ```ignore
/// let users = Paginator::new(source).max_results(50).collect_all().await?;
/// ```
pub struct Paginator<P: PageSource> {
    source: P,
    max_results: Option<u32>,
    limit: Option<usize>,
}

impl<P: PageSource> Paginator<P> {
    pub fn new(source: P) -> Self {
        Self {
            source,
            max_results: None,
            limit: None,
        }
    }

    /// Page size hint forwarded to every list call.
    pub fn max_results(mut self, max_results: u32) -> Self {
        self.max_results = Some(max_results);
        self
    }

    /// Stop after this many items, even if more pages exist.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn source(&self) -> &P {
        &self.source
    }

    /// Items of every page, in order. Pages are fetched lazily: the next list
    /// call happens only once the previous page has been consumed.
    pub fn stream(&self) -> impl Stream<Item = Result<P::Item>> + Send + '_ {
        async_stream::try_stream! {
            let mut token: Option<PageToken> = None;
            let mut seen: HashSet<PageToken> = HashSet::new();
            let mut yielded: usize = 0;
            let mut pages: u32 = 0;
            loop {
                if self.limit.is_some_and(|limit| yielded >= limit) {
                    break;
                }
                let page = self
                    .source
                    .list_page(token.as_ref(), self.max_results)
                    .await
                    .map_err(JobwatchError::from)?;
                pages += 1;
                debug!(page = pages, items = page.items.len(), next = ?page.next_token, "page received");

                let next = page.next_token;
                for item in page.items {
                    if self.limit.is_some_and(|limit| yielded >= limit) {
                        break;
                    }
                    yielded += 1;
                    yield item;
                }

                match next {
                    None => break,
                    Some(next) if !seen.insert(next.clone()) => {
                        Err::<(), _>(JobwatchError::PageTokenRepeated { token: next.to_string() })?;
                    }
                    Some(next) => token = Some(next),
                }
            }
        }
    }

    /// Accumulate every item into memory.
    pub async fn collect_all(&self) -> Result<Vec<P::Item>> {
        self.stream().try_collect().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Page, ServiceError};
    use crate::impls::InMemoryPageSource;
    use futures::StreamExt;

    #[tokio::test]
    async fn follows_markers_until_null() {
        let source = InMemoryPageSource::from_pages(vec![
            Page::with_next(vec!["A", "B"], "m1"),
            Page::last(vec!["C"]),
        ]);
        let pager = Paginator::new(source);

        let items = pager.collect_all().await.unwrap();

        assert_eq!(items, vec!["A", "B", "C"]);
        assert_eq!(
            pager.source().calls(),
            vec![(None, None), (Some("m1".to_string()), None)]
        );
    }

    #[tokio::test]
    async fn empty_marker_is_the_last_page() {
        let source = InMemoryPageSource::from_pages(vec![Page::with_next(vec![1, 2], "")]);
        let pager = Paginator::new(source);

        assert_eq!(pager.collect_all().await.unwrap(), vec![1, 2]);
        assert_eq!(pager.source().calls().len(), 1);
    }

    #[tokio::test]
    async fn max_results_hint_is_forwarded() {
        let source = InMemoryPageSource::from_items((1..=7).collect::<Vec<u32>>(), 100);
        let pager = Paginator::new(source).max_results(3);

        assert_eq!(pager.collect_all().await.unwrap(), (1..=7).collect::<Vec<u32>>());
        let calls = pager.source().calls();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|(_, hint)| *hint == Some(3)));
    }

    #[tokio::test]
    async fn limit_stops_fetching_pages() {
        let source = InMemoryPageSource::from_items((1..=10).collect::<Vec<u32>>(), 2);
        let pager = Paginator::new(source).limit(3);

        assert_eq!(pager.collect_all().await.unwrap(), vec![1, 2, 3]);
        assert_eq!(pager.source().calls().len(), 2);
    }

    #[tokio::test]
    async fn stream_is_lazy() {
        let source = InMemoryPageSource::from_items((1..=6).collect::<Vec<u32>>(), 2);
        let pager = Paginator::new(source);
        let stream = pager.stream();
        futures::pin_mut!(stream);

        assert_eq!(stream.next().await.unwrap().unwrap(), 1);
        assert_eq!(pager.source().calls().len(), 1);
        assert_eq!(stream.next().await.unwrap().unwrap(), 2);
        assert_eq!(stream.next().await.unwrap().unwrap(), 3);
        assert_eq!(pager.source().calls().len(), 2);
    }

    #[tokio::test]
    async fn repeated_token_ends_with_error() {
        let source = InMemoryPageSource::from_pages(vec![
            Page::with_next(vec!["A"], "same"),
            Page::with_next(vec!["B"], "same"),
        ]);
        let pager = Paginator::new(source);

        let err = pager.collect_all().await.unwrap_err();
        assert!(matches!(err, JobwatchError::PageTokenRepeated { ref token } if token == "same"));
    }

    #[tokio::test]
    async fn token_cycle_ends_with_error() {
        let source = InMemoryPageSource::from_pages(vec![
            Page::with_next(vec!["A"], "t1"),
            Page::with_next(vec!["B"], "t2"),
            Page::with_next(vec!["C"], "t1"),
        ]);
        let pager = Paginator::new(source);

        let err = pager.collect_all().await.unwrap_err();

        assert!(matches!(err, JobwatchError::PageTokenRepeated { ref token } if token == "t1"));
        assert_eq!(pager.source().calls().len(), 3);
    }

    #[tokio::test]
    async fn list_error_is_surfaced() {
        let source = InMemoryPageSource::<u32>::failing(ServiceError::service(403, "AccessDeniedException", "no"));
        let err = Paginator::new(source).collect_all().await.unwrap_err();
        assert!(matches!(err, JobwatchError::Service(ServiceError::Service { status: 403, .. })));
    }
}

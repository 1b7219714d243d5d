//! InMemoryPageSource - serves pre-built pages keyed by continuation token.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{Page, PageToken, ServiceError};
use crate::ports::PageSource;

#[derive(Debug)]
enum Script<T> {
    /// The first page answers `None`; page i+1 answers the token of page i.
    Pages(Vec<Page<T>>),
    /// Slices of `items`; the token is the offset of the next slice.
    Items { items: Vec<T>, page_size: usize },
    Failing(ServiceError),
}

#[derive(Debug)]
pub struct InMemoryPageSource<T> {
    script: Script<T>,
    calls: Mutex<Vec<(Option<String>, Option<u32>)>>,
}

impl<T> InMemoryPageSource<T> {
    fn with_script(script: Script<T>) -> Self {
        Self {
            script,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn from_pages(pages: Vec<Page<T>>) -> Self {
        Self::with_script(Script::Pages(pages))
    }

    /// Pages of at most `page_size` items. A smaller `max_results` hint wins.
    pub fn from_items(items: Vec<T>, page_size: usize) -> Self {
        Self::with_script(Script::Items {
            items,
            page_size: page_size.max(1),
        })
    }

    /// Every list call fails with `error`.
    pub fn failing(error: ServiceError) -> Self {
        Self::with_script(Script::Failing(error))
    }

    /// `(token, max_results)` of every list call, in order.
    pub fn calls(&self) -> Vec<(Option<String>, Option<u32>)> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

fn invalid_token(token: &PageToken) -> ServiceError {
    ServiceError::service(400, "InvalidNextTokenException", format!("unknown token {token}"))
}

#[async_trait]
impl<T> PageSource for InMemoryPageSource<T>
where
    T: Clone + Send + Sync,
{
    type Item = T;

    async fn list_page(
        &self,
        token: Option<&PageToken>,
        max_results: Option<u32>,
    ) -> Result<Page<T>, ServiceError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((token.map(|t| t.to_string()), max_results));

        match &self.script {
            Script::Failing(error) => Err(error.clone()),
            Script::Pages(pages) => {
                let index = match token {
                    None => 0,
                    Some(token) => pages
                        .iter()
                        .position(|p| p.next_token.as_ref() == Some(token))
                        .map(|i| i + 1)
                        .ok_or_else(|| invalid_token(token))?,
                };
                match pages.get(index) {
                    Some(page) => Ok(page.clone()),
                    None if index == 0 => Ok(Page::last(Vec::new())),
                    None => Err(token.map(invalid_token).unwrap_or_else(|| {
                        ServiceError::service(500, "InternalFailure", "page script exhausted")
                    })),
                }
            }
            Script::Items { items, page_size } => {
                let offset = match token {
                    None => 0,
                    Some(token) => token
                        .as_str()
                        .parse::<usize>()
                        .ok()
                        .filter(|offset| *offset < items.len())
                        .ok_or_else(|| invalid_token(token))?,
                };
                let size = max_results
                    .map(|hint| (hint.max(1) as usize).min(*page_size))
                    .unwrap_or(*page_size);
                let end = (offset + size).min(items.len());
                let slice = items[offset..end].to_vec();
                if end < items.len() {
                    Ok(Page::with_next(slice, end.to_string()))
                } else {
                    Ok(Page::last(slice))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn item_pages_carry_offset_tokens() {
        let source = InMemoryPageSource::from_items(vec!['a', 'b', 'c'], 2);

        let first = source.list_page(None, None).await.unwrap();
        assert_eq!(first.items, vec!['a', 'b']);
        assert_eq!(first.next_token.as_ref().map(PageToken::as_str), Some("2"));

        let second = source.list_page(first.next_token.as_ref(), None).await.unwrap();
        assert_eq!(second.items, vec!['c']);
        assert!(second.is_last());
    }

    #[tokio::test]
    async fn unknown_token_is_rejected() {
        let source = InMemoryPageSource::from_pages(vec![Page::last(vec![1])]);
        let bogus = PageToken::parse("bogus").unwrap();

        let err = source.list_page(Some(&bogus), None).await.unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(source.calls(), vec![(Some("bogus".to_string()), None)]);
    }
}

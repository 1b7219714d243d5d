//! Cursor-based pages returned by list calls.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque continuation marker (`NextToken`, `Marker`, `nextPageToken`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageToken(String);

impl PageToken {
    /// Returns `None` for an empty marker: some services signal the last page
    /// with `""` rather than omitting the field.
    pub fn parse(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() { None } else { Some(Self(raw)) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of a list call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub next_token: Option<PageToken>,
}

impl<T> Page<T> {
    /// The final page.
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }

    /// A page followed by more results. An empty `token` makes this the last page.
    pub fn with_next(items: Vec<T>, token: impl Into<String>) -> Self {
        Self {
            items,
            next_token: PageToken::parse(token),
        }
    }

    pub fn is_last(&self) -> bool {
        self.next_token.is_none()
    }
}

//! Cursor pagination
//!
//! Listing endpoints return a [`Page`] with an opaque `next` cursor. The
//! [`PageCursor`] state machine decides what to request next and is shared
//! by the async [`paginate`] stream and the blocking iterator, so both walk
//! pages in the same order with the same requests:
//!
//! ```text
//! Start ──list(None)──► Next(c) ──list(Some(c))──► ... ──next absent──► Done
//! ```

use crate::errors::{Result, VaikerError};
use crate::types::Page;
use futures_util::stream::{self, Stream};
use std::future::Future;
use tracing::debug;

/// Where pagination stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCursor {
    /// First page not fetched yet
    Start,
    /// Next page lives behind this cursor
    Next(String),
    /// The last page had no `next`
    Done,
}

impl PageCursor {
    pub fn new() -> Self {
        PageCursor::Start
    }

    /// Cursor argument for the next listing call, or `None` when finished
    pub fn request(&self) -> Option<Option<String>> {
        match self {
            PageCursor::Start => Some(None),
            PageCursor::Next(cursor) => Some(Some(cursor.clone())),
            PageCursor::Done => None,
        }
    }

    /// Advance past a fetched page
    pub fn advance<T>(&mut self, page: &Page<T>) {
        *self = match &page.next {
            Some(next) => PageCursor::Next(next.clone()),
            None => PageCursor::Done,
        };
    }

    pub fn is_done(&self) -> bool {
        matches!(self, PageCursor::Done)
    }
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve a listing path against an optional cursor.
///
/// `None` requests the first page. A cursor must be either an absolute path
/// or an absolute URL under `base_url`, as handed out by the API; anything
/// else, including an empty string or a URL on another origin or scheme, is
/// rejected before any request is made.
pub fn cursor_path(base_url: &str, first_page: &str, cursor: Option<&str>) -> Result<String> {
    let Some(cursor) = cursor else {
        return Ok(first_page.to_string());
    };

    let cursor = cursor.trim();
    if cursor.is_empty() {
        return Err(VaikerError::Validation(
            "cursor cannot be empty; pass None to start from the first page".to_string(),
        ));
    }

    if cursor.starts_with("https://") || cursor.starts_with("http://") {
        let base = base_url.trim_end_matches('/');
        return match cursor.strip_prefix(base) {
            Some(rest) if rest.starts_with('/') || rest.starts_with('?') => Ok(cursor.to_string()),
            _ => Err(VaikerError::Validation(format!(
                "cursor '{}' does not belong to {}",
                cursor, base
            ))),
        };
    }

    if cursor.starts_with('/') {
        Ok(cursor.to_string())
    } else {
        Err(VaikerError::Validation(format!(
            "invalid cursor '{}': expected a URL returned by a previous page",
            cursor
        )))
    }
}

/// Lazily walk every page of a listing, in order.
///
/// `list_fn` receives `None` for the first page and then each page's `next`
/// cursor until one is absent. The first error ends the stream.
pub fn paginate<T, F, Fut>(list_fn: F) -> impl Stream<Item = Result<Page<T>>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    stream::try_unfold(
        (list_fn, PageCursor::new()),
        |(mut list_fn, mut cursor)| async move {
            let Some(request) = cursor.request() else {
                return Ok(None);
            };

            let page = list_fn(request).await?;
            cursor.advance(&page);
            debug!(results = page.len(), more = !cursor.is_done(), "fetched page");

            Ok(Some((page, (list_fn, cursor))))
        },
    )
}

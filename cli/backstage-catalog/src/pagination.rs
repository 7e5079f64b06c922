//! Cursor based pagination.

use std::future::Future;

use async_stream::try_stream;
use futures::stream::Stream;
use tracing::debug;

use crate::types::Cursor;

/// A response that may point at a following page.
pub trait Paginated {
    /// The cursor of the next page, `None` on the last page.
    fn next_cursor(&self) -> Option<&Cursor>;
}

/// Drive a cursor paginated `operation` as a lazy stream of pages.
///
/// The first call is made without a cursor, every following call with the
/// `nextCursor` of the previous page. The stream ends after the first page
/// without a (non-empty) next cursor, or after yielding the first error.
/// Nothing is requested until the stream is polled and there is no upper
/// bound on the number of pages.
pub fn paginate<T, E, Fut>(
    operation: impl Fn(Option<Cursor>) -> Fut,
) -> impl Stream<Item = Result<T, E>>
where
    T: Paginated,
    Fut: Future<Output = Result<T, E>>,
{
    try_stream! {
        let mut cursor = None;
        let mut page_number = 0_usize;
        loop {
            let page = operation(cursor.take()).await?;
            let next_cursor = page
                .next_cursor()
                .filter(|cursor| !cursor.as_str().is_empty())
                .cloned();
            debug!(page_number, has_next = next_cursor.is_some(), "received page");

            yield page;

            match next_cursor {
                Some(next_cursor) => cursor = Some(next_cursor),
                None => break,
            }
            page_number += 1;
        }
    }
}

//! Lazy "scan everything" iteration.

use std::collections::VecDeque;

use cloak_common::StoreClient;

use super::run;
use crate::error::Result;
use crate::transform::scan::{Page, TERMINAL_CURSOR};
use crate::transform::Call;

type PageFn<'a, T> = Box<dyn FnMut(u64) -> Result<Call<Page<T>>> + Send + 'a>;

/// Pulls scan pages on demand and yields their decrypted items one by one.
///
/// Paging starts at cursor 0 and ends when the store hands cursor 0 back.
/// Dropping the iterator stops paging; starting over means asking the client
/// for a new iterator.
pub struct ScanIter<'a, C: ?Sized, T> {
    store: &'a C,
    page: PageFn<'a, T>,
    cursor: Option<u64>,
    buffered: VecDeque<T>,
}

impl<'a, C, T> ScanIter<'a, C, T>
where
    C: StoreClient + ?Sized,
    T: Send,
{
    pub(crate) fn new<F>(store: &'a C, page: F) -> Self
    where
        F: FnMut(u64) -> Result<Call<Page<T>>> + Send + 'a,
    {
        Self {
            store,
            page: Box::new(page),
            cursor: Some(TERMINAL_CURSOR),
            buffered: VecDeque::new(),
        }
    }

    /// The next item, fetching another page when the buffer is empty.
    ///
    /// Returns `None` once the store reports the end of the scan. An error
    /// ends the iteration.
    pub async fn next(&mut self) -> Option<Result<T>> {
        loop {
            if let Some(item) = self.buffered.pop_front() {
                return Some(Ok(item));
            }
            let cursor = self.cursor?;
            match run(self.store, (self.page)(cursor)).await {
                Ok((next, items)) => {
                    self.cursor = (next != TERMINAL_CURSOR).then_some(next);
                    self.buffered.extend(items);
                }
                Err(e) => {
                    self.cursor = None;
                    return Some(Err(e));
                }
            }
        }
    }

    /// Drain the remaining items into a vector.
    pub async fn try_collect(mut self) -> Result<Vec<T>> {
        let mut out = Vec::new();
        while let Some(item) = self.next().await {
            out.push(item?);
        }
        Ok(out)
    }
}

//! Windowed paginator and bounded assembly
//!
//! The data API has no opaque cursors: each page is requested with a time
//! window, and the window is narrowed using the boundary timestamp of the
//! previous page.
//!
//! - **Ascending**: `since_after` (exclusive) moves the lower edge forward
//! - **Descending**: `to` moves the upper edge back. It is inclusive on some
//!   backends, so records repeated at the boundary are dropped.

use super::types::{Cursor, PageRecord};
use crate::error::{Error, Result};
use crate::http::Transport;
use crate::normalize::{Normalizer, Tree};
use crate::types::{format_timestamp, Order};
use futures::stream::{self, Stream};
use std::marker::PhantomData;
use tracing::{debug, trace};

/// Stateful iterator over one windowed, ordered resource
///
/// Owns its cursor exclusively; create one paginator per retrieval.
pub struct Paginator<'a, R> {
    transport: &'a dyn Transport,
    url: String,
    path: String,
    cursor: Cursor,
    normalizer: Option<Normalizer>,
    /// Records at the end of the previous page sharing its boundary timestamp
    boundary_run: usize,
    _record: PhantomData<fn() -> R>,
}

impl<'a, R: PageRecord> Paginator<'a, R> {
    /// Create a paginator for `url`, whose records belong to `path`
    pub fn new(
        transport: &'a dyn Transport,
        url: impl Into<String>,
        path: impl Into<String>,
        cursor: Cursor,
    ) -> Result<Self> {
        if cursor.page_size == 0 {
            return Err(Error::invalid_config(
                "page_size",
                "must be greater than zero",
            ));
        }

        Ok(Self {
            transport,
            url: url.into(),
            path: path.into(),
            cursor,
            normalizer: None,
            boundary_run: 0,
            _record: PhantomData,
        })
    }

    /// Decode records with the declared types of an interface
    #[must_use]
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Start over from the first page
    pub fn rewind(&mut self) {
        self.cursor.rewind();
        self.boundary_run = 0;
    }

    pub fn has_next_page(&self) -> bool {
        !self.cursor.exhausted
    }

    /// Fetch the next page
    ///
    /// On any error the cursor is left as it was, so the same page can be
    /// requested again.
    pub async fn get_next_page(&mut self) -> Result<Vec<R>> {
        if self.cursor.exhausted {
            return Err(Error::NoMorePages);
        }

        let query = self.cursor.query();
        debug!("Fetching page of {} with {:?}", self.url, query);

        let data = self.transport.get(&self.url, &query).await?;
        let records: Vec<Tree> = serde_json::from_value(data)
            .map_err(|e| Error::decode(format!("Expected a list of records: {e}")))?;
        let mut page = records
            .iter()
            .map(|record| R::from_tree(record, &self.path, self.normalizer.as_ref()))
            .collect::<Result<Vec<R>>>()?;

        let page_size = self.cursor.page_size;
        let full = page.len() >= page_size;

        // Repeats of the previous page's tail at an inclusive `to`
        let mut repeated = 0;
        if let (Order::Descending, Some(boundary)) =
            (self.cursor.order, self.cursor.next_window_boundary)
        {
            if full && page.last().map(R::timestamp) == Some(boundary) {
                return Err(Error::PaginationStalled {
                    boundary: format_timestamp(&boundary),
                });
            }
            repeated = page
                .iter()
                .take(self.boundary_run)
                .take_while(|r| r.timestamp() == boundary)
                .count();
        }

        match page.last().map(R::timestamp) {
            Some(last) if full => {
                self.boundary_run = page
                    .iter()
                    .rev()
                    .take_while(|r| r.timestamp() == last)
                    .count();
                self.cursor.next_window_boundary = Some(last);
            }
            _ => {
                trace!("Last page of {} ({} records)", self.url, page.len());
                self.cursor.exhausted = true;
                self.boundary_run = 0;
            }
        }

        if repeated > 0 {
            trace!("Dropping {repeated} records repeated at the page boundary");
            page.drain(..repeated);
        }

        Ok(page)
    }

    /// Adapt into a stream of pages
    ///
    /// The stream ends after the last page, or after yielding the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<Vec<R>>> + 'a
    where
        R: 'a,
    {
        stream::unfold(Some(self), |state| async move {
            let Some(mut paginator) = state else {
                return None;
            };
            if !paginator.has_next_page() {
                return None;
            }
            match paginator.get_next_page().await {
                Ok(page) => Some((Ok(page), Some(paginator))),
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}

impl<R> std::fmt::Debug for Paginator<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Paginator")
            .field("url", &self.url)
            .field("path", &self.path)
            .field("cursor", &self.cursor)
            .field("has_normalizer", &self.normalizer.is_some())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Bounded Assembly
// ============================================================================

/// Collect records from a paginator
///
/// With `limit == 0` every page is drained. Otherwise exactly
/// `min(limit, available)` records are returned, and no page is requested
/// once the limit is reached.
pub async fn fetch_bounded<R: PageRecord>(
    paginator: &mut Paginator<'_, R>,
    limit: usize,
) -> Result<Vec<R>> {
    let mut records = Vec::new();

    while paginator.has_next_page() {
        let mut page = paginator.get_next_page().await?;

        if limit > 0 && records.len() + page.len() >= limit {
            page.truncate(limit - records.len());
            records.extend(page);
            return Ok(records);
        }
        records.extend(page);
    }

    Ok(records)
}

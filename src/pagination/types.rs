//! Pagination types and traits
//!
//! Defines the cursor state shared by both retrieval orders and the records
//! a page can hold.

use crate::error::Result;
use crate::normalize::{build_aggregate, parse_sample, AggregateSample, Normalizer, Sample, Tree};
use crate::types::{format_timestamp, Order, Timestamp};
use chrono::Utc;

/// Time range a retrieval covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Inclusive lower bound; unbounded when unset
    pub since: Option<Timestamp>,
    /// Upper bound
    pub to: Timestamp,
}

impl Window {
    /// Everything up to `to`
    pub fn until(to: Timestamp) -> Self {
        Self { since: None, to }
    }

    /// Everything between `since` and `to`
    pub fn between(since: Timestamp, to: Timestamp) -> Self {
        Self {
            since: Some(since),
            to,
        }
    }

    /// Everything up to the current instant
    pub fn up_to_now() -> Self {
        Self::until(Utc::now())
    }
}

/// Pagination cursor
///
/// `exhausted` only goes back to false through [`Cursor::rewind`].
/// `next_window_boundary` is set after a full page and narrows the window in
/// the direction of `order`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub window_start: Option<Timestamp>,
    pub window_end: Timestamp,
    pub next_window_boundary: Option<Timestamp>,
    pub order: Order,
    pub page_size: usize,
    pub exhausted: bool,
}

impl Cursor {
    /// Create a cursor positioned before the first page
    pub fn new(window: Window, order: Order, page_size: usize) -> Self {
        Self {
            window_start: window.since,
            window_end: window.to,
            next_window_boundary: None,
            order,
            page_size,
            exhausted: false,
        }
    }

    /// Query parameters for the next page
    pub fn query(&self) -> Vec<(String, String)> {
        let mut query = Vec::with_capacity(3);

        match self.order {
            Order::Ascending => {
                match self.next_window_boundary {
                    Some(boundary) => {
                        query.push(("since_after".to_string(), format_timestamp(&boundary)));
                    }
                    None => {
                        if let Some(start) = self.window_start {
                            query.push(("since".to_string(), format_timestamp(&start)));
                        }
                    }
                }
                query.push(("to".to_string(), format_timestamp(&self.window_end)));
                query.push(("page_size".to_string(), self.page_size.to_string()));
            }
            Order::Descending => {
                if let Some(start) = self.window_start {
                    query.push(("since".to_string(), format_timestamp(&start)));
                }
                let upper = self.next_window_boundary.unwrap_or(self.window_end);
                query.push(("to".to_string(), format_timestamp(&upper)));
                query.push(("limit".to_string(), self.page_size.to_string()));
            }
        }

        query
    }

    /// Move back before the first page, keeping window, order and page size
    pub fn rewind(&mut self) {
        self.next_window_boundary = None;
        self.exhausted = false;
    }
}

/// A record that can appear in a page
pub trait PageRecord: Sized {
    /// Decode one element of the page's `data` array
    ///
    /// `path` is the path the page was requested for. With a normalizer,
    /// values get their declared wire types.
    fn from_tree(record: &Tree, path: &str, normalizer: Option<&Normalizer>) -> Result<Self>;

    /// Timestamp the cursor advances on
    fn timestamp(&self) -> Timestamp;
}

impl PageRecord for Sample {
    fn from_tree(record: &Tree, path: &str, normalizer: Option<&Normalizer>) -> Result<Self> {
        match normalizer {
            Some(normalizer) => normalizer.sample(record, path),
            None => parse_sample(record, path),
        }
    }

    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

impl PageRecord for AggregateSample {
    fn from_tree(record: &Tree, path: &str, normalizer: Option<&Normalizer>) -> Result<Self> {
        match normalizer {
            Some(normalizer) => normalizer.aggregate(record, path),
            None => build_aggregate(record, path),
        }
    }

    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

//! Pagination module
//!
//! Supports: ascending and descending windowed retrieval, bounded assembly
//!
//! # Overview
//!
//! A [`Paginator`] walks a time window of one device path page by page. Its
//! [`Cursor`] never holds an offset: every request bounds the window with
//! timestamps, and after a full page the window is narrowed to the timestamp
//! of the page's last record.
//!
//! [`fetch_bounded`] drains a paginator, optionally stopping at a record
//! count and truncating the final page.

mod paginator;
mod types;

pub use paginator::{fetch_bounded, Paginator};
pub use types::{Cursor, PageRecord, Window};

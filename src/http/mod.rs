//! HTTP transport module
//!
//! Provides the `Transport` seam used by the rest of the crate and its
//! reqwest-based implementation.
//!
//! # Features
//!
//! - **Bearer Authentication**: Token taken from the client configuration
//! - **Envelopes**: `{"data": ...}` unwrapping and `{"errors": ...}` decoding
//! - **Rate Limiting**: Optional token bucket using governor
//! - **Backoff**: Constant, linear and exponential, disabled by default

mod client;
mod rate_limit;
mod transport;

pub use client::{unwrap_data, HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use transport::Transport;

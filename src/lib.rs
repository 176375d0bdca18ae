// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Telemetry CDK
//!
//! A Rust-native kit for retrieving device telemetry from a windowed REST
//! data API and turning schema-dependent JSON into typed, path-addressed
//! values.
//!
//! ## Features
//!
//! - **Windowed Pagination**: Ascending and descending retrieval driven by
//!   timestamp boundaries, with bounded assembly
//! - **Schema-Driven Normalization**: Properties, individual datastreams and
//!   object aggregates flattened according to their interface
//! - **Type Coercion**: Lossless conversion between raw or loosely-typed JSON
//!   values and declared wire types
//! - **AppEngine Client**: Device, interface and path addressed reads and writes
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use telemetry_cdk::appengine::{AppEngineClient, DeviceRef, SampleQuery};
//! use telemetry_cdk::{ClientConfig, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ClientConfig::from_file("client.yaml")?;
//!     let client = AppEngineClient::from_config(&config)?;
//!     let device = DeviceRef::id("f0VMRgIBAQAAAAAAAAAAAA");
//!
//!     // Newest 100 samples of one endpoint
//!     let query = SampleQuery::new("/kitchen/temperature").latest(100);
//!     let samples = client.get_samples(&device, "org.example.Sensors", &query).await?;
//!
//!     // Every property currently set on the interface
//!     let properties = client.get_properties(&device, "org.example.Settings", "").await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        AppEngine Client                         │
//! │  get_samples()   get_aggregates()   get_properties()   send_*() │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────┬────────────────┴─┬─────────────────┬──────────────┐
//! │  Paginate   │    Normalize     │     Coerce      │  Interface   │
//! ├─────────────┼──────────────────┼─────────────────┼──────────────┤
//! │ Cursor      │ Properties       │ Wire types      │ Mappings     │
//! │ Ascending   │ Datastreams      │ Raw strings     │ Patterns     │
//! │ Descending  │ Aggregates       │ JSON values     │ Providers    │
//! │ Bounded     │ Tree             │ Generic numbers │              │
//! └─────────────┴──────────────────┴─────────────────┴──────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │          Transport (HTTP, bearer auth, data envelopes)          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the CDK
pub mod error;

/// Common types and type aliases
pub mod types;

/// HTTP transport with envelopes, rate limiting and backoff
pub mod http;

/// Wire types and value coercion
pub mod coerce;

/// Interface schemas and schema providers
pub mod interface;

/// Payload trees and schema-driven flattening
pub mod normalize;

/// Windowed pagination and bounded assembly
pub mod pagination;

/// Client configuration
pub mod config;

/// Realm scoped data client
pub mod appengine;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use appengine::{AppEngineClient, DeviceRef, SampleQuery};
pub use coerce::{WireType, WireValue};
pub use config::ClientConfig;
pub use interface::{InterfaceSchema, SchemaProvider};
pub use normalize::{AggregateSample, Sample};
pub use pagination::{fetch_bounded, Paginator};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

//! Schema-driven value normalizer
//!
//! Turns decoded payload trees into path-addressed values:
//!
//! - **Properties**: [`flatten_properties`] maps every leaf to its full path
//! - **Individual datastreams**: [`flatten_datastream`] finds the sample
//!   record (`value`, `timestamp`, `reception_timestamp`) at each path
//! - **Object aggregation**: [`build_aggregate`] keeps the sibling values of
//!   one record in received order
//!
//! [`Normalizer`] applies the same algorithms guided by an interface's
//! mappings, so recursion ends on declared endpoints and values get their
//! declared wire types.
//!
//! # Example
//!
//! ```
//! use telemetry_cdk::normalize::{flatten_datastream, Tree};
//!
//! let tree: Tree = serde_json::from_str(
//!     r#"{"kitchen": {"value": 21.5, "timestamp": "2019-01-01T01:23:45.678Z"}}"#,
//! ).unwrap();
//!
//! let samples = flatten_datastream(&tree, "").unwrap();
//! assert_eq!(samples["/kitchen"].value.as_f64(), Some(21.5));
//! ```

mod flatten;
mod tree;
mod types;

pub use flatten::{build_aggregate, flatten_datastream, flatten_properties, parse_sample, Normalizer};
pub use tree::Tree;
pub use types::{AggregateSample, PropertyMap, Sample};

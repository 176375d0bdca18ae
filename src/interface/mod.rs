//! Interface schema layer
//!
//! An interface is a versioned description of the data paths a device
//! exposes. It decides which flattening algorithm applies to a payload and
//! which wire type applies to each endpoint.
//!
//! # Example
//!
//! ```
//! use telemetry_cdk::coerce::WireType;
//! use telemetry_cdk::interface::{InterfaceSchema, InterfaceType, Mapping};
//!
//! let schema = InterfaceSchema::new("org.example.Sensors", 1, InterfaceType::Datastream)
//!     .with_mapping(Mapping::new("/%{sensor_id}/value", WireType::Double));
//!
//! assert!(schema.validate().is_ok());
//! assert!(schema.is_parametric());
//! assert!(schema.mapping_for("/kitchen/value").is_some());
//! ```

mod matching;
mod provider;
mod types;

pub use matching::{join_path, split_path, EndpointPattern, Segment, PARAMETER_MARKER};
pub use provider::{HttpSchemaProvider, SchemaProvider, StaticSchemaProvider};
pub use types::{Aggregation, InterfaceSchema, InterfaceType, Mapping, Ownership};

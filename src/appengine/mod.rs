//! AppEngine data client
//!
//! Reads and writes device data of one realm, addressed by device,
//! interface and path:
//!
//! - **Introspection**: which interfaces (and major versions) a device declares
//! - **Datastreams**: paginated samples and aggregates, or the last value of
//!   every endpoint
//! - **Properties**: the currently set values below a path
//! - **Writes**: raw values coerced to the declared wire type, server owned
//!   interfaces only
//!
//! # Example
//!
//! ```no_run
//! use telemetry_cdk::appengine::{AppEngineClient, DeviceRef, SampleQuery};
//! use telemetry_cdk::config::ClientConfig;
//!
//! # async fn run() -> telemetry_cdk::Result<()> {
//! let config = ClientConfig::from_file("client.yaml")?;
//! let client = AppEngineClient::from_config(&config)?;
//!
//! let device = DeviceRef::id("f0VMRgIBAQAAAAAAAAAAAA");
//! let samples = client
//!     .get_samples(&device, "org.example.Sensors", &SampleQuery::new("/kitchen/value").latest(10))
//!     .await?;
//! for sample in samples {
//!     println!("{} {}", sample.timestamp, sample.value);
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod types;

pub use client::AppEngineClient;
pub use types::{DeviceRef, InterfaceVersion, SampleQuery};

#[cfg(test)]
mod tests;

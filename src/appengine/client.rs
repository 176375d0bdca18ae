//! AppEngine data client

use super::types::{DeviceRef, InterfaceVersion, SampleQuery};
use crate::coerce::{coerce, WireValue};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClient, Transport};
use crate::interface::{join_path, HttpSchemaProvider, InterfaceSchema, Ownership, SchemaProvider};
use crate::normalize::{AggregateSample, Normalizer, PropertyMap, Sample, Tree};
use crate::pagination::{fetch_bounded, Cursor, PageRecord, Paginator};
use crate::types::{JsonObject, JsonValue, Method};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Device status fields the client reads
#[derive(Debug, Deserialize)]
struct DeviceStatus {
    #[serde(default)]
    introspection: BTreeMap<String, InterfaceVersion>,
}

/// Client for device data of one realm
///
/// Every operation validates paths against the interface before any data
/// request is made.
#[derive(Clone)]
pub struct AppEngineClient {
    transport: Arc<dyn Transport>,
    schemas: Arc<dyn SchemaProvider>,
    base_url: String,
    realm: String,
    default_page_size: usize,
}

impl AppEngineClient {
    /// Create a client from its collaborators
    pub fn new(
        transport: Arc<dyn Transport>,
        schemas: Arc<dyn SchemaProvider>,
        base_url: impl Into<String>,
        realm: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            schemas,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            realm: realm.into(),
            default_page_size: 10_000,
        }
    }

    /// Create a client over HTTP, resolving interfaces through realm management
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let transport: Arc<dyn Transport> =
            Arc::new(HttpClient::with_config(config.http_client_config())?);
        let schemas = Arc::new(HttpSchemaProvider::new(
            Arc::clone(&transport),
            config.realm_management_url()?,
            &config.realm,
        ));

        Ok(Self::new(transport, schemas, &config.appengine_url, &config.realm)
            .with_default_page_size(config.default_page_size))
    }

    #[must_use]
    pub fn with_default_page_size(mut self, page_size: usize) -> Self {
        self.default_page_size = page_size;
        self
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    fn device_url(&self, device: &DeviceRef) -> String {
        format!(
            "{}/v1/{}/{}",
            self.base_url,
            self.realm,
            device.path_segment()
        )
    }

    fn data_url(&self, device: &DeviceRef, interface: &str, path: &str) -> String {
        format!(
            "{}/interfaces/{}{}",
            self.device_url(device),
            interface,
            path
        )
    }

    // ========================================================================
    // Interfaces
    // ========================================================================

    /// Interfaces a device declares, with their versions
    pub async fn device_introspection(
        &self,
        device: &DeviceRef,
    ) -> Result<BTreeMap<String, InterfaceVersion>> {
        let data = self.transport.get(&self.device_url(device), &[]).await?;
        let status: DeviceStatus = serde_json::from_value(data)
            .map_err(|e| Error::decode(format!("Invalid device status: {e}")))?;
        Ok(status.introspection)
    }

    /// Interface definition at the major version the device declares
    pub async fn interface_for(&self, device: &DeviceRef, name: &str) -> Result<InterfaceSchema> {
        let introspection = self.device_introspection(device).await?;
        let version = introspection
            .get(name)
            .ok_or_else(|| Error::InterfaceNotFound {
                interface: format!("{name} on device {device}"),
            })?;

        debug!("Resolving {name} v{} for device {device}", version.major);
        self.schemas.interface(name, version.major).await
    }

    // ========================================================================
    // Datastream Reads
    // ========================================================================

    /// Paginator over samples of one individual datastream endpoint
    pub fn datastream_paginator(
        &self,
        device: &DeviceRef,
        schema: &InterfaceSchema,
        query: &SampleQuery,
    ) -> Result<Paginator<'_, Sample>> {
        require_datastream(schema, &query.path)?;
        schema.validate_endpoint_path(&query.path)?;
        self.paginator(device, schema, query)
    }

    /// Paginator over records of one object aggregated datastream
    pub fn aggregate_paginator(
        &self,
        device: &DeviceRef,
        schema: &InterfaceSchema,
        query: &SampleQuery,
    ) -> Result<Paginator<'_, AggregateSample>> {
        require_datastream(schema, &query.path)?;
        schema.validate_object_path(&query.path)?;
        self.paginator(device, schema, query)
    }

    fn paginator<R: PageRecord>(
        &self,
        device: &DeviceRef,
        schema: &InterfaceSchema,
        query: &SampleQuery,
    ) -> Result<Paginator<'_, R>> {
        let cursor = Cursor::new(
            query.window(),
            query.order,
            query.page_size.unwrap_or(self.default_page_size),
        );
        let url = self.data_url(device, &schema.name, &query.path);

        Ok(
            Paginator::new(self.transport.as_ref(), url, &query.path, cursor)?
                .with_normalizer(Normalizer::new(schema.clone())),
        )
    }

    /// Samples of one individual datastream endpoint
    pub async fn get_samples(
        &self,
        device: &DeviceRef,
        interface: &str,
        query: &SampleQuery,
    ) -> Result<Vec<Sample>> {
        let schema = self.interface_for(device, interface).await?;
        let mut paginator = self.datastream_paginator(device, &schema, query)?;
        fetch_bounded(&mut paginator, query.limit).await
    }

    /// Records of one object aggregated datastream
    pub async fn get_aggregates(
        &self,
        device: &DeviceRef,
        interface: &str,
        query: &SampleQuery,
    ) -> Result<Vec<AggregateSample>> {
        let schema = self.interface_for(device, interface).await?;
        let mut paginator = self.aggregate_paginator(device, &schema, query)?;
        fetch_bounded(&mut paginator, query.limit).await
    }

    /// Last sample of every endpoint of an individual datastream
    pub async fn get_datastream_snapshot(
        &self,
        device: &DeviceRef,
        interface: &str,
    ) -> Result<BTreeMap<String, Sample>> {
        let schema = self.interface_for(device, interface).await?;
        require_datastream(&schema, "")?;
        if schema.is_object_aggregated() {
            return Err(Error::schema_mismatch(
                &schema.name,
                "",
                "snapshots are only available for individual datastreams",
            ));
        }

        let data = self
            .transport
            .get(&self.data_url(device, &schema.name, ""), &[])
            .await?;
        Normalizer::new(schema).datastream(&Tree::from(data), "")
    }

    // ========================================================================
    // Property Reads
    // ========================================================================

    /// Properties set at or below `path` (empty for the whole interface)
    pub async fn get_properties(
        &self,
        device: &DeviceRef,
        interface: &str,
        path: &str,
    ) -> Result<PropertyMap> {
        let schema = self.interface_for(device, interface).await?;
        if !schema.is_properties() {
            return Err(Error::schema_mismatch(
                &schema.name,
                path,
                "interface is not a properties interface",
            ));
        }
        schema.validate_subtree_path(path)?;

        let data = self
            .transport
            .get(&self.data_url(device, &schema.name, path), &[])
            .await?;
        Normalizer::new(schema).properties(&Tree::from(data), path)
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Send one value to an individual datastream endpoint
    ///
    /// `raw` is coerced with the endpoint's wire type before sending.
    pub async fn send_datastream(
        &self,
        device: &DeviceRef,
        interface: &str,
        path: &str,
        raw: &str,
    ) -> Result<WireValue> {
        let schema = self.writable_interface(device, interface, path).await?;
        require_datastream(&schema, path)?;
        let mapping = schema.validate_endpoint_path(path)?;
        let value = coerce(raw, mapping.wire_type)?;

        self.transport
            .write(
                Method::POST,
                &self.data_url(device, &schema.name, path),
                Some(value.to_json()),
            )
            .await?;
        Ok(value)
    }

    /// Send one object aggregated record
    ///
    /// Each `(endpoint, raw)` pair is coerced with the wire type of the
    /// endpoint below `path`.
    pub async fn send_aggregate(
        &self,
        device: &DeviceRef,
        interface: &str,
        path: &str,
        values: &[(&str, &str)],
    ) -> Result<Vec<(String, WireValue)>> {
        let schema = self.writable_interface(device, interface, path).await?;
        require_datastream(&schema, path)?;
        schema.validate_object_path(path)?;

        let mut typed = Vec::with_capacity(values.len());
        let mut payload = JsonObject::new();
        for (key, raw) in values {
            let mapping = schema.require_mapping(&join_path(path, key))?;
            let value = coerce(raw, mapping.wire_type)?;
            payload.insert((*key).to_string(), value.to_json());
            typed.push(((*key).to_string(), value));
        }

        self.transport
            .write(
                Method::POST,
                &self.data_url(device, &schema.name, path),
                Some(JsonValue::Object(payload)),
            )
            .await?;
        Ok(typed)
    }

    /// Set a property, coercing `raw` with the endpoint's wire type
    pub async fn set_property(
        &self,
        device: &DeviceRef,
        interface: &str,
        path: &str,
        raw: &str,
    ) -> Result<WireValue> {
        let schema = self.writable_interface(device, interface, path).await?;
        require_properties(&schema, path)?;
        let mapping = schema.validate_endpoint_path(path)?;
        let value = coerce(raw, mapping.wire_type)?;

        self.transport
            .write(
                Method::PUT,
                &self.data_url(device, &schema.name, path),
                Some(value.to_json()),
            )
            .await?;
        Ok(value)
    }

    /// Unset a property whose mapping allows it
    pub async fn unset_property(
        &self,
        device: &DeviceRef,
        interface: &str,
        path: &str,
    ) -> Result<()> {
        let schema = self.writable_interface(device, interface, path).await?;
        require_properties(&schema, path)?;
        let mapping = schema.validate_endpoint_path(path)?;
        if !mapping.allow_unset {
            return Err(Error::schema_mismatch(
                &schema.name,
                path,
                "mapping does not allow unset",
            ));
        }

        self.transport
            .write(
                Method::DELETE,
                &self.data_url(device, &schema.name, path),
                None,
            )
            .await?;
        Ok(())
    }

    async fn writable_interface(
        &self,
        device: &DeviceRef,
        interface: &str,
        path: &str,
    ) -> Result<InterfaceSchema> {
        let schema = self.interface_for(device, interface).await?;
        if schema.ownership != Ownership::Server {
            return Err(Error::schema_mismatch(
                &schema.name,
                path,
                "only server owned interfaces accept writes",
            ));
        }
        Ok(schema)
    }
}

impl std::fmt::Debug for AppEngineClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppEngineClient")
            .field("base_url", &self.base_url)
            .field("realm", &self.realm)
            .field("default_page_size", &self.default_page_size)
            .finish_non_exhaustive()
    }
}

fn require_datastream(schema: &InterfaceSchema, path: &str) -> Result<()> {
    if schema.is_datastream() {
        Ok(())
    } else {
        Err(Error::schema_mismatch(
            &schema.name,
            path,
            "interface is not a datastream interface",
        ))
    }
}

fn require_properties(schema: &InterfaceSchema, path: &str) -> Result<()> {
    if schema.is_properties() {
        Ok(())
    } else {
        Err(Error::schema_mismatch(
            &schema.name,
            path,
            "interface is not a properties interface",
        ))
    }
}

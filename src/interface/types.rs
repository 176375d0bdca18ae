//! Interface schema types

use super::matching::{split_path, EndpointPattern};
use crate::coerce::WireType;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of data an interface carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceType {
    /// Time series, every value has a timestamp
    Datastream,
    /// Last-known-value state
    Properties,
}

/// How endpoints of an interface are grouped when sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Each endpoint is timestamped independently
    #[default]
    Individual,
    /// Sibling endpoints share one timestamp per record
    Object,
}

/// Which side is allowed to write to an interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ownership {
    #[default]
    Device,
    Server,
}

/// One endpoint of an interface and its declared type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    /// Endpoint pattern, e.g. `/%{sensor_id}/value`
    pub endpoint: String,

    /// Declared wire type
    #[serde(rename = "type")]
    pub wire_type: WireType,

    /// Whether the sender supplies its own timestamp
    #[serde(default)]
    pub explicit_timestamp: bool,

    /// Whether a property may be unset
    #[serde(default)]
    pub allow_unset: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Mapping {
    /// Create a mapping
    pub fn new(endpoint: impl Into<String>, wire_type: WireType) -> Self {
        Self {
            endpoint: endpoint.into(),
            wire_type,
            explicit_timestamp: false,
            allow_unset: false,
            description: None,
        }
    }

    /// Allow unsetting this mapping
    #[must_use]
    pub fn with_allow_unset(mut self) -> Self {
        self.allow_unset = true;
        self
    }

    /// Compiled endpoint pattern
    pub fn pattern(&self) -> EndpointPattern {
        EndpointPattern::parse(&self.endpoint)
    }
}

/// Interface description as served by the realm management API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceSchema {
    /// Reverse-domain interface name
    #[serde(rename = "interface_name")]
    pub name: String,

    #[serde(rename = "version_major")]
    pub major: u32,

    #[serde(rename = "version_minor", default)]
    pub minor: u32,

    #[serde(rename = "type")]
    pub interface_type: InterfaceType,

    #[serde(default)]
    pub ownership: Ownership,

    #[serde(default)]
    pub aggregation: Aggregation,

    pub mappings: Vec<Mapping>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl InterfaceSchema {
    /// Create an individual interface with no mappings
    pub fn new(name: impl Into<String>, major: u32, interface_type: InterfaceType) -> Self {
        Self {
            name: name.into(),
            major,
            minor: 0,
            interface_type,
            ownership: Ownership::Device,
            aggregation: Aggregation::Individual,
            mappings: Vec::new(),
            description: None,
        }
    }

    /// Set aggregation
    #[must_use]
    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Set ownership
    #[must_use]
    pub fn with_ownership(mut self, ownership: Ownership) -> Self {
        self.ownership = ownership;
        self
    }

    /// Add a mapping
    #[must_use]
    pub fn with_mapping(mut self, mapping: Mapping) -> Self {
        self.mappings.push(mapping);
        self
    }

    /// Parse and validate an interface from its JSON definition
    pub fn from_json_str(json: &str) -> Result<Self> {
        let schema: Self = serde_json::from_str(json)?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn is_datastream(&self) -> bool {
        self.interface_type == InterfaceType::Datastream
    }

    pub fn is_properties(&self) -> bool {
        self.interface_type == InterfaceType::Properties
    }

    pub fn is_object_aggregated(&self) -> bool {
        self.aggregation == Aggregation::Object
    }

    /// Whether any endpoint contains a parameter segment
    pub fn is_parametric(&self) -> bool {
        self.mappings.iter().any(|m| m.pattern().is_parametric())
    }

    /// Check the structural invariants of the interface
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::invalid_interface("", "interface name is empty"));
        }
        if self.mappings.is_empty() {
            return Err(Error::invalid_interface(&self.name, "no mappings declared"));
        }

        for mapping in &self.mappings {
            if !mapping.endpoint.starts_with('/') || mapping.endpoint.ends_with('/') {
                return Err(Error::invalid_interface(
                    &self.name,
                    format!("malformed endpoint '{}'", mapping.endpoint),
                ));
            }
            if let Some(segment) = mapping.pattern().invalid_parameter() {
                return Err(Error::invalid_interface(
                    &self.name,
                    format!("malformed parameter '{segment}' in '{}'", mapping.endpoint),
                ));
            }
        }

        if self.is_properties() && self.is_object_aggregated() {
            return Err(Error::invalid_interface(
                &self.name,
                "properties interfaces cannot use object aggregation",
            ));
        }

        if self.is_object_aggregated() {
            self.object_prefix()?;
        }

        Ok(())
    }

    /// Common endpoint prefix shared by all mappings of an object interface
    ///
    /// This is every endpoint with its last segment removed; it is an error
    /// for mappings to disagree on it.
    pub fn object_prefix(&self) -> Result<String> {
        let mut prefixes = self.mappings.iter().map(|m| {
            let segments = split_path(&m.endpoint);
            let parent = &segments[..segments.len().saturating_sub(1)];
            format!("/{}", parent.join("/"))
        });

        let first = prefixes
            .next()
            .ok_or_else(|| Error::invalid_interface(&self.name, "no mappings declared"))?;

        if let Some(other) = prefixes.find(|p| *p != first) {
            return Err(Error::invalid_interface(
                &self.name,
                format!("object mappings disagree on prefix: '{first}' vs '{other}'"),
            ));
        }

        Ok(if first == "/" { String::new() } else { first })
    }

    /// Mapping whose endpoint matches a concrete path
    pub fn mapping_for(&self, path: &str) -> Option<&Mapping> {
        self.mappings.iter().find(|m| m.pattern().matches(path))
    }

    /// Mapping for a concrete path, or a `SchemaMismatch` error
    pub fn require_mapping(&self, path: &str) -> Result<&Mapping> {
        self.mapping_for(path).ok_or_else(|| {
            Error::schema_mismatch(&self.name, path, "no mapping matches this path")
        })
    }

    /// Validate a path used to address a single individual endpoint
    pub fn validate_endpoint_path(&self, path: &str) -> Result<&Mapping> {
        if self.is_object_aggregated() {
            return Err(Error::schema_mismatch(
                &self.name,
                path,
                "object aggregated interfaces are addressed by their common prefix",
            ));
        }
        self.require_mapping(path)
    }

    /// Validate a path used to address one object aggregate
    pub fn validate_object_path(&self, path: &str) -> Result<()> {
        if !self.is_object_aggregated() {
            return Err(Error::schema_mismatch(
                &self.name,
                path,
                "interface is not object aggregated",
            ));
        }
        let prefix = EndpointPattern::parse(&self.object_prefix()?);
        if prefix.matches(path) {
            Ok(())
        } else {
            Err(Error::schema_mismatch(
                &self.name,
                path,
                format!("expected a path matching '{}'", prefix.as_str()),
            ))
        }
    }

    /// Validate a path used as a subtree query (possibly empty)
    pub fn validate_subtree_path(&self, path: &str) -> Result<()> {
        if self
            .mappings
            .iter()
            .any(|m| m.pattern().matches_prefix(path))
        {
            Ok(())
        } else {
            Err(Error::schema_mismatch(
                &self.name,
                path,
                "path is not a prefix of any mapping",
            ))
        }
    }
}

impl fmt::Display for InterfaceSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{}.{}", self.name, self.major, self.minor)
    }
}

//! Schema providers
//!
//! The normalizer and the data client never construct interfaces themselves;
//! they ask a [`SchemaProvider`] for the definition of an interface at a
//! given major version.

use super::types::InterfaceSchema;
use crate::error::{Error, Result, ResultExt};
use crate::http::Transport;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Source of interface definitions
#[async_trait]
pub trait SchemaProvider: Send + Sync {
    /// Fetch the interface `name` at major version `major`
    async fn interface(&self, name: &str, major: u32) -> Result<InterfaceSchema>;
}

// ============================================================================
// Static provider
// ============================================================================

/// In-memory provider, keyed by interface name and major version
#[derive(Debug, Clone, Default)]
pub struct StaticSchemaProvider {
    interfaces: HashMap<(String, u32), InterfaceSchema>,
}

impl StaticSchemaProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an interface, replacing any definition with the same name and major
    #[must_use]
    pub fn with_interface(mut self, schema: InterfaceSchema) -> Self {
        self.add(schema);
        self
    }

    /// Add an interface in place
    pub fn add(&mut self, schema: InterfaceSchema) {
        self.interfaces
            .insert((schema.name.clone(), schema.major), schema);
    }

    /// Parse and add one interface JSON definition
    pub fn add_json_str(&mut self, json: &str) -> Result<()> {
        let schema = InterfaceSchema::from_json_str(json)?;
        self.add(schema);
        Ok(())
    }

    /// Load every `*.json` interface definition in a directory
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(Error::FileNotFound {
                path: dir.display().to_string(),
            });
        }

        let mut provider = Self::new();
        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        for path in paths {
            let content = std::fs::read_to_string(&path)?;
            provider
                .add_json_str(&content)
                .with_context(|| format!("Failed to load interface {}", path.display()))?;
            debug!("Loaded interface definition {}", path.display());
        }

        Ok(provider)
    }

    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }
}

#[async_trait]
impl SchemaProvider for StaticSchemaProvider {
    async fn interface(&self, name: &str, major: u32) -> Result<InterfaceSchema> {
        self.interfaces
            .get(&(name.to_string(), major))
            .cloned()
            .ok_or_else(|| Error::InterfaceNotFound {
                interface: format!("{name} v{major}"),
            })
    }
}

// ============================================================================
// Realm management provider
// ============================================================================

/// Provider backed by the realm management API
///
/// Fetches `GET {base_url}/v1/{realm}/interfaces/{name}/{major}`.
#[derive(Clone)]
pub struct HttpSchemaProvider {
    transport: Arc<dyn Transport>,
    base_url: String,
    realm: String,
}

impl HttpSchemaProvider {
    pub fn new(
        transport: Arc<dyn Transport>,
        base_url: impl Into<String>,
        realm: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            realm: realm.into(),
        }
    }

    fn interface_url(&self, name: &str, major: u32) -> String {
        format!(
            "{}/v1/{}/interfaces/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.realm,
            name,
            major
        )
    }
}

#[async_trait]
impl SchemaProvider for HttpSchemaProvider {
    async fn interface(&self, name: &str, major: u32) -> Result<InterfaceSchema> {
        let url = self.interface_url(name, major);
        debug!("Fetching interface {name} v{major} from {url}");

        let data = match self.transport.get(&url, &[]).await {
            Err(Error::HttpStatus { status: 404, .. }) | Err(Error::Api { status: 404, .. }) => {
                return Err(Error::InterfaceNotFound {
                    interface: format!("{name} v{major}"),
                })
            }
            other => other?,
        };

        let schema: InterfaceSchema = serde_json::from_value(data)
            .map_err(|e| Error::invalid_interface(name, e.to_string()))?;
        schema.validate()?;
        Ok(schema)
    }
}

impl std::fmt::Debug for HttpSchemaProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSchemaProvider")
            .field("base_url", &self.base_url)
            .field("realm", &self.realm)
            .finish_non_exhaustive()
    }
}

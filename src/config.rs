//! Client configuration
//!
//! One explicit configuration object is threaded through the client
//! constructors. It is loaded from YAML or JSON files.

use crate::error::{Error, Result, ResultExt};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::types::OptionStringExt;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

// ============================================================================
// Client Config
// ============================================================================

/// Configuration of an AppEngine data client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the AppEngine API (e.g., "https://api.example.com/appengine")
    pub appengine_url: String,

    /// Base URL of the realm management API; derived from `appengine_url`
    /// when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm_management_url: Option<String>,

    /// Realm every request is scoped to
    pub realm: String,

    /// Bearer token
    pub token: String,

    /// Page size used when a query does not set one
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Transport-level retries; zero keeps every failure visible to the caller
    #[serde(default)]
    pub max_retries: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimiterConfig>,
}

fn default_page_size() -> usize {
    10_000
}

fn default_timeout() -> u64 {
    30
}

impl ClientConfig {
    /// Create a config with defaults for everything but the required fields
    pub fn new(
        appengine_url: impl Into<String>,
        realm: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            appengine_url: appengine_url.into(),
            realm_management_url: None,
            realm: realm.into(),
            token: token.into(),
            default_page_size: default_page_size(),
            timeout_seconds: default_timeout(),
            max_retries: 0,
            rate_limit: None,
        }
    }

    /// Load from a file; `.json` files are parsed as JSON, anything else as YAML
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config {}", path.display()))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check required fields and value ranges
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("appengine_url", &self.appengine_url),
            ("realm", &self.realm),
            ("token", &self.token),
        ] {
            if value.trim().is_empty() {
                return Err(Error::missing_config_field(field));
            }
        }

        validate_url("appengine_url", &self.appengine_url)?;
        if let Some(url) = self.realm_management_url.clone().none_if_empty() {
            validate_url("realm_management_url", &url)?;
        }

        if self.default_page_size == 0 {
            return Err(Error::invalid_config(
                "default_page_size",
                "must be greater than zero",
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(Error::invalid_config(
                "timeout_seconds",
                "must be greater than zero",
            ));
        }

        Ok(())
    }

    /// Realm management base URL
    ///
    /// Falls back to `appengine_url` with a trailing `appengine` segment
    /// replaced by `realmmanagement`.
    pub fn realm_management_url(&self) -> Result<String> {
        if let Some(url) = self.realm_management_url.clone().none_if_empty() {
            return Ok(url.trim_end_matches('/').to_string());
        }

        let base = self.appengine_url.trim_end_matches('/');
        match base.strip_suffix("/appengine") {
            Some(root) => Ok(format!("{root}/realmmanagement")),
            None => Err(Error::missing_config_field("realm_management_url")),
        }
    }

    /// Transport settings derived from this config
    pub fn http_client_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .token(&self.token)
            .timeout(Duration::from_secs(self.timeout_seconds))
            .max_retries(self.max_retries);

        if let Some(rate_limit) = &self.rate_limit {
            builder = builder.rate_limit(rate_limit.clone());
        }

        builder.build()
    }
}

fn validate_url(field: &str, value: &str) -> Result<()> {
    let url = Url::parse(value).map_err(|e| Error::invalid_config(field, e.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(Error::invalid_config(
            field,
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(())
}

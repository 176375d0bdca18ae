//! AppEngine request types

use crate::pagination::Window;
use crate::types::{Order, Timestamp};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a device is addressed
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeviceRef {
    /// Device id (URL-safe base64 of the device UUID)
    Id(String),
    /// Device alias
    Alias(String),
}

impl DeviceRef {
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    pub fn alias(alias: impl Into<String>) -> Self {
        Self::Alias(alias.into())
    }

    /// Path segments addressing the device below the realm
    pub fn path_segment(&self) -> String {
        match self {
            DeviceRef::Id(id) => format!("devices/{id}"),
            DeviceRef::Alias(alias) => format!("devices-by-alias/{alias}"),
        }
    }
}

impl fmt::Display for DeviceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceRef::Id(id) => f.write_str(id),
            DeviceRef::Alias(alias) => write!(f, "alias '{alias}'"),
        }
    }
}

impl From<&str> for DeviceRef {
    fn from(id: &str) -> Self {
        DeviceRef::Id(id.to_string())
    }
}

/// Version of an interface a device declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceVersion {
    pub major: u32,
    #[serde(default)]
    pub minor: u32,
}

/// Datastream retrieval request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleQuery {
    /// Endpoint path for individual interfaces, object path for aggregates
    pub path: String,
    pub since: Option<Timestamp>,
    /// Upper bound; the time of the request when unset
    pub to: Option<Timestamp>,
    pub order: Order,
    /// Page size; the client default when unset
    pub page_size: Option<usize>,
    /// Maximum number of records; zero for all of them
    pub limit: usize,
}

impl SampleQuery {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            since: None,
            to: None,
            order: Order::Ascending,
            page_size: None,
            limit: 0,
        }
    }

    #[must_use]
    pub fn since(mut self, since: Timestamp) -> Self {
        self.since = Some(since);
        self
    }

    #[must_use]
    pub fn to(mut self, to: Timestamp) -> Self {
        self.to = Some(to);
        self
    }

    #[must_use]
    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Shorthand for the newest `count` records
    #[must_use]
    pub fn latest(self, count: usize) -> Self {
        self.order(Order::Descending).limit(count)
    }

    /// Window resolved against the current time
    pub fn window(&self) -> Window {
        Window {
            since: self.since,
            to: self.to.unwrap_or_else(Utc::now),
        }
    }
}

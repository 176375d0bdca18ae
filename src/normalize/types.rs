//! Normalized record types

use crate::coerce::WireValue;
use crate::types::{JsonValue, Timestamp};
use serde::Serialize;
use std::collections::BTreeMap;

/// Currently-set properties keyed by full path
pub type PropertyMap = BTreeMap<String, WireValue>;

/// One individual datastream reading
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub value: WireValue,
    pub timestamp: Timestamp,
    /// When the backend received the reading; equal to `timestamp` when the
    /// payload does not carry it
    pub reception_timestamp: Timestamp,
}

impl Sample {
    pub fn new(value: impl Into<WireValue>, timestamp: Timestamp) -> Self {
        Self {
            value: value.into(),
            timestamp,
            reception_timestamp: timestamp,
        }
    }

    #[must_use]
    pub fn with_reception_timestamp(mut self, reception_timestamp: Timestamp) -> Self {
        self.reception_timestamp = reception_timestamp;
        self
    }
}

/// One object aggregated reading: sibling endpoints sharing a timestamp
///
/// Values keep the order the siblings were received in.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateSample {
    pub values: Vec<(String, WireValue)>,
    pub timestamp: Timestamp,
}

impl AggregateSample {
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            values: Vec::new(),
            timestamp,
        }
    }

    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<WireValue>) -> Self {
        self.values.push((key.into(), value.into()));
        self
    }

    /// Value of a sibling endpoint
    pub fn get(&self, key: &str) -> Option<&WireValue> {
        self.values.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Sibling names, in received order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(k, _)| k.as_str())
    }

    /// JSON object of the values, in received order, as sent on the wire
    pub fn values_json(&self) -> JsonValue {
        JsonValue::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

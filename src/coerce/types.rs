//! Wire types and typed values

use crate::types::{format_timestamp, JsonValue, Timestamp};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Declared type of a mapping endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireType {
    Integer,
    LongInteger,
    Double,
    Boolean,
    String,
    BinaryBlob,
    DateTime,
    IntegerArray,
    LongIntegerArray,
    DoubleArray,
    BooleanArray,
    StringArray,
    BinaryBlobArray,
    DateTimeArray,
}

impl WireType {
    /// All wire types, scalars first
    pub const ALL: [WireType; 14] = [
        WireType::Integer,
        WireType::LongInteger,
        WireType::Double,
        WireType::Boolean,
        WireType::String,
        WireType::BinaryBlob,
        WireType::DateTime,
        WireType::IntegerArray,
        WireType::LongIntegerArray,
        WireType::DoubleArray,
        WireType::BooleanArray,
        WireType::StringArray,
        WireType::BinaryBlobArray,
        WireType::DateTimeArray,
    ];

    /// Check if this is an array type
    pub fn is_array(&self) -> bool {
        self.element_type().is_some()
    }

    /// Scalar element type of an array type
    pub fn element_type(&self) -> Option<WireType> {
        match self {
            WireType::IntegerArray => Some(WireType::Integer),
            WireType::LongIntegerArray => Some(WireType::LongInteger),
            WireType::DoubleArray => Some(WireType::Double),
            WireType::BooleanArray => Some(WireType::Boolean),
            WireType::StringArray => Some(WireType::String),
            WireType::BinaryBlobArray => Some(WireType::BinaryBlob),
            WireType::DateTimeArray => Some(WireType::DateTime),
            _ => None,
        }
    }

    /// Name as used in interface definitions
    pub fn as_str(&self) -> &'static str {
        match self {
            WireType::Integer => "integer",
            WireType::LongInteger => "longinteger",
            WireType::Double => "double",
            WireType::Boolean => "boolean",
            WireType::String => "string",
            WireType::BinaryBlob => "binaryblob",
            WireType::DateTime => "datetime",
            WireType::IntegerArray => "integerarray",
            WireType::LongIntegerArray => "longintegerarray",
            WireType::DoubleArray => "doublearray",
            WireType::BooleanArray => "booleanarray",
            WireType::StringArray => "stringarray",
            WireType::BinaryBlobArray => "binaryblobarray",
            WireType::DateTimeArray => "datetimearray",
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WireType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WireType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| crate::Error::decode(format!("Unknown wire type: {s}")))
    }
}

/// A value carrying its wire type
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Integer(i32),
    LongInteger(i64),
    Double(f64),
    Boolean(bool),
    String(String),
    BinaryBlob(Vec<u8>),
    DateTime(Timestamp),
    IntegerArray(Vec<i32>),
    LongIntegerArray(Vec<i64>),
    DoubleArray(Vec<f64>),
    BooleanArray(Vec<bool>),
    StringArray(Vec<String>),
    BinaryBlobArray(Vec<Vec<u8>>),
    DateTimeArray(Vec<Timestamp>),
}

impl WireValue {
    /// Wire type of this value
    pub fn wire_type(&self) -> WireType {
        match self {
            WireValue::Integer(_) => WireType::Integer,
            WireValue::LongInteger(_) => WireType::LongInteger,
            WireValue::Double(_) => WireType::Double,
            WireValue::Boolean(_) => WireType::Boolean,
            WireValue::String(_) => WireType::String,
            WireValue::BinaryBlob(_) => WireType::BinaryBlob,
            WireValue::DateTime(_) => WireType::DateTime,
            WireValue::IntegerArray(_) => WireType::IntegerArray,
            WireValue::LongIntegerArray(_) => WireType::LongIntegerArray,
            WireValue::DoubleArray(_) => WireType::DoubleArray,
            WireValue::BooleanArray(_) => WireType::BooleanArray,
            WireValue::StringArray(_) => WireType::StringArray,
            WireValue::BinaryBlobArray(_) => WireType::BinaryBlobArray,
            WireValue::DateTimeArray(_) => WireType::DateTimeArray,
        }
    }

    /// Integer view of the value, if it is integral
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            WireValue::Integer(v) => Some(i64::from(*v)),
            WireValue::LongInteger(v) => Some(*v),
            _ => None,
        }
    }

    /// Floating point view of any numeric value
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            WireValue::Integer(v) => Some(f64::from(*v)),
            WireValue::LongInteger(v) => Some(*v as f64),
            WireValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// String view of a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            WireValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// JSON representation sent on the wire
    ///
    /// Blobs are base64 encoded and datetimes use RFC 3339. Non-finite
    /// doubles have no JSON form and become `null`.
    pub fn to_json(&self) -> JsonValue {
        match self {
            WireValue::Integer(v) => JsonValue::from(*v),
            WireValue::LongInteger(v) => JsonValue::from(*v),
            WireValue::Double(v) => double_to_json(*v),
            WireValue::Boolean(v) => JsonValue::Bool(*v),
            WireValue::String(v) => JsonValue::String(v.clone()),
            WireValue::BinaryBlob(v) => JsonValue::String(STANDARD.encode(v)),
            WireValue::DateTime(v) => JsonValue::String(format_timestamp(v)),
            WireValue::IntegerArray(v) => v.iter().map(|x| JsonValue::from(*x)).collect(),
            WireValue::LongIntegerArray(v) => v.iter().map(|x| JsonValue::from(*x)).collect(),
            WireValue::DoubleArray(v) => v.iter().map(|x| double_to_json(*x)).collect(),
            WireValue::BooleanArray(v) => v.iter().map(|x| JsonValue::Bool(*x)).collect(),
            WireValue::StringArray(v) => v.iter().map(|x| JsonValue::String(x.clone())).collect(),
            WireValue::BinaryBlobArray(v) => v
                .iter()
                .map(|x| JsonValue::String(STANDARD.encode(x)))
                .collect(),
            WireValue::DateTimeArray(v) => v
                .iter()
                .map(|x| JsonValue::String(format_timestamp(x)))
                .collect(),
        }
    }
}

fn double_to_json(v: f64) -> JsonValue {
    serde_json::Number::from_f64(v).map_or(JsonValue::Null, JsonValue::Number)
}

impl fmt::Display for WireValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&super::decoerce(self))
    }
}

impl Serialize for WireValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<i32> for WireValue {
    fn from(v: i32) -> Self {
        WireValue::Integer(v)
    }
}

impl From<i64> for WireValue {
    fn from(v: i64) -> Self {
        WireValue::LongInteger(v)
    }
}

impl From<f64> for WireValue {
    fn from(v: f64) -> Self {
        WireValue::Double(v)
    }
}

impl From<bool> for WireValue {
    fn from(v: bool) -> Self {
        WireValue::Boolean(v)
    }
}

impl From<&str> for WireValue {
    fn from(v: &str) -> Self {
        WireValue::String(v.to_string())
    }
}

impl From<String> for WireValue {
    fn from(v: String) -> Self {
        WireValue::String(v)
    }
}

impl From<Timestamp> for WireValue {
    fn from(v: Timestamp) -> Self {
        WireValue::DateTime(v)
    }
}

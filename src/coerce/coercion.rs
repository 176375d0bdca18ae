//! Coercion between raw/JSON values and typed wire values
//!
//! Three entry points cover the three places values come from:
//! - [`coerce`]: raw strings typed by a user (send path)
//! - [`coerce_json`]: JSON decoded from the data API when the mapping type is known
//! - [`coerce_generic`]: JSON with no declared type (object aggregation leaves,
//!   schema-less flattening)

use super::types::{WireType, WireValue};
use crate::error::{Error, Result};
use crate::types::{format_timestamp, JsonValue, Timestamp};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde_json::Number;

/// Naive layouts accepted for datetimes, interpreted as UTC
const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

// ============================================================================
// Raw (string) coercion
// ============================================================================

/// Coerce a raw string into a value of the declared wire type
pub fn coerce(raw: &str, wire_type: WireType) -> Result<WireValue> {
    if let Some(element) = wire_type.element_type() {
        let parsed: JsonValue = serde_json::from_str(raw)
            .map_err(|e| Error::coercion(wire_type, raw, format!("not a JSON array: {e}")))?;
        return coerce_array(&parsed, wire_type, element);
    }

    match wire_type {
        WireType::Integer => {
            let wide = parse_integer(raw, wire_type)?;
            i32::try_from(wide)
                .map(WireValue::Integer)
                .map_err(|_| Error::coercion(wire_type, raw, "out of 32-bit range"))
        }
        WireType::LongInteger => parse_integer(raw, wire_type).map(WireValue::LongInteger),
        WireType::Double => {
            let v: f64 = raw
                .trim()
                .parse()
                .map_err(|_| Error::coercion(wire_type, raw, "not a number"))?;
            finite(v, wire_type, raw).map(WireValue::Double)
        }
        WireType::Boolean => match raw {
            "true" => Ok(WireValue::Boolean(true)),
            "false" => Ok(WireValue::Boolean(false)),
            _ => Err(Error::coercion(wire_type, raw, "expected 'true' or 'false'")),
        },
        WireType::String => Ok(WireValue::String(raw.to_string())),
        WireType::BinaryBlob => decode_blob(raw).map(WireValue::BinaryBlob),
        WireType::DateTime => parse_datetime(raw)
            .map(WireValue::DateTime)
            .ok_or_else(|| Error::coercion(wire_type, raw, "unrecognized date/time")),
        _ => unreachable!("array types handled above"),
    }
}

/// Coerce a raw string without a declared type
///
/// The string is read as JSON when possible and decoded generically;
/// anything that is not JSON is kept as a plain string.
pub fn coerce_untyped(raw: &str) -> Result<WireValue> {
    match serde_json::from_str::<JsonValue>(raw) {
        Ok(value @ (JsonValue::Number(_) | JsonValue::Bool(_) | JsonValue::Array(_))) => {
            coerce_generic(&value)
        }
        Ok(JsonValue::String(s)) => Ok(WireValue::String(s)),
        _ => Ok(WireValue::String(raw.to_string())),
    }
}

/// Render a typed value back into the raw form accepted by [`coerce`]
pub fn decoerce(value: &WireValue) -> String {
    match value {
        WireValue::Integer(v) => v.to_string(),
        WireValue::LongInteger(v) => v.to_string(),
        WireValue::Double(v) => v.to_string(),
        WireValue::Boolean(v) => v.to_string(),
        WireValue::String(v) => v.clone(),
        WireValue::BinaryBlob(v) => STANDARD.encode(v),
        WireValue::DateTime(v) => format_timestamp(v),
        array => array.to_json().to_string(),
    }
}

// ============================================================================
// JSON coercion
// ============================================================================

/// Coerce an already-decoded JSON value into the declared wire type
pub fn coerce_json(value: &JsonValue, wire_type: WireType) -> Result<WireValue> {
    if let Some(element) = wire_type.element_type() {
        return coerce_array(value, wire_type, element);
    }

    let mismatch = || Error::coercion(wire_type, value.to_string(), "unexpected JSON type");

    match (wire_type, value) {
        (WireType::Integer, JsonValue::Number(n)) => integral(n)
            .and_then(|v| i32::try_from(v).ok())
            .map(WireValue::Integer)
            .ok_or_else(|| Error::coercion(wire_type, n.to_string(), "not a 32-bit integer")),
        (WireType::LongInteger, JsonValue::Number(n)) => integral(n)
            .map(WireValue::LongInteger)
            .ok_or_else(|| Error::coercion(wire_type, n.to_string(), "not a 64-bit integer")),
        // Large integers may travel as decimal strings to survive JSON doubles
        (WireType::LongInteger, JsonValue::String(s)) => {
            parse_integer(s, wire_type).map(WireValue::LongInteger)
        }
        (WireType::Double, JsonValue::Number(n)) => n
            .as_f64()
            .map(WireValue::Double)
            .ok_or_else(mismatch),
        (WireType::Boolean, JsonValue::Bool(b)) => Ok(WireValue::Boolean(*b)),
        (WireType::String, JsonValue::String(s)) => Ok(WireValue::String(s.clone())),
        (WireType::BinaryBlob, JsonValue::String(s)) => decode_blob(s).map(WireValue::BinaryBlob),
        (WireType::DateTime, JsonValue::String(s)) => parse_datetime(s)
            .map(WireValue::DateTime)
            .ok_or_else(|| Error::coercion(wire_type, s.as_str(), "unrecognized date/time")),
        (WireType::DateTime, JsonValue::Number(n)) => n
            .as_i64()
            .and_then(from_epoch_millis)
            .map(WireValue::DateTime)
            .ok_or_else(mismatch),
        _ => Err(mismatch()),
    }
}

/// Decode a JSON value that carries no declared type
///
/// Integral numbers become integers (`15.0` is read as `15`); fractional
/// numbers stay doubles. Homogeneous arrays get the matching array type.
pub fn coerce_generic(value: &JsonValue) -> Result<WireValue> {
    match value {
        JsonValue::Number(n) => Ok(normalize_number(n)),
        JsonValue::Bool(b) => Ok(WireValue::Boolean(*b)),
        JsonValue::String(s) => Ok(WireValue::String(s.clone())),
        JsonValue::Array(items) => generic_array(items),
        JsonValue::Null => Err(Error::coercion("generic", "null", "null has no wire type")),
        JsonValue::Object(_) => Err(Error::coercion(
            "generic",
            value.to_string(),
            "objects are not scalar values",
        )),
    }
}

/// Apply the integral-number rule to a JSON number
pub fn normalize_number(n: &Number) -> WireValue {
    match integral(n) {
        Some(v) => i32::try_from(v).map_or(WireValue::LongInteger(v), WireValue::Integer),
        None => WireValue::Double(n.as_f64().unwrap_or(f64::NAN)),
    }
}

fn generic_array(items: &[JsonValue]) -> Result<WireValue> {
    if items.is_empty() {
        return Ok(WireValue::StringArray(Vec::new()));
    }

    let numbers: Option<Vec<&Number>> = items.iter().map(JsonValue::as_number).collect();
    if let Some(numbers) = numbers {
        let integers: Option<Vec<i64>> = numbers.iter().map(|n| integral(n)).collect();
        return Ok(match integers {
            Some(ints) => match ints
                .iter()
                .map(|v| i32::try_from(*v))
                .collect::<std::result::Result<Vec<i32>, _>>()
            {
                Ok(narrow) => WireValue::IntegerArray(narrow),
                Err(_) => WireValue::LongIntegerArray(ints),
            },
            None => WireValue::DoubleArray(numbers.iter().filter_map(|n| n.as_f64()).collect()),
        });
    }

    if let Some(bools) = items
        .iter()
        .map(JsonValue::as_bool)
        .collect::<Option<Vec<bool>>>()
    {
        return Ok(WireValue::BooleanArray(bools));
    }

    if let Some(strings) = items
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect::<Option<Vec<String>>>()
    {
        return Ok(WireValue::StringArray(strings));
    }

    Err(Error::coercion(
        "generic",
        JsonValue::Array(items.to_vec()).to_string(),
        "array elements do not share one type",
    ))
}

// ============================================================================
// Helpers
// ============================================================================

/// Parse any recognized date/time representation into a UTC instant
///
/// Instants outside years 0 to 9999 have no RFC 3339 form and are rejected.
pub fn parse_datetime(raw: &str) -> Option<Timestamp> {
    parse_any_datetime(raw.trim()).filter(has_rfc3339_year)
}

fn parse_any_datetime(raw: &str) -> Option<Timestamp> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    raw.parse::<i64>().ok().and_then(from_epoch_millis)
}

fn from_epoch_millis(millis: i64) -> Option<Timestamp> {
    DateTime::<Utc>::from_timestamp_millis(millis).filter(has_rfc3339_year)
}

fn has_rfc3339_year(ts: &Timestamp) -> bool {
    (0..=9999).contains(&ts.year())
}

/// Parse a strict RFC 3339 timestamp (any fractional precision)
pub fn parse_rfc3339(raw: &str) -> Option<Timestamp> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn coerce_array(value: &JsonValue, wire_type: WireType, element: WireType) -> Result<WireValue> {
    let JsonValue::Array(items) = value else {
        return Err(Error::coercion(
            wire_type,
            value.to_string(),
            "expected a JSON array",
        ));
    };

    let values = items
        .iter()
        .map(|item| coerce_json(item, element))
        .collect::<Result<Vec<_>>>()?;

    macro_rules! collect_as {
        ($variant:ident, $array:ident) => {
            WireValue::$array(
                values
                    .into_iter()
                    .filter_map(|v| match v {
                        WireValue::$variant(inner) => Some(inner),
                        _ => None,
                    })
                    .collect(),
            )
        };
    }

    Ok(match element {
        WireType::Integer => collect_as!(Integer, IntegerArray),
        WireType::LongInteger => collect_as!(LongInteger, LongIntegerArray),
        WireType::Double => collect_as!(Double, DoubleArray),
        WireType::Boolean => collect_as!(Boolean, BooleanArray),
        WireType::String => collect_as!(String, StringArray),
        WireType::BinaryBlob => collect_as!(BinaryBlob, BinaryBlobArray),
        WireType::DateTime => collect_as!(DateTime, DateTimeArray),
        _ => unreachable!("element types are scalar"),
    })
}

fn parse_integer(raw: &str, wire_type: WireType) -> Result<i64> {
    raw.trim().parse::<i64>().map_err(|e| {
        let message = match e.kind() {
            std::num::IntErrorKind::PosOverflow | std::num::IntErrorKind::NegOverflow => {
                "out of 64-bit range"
            }
            _ => "not an integer",
        };
        Error::coercion(wire_type, raw, message)
    })
}

/// Integer value of a JSON number, if it has no fractional part
fn integral(n: &Number) -> Option<i64> {
    if let Some(v) = n.as_i64() {
        return Some(v);
    }
    let v = n.as_f64()?;
    #[allow(clippy::cast_precision_loss)]
    let in_range = v >= i64::MIN as f64 && v < i64::MAX as f64;
    (v.is_finite() && v == v.trunc() && in_range).then_some(v as i64)
}

fn finite(v: f64, wire_type: WireType, raw: &str) -> Result<f64> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(Error::coercion(wire_type, raw, "non-finite doubles are not representable"))
    }
}

fn decode_blob(raw: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(raw)
        .map_err(|e| Error::coercion(WireType::BinaryBlob, raw, format!("invalid base64: {e}")))
}

//! Tests for coercion module

use super::*;
use crate::error::Error;
use chrono::{TimeZone, Utc};
use serde_json::json;
use test_case::test_case;

fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> crate::types::Timestamp {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

// ============================================================================
// WireType Tests
// ============================================================================

#[test]
fn test_wire_type_names_roundtrip() {
    for wire_type in WireType::ALL {
        let parsed: WireType = wire_type.as_str().parse().unwrap();
        assert_eq!(parsed, wire_type);

        let json = serde_json::to_string(&wire_type).unwrap();
        assert_eq!(json, format!("\"{}\"", wire_type.as_str()));
    }
    assert!("int".parse::<WireType>().is_err());
}

#[test]
fn test_wire_type_element_type() {
    assert_eq!(
        WireType::DoubleArray.element_type(),
        Some(WireType::Double)
    );
    assert_eq!(WireType::Double.element_type(), None);
    assert!(WireType::BinaryBlobArray.is_array());
    assert!(!WireType::DateTime.is_array());
}

// ============================================================================
// Raw Coercion Tests
// ============================================================================

#[test_case("42", WireType::Integer, WireValue::Integer(42) ; "integer")]
#[test_case("-2147483648", WireType::Integer, WireValue::Integer(i32::MIN) ; "integer min")]
#[test_case("9007199254740993", WireType::LongInteger, WireValue::LongInteger(9_007_199_254_740_993) ; "longinteger beyond f64 precision")]
#[test_case("15.5", WireType::Double, WireValue::Double(15.5) ; "double")]
#[test_case("1e3", WireType::Double, WireValue::Double(1000.0) ; "double exponent")]
#[test_case("true", WireType::Boolean, WireValue::Boolean(true) ; "boolean true")]
#[test_case("false", WireType::Boolean, WireValue::Boolean(false) ; "boolean false")]
#[test_case(" spaced ", WireType::String, WireValue::String(" spaced ".to_string()) ; "string identity")]
#[test_case("aGVsbG8=", WireType::BinaryBlob, WireValue::BinaryBlob(b"hello".to_vec()) ; "binaryblob")]
#[test_case("[1, 2, 3]", WireType::IntegerArray, WireValue::IntegerArray(vec![1, 2, 3]) ; "integer array")]
#[test_case("[true, false]", WireType::BooleanArray, WireValue::BooleanArray(vec![true, false]) ; "boolean array")]
#[test_case(r#"["aGk=", ""]"#, WireType::BinaryBlobArray, WireValue::BinaryBlobArray(vec![b"hi".to_vec(), vec![]]) ; "blob array")]
fn test_coerce_valid(raw: &str, wire_type: WireType, expected: WireValue) {
    assert_eq!(coerce(raw, wire_type).unwrap(), expected);
}

#[test_case("2147483648", WireType::Integer ; "integer overflow")]
#[test_case("1.5", WireType::Integer ; "integer fractional")]
#[test_case("99999999999999999999", WireType::LongInteger ; "longinteger overflow")]
#[test_case("abc", WireType::Double ; "double garbage")]
#[test_case("inf", WireType::Double ; "double infinite")]
#[test_case("True", WireType::Boolean ; "boolean is case sensitive")]
#[test_case("1", WireType::Boolean ; "boolean numeric")]
#[test_case("not base64!", WireType::BinaryBlob ; "invalid base64")]
#[test_case("yesterday", WireType::DateTime ; "unparsable datetime")]
#[test_case("253402300800000", WireType::DateTime ; "epoch millis past year 9999")]
#[test_case("-62167219200001", WireType::DateTime ; "epoch millis before year 0")]
#[test_case("+10000-01-01T00:00:00Z", WireType::DateTime ; "five digit year")]
#[test_case("[1, 2.5]", WireType::IntegerArray ; "array with one bad element")]
#[test_case("1, 2", WireType::IntegerArray ; "array that is not json")]
#[test_case("{\"a\": 1}", WireType::StringArray ; "object instead of array")]
fn test_coerce_rejects(raw: &str, wire_type: WireType) {
    let err = coerce(raw, wire_type).unwrap_err();
    assert!(matches!(err, Error::Coercion { .. }), "got {err:?}");
}

#[test]
fn test_coerce_integer_out_of_range_message() {
    let err = coerce("3000000000", WireType::Integer).unwrap_err();
    assert!(err.to_string().contains("out of 32-bit range"));
}

#[test_case("2019-01-01T01:23:45Z" ; "rfc3339")]
#[test_case("2019-01-01T02:23:45+01:00" ; "rfc3339 with offset")]
#[test_case("Tue, 1 Jan 2019 01:23:45 +0000" ; "rfc2822")]
#[test_case("2019-01-01 01:23:45" ; "naive with space")]
#[test_case("2019-01-01T01:23:45" ; "naive with T")]
#[test_case("1546305825000" ; "epoch millis")]
fn test_coerce_datetime_representations(raw: &str) {
    assert_eq!(
        coerce(raw, WireType::DateTime).unwrap(),
        WireValue::DateTime(ts(2019, 1, 1, 1, 23, 45))
    );
}

#[test]
fn test_coerce_datetime_date_only() {
    assert_eq!(
        coerce("2019-01-01", WireType::DateTime).unwrap(),
        WireValue::DateTime(ts(2019, 1, 1, 0, 0, 0))
    );
}

#[test]
fn test_coerce_datetime_array() {
    let value = coerce(
        r#"["2019-01-01T00:00:00Z", "2019-01-02 00:00:00"]"#,
        WireType::DateTimeArray,
    )
    .unwrap();
    assert_eq!(
        value,
        WireValue::DateTimeArray(vec![ts(2019, 1, 1, 0, 0, 0), ts(2019, 1, 2, 0, 0, 0)])
    );
}

// ============================================================================
// Generic Coercion Tests
// ============================================================================

#[test]
fn test_coerce_untyped_integral_double_becomes_integer() {
    assert_eq!(coerce_untyped("15.0").unwrap(), WireValue::Integer(15));
    assert_eq!(coerce_untyped("15.5").unwrap(), WireValue::Double(15.5));
}

#[test]
fn test_coerce_untyped_other_shapes() {
    assert_eq!(coerce_untyped("true").unwrap(), WireValue::Boolean(true));
    assert_eq!(
        coerce_untyped("hello").unwrap(),
        WireValue::String("hello".to_string())
    );
    assert_eq!(
        coerce_untyped("\"quoted\"").unwrap(),
        WireValue::String("quoted".to_string())
    );
    assert_eq!(
        coerce_untyped("{\"a\": 1}").unwrap(),
        WireValue::String("{\"a\": 1}".to_string())
    );
    assert_eq!(
        coerce_untyped("5000000000").unwrap(),
        WireValue::LongInteger(5_000_000_000)
    );
}

#[test]
fn test_coerce_generic_arrays() {
    assert_eq!(
        coerce_generic(&json!([1.0, 2, 3])).unwrap(),
        WireValue::IntegerArray(vec![1, 2, 3])
    );
    assert_eq!(
        coerce_generic(&json!([1, 2.5])).unwrap(),
        WireValue::DoubleArray(vec![1.0, 2.5])
    );
    assert_eq!(
        coerce_generic(&json!([1, 5_000_000_000_i64])).unwrap(),
        WireValue::LongIntegerArray(vec![1, 5_000_000_000])
    );
    assert_eq!(
        coerce_generic(&json!(["a", "b"])).unwrap(),
        WireValue::StringArray(vec!["a".to_string(), "b".to_string()])
    );
    assert_eq!(
        coerce_generic(&json!([])).unwrap(),
        WireValue::StringArray(vec![])
    );
    assert!(coerce_generic(&json!([1, "a"])).is_err());
}

#[test]
fn test_coerce_generic_rejects_null_and_objects() {
    assert!(coerce_generic(&json!(null)).is_err());
    assert!(coerce_generic(&json!({"a": 1})).is_err());
}

// ============================================================================
// JSON Coercion Tests
// ============================================================================

#[test]
fn test_coerce_json_integer_accepts_integral_double() {
    assert_eq!(
        coerce_json(&json!(15.0), WireType::Integer).unwrap(),
        WireValue::Integer(15)
    );
    assert!(coerce_json(&json!(15.5), WireType::Integer).is_err());
    assert!(coerce_json(&json!(3_000_000_000_i64), WireType::Integer).is_err());
}

#[test]
fn test_coerce_json_longinteger_from_string() {
    assert_eq!(
        coerce_json(&json!("9223372036854775807"), WireType::LongInteger).unwrap(),
        WireValue::LongInteger(i64::MAX)
    );
}

#[test]
fn test_coerce_json_double_keeps_integral_values_as_double() {
    assert_eq!(
        coerce_json(&json!(15), WireType::Double).unwrap(),
        WireValue::Double(15.0)
    );
}

#[test]
fn test_coerce_json_datetime_year_range() {
    assert_eq!(
        coerce_json(&json!(1_546_305_825_000_i64), WireType::DateTime).unwrap(),
        WireValue::DateTime(ts(2019, 1, 1, 1, 23, 45))
    );
    assert!(coerce_json(&json!(253_402_300_800_000_i64), WireType::DateTime).is_err());
}

#[test]
fn test_coerce_json_type_mismatch() {
    let err = coerce_json(&json!("15"), WireType::Integer).unwrap_err();
    assert!(matches!(err, Error::Coercion { .. }));
    assert!(coerce_json(&json!(1), WireType::Boolean).is_err());
    assert!(coerce_json(&json!(1), WireType::String).is_err());
}

#[test]
fn test_coerce_json_blob_and_datetime() {
    assert_eq!(
        coerce_json(&json!("AAEC"), WireType::BinaryBlob).unwrap(),
        WireValue::BinaryBlob(vec![0, 1, 2])
    );
    assert_eq!(
        coerce_json(&json!("2019-01-01T01:23:45.000Z"), WireType::DateTime).unwrap(),
        WireValue::DateTime(ts(2019, 1, 1, 1, 23, 45))
    );
}

// ============================================================================
// Decoercion Tests
// ============================================================================

#[test]
fn test_decoerce_forms() {
    assert_eq!(decoerce(&WireValue::Integer(-7)), "-7");
    assert_eq!(decoerce(&WireValue::Double(0.1)), "0.1");
    assert_eq!(decoerce(&WireValue::BinaryBlob(b"hello".to_vec())), "aGVsbG8=");
    assert_eq!(
        decoerce(&WireValue::DateTime(ts(2019, 1, 1, 1, 23, 45))),
        "2019-01-01T01:23:45.000000000Z"
    );
    assert_eq!(
        decoerce(&WireValue::StringArray(vec!["a".into(), "b".into()])),
        r#"["a","b"]"#
    );
}

#[test]
fn test_to_json_wire_forms() {
    assert_eq!(WireValue::LongInteger(5).to_json(), json!(5));
    assert_eq!(WireValue::BinaryBlob(vec![0, 1, 2]).to_json(), json!("AAEC"));
    assert_eq!(WireValue::Double(f64::NAN).to_json(), json!(null));
    assert_eq!(
        WireValue::DoubleArray(vec![1.5, 2.0]).to_json(),
        json!([1.5, 2.0])
    );
}

#[test]
fn test_coerce_decoerce_idempotent() {
    let samples: &[(WireType, &str)] = &[
        (WireType::Integer, "-12"),
        (WireType::LongInteger, "9007199254740993"),
        (WireType::Double, "0.30000000000000004"),
        (WireType::Double, "15"),
        (WireType::Boolean, "false"),
        (WireType::String, "with \"quotes\""),
        (WireType::BinaryBlob, "AP8="),
        (WireType::DateTime, "2019-01-01T02:23:45.678+01:00"),
        (WireType::DateTime, "253402300799999"),
        (WireType::DateTime, "-62167219200000"),
        (WireType::IntegerArray, "[1,-2]"),
        (WireType::LongIntegerArray, "[5000000000]"),
        (WireType::DoubleArray, "[1.0, 2.5]"),
        (WireType::BooleanArray, "[true]"),
        (WireType::StringArray, r#"["x", ""]"#),
        (WireType::BinaryBlobArray, r#"["AP8="]"#),
        (WireType::DateTimeArray, r#"["2019-01-01 00:00:00"]"#),
    ];

    for (wire_type, raw) in samples {
        let first = coerce(raw, *wire_type).unwrap();
        let second = coerce(&decoerce(&first), *wire_type).unwrap();
        assert_eq!(first, second, "{wire_type} from {raw}");
        assert_eq!(first.wire_type(), *wire_type);
    }
}

//! Tests for the AppEngine client

use super::*;
use crate::coerce::{WireType, WireValue};
use crate::config::ClientConfig;
use crate::error::Error;
use crate::http::{HttpClient, HttpClientConfig};
use crate::interface::{
    Aggregation, InterfaceSchema, InterfaceType, Mapping, Ownership, StaticSchemaProvider,
};
use crate::types::Order;
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DEVICE_PATH: &str = "/v1/test/devices/dev1";

fn schemas() -> StaticSchemaProvider {
    StaticSchemaProvider::new()
        .with_interface(
            InterfaceSchema::new("org.example.Sensors", 1, InterfaceType::Datastream)
                .with_mapping(Mapping::new("/%{sensor}/value", WireType::Double)),
        )
        .with_interface(
            InterfaceSchema::new("org.example.Geolocation", 0, InterfaceType::Datastream)
                .with_aggregation(Aggregation::Object)
                .with_mapping(Mapping::new("/%{car}/latitude", WireType::Double))
                .with_mapping(Mapping::new("/%{car}/longitude", WireType::Double)),
        )
        .with_interface(
            InterfaceSchema::new("org.example.Settings", 2, InterfaceType::Properties)
                .with_ownership(Ownership::Server)
                .with_mapping(Mapping::new("/limits/max", WireType::Integer))
                .with_mapping(Mapping::new("/name", WireType::String).with_allow_unset()),
        )
        .with_interface(
            InterfaceSchema::new("org.example.Commands", 0, InterfaceType::Datastream)
                .with_ownership(Ownership::Server)
                .with_mapping(Mapping::new("/run", WireType::Integer)),
        )
        .with_interface(
            InterfaceSchema::new("org.example.Targets", 1, InterfaceType::Datastream)
                .with_ownership(Ownership::Server)
                .with_aggregation(Aggregation::Object)
                .with_mapping(Mapping::new("/%{car}/latitude", WireType::Double))
                .with_mapping(Mapping::new("/%{car}/label", WireType::String)),
        )
}

fn device_status() -> serde_json::Value {
    json!({
        "data": {
            "id": "dev1",
            "connected": true,
            "introspection": {
                "org.example.Sensors": {"major": 1, "minor": 3, "exchanged_msgs": 10},
                "org.example.Geolocation": {"major": 0, "minor": 1},
                "org.example.Settings": {"major": 2, "minor": 0},
                "org.example.Commands": {"major": 0, "minor": 1},
                "org.example.Targets": {"major": 1, "minor": 0}
            }
        }
    })
}

async fn setup() -> (MockServer, AppEngineClient) {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(DEVICE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_status()))
        .mount(&mock_server)
        .await;

    let transport = HttpClient::with_config(HttpClientConfig::builder().token("t").build()).unwrap();
    let client = AppEngineClient::new(
        Arc::new(transport),
        Arc::new(schemas()),
        mock_server.uri(),
        "test",
    );

    (mock_server, client)
}

fn device() -> DeviceRef {
    DeviceRef::id("dev1")
}

fn record(second: u32, value: serde_json::Value) -> serde_json::Value {
    let ts = format!("2024-05-01T12:00:{second:02}.000000000Z");
    json!({"value": value, "timestamp": ts, "reception_timestamp": ts})
}

// ============================================================================
// Types
// ============================================================================

#[test]
fn test_device_ref_path_segment() {
    assert_eq!(DeviceRef::id("abc").path_segment(), "devices/abc");
    assert_eq!(
        DeviceRef::alias("pump-1").path_segment(),
        "devices-by-alias/pump-1"
    );
    assert_eq!(DeviceRef::from("abc"), DeviceRef::id("abc"));
}

#[test]
fn test_sample_query_builder() {
    let to = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    let query = SampleQuery::new("/kitchen/value").to(to).latest(5).page_size(2);

    assert_eq!(query.order, Order::Descending);
    assert_eq!(query.limit, 5);
    assert_eq!(query.page_size, Some(2));
    assert_eq!(query.window().to, to);
    assert_eq!(query.window().since, None);
}

// ============================================================================
// Introspection
// ============================================================================

#[tokio::test]
async fn test_device_introspection() {
    let (_server, client) = setup().await;

    let introspection = client.device_introspection(&device()).await.unwrap();

    assert_eq!(introspection.len(), 5);
    assert_eq!(
        introspection["org.example.Sensors"],
        InterfaceVersion { major: 1, minor: 3 }
    );
}

#[tokio::test]
async fn test_device_by_alias() {
    let (mock_server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/test/devices-by-alias/pump-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_status()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let schema = client
        .interface_for(&DeviceRef::alias("pump-1"), "org.example.Settings")
        .await
        .unwrap();
    assert_eq!(schema.major, 2);
}

#[tokio::test]
async fn test_interface_not_declared() {
    let (_server, client) = setup().await;

    let err = client
        .interface_for(&device(), "org.example.Missing")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InterfaceNotFound { .. }));
}

#[tokio::test]
async fn test_unknown_device_surfaces_api_error() {
    let (mock_server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/test/devices/ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errors": {"detail": "Device not found"}
        })))
        .mount(&mock_server)
        .await;

    let err = client
        .device_introspection(&DeviceRef::id("ghost"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Api { status: 404, ref detail } if detail == "Device not found"));
}

// ============================================================================
// Datastream Reads
// ============================================================================

#[tokio::test]
async fn test_get_samples_follows_pages() {
    let (mock_server, client) = setup().await;
    let data_path = "/v1/test/devices/dev1/interfaces/org.example.Sensors/kitchen/value";

    Mock::given(method("GET"))
        .and(path(data_path))
        .and(query_param("page_size", "2"))
        .and(query_param_is_missing("since_after"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [record(0, json!(20)), record(1, json!(20.5))]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(data_path))
        .and(query_param("since_after", "2024-05-01T12:00:01.000000000Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [record(2, json!(21))]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let query = SampleQuery::new("/kitchen/value").page_size(2);
    let samples = client
        .get_samples(&device(), "org.example.Sensors", &query)
        .await
        .unwrap();

    let values: Vec<WireValue> = samples.into_iter().map(|s| s.value).collect();
    assert_eq!(
        values,
        vec![
            WireValue::Double(20.0),
            WireValue::Double(20.5),
            WireValue::Double(21.0)
        ]
    );
}

#[tokio::test]
async fn test_get_samples_latest_uses_limit() {
    let (mock_server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(
            "/v1/test/devices/dev1/interfaces/org.example.Sensors/kitchen/value",
        ))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [record(9, json!(3)), record(8, json!(2)), record(7, json!(1))]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let query = SampleQuery::new("/kitchen/value").latest(2).page_size(100);
    let samples = client
        .get_samples(&device(), "org.example.Sensors", &query)
        .await
        .unwrap();

    assert_eq!(samples.len(), 2);
    assert_eq!(samples[0].value, WireValue::Double(3.0));
}

#[tokio::test]
async fn test_path_mismatch_makes_no_data_request() {
    let (mock_server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(
            "/v1/test/devices/dev1/interfaces/org.example.Sensors/kitchen",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let err = client
        .get_samples(&device(), "org.example.Sensors", &SampleQuery::new("/kitchen"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SchemaMismatch { .. }));

    let err = client
        .get_aggregates(&device(), "org.example.Sensors", &SampleQuery::new("/kitchen"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SchemaMismatch { .. }));
}

#[tokio::test]
async fn test_get_aggregates() {
    let (mock_server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(
            "/v1/test/devices/dev1/interfaces/org.example.Geolocation/car",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"timestamp": "2024-05-01T12:00:00.000Z", "longitude": 11, "latitude": 45.5},
                {"timestamp": "2024-05-01T12:00:05.000Z", "longitude": 11.5, "latitude": 46}
            ]
        })))
        .mount(&mock_server)
        .await;

    let aggregates = client
        .get_aggregates(&device(), "org.example.Geolocation", &SampleQuery::new("/car"))
        .await
        .unwrap();

    assert_eq!(aggregates.len(), 2);
    let keys: Vec<&str> = aggregates[0].keys().collect();
    assert_eq!(keys, vec!["longitude", "latitude"]);
    assert_eq!(aggregates[0].get("longitude"), Some(&WireValue::Double(11.0)));
    assert_eq!(aggregates[1].get("latitude"), Some(&WireValue::Double(46.0)));
}

#[tokio::test]
async fn test_get_datastream_snapshot() {
    let (mock_server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/test/devices/dev1/interfaces/org.example.Sensors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "kitchen": {"value": record(3, json!(19))},
                "garage": {"value": record(4, json!(7.5))}
            }
        })))
        .mount(&mock_server)
        .await;

    let snapshot = client
        .get_datastream_snapshot(&device(), "org.example.Sensors")
        .await
        .unwrap();

    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot["/kitchen/value"].value, WireValue::Double(19.0));
    assert_eq!(snapshot["/garage/value"].value, WireValue::Double(7.5));
}

// ============================================================================
// Property Reads
// ============================================================================

#[tokio::test]
async fn test_get_properties_whole_interface() {
    let (mock_server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/test/devices/dev1/interfaces/org.example.Settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"limits": {"max": 10}, "name": "pump"}
        })))
        .mount(&mock_server)
        .await;

    let properties = client
        .get_properties(&device(), "org.example.Settings", "")
        .await
        .unwrap();

    assert_eq!(properties.len(), 2);
    assert_eq!(properties["/limits/max"], WireValue::Integer(10));
    assert_eq!(properties["/name"], WireValue::from("pump"));
}

#[tokio::test]
async fn test_get_single_property() {
    let (mock_server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(
            "/v1/test/devices/dev1/interfaces/org.example.Settings/limits/max",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": 42})))
        .mount(&mock_server)
        .await;

    let properties = client
        .get_properties(&device(), "org.example.Settings", "/limits/max")
        .await
        .unwrap();

    assert_eq!(properties.len(), 1);
    assert_eq!(properties["/limits/max"], WireValue::Integer(42));
}

#[tokio::test]
async fn test_get_properties_requires_properties_interface() {
    let (_server, client) = setup().await;

    let err = client
        .get_properties(&device(), "org.example.Sensors", "")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SchemaMismatch { .. }));
}

// ============================================================================
// Writes
// ============================================================================

#[tokio::test]
async fn test_send_datastream_coerces_payload() {
    let (mock_server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/test/devices/dev1/interfaces/org.example.Commands/run"))
        .and(body_json(json!({"data": 5})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": 5})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let sent = client
        .send_datastream(&device(), "org.example.Commands", "/run", "5")
        .await
        .unwrap();
    assert_eq!(sent, WireValue::Integer(5));

    let err = client
        .send_datastream(&device(), "org.example.Commands", "/run", "five")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Coercion { .. }));
}

#[tokio::test]
async fn test_writes_require_server_ownership() {
    let (_server, client) = setup().await;

    let err = client
        .send_datastream(&device(), "org.example.Sensors", "/kitchen/value", "1.5")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SchemaMismatch { ref message, .. } if message.contains("server owned")));
}

#[tokio::test]
async fn test_send_aggregate() {
    let (mock_server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/test/devices/dev1/interfaces/org.example.Targets/car"))
        .and(body_json(json!({"data": {"latitude": 45.5, "label": "home"}})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let sent = client
        .send_aggregate(
            &device(),
            "org.example.Targets",
            "/car",
            &[("latitude", "45.5"), ("label", "home")],
        )
        .await
        .unwrap();
    assert_eq!(sent[0], ("latitude".to_string(), WireValue::Double(45.5)));

    let err = client
        .send_aggregate(&device(), "org.example.Targets", "/car", &[("speed", "3")])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SchemaMismatch { .. }));
}

#[tokio::test]
async fn test_set_and_unset_property() {
    let (mock_server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path(
            "/v1/test/devices/dev1/interfaces/org.example.Settings/limits/max",
        ))
        .and(body_json(json!({"data": 42})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": 42})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/v1/test/devices/dev1/interfaces/org.example.Settings/name"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let value = client
        .set_property(&device(), "org.example.Settings", "/limits/max", "42")
        .await
        .unwrap();
    assert_eq!(value, WireValue::Integer(42));

    client
        .unset_property(&device(), "org.example.Settings", "/name")
        .await
        .unwrap();

    let err = client
        .unset_property(&device(), "org.example.Settings", "/limits/max")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SchemaMismatch { ref message, .. } if message.contains("unset")));
}

#[tokio::test]
async fn test_set_property_out_of_range_sends_nothing() {
    let (mock_server, client) = setup().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let err = client
        .set_property(&device(), "org.example.Settings", "/limits/max", "4294967296")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Coercion { .. }));
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_from_config() {
    let config = ClientConfig::new("https://api.example.com/appengine", "test", "secret");
    let client = AppEngineClient::from_config(&config).unwrap();

    assert_eq!(client.realm(), "test");
    let debug = format!("{client:?}");
    assert!(debug.contains("https://api.example.com/appengine"));
    assert!(debug.contains("10000"));
}

//! End-to-end smoke tests for the full smarthomed stack.
//!
//! Each test spins up the complete application (in-memory `SQLite`, real
//! store, real service, real axum router) and exercises the HTTP layer via
//! `tower::ServiceExt::oneshot`. No TCP port is bound.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use smarthome_adapter_http_axum::router;
use smarthome_adapter_http_axum::state::AppState;
use smarthome_adapter_storage_sqlite_sqlx::{Database, SqliteDeviceStore};
use smarthome_app::services::device_service::DeviceService;
use tower::ServiceExt;

/// Build a fully-wired router backed by an in-memory `SQLite` database.
async fn app() -> axum::Router {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("in-memory database should initialise");

    let store = SqliteDeviceStore::new(db.pool().clone());
    router::build(AppState::new(DeviceService::new(store)))
}

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    call(app, request).await
}

async fn send_json(app: &axum::Router, method: &str, uri: &str, body: &Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    call(app, request).await
}

async fn call(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn temperature_sensor() -> Value {
    json!({
        "device_id": "sensor_1",
        "name": "Temp living",
        "room_name": "living",
        "type": "sensor",
        "sensor_type": "temperature",
        "unit": "°C"
    })
}

fn ceiling_relay() -> Value {
    json!({
        "device_id": "relay_1",
        "name": "Living light",
        "room_name": "living",
        "type": "relay",
        "load_name": "Luz techo"
    })
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let (status, body) = get(&app().await, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

// ---------------------------------------------------------------------------
// Creation and queries
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_create_sensor_fetch_it_and_create_relay_with_default_state() {
    let app = app().await;

    let (status, created) = send_json(&app, "POST", "/devices", &temperature_sensor()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        created,
        json!({
            "device_id": "sensor_1",
            "name": "Temp living",
            "room_name": "living",
            "type": "sensor",
            "sensor_type": "temperature",
            "unit": "°C",
            "value": null,
            "load_name": null,
            "state": null,
            "online": true,
            "last_value_at": null
        })
    );

    let (status, fetched) = get(&app, "/devices/sensor_1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, relay) = send_json(&app, "POST", "/devices", &ceiling_relay()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(relay["state"], false);
    assert_eq!(relay["load_name"], "Luz techo");
    assert!(relay["sensor_type"].is_null());
    assert!(relay["unit"].is_null());
    assert!(relay["value"].is_null());
}

#[tokio::test]
async fn should_store_other_variant_fields_as_null() {
    let app = app().await;
    let mut relay = ceiling_relay();
    relay["unit"] = json!("W");
    relay["sensor_type"] = json!("power");

    let (status, _) = send_json(&app, "POST", "/devices", &relay).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, stored) = get(&app, "/devices/relay_1").await;
    assert!(stored["unit"].is_null());
    assert!(stored["sensor_type"].is_null());
    assert_eq!(stored["load_name"], "Luz techo");
}

#[tokio::test]
async fn should_replace_device_when_created_twice_with_same_id() {
    let app = app().await;
    send_json(&app, "POST", "/devices", &temperature_sensor()).await;

    let mut renamed = temperature_sensor();
    renamed["name"] = json!("Renamed sensor");
    send_json(&app, "POST", "/devices", &renamed).await;

    let (status, all) = get(&app, "/devices").await;
    assert_eq!(status, StatusCode::OK);
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0]["name"], "Renamed sensor");
}

#[tokio::test]
async fn should_list_empty_array_when_no_devices() {
    let (status, body) = get(&app().await, "/devices").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn should_return_404_for_unknown_device() {
    let (status, body) = get(&app().await, "/devices/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn should_return_400_when_sensor_type_missing() {
    let mut body = temperature_sensor();
    body.as_object_mut().unwrap().remove("sensor_type");

    let (status, err) = send_json(&app().await, "POST", "/devices", &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["error"].as_str().unwrap().contains("sensor_type"));
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_persist_sensor_value_and_relay_toggle() {
    let app = app().await;
    send_json(&app, "POST", "/devices", &temperature_sensor()).await;
    send_json(&app, "POST", "/devices", &ceiling_relay()).await;

    let (status, _) =
        send_json(&app, "PUT", "/devices/sensor_1/value", &json!({ "value": 25.0 })).await;
    assert_eq!(status, StatusCode::OK);
    let (_, sensor) = get(&app, "/devices/sensor_1").await;
    assert_eq!(sensor["value"], 25.0);
    assert!(sensor["last_value_at"].is_string());

    let (status, _) = send_json(
        &app,
        "PUT",
        "/devices/relay_1/state",
        &json!({ "command": "toggle" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, relay) = get(&app, "/devices/relay_1").await;
    assert_eq!(relay["state"], true);
    assert!(relay["last_value_at"].is_null());
}

#[tokio::test]
async fn should_return_409_when_updating_value_of_relay() {
    let app = app().await;
    send_json(&app, "POST", "/devices", &ceiling_relay()).await;

    let (status, _) =
        send_json(&app, "PUT", "/devices/relay_1/value", &json!({ "value": 1.0 })).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// Rooms and snapshot
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_filter_devices_by_room_in_insertion_order() {
    let app = app().await;
    for (id, room) in [("A", "living"), ("B", "kitchen"), ("C", "living")] {
        let mut relay = ceiling_relay();
        relay["device_id"] = json!(id);
        relay["room_name"] = json!(room);
        send_json(&app, "POST", "/devices", &relay).await;
    }

    let (status, body) = get(&app, "/rooms/living/devices").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["device_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["A", "C"]);
}

#[tokio::test]
async fn should_export_snapshot_wrapped_in_devices_key() {
    let app = app().await;
    send_json(&app, "POST", "/devices", &temperature_sensor()).await;
    send_json(&app, "POST", "/devices", &ceiling_relay()).await;

    let (status, body) = get(&app, "/snapshot").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["devices"].as_array().unwrap().len(), 2);
    assert_eq!(body["devices"][0]["device_id"], "sensor_1");
}

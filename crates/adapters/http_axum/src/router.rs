//! Axum router assembly.

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use smarthome_app::ports::DeviceStore;

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Includes a [`TraceLayer`] that logs each HTTP request/response at the
/// `DEBUG` level using the `tracing` ecosystem.
pub fn build<S>(state: AppState<S>) -> Router
where
    S: DeviceStore + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .merge(crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use smarthome_app::services::device_service::DeviceService;
    use smarthome_domain::device::DeviceRecord;
    use smarthome_domain::error::SmartHomeError;
    use smarthome_domain::id::DeviceId;
    use std::sync::Mutex;
    use tower::ServiceExt;

    #[derive(Default)]
    struct MemoryStore {
        docs: Mutex<Vec<DeviceRecord>>,
    }

    impl DeviceStore for MemoryStore {
        async fn replace(&self, record: DeviceRecord) -> Result<(), SmartHomeError> {
            let mut docs = self.docs.lock().unwrap();
            match docs.iter_mut().find(|d| d.device_id == record.device_id) {
                Some(existing) => *existing = record,
                None => docs.push(record),
            }
            Ok(())
        }
        async fn find_all(&self) -> Result<Vec<DeviceRecord>, SmartHomeError> {
            Ok(self.docs.lock().unwrap().clone())
        }
        async fn find_by_id(&self, id: &DeviceId) -> Result<Option<DeviceRecord>, SmartHomeError> {
            Ok(self
                .docs
                .lock()
                .unwrap()
                .iter()
                .find(|d| d.device_id == id.as_str())
                .cloned())
        }
    }

    fn app() -> Router {
        build(AppState::new(DeviceService::new(MemoryStore::default())))
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    fn sensor_body() -> Value {
        json!({
            "device_id": "sensor_1",
            "name": "Temp living",
            "room_name": "living",
            "type": "sensor",
            "sensor_type": "temperature",
            "unit": "°C"
        })
    }

    #[tokio::test]
    async fn should_return_ok_when_health_check_called() {
        let (status, body) = send(&app(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn should_create_sensor_and_return_canonical_record() {
        let (status, body) = send(&app(), "POST", "/devices", Some(sensor_body())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["device_id"], "sensor_1");
        assert_eq!(body["type"], "sensor");
        assert!(body["value"].is_null());
        assert!(body["state"].is_null());
        assert!(body["load_name"].is_null());
        assert_eq!(body["online"], true);
        assert!(body["last_value_at"].is_null());
    }

    #[tokio::test]
    async fn should_return_404_for_unknown_device() {
        let (status, body) = send(&app(), "GET", "/devices/ghost", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("ghost"));
    }

    #[tokio::test]
    async fn should_reject_unknown_device_type_with_400() {
        let mut body = sensor_body();
        body["type"] = json!("thermostat");
        let (status, _) = send(&app(), "POST", "/devices", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_null_other_variant_fields_on_create() {
        let app = app();

        let mut sensor = sensor_body();
        sensor["initial_state"] = json!(true);
        let (status, body) = send(&app, "POST", "/devices", Some(sensor)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["state"].is_null());

        let relay = json!({
            "device_id": "relay_1",
            "name": "Heater",
            "room_name": "living",
            "type": "relay",
            "load_name": "Heater",
            "unit": "W"
        });
        let (status, body) = send(&app, "POST", "/devices", Some(relay)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["unit"].is_null());
        assert_eq!(body["state"], false);
    }

    #[tokio::test]
    async fn should_reject_malformed_json_with_400() {
        let request = Request::builder()
            .method("POST")
            .uri("/devices")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_reject_relay_command_on_sensor_with_409() {
        let app = app();
        send(&app, "POST", "/devices", Some(sensor_body())).await;

        let (status, _) = send(
            &app,
            "PUT",
            "/devices/sensor_1/state",
            Some(json!({ "command": "toggle" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn should_record_sensor_value() {
        let app = app();
        send(&app, "POST", "/devices", Some(sensor_body())).await;

        let (status, body) = send(
            &app,
            "PUT",
            "/devices/sensor_1/value",
            Some(json!({ "value": 24.5 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["value"], 24.5);
        assert!(body["last_value_at"].is_string());
    }

    #[tokio::test]
    async fn should_list_devices_of_room_and_snapshot() {
        let app = app();
        send(&app, "POST", "/devices", Some(sensor_body())).await;
        send(
            &app,
            "POST",
            "/devices",
            Some(json!({
                "device_id": "relay_1",
                "name": "Kitchen light",
                "room_name": "kitchen",
                "type": "relay",
                "load_name": "Ceiling light"
            })),
        )
        .await;

        let (status, body) = send(&app, "GET", "/rooms/kitchen/devices", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["device_id"], "relay_1");

        let (status, body) = send(&app, "GET", "/snapshot", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["devices"].as_array().unwrap().len(), 2);
    }
}

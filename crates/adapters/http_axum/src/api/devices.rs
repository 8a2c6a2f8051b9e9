//! JSON handlers for devices.

use std::str::FromStr;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use smarthome_app::ports::DeviceStore;
use smarthome_domain::device::{Device, RelayCommand};
use smarthome_domain::error::ValidationError;
use smarthome_domain::id::DeviceId;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for creating a device.
///
/// Every field is optional at the decoding stage so that missing fields are
/// reported by the domain builder with the field name.
#[derive(Debug, Default, Deserialize)]
pub struct CreateDeviceRequest {
    pub device_id: Option<String>,
    pub name: Option<String>,
    pub room_name: Option<String>,
    #[serde(rename = "type")]
    pub device_type: Option<String>,
    pub sensor_type: Option<String>,
    pub unit: Option<String>,
    pub load_name: Option<String>,
    pub initial_state: Option<bool>,
}

impl CreateDeviceRequest {
    fn into_device(self) -> Result<Device, ValidationError> {
        let mut builder = Device::builder();
        if let Some(device_id) = self.device_id {
            builder = builder.device_id(device_id);
        }
        if let Some(name) = self.name {
            builder = builder.name(name);
        }
        if let Some(room_name) = self.room_name {
            builder = builder.room_name(room_name);
        }
        if let Some(tag) = self.device_type {
            builder = builder.device_type_tag(tag);
        }
        if let Some(sensor_type) = self.sensor_type {
            builder = builder.sensor_type(sensor_type);
        }
        if let Some(unit) = self.unit {
            builder = builder.unit(unit);
        }
        if let Some(load_name) = self.load_name {
            builder = builder.load_name(load_name);
        }
        if let Some(state) = self.initial_state {
            builder = builder.initial_state(state);
        }
        builder.build()
    }
}

/// Request body for `PUT /devices/{id}/value`.
#[derive(Debug, Deserialize)]
pub struct SensorValueRequest {
    pub value: f64,
}

/// Request body for `PUT /devices/{id}/state`.
#[derive(Debug, Deserialize)]
pub struct RelayStateRequest {
    pub command: RelayCommand,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Device>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from endpoints returning a single device.
pub enum DeviceResponse {
    Ok(Json<Device>),
    Created(Json<Device>),
}

impl IntoResponse for DeviceResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

fn parse_id(raw: &str) -> Result<DeviceId, ApiError> {
    DeviceId::from_str(raw).map_err(ApiError::from)
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(inner)| inner)
        .map_err(|rejection| ValidationError::MalformedPayload(rejection.body_text()).into())
}

/// `GET /devices`
pub async fn list<S>(State(state): State<AppState<S>>) -> Result<ListResponse, ApiError>
where
    S: DeviceStore + Send + Sync + 'static,
{
    let devices = state.device_service.list_all().await?;
    Ok(ListResponse::Ok(Json(devices)))
}

/// `GET /devices/{id}`
pub async fn get<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<DeviceResponse, ApiError>
where
    S: DeviceStore + Send + Sync + 'static,
{
    let device_id = parse_id(&id)?;
    let device = state.device_service.get_device(&device_id).await?;
    Ok(DeviceResponse::Ok(Json(device)))
}

/// `POST /devices`
///
/// Creating a device whose id already exists replaces it.
pub async fn create<S>(
    State(state): State<AppState<S>>,
    payload: Result<Json<CreateDeviceRequest>, JsonRejection>,
) -> Result<DeviceResponse, ApiError>
where
    S: DeviceStore + Send + Sync + 'static,
{
    let device = body(payload)?.into_device()?;
    let created = state.device_service.create_device(device).await?;
    Ok(DeviceResponse::Created(Json(created)))
}

/// `PUT /devices/{id}/value`
pub async fn update_value<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    payload: Result<Json<SensorValueRequest>, JsonRejection>,
) -> Result<DeviceResponse, ApiError>
where
    S: DeviceStore + Send + Sync + 'static,
{
    let device_id = parse_id(&id)?;
    let req = body(payload)?;
    let device = state
        .device_service
        .record_sensor_value(&device_id, req.value)
        .await?;
    Ok(DeviceResponse::Ok(Json(device)))
}

/// `PUT /devices/{id}/state`
pub async fn update_state<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    payload: Result<Json<RelayStateRequest>, JsonRejection>,
) -> Result<DeviceResponse, ApiError>
where
    S: DeviceStore + Send + Sync + 'static,
{
    let device_id = parse_id(&id)?;
    let req = body(payload)?;
    let device = state
        .device_service
        .apply_relay_command(&device_id, req.command)
        .await?;
    Ok(DeviceResponse::Ok(Json(device)))
}

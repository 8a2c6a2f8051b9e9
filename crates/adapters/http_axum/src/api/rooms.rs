//! Room queries and whole-registry export.

use axum::Json;
use axum::extract::{Path, State};

use smarthome_app::ports::DeviceStore;
use smarthome_domain::device::Device;
use smarthome_domain::registry::RegistrySnapshot;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /rooms/{room_name}/devices`
pub async fn list_devices<S>(
    State(state): State<AppState<S>>,
    Path(room_name): Path<String>,
) -> Result<Json<Vec<Device>>, ApiError>
where
    S: DeviceStore + Send + Sync + 'static,
{
    let devices = state.device_service.list_by_room(&room_name).await?;
    Ok(Json(devices))
}

/// `GET /snapshot`
pub async fn snapshot<S>(
    State(state): State<AppState<S>>,
) -> Result<Json<RegistrySnapshot>, ApiError>
where
    S: DeviceStore + Send + Sync + 'static,
{
    let snapshot = state.device_service.snapshot().await?;
    Ok(Json(snapshot))
}

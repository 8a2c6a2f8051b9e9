//! JSON API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod devices;
#[allow(clippy::missing_errors_doc)]
pub mod rooms;

use axum::Router;
use axum::routing::{get, put};

use smarthome_app::ports::DeviceStore;

use crate::state::AppState;

/// Build the device API router.
pub fn routes<S>() -> Router<AppState<S>>
where
    S: DeviceStore + Send + Sync + 'static,
{
    Router::new()
        // Devices
        .route("/devices", get(devices::list::<S>).post(devices::create::<S>))
        .route("/devices/{id}", get(devices::get::<S>))
        .route("/devices/{id}/value", put(devices::update_value::<S>))
        .route("/devices/{id}/state", put(devices::update_state::<S>))
        // Rooms
        .route("/rooms/{room_name}/devices", get(rooms::list_devices::<S>))
        .route("/snapshot", get(rooms::snapshot::<S>))
}

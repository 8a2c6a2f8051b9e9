//! Shared application state for axum handlers.

use std::sync::Arc;

use smarthome_app::ports::DeviceStore;
use smarthome_app::services::device_service::DeviceService;

/// Application state shared across all axum handlers.
///
/// Generic over the device store to avoid dynamic dispatch. `Clone` is
/// implemented manually so the store itself does not need to be `Clone`;
/// only the `Arc` wrapper is cloned.
pub struct AppState<S> {
    /// Device persistence gateway.
    pub device_service: Arc<DeviceService<S>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            device_service: Arc::clone(&self.device_service),
        }
    }
}

impl<S> AppState<S>
where
    S: DeviceStore + Send + Sync + 'static,
{
    /// Create a new application state from a service instance.
    pub fn new(device_service: DeviceService<S>) -> Self {
        Self {
            device_service: Arc::new(device_service),
        }
    }
}

//! Device service, the persistence gateway for devices.
//!
//! Translates between the canonical documents held by a [`DeviceStore`] and
//! the domain [`Device`], and runs the device use-cases on top of it. Every
//! check happens before the store is written, so a failed call never leaves a
//! partial write behind.

use smarthome_domain::device::{Device, DeviceRecord, RelayCommand};
use smarthome_domain::error::{NotFoundError, SmartHomeError};
use smarthome_domain::id::DeviceId;
use smarthome_domain::registry::{Registry, RegistrySnapshot};
use smarthome_domain::time::now;

use crate::ports::DeviceStore;

/// Application service for device persistence and queries.
pub struct DeviceService<S> {
    store: S,
}

impl<S: DeviceStore> DeviceService<S> {
    /// Create a new service backed by the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Upsert a document by its `device_id`.
    ///
    /// The document is checked against the variant field table, then replaces
    /// whatever was stored under the same key. Returns the document exactly as
    /// it was written.
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::Validation`] if `device_id` is missing or the
    /// document breaks a variant invariant, or a storage error from the store.
    #[tracing::instrument(skip(self, record), fields(device_id = %record.device_id))]
    pub async fn save(&self, record: DeviceRecord) -> Result<DeviceRecord, SmartHomeError> {
        let device = Device::try_from(record)?;
        self.persist(&device).await
    }

    /// Persist a freshly built device.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the store.
    #[tracing::instrument(skip(self, device), fields(device_id = %device.id))]
    pub async fn create_device(&self, device: Device) -> Result<Device, SmartHomeError> {
        self.persist(&device).await?;
        Ok(device)
    }

    /// List every stored device.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the store, or if a stored
    /// document no longer satisfies the device invariants.
    pub async fn list_all(&self) -> Result<Vec<Device>, SmartHomeError> {
        let records = self.store.find_all().await?;
        tracing::debug!(count = records.len(), "listed devices");
        records.into_iter().map(decode).collect()
    }

    /// Look up a device, returning `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the store.
    #[tracing::instrument(skip(self, id), fields(device_id = %id))]
    pub async fn get_by_id(&self, id: &DeviceId) -> Result<Option<Device>, SmartHomeError> {
        self.store.find_by_id(id).await?.map(decode).transpose()
    }

    /// Look up a device, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::NotFound`] when no device with `id` exists,
    /// or a storage error from the store.
    pub async fn get_device(&self, id: &DeviceId) -> Result<Device, SmartHomeError> {
        self.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Device",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// Stored devices in `room_name`, in store order.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the store.
    pub async fn list_by_room(&self, room_name: &str) -> Result<Vec<Device>, SmartHomeError> {
        let registry = self.load_registry().await?;
        Ok(registry.list_by_room(room_name).cloned().collect())
    }

    /// Export every stored device as a single `{devices: [...]}` document.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the store.
    pub async fn snapshot(&self) -> Result<RegistrySnapshot, SmartHomeError> {
        Ok(self.load_registry().await?.snapshot())
    }

    /// Store a new reading for a sensor, stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::NotFound`] if the device does not exist,
    /// [`SmartHomeError::TypeMismatch`] if it is not a sensor,
    /// [`SmartHomeError::Validation`] if `value` is not finite, or a storage
    /// error from the store.
    #[tracing::instrument(skip(self, id), fields(device_id = %id))]
    pub async fn record_sensor_value(
        &self,
        id: &DeviceId,
        value: f64,
    ) -> Result<Device, SmartHomeError> {
        let device = self.get_device(id).await?.update_sensor_value(value, now())?;
        self.persist(&device).await?;
        Ok(device)
    }

    /// Switch a relay on, off, or toggle it.
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::NotFound`] if the device does not exist,
    /// [`SmartHomeError::TypeMismatch`] if it is not a relay, or a storage
    /// error from the store.
    #[tracing::instrument(skip(self, id), fields(device_id = %id))]
    pub async fn apply_relay_command(
        &self,
        id: &DeviceId,
        command: RelayCommand,
    ) -> Result<Device, SmartHomeError> {
        let device = self.get_device(id).await?.apply_relay_command(command)?;
        self.persist(&device).await?;
        Ok(device)
    }

    async fn persist(&self, device: &Device) -> Result<DeviceRecord, SmartHomeError> {
        let record = device.to_record();
        self.store.replace(record.clone()).await?;
        tracing::info!(device_type = %device.device_type(), "device saved");
        Ok(record)
    }

    async fn load_registry(&self) -> Result<Registry, SmartHomeError> {
        Ok(self.list_all().await?.into_iter().collect())
    }
}

/// Rebuild a device from a stored document. A document that fails the device
/// invariants means the store holds corrupt data, so it surfaces as a storage
/// error rather than a validation error.
fn decode(record: DeviceRecord) -> Result<Device, SmartHomeError> {
    let device_id = record.device_id.clone();
    Device::try_from(record).map_err(|err| {
        tracing::warn!(%device_id, error = %err, "stored device document is invalid");
        SmartHomeError::Storage(Box::new(err))
    })
}

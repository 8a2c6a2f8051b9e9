//! Storage port: the document store boundary for devices.

use std::future::Future;

use smarthome_domain::device::DeviceRecord;
use smarthome_domain::error::SmartHomeError;
use smarthome_domain::id::DeviceId;

/// Keyed store of canonical device documents.
///
/// Documents are keyed by `device_id`. Implementations must guarantee at most
/// one document per key after [`replace`](Self::replace) returns.
pub trait DeviceStore {
    /// Insert `record`, or replace in full the document stored under the same
    /// `device_id`. Fields absent from `record` are not kept from the old one.
    fn replace(
        &self,
        record: DeviceRecord,
    ) -> impl Future<Output = Result<(), SmartHomeError>> + Send;

    /// Every stored document, in the store's default order.
    fn find_all(&self) -> impl Future<Output = Result<Vec<DeviceRecord>, SmartHomeError>> + Send;

    /// The document stored under `id`, if any.
    fn find_by_id(
        &self,
        id: &DeviceId,
    ) -> impl Future<Output = Result<Option<DeviceRecord>, SmartHomeError>> + Send;
}

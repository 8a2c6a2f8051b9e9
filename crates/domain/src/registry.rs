//! Registry: an in-process collection of devices keyed by identifier.
//!
//! The registry is independent from persistence: filling it does not write
//! anything, and writes to a store are not reflected here. It is used to
//! answer room queries and to export the whole set as a single document.
//!
//! Mutation goes through `&mut self`. A registry shared between tasks must be
//! wrapped in a lock by its owner.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::device::{Device, DeviceRecord};
use crate::id::DeviceId;

/// Devices keyed by [`DeviceId`], iterated in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    devices: Vec<Device>,
    index: HashMap<DeviceId, usize>,
}

/// Whole-registry export, serialized as `{"devices": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub devices: Vec<DeviceRecord>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `device`, replacing any device with the same identifier.
    ///
    /// A replaced device keeps the position of the one it replaces.
    pub fn add(&mut self, device: Device) {
        if let Some(&position) = self.index.get(&device.id) {
            self.devices[position] = device;
        } else {
            self.index.insert(device.id.clone(), self.devices.len());
            self.devices.push(device);
        }
    }

    #[must_use]
    pub fn get(&self, id: &DeviceId) -> Option<&Device> {
        self.index.get(id).map(|&position| &self.devices[position])
    }

    /// Devices whose room matches `room_name` exactly (case-sensitive).
    pub fn list_by_room<'a>(&'a self, room_name: &'a str) -> impl Iterator<Item = &'a Device> {
        self.devices
            .iter()
            .filter(move |device| device.room_name == room_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Serialize every held device into a [`RegistrySnapshot`].
    #[must_use]
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            devices: self.devices.iter().map(Device::to_record).collect(),
        }
    }
}

impl FromIterator<Device> for Registry {
    fn from_iter<T: IntoIterator<Item = Device>>(iter: T) -> Self {
        let mut registry = Self::new();
        for device in iter {
            registry.add(device);
        }
        registry
    }
}

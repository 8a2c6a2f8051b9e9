//! Device: a physical or virtual home-automation unit.
//!
//! A device carries a set of base fields (identity, label, room, liveness)
//! and exactly one variant:
//!
//! - [`Sensor`] reports a single numeric reading of a given type and unit.
//! - [`Relay`] drives an on/off load.
//!
//! Every device serializes to the same flat [`DeviceRecord`] shape. Fields
//! belonging to the other variant are always present and `null`, so
//! downstream consumers can read any record without knowing its variant.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{SmartHomeError, TypeMismatchError, ValidationError};
use crate::id::DeviceId;
use crate::time::Timestamp;

/// Variant tag of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Sensor,
    Relay,
}

impl DeviceType {
    /// Lowercase wire name of the tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sensor => "sensor",
            Self::Relay => "relay",
        }
    }

    /// Variant fields that must be supplied when creating a device of this type.
    ///
    /// A relay's `state` is not listed: it defaults to `false` at creation.
    #[must_use]
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            Self::Sensor => &["sensor_type"],
            Self::Relay => &["load_name"],
        }
    }

    /// Variant fields that must stay `null` for this type.
    #[must_use]
    pub fn forbidden_fields(self) -> &'static [&'static str] {
        match self {
            Self::Sensor => &["load_name", "state"],
            Self::Relay => &["sensor_type", "unit", "value"],
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sensor" => Ok(Self::Sensor),
            "relay" => Ok(Self::Relay),
            other => Err(ValidationError::UnknownDeviceType(other.to_string())),
        }
    }
}

/// Sensor-specific fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Sensor {
    /// Kind of reading, e.g. `temperature`.
    pub sensor_type: String,
    pub unit: Option<String>,
    /// Last reported reading, `None` until the first update.
    pub value: Option<f64>,
}

/// Relay-specific fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relay {
    /// `true` when the load is powered.
    pub state: bool,
    /// Description of the controlled load, e.g. `Ceiling light`.
    pub load_name: String,
}

/// An on/off command for a relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayCommand {
    TurnOn,
    TurnOff,
    Toggle,
}

impl Relay {
    #[must_use]
    pub fn turned_on(&self) -> Self {
        self.with_state(true)
    }

    #[must_use]
    pub fn turned_off(&self) -> Self {
        self.with_state(false)
    }

    #[must_use]
    pub fn toggled(&self) -> Self {
        self.with_state(!self.state)
    }

    /// Return a copy of this relay with the command applied.
    #[must_use]
    pub fn apply(&self, command: RelayCommand) -> Self {
        match command {
            RelayCommand::TurnOn => self.turned_on(),
            RelayCommand::TurnOff => self.turned_off(),
            RelayCommand::Toggle => self.toggled(),
        }
    }

    fn with_state(&self, state: bool) -> Self {
        Self {
            state,
            load_name: self.load_name.clone(),
        }
    }
}

/// The variant part of a [`Device`].
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceKind {
    Sensor(Sensor),
    Relay(Relay),
}

impl DeviceKind {
    #[must_use]
    pub fn device_type(&self) -> DeviceType {
        match self {
            Self::Sensor(_) => DeviceType::Sensor,
            Self::Relay(_) => DeviceType::Relay,
        }
    }
}

/// A registered device: base fields plus exactly one variant.
///
/// Serializes through [`DeviceRecord`], so the JSON form is always the flat
/// canonical record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "DeviceRecord", try_from = "DeviceRecord")]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub room_name: String,
    pub online: bool,
    /// Time of the last sensor reading. Never set by relay commands.
    pub last_value_at: Option<Timestamp>,
    pub kind: DeviceKind,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    #[must_use]
    pub fn device_type(&self) -> DeviceType {
        self.kind.device_type()
    }

    /// Sensor fields, if this device is a sensor.
    #[must_use]
    pub fn as_sensor(&self) -> Option<&Sensor> {
        match &self.kind {
            DeviceKind::Sensor(sensor) => Some(sensor),
            DeviceKind::Relay(_) => None,
        }
    }

    /// Relay fields, if this device is a relay.
    #[must_use]
    pub fn as_relay(&self) -> Option<&Relay> {
        match &self.kind {
            DeviceKind::Relay(relay) => Some(relay),
            DeviceKind::Sensor(_) => None,
        }
    }

    /// Flatten into the canonical record.
    #[must_use]
    pub fn to_record(&self) -> DeviceRecord {
        let (sensor_type, unit, value, load_name, state) = match &self.kind {
            DeviceKind::Sensor(sensor) => (
                Some(sensor.sensor_type.clone()),
                sensor.unit.clone(),
                sensor.value,
                None,
                None,
            ),
            DeviceKind::Relay(relay) => (
                None,
                None,
                None,
                Some(relay.load_name.clone()),
                Some(relay.state),
            ),
        };

        DeviceRecord {
            device_id: self.id.to_string(),
            name: self.name.clone(),
            room_name: self.room_name.clone(),
            device_type: self.device_type(),
            sensor_type,
            unit,
            value,
            load_name,
            state,
            online: self.online,
            last_value_at: self.last_value_at,
        }
    }

    /// Return a copy of this sensor holding `value`, read at `at`.
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::TypeMismatch`] if this device is not a
    /// sensor, or [`SmartHomeError::Validation`] if `value` is NaN or infinite.
    pub fn update_sensor_value(&self, value: f64, at: Timestamp) -> Result<Self, SmartHomeError> {
        let DeviceKind::Sensor(sensor) = &self.kind else {
            return Err(self
                .mismatch("update sensor value", DeviceType::Sensor)
                .into());
        };
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteValue.into());
        }

        Ok(Self {
            last_value_at: Some(at),
            kind: DeviceKind::Sensor(Sensor {
                value: Some(value),
                ..sensor.clone()
            }),
            ..self.clone()
        })
    }

    /// Return a copy of this relay with its state set to `state`.
    ///
    /// # Errors
    ///
    /// Returns [`TypeMismatchError`] if this device is not a relay.
    pub fn set_relay_state(&self, state: bool) -> Result<Self, TypeMismatchError> {
        let command = if state {
            RelayCommand::TurnOn
        } else {
            RelayCommand::TurnOff
        };
        self.apply_relay_command(command)
    }

    /// Return a copy of this relay with `command` applied.
    ///
    /// # Errors
    ///
    /// Returns [`TypeMismatchError`] if this device is not a relay.
    pub fn apply_relay_command(
        &self,
        command: RelayCommand,
    ) -> Result<Self, TypeMismatchError> {
        let DeviceKind::Relay(relay) = &self.kind else {
            return Err(self.mismatch("switch relay state", DeviceType::Relay));
        };

        Ok(Self {
            kind: DeviceKind::Relay(relay.apply(command)),
            ..self.clone()
        })
    }

    fn mismatch(&self, operation: &'static str, expected: DeviceType) -> TypeMismatchError {
        TypeMismatchError {
            operation,
            expected,
            actual: self.device_type(),
        }
    }
}

/// The canonical flat representation of a device.
///
/// This is both the JSON shape served to clients and the document persisted
/// by storage adapters. The key set never depends on the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub device_id: String,
    pub name: String,
    pub room_name: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    pub sensor_type: Option<String>,
    pub unit: Option<String>,
    pub value: Option<f64>,
    pub load_name: Option<String>,
    pub state: Option<bool>,
    pub online: bool,
    pub last_value_at: Option<Timestamp>,
}

impl From<Device> for DeviceRecord {
    fn from(device: Device) -> Self {
        device.to_record()
    }
}

impl TryFrom<DeviceRecord> for Device {
    type Error = ValidationError;

    fn try_from(record: DeviceRecord) -> Result<Self, Self::Error> {
        let id = DeviceId::new(record.device_id)?;
        let fields = VariantFields {
            sensor_type: record.sensor_type,
            unit: record.unit,
            value: record.value,
            load_name: record.load_name,
            state: record.state,
        };
        let kind = fields.into_kind(record.device_type, None)?;

        Ok(Self {
            id,
            name: record.name,
            room_name: record.room_name,
            online: record.online,
            last_value_at: record.last_value_at,
            kind,
        })
    }
}

/// Variant fields as supplied by a caller, before the per-type table is applied.
#[derive(Debug, Default)]
struct VariantFields {
    sensor_type: Option<String>,
    unit: Option<String>,
    value: Option<f64>,
    load_name: Option<String>,
    state: Option<bool>,
}

impl VariantFields {
    fn is_present(&self, field: &str) -> bool {
        match field {
            "sensor_type" => self.sensor_type.is_some(),
            "unit" => self.unit.is_some(),
            "value" => self.value.is_some(),
            "load_name" => self.load_name.is_some(),
            "state" => self.state.is_some(),
            _ => false,
        }
    }

    /// Clear every field the table forbids for `device_type`.
    fn without_foreign(mut self, device_type: DeviceType) -> Self {
        for field in device_type.forbidden_fields() {
            match *field {
                "sensor_type" => self.sensor_type = None,
                "unit" => self.unit = None,
                "value" => self.value = None,
                "load_name" => self.load_name = None,
                "state" => self.state = None,
                _ => {}
            }
        }
        self
    }

    /// Check the field table for `device_type` and build the variant.
    ///
    /// `default_state` fills in a missing relay state; `None` makes it required.
    fn into_kind(
        self,
        device_type: DeviceType,
        default_state: Option<bool>,
    ) -> Result<DeviceKind, ValidationError> {
        if let Some(field) = device_type
            .required_fields()
            .iter()
            .copied()
            .find(|field| !self.is_present(field))
        {
            return Err(ValidationError::MissingField(field));
        }
        if let Some(field) = device_type
            .forbidden_fields()
            .iter()
            .copied()
            .find(|field| self.is_present(field))
        {
            return Err(ValidationError::FieldNotAllowed { field, device_type });
        }

        match device_type {
            DeviceType::Sensor => Ok(DeviceKind::Sensor(Sensor {
                sensor_type: self
                    .sensor_type
                    .ok_or(ValidationError::MissingField("sensor_type"))?,
                unit: self.unit,
                value: self.value,
            })),
            DeviceType::Relay => Ok(DeviceKind::Relay(Relay {
                state: self
                    .state
                    .or(default_state)
                    .ok_or(ValidationError::MissingField("state"))?,
                load_name: self
                    .load_name
                    .ok_or(ValidationError::MissingField("load_name"))?,
            })),
        }
    }
}

/// Step-by-step builder for a newly created [`Device`].
///
/// New devices start `online` with no reading (`value` and `last_value_at`
/// are `null`).
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    device_id: Option<String>,
    name: Option<String>,
    room_name: Option<String>,
    type_tag: Option<String>,
    sensor_type: Option<String>,
    unit: Option<String>,
    load_name: Option<String>,
    initial_state: Option<bool>,
}

impl DeviceBuilder {
    #[must_use]
    pub fn device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn room_name(mut self, room_name: impl Into<String>) -> Self {
        self.room_name = Some(room_name.into());
        self
    }

    #[must_use]
    pub fn device_type(mut self, device_type: DeviceType) -> Self {
        self.type_tag = Some(device_type.as_str().to_string());
        self
    }

    /// Set the variant from its raw tag. Unknown tags are reported by [`build`](Self::build).
    #[must_use]
    pub fn device_type_tag(mut self, tag: impl Into<String>) -> Self {
        self.type_tag = Some(tag.into());
        self
    }

    #[must_use]
    pub fn sensor_type(mut self, sensor_type: impl Into<String>) -> Self {
        self.sensor_type = Some(sensor_type.into());
        self
    }

    #[must_use]
    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    #[must_use]
    pub fn load_name(mut self, load_name: impl Into<String>) -> Self {
        self.load_name = Some(load_name.into());
        self
    }

    #[must_use]
    pub fn initial_state(mut self, state: bool) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Consume the builder, validate, and return a [`Device`].
    ///
    /// Fields that belong to the other variant are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if a base field is missing, the type tag is
    /// unknown, or a required variant field is missing.
    pub fn build(self) -> Result<Device, ValidationError> {
        let id = self
            .device_id
            .ok_or(ValidationError::MissingField("device_id"))
            .and_then(DeviceId::new)?;
        let name = self.name.ok_or(ValidationError::MissingField("name"))?;
        let room_name = self
            .room_name
            .ok_or(ValidationError::MissingField("room_name"))?;
        let device_type: DeviceType = self
            .type_tag
            .ok_or(ValidationError::MissingField("type"))?
            .parse()?;

        let fields = VariantFields {
            sensor_type: self.sensor_type,
            unit: self.unit,
            value: None,
            load_name: self.load_name,
            state: self.initial_state,
        };
        let kind = fields
            .without_foreign(device_type)
            .into_kind(device_type, Some(false))?;

        Ok(Device {
            id,
            name,
            room_name,
            online: true,
            last_value_at: None,
            kind,
        })
    }
}

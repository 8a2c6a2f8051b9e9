//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`SmartHomeError`] via `#[from]`.

use crate::device::DeviceType;

/// Top-level error shared by every crate in the workspace.
#[derive(Debug, thiserror::Error)]
pub enum SmartHomeError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("type mismatch: {0}")]
    TypeMismatch(#[from] TypeMismatchError),

    #[error("not found: {0}")]
    NotFound(#[from] NotFoundError),

    /// Failure reported by a storage adapter. The concrete error stays boxed
    /// so the domain never depends on a driver crate.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Malformed or incomplete device input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A field required for this device (or document) was not supplied.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// The type tag is neither `sensor` nor `relay`.
    #[error("unknown device type `{0}`")]
    UnknownDeviceType(String),

    /// A field belonging to the other variant was supplied.
    #[error("field `{field}` is not allowed for {device_type} devices")]
    FieldNotAllowed {
        field: &'static str,
        device_type: DeviceType,
    },

    /// A sensor reading was NaN or infinite, which has no JSON encoding.
    #[error("sensor value must be a finite number")]
    NonFiniteValue,

    /// The request body could not be decoded.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// A variant-specific operation was invoked on the wrong variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot {operation} on a {actual} device, expected a {expected}")]
pub struct TypeMismatchError {
    pub operation: &'static str,
    pub expected: DeviceType,
    pub actual: DeviceType,
}

/// A lookup by identifier found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} `{id}` not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

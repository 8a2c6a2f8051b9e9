//! # smarthome-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define the **driven/outbound port** adapters must implement:
//!   - `DeviceStore`: replace-by-key upsert, find-all, find-by-key over
//!     canonical device documents
//! - Define the **driving/inbound** use-case struct:
//!   - `DeviceService`: the persistence gateway: save, list, get, room
//!     queries, sensor readings and relay commands
//! - Translate between stored documents and the domain model without knowing
//!   *how* persistence works
//!
//! ## Dependency rule
//! Depends on `smarthome-domain` only.
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod ports;
pub mod services;

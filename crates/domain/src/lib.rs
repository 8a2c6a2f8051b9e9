//! # smarthome-domain
//!
//! Pure domain model for the smarthome device registry.
//!
//! ## Responsibilities
//! - Foundational types: device identifiers, error conventions, timestamps
//! - Define **Devices** as a sum of two variants: sensors (numeric readings)
//!   and relays (on/off loads)
//! - Define the canonical flat **record** every device serializes to
//! - Define the in-process **Registry** with room-based queries
//! - Contain all invariant enforcement (variant field table, type checks)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod device;
pub mod registry;

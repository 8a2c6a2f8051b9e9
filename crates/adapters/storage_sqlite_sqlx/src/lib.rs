//! # smarthome-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the `DeviceStore` port defined in `smarthome-app::ports::storage`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Store each device as a JSON document keyed by `device_id`
//!
//! ## Dependency rule
//! Depends on `smarthome-app` (for port traits) and `smarthome-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod device_store;
pub mod error;
pub mod pool;

pub use device_store::SqliteDeviceStore;
pub use pool::Database;

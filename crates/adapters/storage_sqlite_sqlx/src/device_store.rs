//! `SQLite` implementation of [`DeviceStore`].
//!
//! Each device is one row holding the canonical record as a JSON document,
//! with `device_id` as primary key.

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use smarthome_app::ports::DeviceStore;
use smarthome_domain::device::DeviceRecord;
use smarthome_domain::error::SmartHomeError;
use smarthome_domain::id::DeviceId;

use crate::error::StorageError;

/// Wrapper for converting database rows into a [`DeviceRecord`].
struct Wrapper(DeviceRecord);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<DeviceRecord> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let document: String = row.try_get("document")?;
        let record: DeviceRecord =
            serde_json::from_str(&document).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        Ok(Self(record))
    }
}

const UPSERT: &str = "INSERT INTO devices (device_id, document) VALUES (?, ?) \
     ON CONFLICT(device_id) DO UPDATE SET document = excluded.document";
const SELECT_BY_ID: &str = "SELECT document FROM devices WHERE device_id = ?";
const SELECT_ALL: &str = "SELECT document FROM devices ORDER BY rowid";

/// `SQLite`-backed device document store.
pub struct SqliteDeviceStore {
    pool: SqlitePool,
}

impl SqliteDeviceStore {
    /// Create a new store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl DeviceStore for SqliteDeviceStore {
    fn replace(
        &self,
        record: DeviceRecord,
    ) -> impl Future<Output = Result<(), SmartHomeError>> + Send {
        let pool = self.pool.clone();
        async move {
            let document = serde_json::to_string(&record).map_err(StorageError::from)?;

            // Single statement: the primary key guarantees one row per id.
            sqlx::query(UPSERT)
                .bind(&record.device_id)
                .bind(document)
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(())
        }
    }

    fn find_all(&self) -> impl Future<Output = Result<Vec<DeviceRecord>, SmartHomeError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn find_by_id(
        &self,
        id: &DeviceId,
    ) -> impl Future<Output = Result<Option<DeviceRecord>, SmartHomeError>> + Send {
        let pool = self.pool.clone();
        let key = id.to_string();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
                .bind(key)
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::maybe(row))
        }
    }
}

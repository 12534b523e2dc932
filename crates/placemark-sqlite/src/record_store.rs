//! `RecordStore` over the `properties` table.

use crate::connection::SqliteHandle;
use async_trait::async_trait;
use placemark_core::error::CoreError;
use placemark_core::model::Spr;
use placemark_core::traits::RecordStore;

pub struct SqliteRecordStore {
    handle: SqliteHandle,
}

impl SqliteRecordStore {
    pub fn new(handle: SqliteHandle) -> Self {
        SqliteRecordStore { handle }
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn fetch_spr(&self, feature_id: i64, alt_label: &str) -> Result<Spr, CoreError> {
        let conn = self.handle.conn.lock().await;
        let body: String = conn
            .query_row(
                "SELECT body FROM properties WHERE feature_id = ?1 AND alt_label = ?2",
                rusqlite::params![feature_id, alt_label],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    CoreError::RecordNotFound(format!("{feature_id}:{alt_label}"))
                }
                other => CoreError::Persistence(format!("fetch_spr: {other}")),
            })?;

        let mut spr: Spr = serde_json::from_str(&body)?;
        spr.alt_label = alt_label.to_string();
        Ok(spr)
    }
}

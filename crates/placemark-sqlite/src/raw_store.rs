//! `RawStore` over the `geojson` table. Reads only the canonical
//! (`alt_label = ""`) record; alt-geometry raw bytes are not addressable
//! through this surface. See `DESIGN.md`'s Open Question decision for why.

use crate::connection::SqliteHandle;
use async_trait::async_trait;
use placemark_core::error::CoreError;
use placemark_core::traits::RawStore;

pub struct SqliteRawStore {
    handle: SqliteHandle,
}

impl SqliteRawStore {
    pub fn new(handle: SqliteHandle) -> Self {
        SqliteRawStore { handle }
    }
}

#[async_trait]
impl RawStore for SqliteRawStore {
    async fn read(&self, feature_id: i64) -> Result<Vec<u8>, CoreError> {
        let conn = self.handle.conn.lock().await;
        conn.query_row(
            "SELECT body FROM geojson WHERE feature_id = ?1",
            [feature_id],
            |row| row.get(0),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                CoreError::RecordNotFound(feature_id.to_string())
            }
            other => CoreError::Persistence(format!("read_raw: {other}")),
        })
    }
}

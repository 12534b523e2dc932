//! Atomic multi-table ingest: writes the bbox index, the properties
//! (attribute-row) table and the raw-bytes table inside a single
//! transaction, rolling back on any failure. A single writer lock
//! (the shared connection mutex) serializes concurrent ingests and
//! removes; queries hold the same mutex only for the duration of a single
//! statement, so they interleave rather than wait out a whole ingest.

use crate::connection::SqliteHandle;
use async_trait::async_trait;
use geo::BoundingRect;
use placemark_core::error::CoreError;
use placemark_core::geom_codec;
use placemark_core::model::{GeometryShape, Spr};
use placemark_core::traits::Ingest;
use serde::{Deserialize, Serialize};

/// One geometry variant to be indexed alongside a feature: either the
/// canonical geometry (`alt_label == ""`) or a named alternate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AltGeometryPayload {
    pub alt_label: String,
    pub geometry_bytes: Vec<u8>,
}

/// Wire format accepted by `index_feature`: the flat attribute row plus
/// every geometry variant to index, plus the raw bytes to persist
/// verbatim for `read_raw`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturePayload {
    pub spr: Spr,
    pub geometry_bytes: Vec<u8>,
    #[serde(default)]
    pub alt_geometries: Vec<AltGeometryPayload>,
    pub raw_bytes: Vec<u8>,
}

pub struct SqliteIngest {
    handle: SqliteHandle,
}

impl SqliteIngest {
    pub fn new(handle: SqliteHandle) -> Self {
        SqliteIngest { handle }
    }

    /// Decodes `bytes` as a `FeaturePayload` and indexes it. On any
    /// failure, nothing is written: the whole feature either lands in all
    /// three tables or none of them.
    pub async fn index_feature(&self, bytes: &[u8], index_alt: bool) -> Result<(), CoreError> {
        let payload: FeaturePayload = serde_json::from_slice(bytes)?;
        self.index_payload(&payload, index_alt).await
    }

    async fn index_payload(&self, payload: &FeaturePayload, index_alt: bool) -> Result<(), CoreError> {
        let feature_id = payload.spr.feature_id;
        let (min_x, min_y, max_x, max_y) = geometry_bounds(&payload.geometry_bytes)?;

        let mut conn = self.handle.conn.lock().await;
        let tx = conn
            .transaction()
            .map_err(|e| CoreError::Ingest(format!("begin transaction: {e}")))?;

        tx.execute("DELETE FROM bbox_index WHERE feature_id = ?1", [feature_id])
            .map_err(|e| CoreError::Ingest(format!("clear bbox rows: {e}")))?;
        tx.execute("DELETE FROM properties WHERE feature_id = ?1", [feature_id])
            .map_err(|e| CoreError::Ingest(format!("clear properties rows: {e}")))?;
        tx.execute("DELETE FROM geojson WHERE feature_id = ?1", [feature_id])
            .map_err(|e| CoreError::Ingest(format!("clear geojson row: {e}")))?;

        tx.execute(
            "INSERT INTO bbox_index (feature_id, is_alt, alt_label, polygon_bytes, min_x, min_y, max_x, max_y)
             VALUES (?1, 0, '', ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![feature_id, payload.geometry_bytes, min_x, min_y, max_x, max_y],
        )
        .map_err(|e| CoreError::Ingest(format!("insert canonical bbox row: {e}")))?;

        let body = serde_json::to_string(&payload.spr)?;
        tx.execute(
            "INSERT OR REPLACE INTO properties (feature_id, body, is_alt, alt_label, last_modified)
             VALUES (?1, ?2, 0, '', ?3)",
            rusqlite::params![feature_id, body, payload.spr.last_modified],
        )
        .map_err(|e| CoreError::Ingest(format!("insert canonical properties row: {e}")))?;

        tx.execute(
            "INSERT INTO geojson (feature_id, body, last_modified) VALUES (?1, ?2, ?3)",
            rusqlite::params![feature_id, payload.raw_bytes, payload.spr.last_modified],
        )
        .map_err(|e| CoreError::Ingest(format!("insert raw bytes row: {e}")))?;

        if index_alt {
            for alt in &payload.alt_geometries {
                let (amin_x, amin_y, amax_x, amax_y) = geometry_bounds(&alt.geometry_bytes)?;
                tx.execute(
                    "INSERT INTO bbox_index (feature_id, is_alt, alt_label, polygon_bytes, min_x, min_y, max_x, max_y)
                     VALUES (?1, 1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    rusqlite::params![feature_id, alt.alt_label, alt.geometry_bytes, amin_x, amin_y, amax_x, amax_y],
                )
                .map_err(|e| CoreError::Ingest(format!("insert alt bbox row: {e}")))?;

                let mut alt_spr = payload.spr.clone();
                alt_spr.alt_label = alt.alt_label.clone();
                let alt_body = serde_json::to_string(&alt_spr)?;
                tx.execute(
                    "INSERT OR REPLACE INTO properties (feature_id, body, is_alt, alt_label, last_modified)
                     VALUES (?1, ?2, 1, ?3, ?4)",
                    rusqlite::params![feature_id, alt_body, alt.alt_label, payload.spr.last_modified],
                )
                .map_err(|e| CoreError::Ingest(format!("insert alt properties row: {e}")))?;
            }
        }

        tx.commit().map_err(|e| CoreError::Ingest(format!("commit transaction: {e}")))?;
        tracing::debug!(feature_id, "indexed feature");
        Ok(())
    }

    /// Deletes every row for `feature_id` across all three tables inside
    /// one transaction.
    pub async fn remove_feature(&self, feature_id: i64) -> Result<(), CoreError> {
        let mut conn = self.handle.conn.lock().await;
        let tx = conn
            .transaction()
            .map_err(|e| CoreError::Ingest(format!("begin transaction: {e}")))?;

        tx.execute("DELETE FROM bbox_index WHERE feature_id = ?1", [feature_id])
            .map_err(|e| CoreError::Ingest(format!("delete bbox rows: {e}")))?;
        tx.execute("DELETE FROM properties WHERE feature_id = ?1", [feature_id])
            .map_err(|e| CoreError::Ingest(format!("delete properties rows: {e}")))?;
        tx.execute("DELETE FROM geojson WHERE feature_id = ?1", [feature_id])
            .map_err(|e| CoreError::Ingest(format!("delete geojson row: {e}")))?;

        tx.commit().map_err(|e| CoreError::Ingest(format!("commit transaction: {e}")))?;
        tracing::debug!(feature_id, "removed feature");
        Ok(())
    }

    /// Low-level single-row insert used directly by tests that only care
    /// about bbox-index behavior, bypassing the full payload shape.
    #[cfg(test)]
    pub async fn index_raw_row(
        &self,
        feature_id: i64,
        alt_label: &str,
        wkt: &str,
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    ) -> Result<(), CoreError> {
        let conn = self.handle.conn.lock().await;
        conn.execute(
            "INSERT INTO bbox_index (feature_id, is_alt, alt_label, polygon_bytes, min_x, min_y, max_x, max_y)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![feature_id, !alt_label.is_empty(), alt_label, wkt.as_bytes(), min_x, min_y, max_x, max_y],
        )
        .map_err(|e| CoreError::Persistence(format!("test row insert: {e}")))?;
        Ok(())
    }
}

/// Exposes the inherent ingest methods through the engine-facing contract
/// so a `QueryFacade` can hold this behind `Arc<dyn Ingest>` without
/// depending on the concrete SQLite backend.
#[async_trait]
impl Ingest for SqliteIngest {
    async fn index_feature(&self, bytes: &[u8], index_alt: bool) -> Result<(), CoreError> {
        SqliteIngest::index_feature(self, bytes, index_alt).await
    }

    async fn remove_feature(&self, feature_id: i64) -> Result<(), CoreError> {
        SqliteIngest::remove_feature(self, feature_id).await
    }
}

fn geometry_bounds(bytes: &[u8]) -> Result<(f64, f64, f64, f64), CoreError> {
    let shape = geom_codec::decode(bytes)?;
    let rect = match &shape {
        GeometryShape::Polygon(p) => p.bounding_rect(),
        GeometryShape::MultiPolygon(mp) => mp.bounding_rect(),
    }
    .ok_or_else(|| CoreError::BadGeometry("geometry has no bounding rect".into()))?;
    Ok((rect.min().x, rect.min().y, rect.max().x, rect.max().y))
}

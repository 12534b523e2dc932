//! `BboxIndex` over the `bbox_index` table, using an AND-only overlap
//! predicate. An early revision of the system this is built from used OR
//! here and over-matched; only AND is correct.

use crate::connection::SqliteHandle;
use async_trait::async_trait;
use placemark_core::error::CoreError;
use placemark_core::model::IndexRow;
use placemark_core::traits::BboxIndex;

pub struct SqliteBboxIndex {
    handle: SqliteHandle,
}

impl SqliteBboxIndex {
    pub fn new(handle: SqliteHandle) -> Self {
        SqliteBboxIndex { handle }
    }
}

#[async_trait]
impl BboxIndex for SqliteBboxIndex {
    async fn range(
        &self,
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    ) -> Result<Vec<IndexRow>, CoreError> {
        let conn = self.handle.conn.lock().await;
        let mut stmt = conn
            .prepare(
                "SELECT row_id, feature_id, is_alt, alt_label, polygon_bytes, min_x, min_y, max_x, max_y
                 FROM bbox_index
                 WHERE min_x <= ?1 AND max_x >= ?2 AND min_y <= ?3 AND max_y >= ?4",
            )
            .map_err(|e| CoreError::Persistence(format!("prepare range query: {e}")))?;

        let rows = stmt
            .query_map([max_x, min_x, max_y, min_y], |row| {
                Ok(IndexRow {
                    row_id: row.get(0)?,
                    feature_id: row.get(1)?,
                    is_alt: row.get(2)?,
                    alt_label: row.get(3)?,
                    polygon_bytes: row.get(4)?,
                    min_x: row.get(5)?,
                    min_y: row.get(6)?,
                    max_x: row.get(7)?,
                    max_y: row.get(8)?,
                })
            })
            .map_err(|e| CoreError::Persistence(format!("range query: {e}")))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CoreError::Persistence(format!("range row decode: {e}")))?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::SqliteIngest;

    fn wkt_square(x0: f64, y0: f64, x1: f64, y1: f64) -> String {
        format!("POLYGON(({x0} {y0}, {x0} {y1}, {x1} {y1}, {x1} {y0}, {x0} {y0}))")
    }

    #[tokio::test]
    async fn range_only_returns_and_overlaps() {
        let handle = SqliteHandle::open(":memory:").unwrap();
        let ingest = SqliteIngest::new(handle.clone());
        ingest
            .index_raw_row(1, "", &wkt_square(0.0, 0.0, 10.0, 10.0), 0.0, 0.0, 10.0, 10.0)
            .await
            .unwrap();

        let index = SqliteBboxIndex::new(handle);
        let hits = index.range(5.0, 5.0, 15.0, 15.0).await.unwrap();
        assert_eq!(hits.len(), 1);

        // x-overlap only, no y-overlap: must not be returned.
        let misses = index.range(5.0, 100.0, 15.0, 200.0).await.unwrap();
        assert_eq!(misses.len(), 0);
    }
}

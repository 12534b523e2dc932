//! Table DDL for the three collaborator tables: the bbox index, the
//! attribute-row (SPR) table, and the raw-geojson bytes table.

use placemark_core::error::CoreError;
use rusqlite::Connection;

pub const BBOX_TABLE: &str = "bbox_index";
pub const PROPERTIES_TABLE: &str = "properties";
pub const GEOJSON_TABLE: &str = "geojson";

pub fn create_tables(conn: &Connection) -> Result<(), CoreError> {
    conn.execute_batch(&format!(
        "
        CREATE TABLE IF NOT EXISTS {BBOX_TABLE} (
            row_id INTEGER PRIMARY KEY AUTOINCREMENT,
            feature_id INTEGER NOT NULL,
            is_alt BOOLEAN NOT NULL DEFAULT 0,
            alt_label TEXT NOT NULL DEFAULT '',
            polygon_bytes BLOB NOT NULL,
            min_x REAL NOT NULL,
            min_y REAL NOT NULL,
            max_x REAL NOT NULL,
            max_y REAL NOT NULL
        );
        CREATE INDEX IF NOT EXISTS bbox_index_by_feature ON {BBOX_TABLE} (feature_id);
        CREATE INDEX IF NOT EXISTS bbox_index_by_bounds ON {BBOX_TABLE} (min_x, max_x, min_y, max_y);

        CREATE TABLE IF NOT EXISTS {PROPERTIES_TABLE} (
            feature_id INTEGER NOT NULL,
            body TEXT NOT NULL,
            is_alt BOOLEAN NOT NULL DEFAULT 0,
            alt_label TEXT NOT NULL DEFAULT '',
            last_modified INTEGER NOT NULL
        );
        CREATE UNIQUE INDEX IF NOT EXISTS properties_by_id ON {PROPERTIES_TABLE} (feature_id, alt_label);
        CREATE INDEX IF NOT EXISTS properties_by_alt ON {PROPERTIES_TABLE} (alt_label);
        CREATE INDEX IF NOT EXISTS properties_by_lastmod ON {PROPERTIES_TABLE} (last_modified);

        CREATE TABLE IF NOT EXISTS {GEOJSON_TABLE} (
            feature_id INTEGER PRIMARY KEY,
            body BLOB NOT NULL,
            last_modified INTEGER NOT NULL
        );
        "
    ))
    .map_err(|e| CoreError::Persistence(format!("failed to create schema: {e}")))
}

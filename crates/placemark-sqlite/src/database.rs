//! Ties the SQLite collaborator implementations together into one handle
//! and registers the `"sqlite"` scheme in the core's registry.

use crate::bbox_index::SqliteBboxIndex;
use crate::connection::SqliteHandle;
use crate::ingest::SqliteIngest;
use crate::raw_store::SqliteRawStore;
use crate::record_store::SqliteRecordStore;
use placemark_core::config::DatabaseConfig;
use placemark_core::error::CoreError;
use std::sync::Arc;

/// A fully-wired SQLite-backed database: bbox index, record store, raw
/// store and ingest path sharing one connection.
pub struct SqliteDatabase {
    pub bbox_index: Arc<SqliteBboxIndex>,
    pub record_store: Arc<SqliteRecordStore>,
    pub raw_store: Arc<SqliteRawStore>,
    pub ingest: Arc<SqliteIngest>,
    pub config: DatabaseConfig,
}

impl SqliteDatabase {
    pub fn open(config: DatabaseConfig) -> Result<Self, CoreError> {
        let handle = SqliteHandle::open(&config.dsn)?;
        Ok(SqliteDatabase {
            bbox_index: Arc::new(SqliteBboxIndex::new(handle.clone())),
            record_store: Arc::new(SqliteRecordStore::new(handle.clone())),
            raw_store: Arc::new(SqliteRawStore::new(handle.clone())),
            ingest: Arc::new(SqliteIngest::new(handle)),
            config,
        })
    }
}

/// Registers the `"sqlite"` scheme so `placemark_core::registry::construct`
/// can build a `SqliteDatabase` from a connection string.
pub fn register() {
    placemark_core::registry::register_scheme(
        "sqlite",
        Box::new(|config: &DatabaseConfig| {
            let db = SqliteDatabase::open(config.clone())?;
            Ok(Box::new(db) as Box<dyn std::any::Any + Send + Sync>)
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_schema() {
        let config = DatabaseConfig::parse("sqlite://?dsn=:memory:").unwrap();
        let db = SqliteDatabase::open(config).unwrap();
        assert_eq!(db.config.dsn, ":memory:");
    }

    #[test]
    fn register_makes_scheme_constructible() {
        register();
        assert!(placemark_core::registry::is_registered("sqlite"));
        let config = DatabaseConfig::parse("sqlite://?dsn=:memory:").unwrap();
        assert!(placemark_core::registry::construct(&config).is_ok());
    }
}

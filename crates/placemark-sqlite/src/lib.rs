//! SQLite-backed implementation of the `BboxIndex`, `RecordStore`,
//! `RawStore` and `Ingest` contracts `placemark-core` defines. `Ingest`
//! keeps the bbox-index, properties and raw-bytes tables in sync inside a
//! single transaction.

pub mod bbox_index;
pub mod connection;
pub mod database;
pub mod ingest;
pub mod raw_store;
pub mod record_store;
pub mod schema;

pub mod prelude {
    pub use crate::bbox_index::SqliteBboxIndex;
    pub use crate::connection::SqliteHandle;
    pub use crate::database::{register, SqliteDatabase};
    pub use crate::ingest::{AltGeometryPayload, FeaturePayload, SqliteIngest};
    pub use crate::raw_store::SqliteRawStore;
    pub use crate::record_store::SqliteRecordStore;
}

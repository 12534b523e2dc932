//! Concurrent candidate inflation, de-duplication, filtering and the
//! public query facade for the placemark spatial index engine.
//!
//! ```no_run
//! use placemark_core::config::DatabaseConfig;
//! use placemark_sqlite::database::SqliteDatabase;
//! use placemark_query::facade::QueryFacade;
//!
//! # async fn run() -> Result<(), placemark_core::error::CoreError> {
//! let config = DatabaseConfig::parse("sqlite://?dsn=/var/data/places.db")?;
//! let db = SqliteDatabase::open(config.clone())?;
//! let facade = QueryFacade::new(
//!     db.bbox_index.clone(),
//!     db.record_store.clone(),
//!     db.raw_store.clone(),
//!     db.ingest.clone(),
//!     &config,
//! );
//! let results = facade.point_in_polygon(-122.3837, 37.6169, vec![]).await?;
//! # Ok(())
//! # }
//! ```

pub mod candidate_iter;
pub mod cancellation;
pub mod facade;
pub mod intersects_executor;
pub mod pip_executor;

pub mod prelude {
    pub use crate::cancellation::Cancellation;
    pub use crate::facade::QueryFacade;
    pub use crate::intersects_executor::QueryGeometry;
}

//! Data model, geometry codec, attribute filter and result cache for the
//! placemark spatial index engine.
//!
//! This crate has no opinion about where features live; it defines the
//! `BboxIndex` / `RecordStore` / `RawStore` contracts a storage backend
//! must satisfy and the pure logic (filtering, geometry decoding, caching)
//! that sits on top of them. `placemark-sqlite` supplies one such backend;
//! `placemark-query` composes everything into the query engine.
//!
//! ```no_run
//! use placemark_core::config::DatabaseConfig;
//!
//! let config = DatabaseConfig::parse("sqlite://?dsn=/var/data/places.db&cache_ttl=300")?;
//! # Ok::<(), placemark_core::error::CoreError>(())
//! ```

pub mod bbox;
pub mod cache;
pub mod config;
pub mod edtf_lite;
pub mod error;
pub mod filter;
pub mod geom_codec;
pub mod model;
pub mod registry;
pub mod traits;

pub mod prelude {
    pub use crate::bbox::{BoundingBox, POINT_EPSILON};
    pub use crate::cache::SprCache;
    pub use crate::config::DatabaseConfig;
    pub use crate::error::{CoreError, Result};
    pub use crate::filter::{Filter, GeometryScope};
    pub use crate::model::{AltGeometry, CandidateRef, ExistentialFlag, Feature, GeometryShape, IndexRow, Spr};
    pub use crate::traits::{BboxIndex, Ingest, RawStore, RecordStore};
}

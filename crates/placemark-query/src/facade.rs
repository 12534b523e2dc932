//! `QueryFacade`: the public surface composing candidate iteration, the
//! executors, the cache and cancellation into the engine's API.

use crate::cancellation::Cancellation;
use crate::intersects_executor::{self, IntersectsQuery, QueryGeometry};
use crate::pip_executor::{self, PipQuery};
use placemark_core::bbox::{BoundingBox, POINT_EPSILON};
use placemark_core::cache::SprCache;
use placemark_core::config::DatabaseConfig;
use placemark_core::error::CoreError;
use placemark_core::filter::Filter;
use placemark_core::model::{CandidateRef, Spr};
use placemark_core::traits::{BboxIndex, Ingest, RawStore, RecordStore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Composes the spatial engine's collaborators into the public query
/// surface. Owns the database handle (the four collaborator traits), the
/// cache-sweep task, and the root cancellation every facade-managed query
/// is a child of. `disconnect` stops the sweep, cancels every in-flight
/// facade-managed query, and closes the facade's handle to its
/// collaborators — further calls return `CoreError::Cancelled` rather than
/// reaching the database.
pub struct QueryFacade {
    index: Arc<dyn BboxIndex>,
    record_store: Arc<dyn RecordStore>,
    raw_store: Arc<dyn RawStore>,
    ingest: Arc<dyn Ingest>,
    cache: Arc<SprCache>,
    concurrency: usize,
    channel_capacity: usize,
    root_cancellation: Cancellation,
    closed: AtomicBool,
}

impl QueryFacade {
    pub fn new(
        index: Arc<dyn BboxIndex>,
        record_store: Arc<dyn RecordStore>,
        raw_store: Arc<dyn RawStore>,
        ingest: Arc<dyn Ingest>,
        config: &DatabaseConfig,
    ) -> Self {
        let cache = SprCache::new(config.cache_ttl);
        cache.spawn_sweep(config.cache_sweep);
        QueryFacade {
            index,
            record_store,
            raw_store,
            ingest,
            cache: Arc::new(cache),
            concurrency: pip_executor::default_concurrency(),
            channel_capacity: 8,
            root_cancellation: Cancellation::new(),
            closed: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> Result<(), CoreError> {
        if self.closed.load(Ordering::Acquire) {
            Err(CoreError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn pip_query(&self, filters: Vec<Filter>) -> PipQuery {
        PipQuery {
            index: Arc::clone(&self.index),
            record_store: Arc::clone(&self.record_store),
            cache: Arc::clone(&self.cache),
            filters,
            concurrency: self.concurrency,
            channel_capacity: self.channel_capacity,
        }
    }

    fn intersects_query(&self, filters: Vec<Filter>) -> IntersectsQuery {
        IntersectsQuery {
            index: Arc::clone(&self.index),
            record_store: Arc::clone(&self.record_store),
            cache: Arc::clone(&self.cache),
            filters,
            concurrency: self.concurrency,
            channel_capacity: self.channel_capacity,
        }
    }

    /// Accumulates every PIP result into a `Vec`.
    pub async fn point_in_polygon(
        &self,
        x: f64,
        y: f64,
        filters: Vec<Filter>,
    ) -> Result<Vec<Spr>, CoreError> {
        self.ensure_open()?;
        let rx = self.point_in_polygon_iter(x, y, filters, self.root_cancellation.child());
        pip_executor::collect(rx).await
    }

    /// Yields PIP results as they're produced.
    pub fn point_in_polygon_iter(
        &self,
        x: f64,
        y: f64,
        filters: Vec<Filter>,
        cancellation: Cancellation,
    ) -> mpsc::Receiver<Result<Spr, CoreError>> {
        pip_executor::run(self.pip_query(filters), x, y, cancellation)
    }

    /// Accumulates every intersects result into a `Vec`.
    pub async fn intersects(
        &self,
        geometry: QueryGeometry,
        filters: Vec<Filter>,
    ) -> Result<Vec<Spr>, CoreError> {
        self.ensure_open()?;
        let rx = self.intersects_iter(geometry, filters, self.root_cancellation.child());
        intersects_executor::collect(rx).await
    }

    /// Yields intersects results as they're produced.
    pub fn intersects_iter(
        &self,
        geometry: QueryGeometry,
        filters: Vec<Filter>,
        cancellation: Cancellation,
    ) -> mpsc::Receiver<Result<Spr, CoreError>> {
        intersects_executor::run(self.intersects_query(filters), geometry, cancellation)
    }

    /// Bbox-only results, no containment test. Useful for debugging.
    pub async fn candidates(&self, x: f64, y: f64) -> Result<Vec<CandidateRef>, CoreError> {
        use futures::StreamExt;
        self.ensure_open()?;
        let query_box = BoundingBox::from_point(x, y).pad(POINT_EPSILON);
        let stream = crate::candidate_iter::candidates(Arc::clone(&self.index), query_box);
        stream.collect::<Vec<_>>().await.into_iter().collect()
    }

    /// Pass-through to the raw-bytes collaborator.
    pub async fn read_raw(&self, feature_id: i64) -> Result<Vec<u8>, CoreError> {
        self.ensure_open()?;
        self.raw_store.read(feature_id).await
    }

    /// Indexes a feature payload via the ingest collaborator.
    pub async fn index_feature(&self, bytes: &[u8], index_alt: bool) -> Result<(), CoreError> {
        self.ensure_open()?;
        self.ingest.index_feature(bytes, index_alt).await
    }

    /// Removes a feature (and every geometry variant) via the ingest
    /// collaborator.
    pub async fn remove_feature(&self, feature_id: i64) -> Result<(), CoreError> {
        self.ensure_open()?;
        self.ingest.remove_feature(feature_id).await
    }

    /// Stops the cache sweep, cancels every query spawned through the
    /// accumulating `point_in_polygon`/`intersects`/`candidates` methods
    /// (they're all children of `root_cancellation`), and closes the
    /// facade's handle: every method above returns `CoreError::Cancelled`
    /// after this call rather than reaching the collaborators again.
    pub fn disconnect(&self) {
        self.cache.stop_sweep();
        self.root_cancellation.cancel();
        self.closed.store(true, Ordering::Release);
    }

    /// Default TTL-sweep interval used when constructing from a raw
    /// `Duration` rather than a `DatabaseConfig` (test/helper entry point).
    pub fn with_cache_ttl(
        index: Arc<dyn BboxIndex>,
        record_store: Arc<dyn RecordStore>,
        raw_store: Arc<dyn RawStore>,
        ingest: Arc<dyn Ingest>,
        ttl: Duration,
        sweep: Duration,
    ) -> Self {
        let cache = SprCache::new(ttl);
        cache.spawn_sweep(sweep);
        QueryFacade {
            index,
            record_store,
            raw_store,
            ingest,
            cache: Arc::new(cache),
            concurrency: pip_executor::default_concurrency(),
            channel_capacity: 8,
            root_cancellation: Cancellation::new(),
            closed: AtomicBool::new(false),
        }
    }
}

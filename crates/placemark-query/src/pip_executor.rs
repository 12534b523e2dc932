//! Point-in-polygon execution: drives candidate iteration, dispatches
//! concurrent per-candidate containment checks, de-duplicates, filters,
//! and emits results on a bounded channel.

use crate::cancellation::Cancellation;
use crate::candidate_iter::{self, point_query_box};
use dashmap::DashSet;
use futures::StreamExt;
use geo::Contains;
use geo_types::Point;
use placemark_core::cache::{cache_key, SprCache};
use placemark_core::error::CoreError;
use placemark_core::filter::Filter;
use placemark_core::geom_codec;
use placemark_core::model::{CandidateRef, GeometryShape, Spr};
use placemark_core::traits::{BboxIndex, RecordStore};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Default bound on concurrent per-candidate tasks in flight.
pub fn default_concurrency() -> usize {
    (num_cpus() * 4).max(4)
}

fn num_cpus() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
}

/// Shared state for one PIP query: the `seen` de-dup set, concurrency
/// bound and cancellation handle.
pub struct PipQuery {
    pub index: Arc<dyn BboxIndex>,
    pub record_store: Arc<dyn RecordStore>,
    pub cache: Arc<SprCache>,
    pub filters: Vec<Filter>,
    pub concurrency: usize,
    pub channel_capacity: usize,
}

/// Runs a PIP query at `(x, y)`, returning a receiver of results. The
/// sender side is dropped once every candidate task completes or
/// cancellation fires, which closes the channel for the caller.
pub fn run(
    query: PipQuery,
    x: f64,
    y: f64,
    cancellation: Cancellation,
) -> mpsc::Receiver<Result<Spr, CoreError>> {
    let (tx, rx) = mpsc::channel(query.channel_capacity.max(1));
    tokio::spawn(async move {
        let seen: Arc<DashSet<String>> = Arc::new(DashSet::new());
        let query_box = point_query_box(x, y);
        let point = Point::new(x, y);

        let candidate_stream = candidate_iter::candidates(Arc::clone(&query.index), query_box);

        let tx = tx;
        let concurrency = query.concurrency;
        let cancellation2 = cancellation.clone();

        candidate_stream
            .for_each_concurrent(Some(concurrency), move |candidate| {
                let seen = Arc::clone(&seen);
                let cache = Arc::clone(&query.cache);
                let record_store = Arc::clone(&query.record_store);
                let filters = query.filters.clone();
                let tx = tx.clone();
                let cancellation = cancellation2.clone();
                let point = point;

                async move {
                    if cancellation.is_cancelled() {
                        return;
                    }
                    match candidate {
                        Ok(candidate) => {
                            process_pip_candidate(candidate, point, &seen, &cache, record_store.as_ref(), &filters, &tx, &cancellation)
                                .await;
                        }
                        Err(e) => {
                            let _ = tx.send(Err(e)).await;
                        }
                    }
                }
            })
            .await;
    });
    rx
}

#[allow(clippy::too_many_arguments)]
async fn process_pip_candidate(
    candidate: CandidateRef,
    point: Point<f64>,
    seen: &DashSet<String>,
    cache: &SprCache,
    record_store: &dyn RecordStore,
    filters: &[Filter],
    tx: &mpsc::Sender<Result<Spr, CoreError>>,
    cancellation: &Cancellation,
) {
    // (a) row-level de-dup happens implicitly: each row is visited once by
    // construction of the candidate stream.

    if cancellation.is_cancelled() {
        return;
    }

    // (b) decode geometry; propagate decode errors.
    let shape = match geom_codec::decode(&candidate.polygon_bytes) {
        Ok(shape) => shape,
        Err(e) => {
            let _ = tx.send(Err(e)).await;
            return;
        }
    };

    if cancellation.is_cancelled() {
        return;
    }

    // (c) planar containment test.
    let contains = match &shape {
        GeometryShape::Polygon(p) => p.contains(&point),
        GeometryShape::MultiPolygon(mp) => mp.contains(&point),
    };
    if !contains {
        return;
    }

    // (d) double-checked de-dup: read before any write-lock acquisition.
    let variant_key = candidate.variant_key();
    if seen.contains(&variant_key) {
        return;
    }
    if !seen.insert(variant_key.clone()) {
        // Another task won the race after our containment test.
        return;
    }

    if cancellation.is_cancelled() {
        return;
    }

    // (e) SPR retrieval via cache, falling through to the record store.
    let key = cache_key(candidate.feature_id, &candidate.alt_label);
    let spr = match cache.get(&key) {
        Some(spr) => spr,
        None => match record_store.fetch_spr(candidate.feature_id, &candidate.alt_label).await {
            Ok(spr) => {
                cache.put(key, spr.clone());
                spr
            }
            Err(e) => {
                if e.is_non_terminal() {
                    tracing::warn!(feature_id = candidate.feature_id, "spr lookup missed candidate");
                    return;
                }
                let _ = tx.send(Err(e)).await;
                return;
            }
        },
    };

    // (f) apply every filter in order; first rejection drops silently.
    for filter in filters {
        if let Err(e) = filter.evaluate(&spr) {
            debug_assert!(e.is_non_terminal());
            return;
        }
    }

    if cancellation.is_cancelled() {
        return;
    }

    // (g) emit.
    let _ = tx.send(Ok(spr)).await;
}

/// Collects a PIP query's receiver into a `Vec`, for the accumulating form
/// of the facade's API.
pub async fn collect(mut rx: mpsc::Receiver<Result<Spr, CoreError>>) -> Result<Vec<Spr>, CoreError> {
    let mut out = Vec::new();
    while let Some(item) = rx.recv().await {
        out.push(item?);
    }
    Ok(out)
}

//! Polygon-vs-geometry intersection execution. Same shape as
//! `pip_executor`: candidate iteration over the query geometry's bounding
//! box, concurrent per-candidate dispatch, de-duplication, filtering.

use crate::cancellation::Cancellation;
use crate::candidate_iter;
use dashmap::DashSet;
use futures::StreamExt;
use geo::{BoundingRect, Intersects};
use placemark_core::bbox::BoundingBox;
use placemark_core::cache::{cache_key, SprCache};
use placemark_core::error::CoreError;
use placemark_core::filter::Filter;
use placemark_core::geom_codec;
use placemark_core::model::{CandidateRef, GeometryShape, Spr};
use placemark_core::traits::{BboxIndex, RecordStore};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Any simple geometry this executor can test intersection against.
#[derive(Debug, Clone)]
pub enum QueryGeometry {
    Point(geo_types::Point<f64>),
    LineString(geo_types::LineString<f64>),
    Polygon(geo_types::Polygon<f64>),
    MultiPolygon(geo_types::MultiPolygon<f64>),
}

impl QueryGeometry {
    fn bounding_box(&self) -> Result<BoundingBox, CoreError> {
        let rect = match self {
            QueryGeometry::Point(p) => {
                return Ok(BoundingBox::from_point(p.x(), p.y()).pad(placemark_core::bbox::POINT_EPSILON))
            }
            QueryGeometry::LineString(l) => l.bounding_rect(),
            QueryGeometry::Polygon(p) => p.bounding_rect(),
            QueryGeometry::MultiPolygon(mp) => mp.bounding_rect(),
        }
        .ok_or_else(|| CoreError::BadGeometry("query geometry has no bounding rect".into()))?;
        Ok(BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }

    fn as_geometry(&self) -> geo_types::Geometry<f64> {
        match self {
            QueryGeometry::Point(g) => geo_types::Geometry::Point(*g),
            QueryGeometry::LineString(g) => geo_types::Geometry::LineString(g.clone()),
            QueryGeometry::Polygon(g) => geo_types::Geometry::Polygon(g.clone()),
            QueryGeometry::MultiPolygon(g) => geo_types::Geometry::MultiPolygon(g.clone()),
        }
    }

    fn intersects_shape(&self, shape: &GeometryShape) -> bool {
        let other = match shape {
            GeometryShape::Polygon(p) => geo_types::Geometry::Polygon(p.clone()),
            GeometryShape::MultiPolygon(p) => geo_types::Geometry::MultiPolygon(p.clone()),
        };
        self.as_geometry().intersects(&other)
    }
}

pub struct IntersectsQuery {
    pub index: Arc<dyn BboxIndex>,
    pub record_store: Arc<dyn RecordStore>,
    pub cache: Arc<SprCache>,
    pub filters: Vec<Filter>,
    pub concurrency: usize,
    pub channel_capacity: usize,
}

pub fn run(
    query: IntersectsQuery,
    geometry: QueryGeometry,
    cancellation: Cancellation,
) -> mpsc::Receiver<Result<Spr, CoreError>> {
    let (tx, rx) = mpsc::channel(query.channel_capacity.max(1));
    tokio::spawn(async move {
        let query_box = match geometry.bounding_box() {
            Ok(b) => b,
            Err(e) => {
                let _ = tx.send(Err(e)).await;
                return;
            }
        };

        let seen: Arc<DashSet<String>> = Arc::new(DashSet::new());
        let candidate_stream = candidate_iter::candidates(Arc::clone(&query.index), query_box);

        let tx = tx;
        let concurrency = query.concurrency;
        let cancellation2 = cancellation.clone();
        let geometry = Arc::new(geometry);

        candidate_stream
            .for_each_concurrent(Some(concurrency), move |candidate| {
                let seen = Arc::clone(&seen);
                let cache = Arc::clone(&query.cache);
                let record_store = Arc::clone(&query.record_store);
                let filters = query.filters.clone();
                let tx = tx.clone();
                let cancellation = cancellation2.clone();
                let geometry = Arc::clone(&geometry);

                async move {
                    if cancellation.is_cancelled() {
                        return;
                    }
                    match candidate {
                        Ok(candidate) => {
                            process_intersects_candidate(
                                candidate,
                                &geometry,
                                &seen,
                                &cache,
                                record_store.as_ref(),
                                &filters,
                                &tx,
                                &cancellation,
                            )
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
async fn process_intersects_candidate(
    candidate: CandidateRef,
    geometry: &QueryGeometry,
    seen: &DashSet<String>,
    cache: &SprCache,
    record_store: &dyn RecordStore,
    filters: &[Filter],
    tx: &mpsc::Sender<Result<Spr, CoreError>>,
    cancellation: &Cancellation,
) {
    if cancellation.is_cancelled() {
        return;
    }

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

    if !geometry.intersects_shape(&shape) {
        return;
    }

    let variant_key = candidate.variant_key();
    if seen.contains(&variant_key) {
        return;
    }
    if !seen.insert(variant_key.clone()) {
        return;
    }

    if cancellation.is_cancelled() {
        return;
    }

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

    for filter in filters {
        if let Err(e) = filter.evaluate(&spr) {
            debug_assert!(e.is_non_terminal());
            return;
        }
    }

    if cancellation.is_cancelled() {
        return;
    }

    let _ = tx.send(Ok(spr)).await;
}

pub async fn collect(mut rx: mpsc::Receiver<Result<Spr, CoreError>>) -> Result<Vec<Spr>, CoreError> {
    let mut out = Vec::new();
    while let Some(item) = rx.recv().await {
        out.push(item?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use geo_types::{Coord, LineString, Polygon};
    use placemark_core::model::{ExistentialFlag, IndexRow};

    struct FakeIndex {
        rows: Vec<IndexRow>,
    }

    #[async_trait]
    impl BboxIndex for FakeIndex {
        async fn range(&self, _: f64, _: f64, _: f64, _: f64) -> Result<Vec<IndexRow>, CoreError> {
            Ok(self.rows.clone())
        }
    }

    struct FakeRecordStore;

    #[async_trait]
    impl RecordStore for FakeRecordStore {
        async fn fetch_spr(&self, feature_id: i64, alt_label: &str) -> Result<Spr, CoreError> {
            Ok(Spr {
                feature_id,
                placetype: "locality".into(),
                parent_id: None,
                name: "Test".into(),
                country: None,
                latitude: 0.0,
                longitude: 0.0,
                min_latitude: 0.0,
                min_longitude: 0.0,
                max_latitude: 0.0,
                max_longitude: 0.0,
                is_current: ExistentialFlag::True,
                is_ceased: ExistentialFlag::False,
                is_deprecated: ExistentialFlag::False,
                is_superseded: ExistentialFlag::False,
                is_superseding: ExistentialFlag::False,
                superseded_by: vec![],
                superseding: vec![],
                last_modified: 0,
                inception: None,
                cessation: None,
                alt_label: alt_label.to_string(),
            })
        }
    }

    fn square_row(feature_id: i64, row_id: i64) -> IndexRow {
        IndexRow {
            row_id,
            feature_id,
            is_alt: false,
            alt_label: String::new(),
            polygon_bytes: b"POLYGON((0 0, 0 10, 10 10, 10 0, 0 0))".to_vec(),
            min_x: 0.0,
            min_y: 0.0,
            max_x: 10.0,
            max_y: 10.0,
        }
    }

    fn overlapping_query_polygon() -> Polygon<f64> {
        Polygon::new(
            LineString::new(vec![
                Coord { x: 5.0, y: 5.0 },
                Coord { x: 5.0, y: 15.0 },
                Coord { x: 15.0, y: 15.0 },
                Coord { x: 15.0, y: 5.0 },
                Coord { x: 5.0, y: 5.0 },
            ]),
            vec![],
        )
    }

    #[tokio::test]
    async fn overlapping_polygon_is_returned() {
        let index: Arc<dyn BboxIndex> = Arc::new(FakeIndex { rows: vec![square_row(1, 1)] });
        let query = IntersectsQuery {
            index,
            record_store: Arc::new(FakeRecordStore),
            cache: Arc::new(SprCache::new(std::time::Duration::from_secs(60))),
            filters: vec![],
            concurrency: 4,
            channel_capacity: 8,
        };
        let rx = run(query, QueryGeometry::Polygon(overlapping_query_polygon()), Cancellation::new());
        let results = collect(rx).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn disjoint_polygon_is_dropped() {
        let index: Arc<dyn BboxIndex> = Arc::new(FakeIndex { rows: vec![square_row(1, 1)] });
        let far_away = Polygon::new(
            LineString::new(vec![
                Coord { x: 1000.0, y: 1000.0 },
                Coord { x: 1000.0, y: 1010.0 },
                Coord { x: 1010.0, y: 1010.0 },
                Coord { x: 1010.0, y: 1000.0 },
                Coord { x: 1000.0, y: 1000.0 },
            ]),
            vec![],
        );
        let query = IntersectsQuery {
            index,
            record_store: Arc::new(FakeRecordStore),
            cache: Arc::new(SprCache::new(std::time::Duration::from_secs(60))),
            filters: vec![],
            concurrency: 4,
            channel_capacity: 8,
        };
        let rx = run(query, QueryGeometry::Polygon(far_away), Cancellation::new());
        let results = collect(rx).await.unwrap();
        assert!(results.is_empty());
    }
}

//! Property-based tests for the invariants a point-in-polygon query must
//! hold regardless of which candidates a `BboxIndex` happens to return:
//! bbox/exact soundness, completeness, at-most-once, filter composition,
//! and cache transparency.

use async_trait::async_trait;
use placemark_core::bbox::BoundingBox;
use placemark_core::cache::SprCache;
use placemark_core::error::CoreError;
use placemark_core::filter::Filter;
use placemark_core::geom_codec;
use placemark_core::model::{ExistentialFlag, GeometryShape, IndexRow, Spr};
use placemark_core::traits::{BboxIndex, RecordStore};
use placemark_query::cancellation::Cancellation;
use placemark_query::pip_executor::{self, PipQuery};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// A lower-left right triangle inscribed in `[x0,y0]-[x1,y1]`: its bounding
/// rect is the full rectangle, but it only covers half of it, so a query
/// point can land inside the bbox while missing the polygon. Exercises the
/// "bbox hit, polygon miss" boundary behavior alongside soundness.
fn triangle_wkt(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<u8> {
    format!("POLYGON(({x0} {y0}, {x1} {y0}, {x0} {y1}, {x0} {y0}))").into_bytes()
}

/// Returns every row it was built with, independent of the query
/// rectangle — this crate's own bbox-soundness-of-the-SQL-query guarantee
/// lives in `placemark-sqlite`; this fake isolates the executor's own
/// containment, de-dup, and filter behavior from that concern.
struct FakeIndex {
    rows: Vec<IndexRow>,
}

#[async_trait]
impl BboxIndex for FakeIndex {
    async fn range(&self, _: f64, _: f64, _: f64, _: f64) -> Result<Vec<IndexRow>, CoreError> {
        Ok(self.rows.clone())
    }
}

/// Assigns `placetype = "even"` / `"odd"` by feature_id parity, so tests
/// can build filters that split the candidate set in a predictable way.
struct FakeRecordStore;

#[async_trait]
impl RecordStore for FakeRecordStore {
    async fn fetch_spr(&self, feature_id: i64, alt_label: &str) -> Result<Spr, CoreError> {
        Ok(Spr {
            feature_id,
            placetype: if feature_id % 2 == 0 { "even".into() } else { "odd".into() },
            parent_id: None,
            name: format!("feature-{feature_id}"),
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

/// One candidate rectangle: `feature_id` is `1 + index`, the WKT triangle
/// spans `(x0,y0)-(x1,y1)`, and `duplicate` controls whether the same
/// variant is also indexed under a second `row_id` (simulating the source
/// occasionally emitting the same geometry twice).
#[derive(Debug, Clone)]
struct Candidate {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    duplicate: bool,
}

fn candidate_strategy() -> impl Strategy<Value = Candidate> {
    (-20.0..20.0f64, -20.0..20.0f64, 1.0..10.0f64, 1.0..10.0f64, any::<bool>()).prop_map(
        |(x0, y0, w, h, duplicate)| Candidate { x0, y0, x1: x0 + w, y1: y0 + h, duplicate },
    )
}

fn candidates_and_point_strategy() -> impl Strategy<Value = (Vec<Candidate>, f64, f64)> {
    (prop::collection::vec(candidate_strategy(), 1..8), -25.0..25.0f64, -25.0..25.0f64)
}

fn build_rows(candidates: &[Candidate]) -> Vec<IndexRow> {
    let mut rows = Vec::new();
    for (i, c) in candidates.iter().enumerate() {
        let feature_id = (i + 1) as i64;
        let bytes = triangle_wkt(c.x0, c.y0, c.x1, c.y1);
        let mut row_id = feature_id * 10;
        let mut push_row = |row_id: i64| {
            rows.push(IndexRow {
                row_id,
                feature_id,
                is_alt: false,
                alt_label: String::new(),
                polygon_bytes: bytes.clone(),
                min_x: c.x0,
                min_y: c.y0,
                max_x: c.x1,
                max_y: c.y1,
            });
        };
        push_row(row_id);
        if c.duplicate {
            row_id += 1;
            push_row(row_id);
        }
    }
    rows
}

/// Ground truth: decode the same bytes the index would hand the executor
/// and ask `geo` directly whether the triangle contains the point.
fn triangle_contains(c: &Candidate, px: f64, py: f64) -> bool {
    use geo::Contains;
    use geo_types::Point;
    let shape = geom_codec::decode(&triangle_wkt(c.x0, c.y0, c.x1, c.y1)).unwrap();
    match shape {
        GeometryShape::Polygon(p) => p.contains(&Point::new(px, py)),
        GeometryShape::MultiPolygon(mp) => mp.contains(&Point::new(px, py)),
    }
}

async fn run_pip(rows: Vec<IndexRow>, px: f64, py: f64, filters: Vec<Filter>, cache: Arc<SprCache>) -> Vec<Spr> {
    let query = PipQuery {
        index: Arc::new(FakeIndex { rows }),
        record_store: Arc::new(FakeRecordStore),
        cache,
        filters,
        concurrency: 4,
        channel_capacity: 8,
    };
    let rx = pip_executor::run(query, px, py, Cancellation::new());
    pip_executor::collect(rx).await.unwrap()
}

fn fresh_cache() -> Arc<SprCache> {
    Arc::new(SprCache::new(Duration::from_secs(60)))
}

proptest! {
    /// Bbox soundness + exact soundness (§8): every emitted feature's
    /// stored bbox contains the query point, and its polygon planar-
    /// contains the point exactly — never just the bbox.
    #[test]
    fn bbox_and_exact_soundness(input in candidates_and_point_strategy()) {
        let (candidates, px, py) = input;
        let rows = build_rows(&candidates);
        let results = tokio::runtime::Runtime::new().unwrap().block_on(
            run_pip(rows, px, py, vec![], fresh_cache())
        );
        for spr in &results {
            let c = &candidates[(spr.feature_id - 1) as usize];
            prop_assert!(BoundingBox::new(c.x0, c.y0, c.x1, c.y1).contains_point(px, py));
            prop_assert!(triangle_contains(c, px, py));
        }
    }

    /// Completeness (§8): every candidate whose polygon truly contains the
    /// point appears in the result, with no filters to exclude it.
    #[test]
    fn completeness(input in candidates_and_point_strategy()) {
        let (candidates, px, py) = input;
        let rows = build_rows(&candidates);
        let expected: HashSet<i64> = candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| triangle_contains(c, px, py))
            .map(|(i, _)| (i + 1) as i64)
            .collect();

        let results = tokio::runtime::Runtime::new().unwrap().block_on(
            run_pip(rows, px, py, vec![], fresh_cache())
        );
        let got: HashSet<i64> = results.iter().map(|s| s.feature_id).collect();
        prop_assert_eq!(got, expected);
    }

    /// At-most-once (§8): even when the index hands back a duplicate row
    /// for the same `(feature_id, alt_label)` variant, it is emitted once.
    #[test]
    fn at_most_once(input in candidates_and_point_strategy()) {
        let (candidates, px, py) = input;
        let rows = build_rows(&candidates);
        let results = tokio::runtime::Runtime::new().unwrap().block_on(
            run_pip(rows, px, py, vec![], fresh_cache())
        );
        let mut seen = HashSet::new();
        for spr in &results {
            prop_assert!(seen.insert((spr.feature_id, spr.alt_label.clone())));
        }
    }

    /// Filter composition (§8): `pip(p, f ∧ g) = pip(p, f) ∩ pip(p, g)`.
    /// `f` keeps only even feature ids, `g` only odd — composed they
    /// reject everything, matching the intersection of the two.
    #[test]
    fn filter_composition(input in candidates_and_point_strategy()) {
        let (candidates, px, py) = input;
        let rows = build_rows(&candidates);
        let rt = tokio::runtime::Runtime::new().unwrap();

        let mut f = Filter::new();
        f.placetypes.insert("even".into());
        let mut g = Filter::new();
        g.placetypes.insert("odd".into());

        let only_f: HashSet<i64> =
            rt.block_on(run_pip(rows.clone(), px, py, vec![f.clone()], fresh_cache()))
                .into_iter().map(|s| s.feature_id).collect();
        let only_g: HashSet<i64> =
            rt.block_on(run_pip(rows.clone(), px, py, vec![g.clone()], fresh_cache()))
                .into_iter().map(|s| s.feature_id).collect();
        let both: HashSet<i64> =
            rt.block_on(run_pip(rows, px, py, vec![f, g], fresh_cache()))
                .into_iter().map(|s| s.feature_id).collect();

        let intersection: HashSet<i64> = only_f.intersection(&only_g).copied().collect();
        prop_assert_eq!(both, intersection);
    }

    /// Cache transparency (§8): the same query against a cold cache and
    /// against a cache already warmed by an identical prior run returns
    /// the same result set.
    #[test]
    fn cache_transparency(input in candidates_and_point_strategy()) {
        let (candidates, px, py) = input;
        let rows = build_rows(&candidates);
        let rt = tokio::runtime::Runtime::new().unwrap();
        let cache = fresh_cache();

        let cold: HashSet<i64> = rt
            .block_on(run_pip(rows.clone(), px, py, vec![], Arc::clone(&cache)))
            .into_iter()
            .map(|s| s.feature_id)
            .collect();
        // Second run reuses `cache`, now warm for every feature_id seen above.
        let warm: HashSet<i64> = rt
            .block_on(run_pip(rows, px, py, vec![], cache))
            .into_iter()
            .map(|s| s.feature_id)
            .collect();
        prop_assert_eq!(cold, warm);
    }
}

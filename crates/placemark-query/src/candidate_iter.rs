//! Lazy candidate retrieval. Wraps a `BboxIndex` range query behind a
//! `Stream` so the executors never have to materialize every candidate
//! before dispatching work.

use async_stream::stream;
use futures::Stream;
use placemark_core::bbox::{BoundingBox, POINT_EPSILON};
use placemark_core::error::CoreError;
use placemark_core::model::CandidateRef;
use placemark_core::traits::BboxIndex;
use std::sync::Arc;

/// Builds the query rectangle for a point query: the point padded by
/// `POINT_EPSILON` in every direction, which accommodates the
/// vertex-on-point edge case.
pub fn point_query_box(x: f64, y: f64) -> BoundingBox {
    BoundingBox::from_point(x, y).pad(POINT_EPSILON)
}

/// Returns a lazy stream of candidates whose bbox overlaps `query_box`.
/// Candidates are emitted in whatever order the underlying index returns
/// its rows; no ordering guarantee is made.
pub fn candidates(
    index: Arc<dyn BboxIndex>,
    query_box: BoundingBox,
) -> impl Stream<Item = Result<CandidateRef, CoreError>> {
    stream! {
        let rows = index
            .range(query_box.min_x, query_box.min_y, query_box.max_x, query_box.max_y)
            .await;
        match rows {
            Ok(rows) => {
                for row in rows {
                    yield Ok(CandidateRef::from(row));
                }
            }
            Err(e) => yield Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::StreamExt;
    use placemark_core::model::IndexRow;

    struct FakeIndex {
        rows: Vec<IndexRow>,
    }

    #[async_trait]
    impl BboxIndex for FakeIndex {
        async fn range(
            &self,
            _min_x: f64,
            _min_y: f64,
            _max_x: f64,
            _max_y: f64,
        ) -> Result<Vec<IndexRow>, CoreError> {
            Ok(self.rows.clone())
        }
    }

    #[tokio::test]
    async fn yields_all_rows_lazily() {
        let rows = vec![IndexRow {
            row_id: 1,
            feature_id: 101,
            is_alt: false,
            alt_label: String::new(),
            polygon_bytes: vec![],
            min_x: 0.0,
            min_y: 0.0,
            max_x: 1.0,
            max_y: 1.0,
        }];
        let index: Arc<dyn BboxIndex> = Arc::new(FakeIndex { rows });
        let box_ = point_query_box(0.5, 0.5);
        let results: Vec<_> = candidates(index, box_).collect().await;
        assert_eq!(results.len(), 1);
        assert!(results[0].is_ok());
    }
}

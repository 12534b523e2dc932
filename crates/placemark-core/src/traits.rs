//! Contracts the query engine consumes from its storage collaborators. The
//! core never depends on a concrete backend — only on these traits.

use crate::error::CoreError;
use crate::model::{IndexRow, Spr};
use async_trait::async_trait;

/// Range query over the bounding-box index. False positives (rows whose
/// box doesn't actually overlap the query rectangle, once epsilon and
/// float slop are accounted for) are acceptable; false negatives are not.
#[async_trait]
pub trait BboxIndex: Send + Sync {
    async fn range(
        &self,
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    ) -> Result<Vec<IndexRow>, CoreError>;
}

/// Attribute-row lookup keyed by `(feature_id, alt_label)`. `alt_label =
/// ""` retrieves the canonical row.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn fetch_spr(&self, feature_id: i64, alt_label: &str) -> Result<Spr, CoreError>;
}

/// Raw record bytes lookup, used only by `QueryFacade::read_raw`.
#[async_trait]
pub trait RawStore: Send + Sync {
    async fn read(&self, feature_id: i64) -> Result<Vec<u8>, CoreError>;
}

/// Write-path contract: atomic multi-table ingest and removal. The engine
/// layer depends only on this trait, never on a concrete backend, so
/// `QueryFacade` can expose `index_feature`/`remove_feature` without
/// depending on `placemark-sqlite`.
#[async_trait]
pub trait Ingest: Send + Sync {
    async fn index_feature(&self, bytes: &[u8], index_alt: bool) -> Result<(), CoreError>;
    async fn remove_feature(&self, feature_id: i64) -> Result<(), CoreError>;
}

//! Core data model: features, alternate geometries, index rows, candidate
//! references and the flat attribute projection (SPR) used for query
//! output.

use geo_types::{MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};

/// A tri-valued lifecycle attribute. The raw on-disk representation is a
/// signed integer (`-1`, `0`, `1`); this type gives it a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExistentialFlag {
    Unknown,
    False,
    True,
}

impl ExistentialFlag {
    /// The raw integer encoding used by the on-disk attribute row.
    pub fn as_i64(self) -> i64 {
        match self {
            ExistentialFlag::Unknown => -1,
            ExistentialFlag::False => 0,
            ExistentialFlag::True => 1,
        }
    }
}

impl TryFrom<i64> for ExistentialFlag {
    type Error = crate::error::CoreError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(ExistentialFlag::Unknown),
            0 => Ok(ExistentialFlag::False),
            1 => Ok(ExistentialFlag::True),
            other => Err(crate::error::CoreError::Persistence(format!(
                "invalid existential flag value: {other}"
            ))),
        }
    }
}

/// Either a single polygon or a multipolygon, as decoded by `GeomCodec`.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryShape {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

/// A geographic place record. Corresponds 1:1 to a row the ingest path
/// writes across the bbox index, the attribute-row table, and (optionally)
/// the raw-bytes table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub feature_id: i64,
    pub placetype: String,
    pub parent_id: Option<i64>,
    pub name: String,
    pub country: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub min_latitude: f64,
    pub min_longitude: f64,
    pub max_latitude: f64,
    pub max_longitude: f64,
    pub is_current: ExistentialFlag,
    pub is_ceased: ExistentialFlag,
    pub is_deprecated: ExistentialFlag,
    pub is_superseded: ExistentialFlag,
    pub is_superseding: ExistentialFlag,
    pub superseded_by: Vec<i64>,
    pub superseding: Vec<i64>,
    pub last_modified: i64,
    pub inception: Option<String>,
    pub cessation: Option<String>,
    #[serde(skip)]
    pub geometry: Option<GeometryShape>,
    pub alt_geometries: Vec<AltGeometry>,
}

/// An alternate geometry variant of a feature, keyed by a non-empty label.
/// The pair `(feature_id, alt_label = "")` denotes the canonical geometry
/// and is represented directly on `Feature`, not as an `AltGeometry`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AltGeometry {
    pub feature_id: i64,
    pub alt_label: String,
    pub min_latitude: f64,
    pub min_longitude: f64,
    pub max_latitude: f64,
    pub max_longitude: f64,
    #[serde(skip)]
    pub geometry: Option<GeometryShape>,
}

/// A row in the bounding-box index, as returned by `BboxIndex::range`.
#[derive(Debug, Clone)]
pub struct IndexRow {
    pub row_id: i64,
    pub feature_id: i64,
    pub is_alt: bool,
    pub alt_label: String,
    pub polygon_bytes: Vec<u8>,
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl IndexRow {
    /// `feature_id + "#" + row_id` — unique per index row.
    pub fn composite_id(&self) -> String {
        format!("{}#{}", self.feature_id, self.row_id)
    }

    /// `feature_id + ":" + alt_label` — unique per geometry variant, used
    /// for de-duplication within a single query.
    pub fn variant_key(&self) -> String {
        format!("{}:{}", self.feature_id, self.alt_label)
    }
}

/// Transient candidate handed from the `CandidateIterator` to an executor.
#[derive(Debug, Clone)]
pub struct CandidateRef {
    pub composite_id: String,
    pub feature_id: i64,
    pub alt_label: String,
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub polygon_bytes: Vec<u8>,
}

impl From<IndexRow> for CandidateRef {
    fn from(row: IndexRow) -> Self {
        CandidateRef {
            composite_id: row.composite_id(),
            feature_id: row.feature_id,
            alt_label: row.alt_label,
            min_x: row.min_x,
            min_y: row.min_y,
            max_x: row.max_x,
            max_y: row.max_y,
            polygon_bytes: row.polygon_bytes,
        }
    }
}

impl CandidateRef {
    pub fn variant_key(&self) -> String {
        format!("{}:{}", self.feature_id, self.alt_label)
    }
}

/// Flat attribute projection used in query output. Contains all `Feature`
/// fields except the polygon and the raw record bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spr {
    pub feature_id: i64,
    pub placetype: String,
    pub parent_id: Option<i64>,
    pub name: String,
    pub country: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub min_latitude: f64,
    pub min_longitude: f64,
    pub max_latitude: f64,
    pub max_longitude: f64,
    pub is_current: ExistentialFlag,
    pub is_ceased: ExistentialFlag,
    pub is_deprecated: ExistentialFlag,
    pub is_superseded: ExistentialFlag,
    pub is_superseding: ExistentialFlag,
    pub superseded_by: Vec<i64>,
    pub superseding: Vec<i64>,
    pub last_modified: i64,
    pub inception: Option<String>,
    pub cessation: Option<String>,
    pub alt_label: String,
}

impl From<&Feature> for Spr {
    fn from(f: &Feature) -> Self {
        Spr {
            feature_id: f.feature_id,
            placetype: f.placetype.clone(),
            parent_id: f.parent_id,
            name: f.name.clone(),
            country: f.country.clone(),
            latitude: f.latitude,
            longitude: f.longitude,
            min_latitude: f.min_latitude,
            min_longitude: f.min_longitude,
            max_latitude: f.max_latitude,
            max_longitude: f.max_longitude,
            is_current: f.is_current,
            is_ceased: f.is_ceased,
            is_deprecated: f.is_deprecated,
            is_superseded: f.is_superseded,
            is_superseding: f.is_superseding,
            superseded_by: f.superseded_by.clone(),
            superseding: f.superseding.clone(),
            last_modified: f.last_modified,
            inception: f.inception.clone(),
            cessation: f.cessation.clone(),
            alt_label: String::new(),
        }
    }
}

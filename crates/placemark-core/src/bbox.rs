//! Axis-aligned bounding box and the bbox-overlap predicate the candidate
//! iterator and the SQLite backend both rely on.
//!
//! The overlap test is AND-only across all four per-axis conditions. An
//! earlier revision of the system this is built from used OR here, which
//! silently over-matched; see the corrected form in `intersects`.

use geo_types::{Coord, Rect};

/// Default point-query padding (§4.4): a point is expanded into a
/// degenerate-but-nonzero rectangle of this half-width before being used
/// as a range query.
pub const POINT_EPSILON: f64 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        debug_assert!(min_x <= max_x && min_y <= max_y, "inverted bounding box");
        BoundingBox { min_x, min_y, max_x, max_y }
    }

    /// Builds a degenerate box around a single point, ready for `pad`.
    pub fn from_point(x: f64, y: f64) -> Self {
        BoundingBox { min_x: x, min_y: y, max_x: x, max_y: y }
    }

    /// Expands the box by `epsilon` in every direction. Building the query
    /// rectangle through `from_point(..).pad(..)` rather than constructing
    /// min/max fields by hand avoids the coordinate-order transposition bug
    /// an early version of the source had.
    pub fn pad(self, epsilon: f64) -> Self {
        BoundingBox {
            min_x: self.min_x - epsilon,
            min_y: self.min_y - epsilon,
            max_x: self.max_x + epsilon,
            max_y: self.max_y + epsilon,
        }
    }

    /// AND-only overlap test. A box intersects `other` iff all four
    /// per-axis overlap conditions hold. Do not weaken this to OR.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn to_rect(self) -> Rect<f64> {
        Rect::new(
            Coord { x: self.min_x, y: self.min_y },
            Coord { x: self.max_x, y: self.max_y },
        )
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn box_strategy() -> impl Strategy<Value = BoundingBox> {
        (-1000.0..1000.0f64, -1000.0..1000.0f64, 0.0..200.0f64, 0.0..200.0f64).prop_map(
            |(x, y, w, h)| BoundingBox::new(x, y, x + w, y + h),
        )
    }

    proptest! {
        /// Overlap is symmetric regardless of argument order, which the
        /// AND-only definition guarantees but the buggy OR form would not
        /// necessarily preserve once padding is involved.
        #[test]
        fn intersects_is_symmetric(a in box_strategy(), b in box_strategy()) {
            prop_assert_eq!(a.intersects(&b), b.intersects(&a));
        }

        /// A padded point box always contains the point it was built from:
        /// this is the bbox half of "bbox soundness" (§8) — every point
        /// query's own rectangle contains the point it queries for.
        #[test]
        fn padded_point_box_contains_its_point(x in -1000.0..1000.0f64, y in -1000.0..1000.0f64) {
            let b = BoundingBox::from_point(x, y).pad(POINT_EPSILON);
            prop_assert!(b.contains_point(x, y));
        }

        /// A box intersects itself, and intersects any box built by padding
        /// itself outward — shrinking a box can only ever remove overlap,
        /// never add it.
        #[test]
        fn box_intersects_itself_and_its_own_padding(a in box_strategy(), eps in 0.0..50.0f64) {
            prop_assert!(a.intersects(&a));
            prop_assert!(a.intersects(&a.pad(eps)));
        }
    }
}

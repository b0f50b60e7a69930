//! Binary predicates between two series, resolved through a fixed dispatch
//! matrix over the closed `(ColumnShape, ColumnShape)` space.
//!
//! Every supported entry maps to a DE-9IM kernel; the matrix is data, not a
//! trait hierarchy, because the shape set is closed and small. A pair with no
//! entry fails with [`GeoUnionError::UnsupportedGeometryCombination`] before
//! any geometry is decoded.

use arrow_array::BooleanArray;

use crate::error::{GeoUnionError, Result};
use crate::meta::ColumnShape;
use crate::series::GeoSeries;

mod backend;

use backend::Kernel;

/// The binary predicates this crate can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Predicate {
    Equals,
    Covers,
    Intersects,
    Within,
    Overlaps,
    Crosses,
    Disjoint,
    ContainsProperly,
}

impl Predicate {
    fn name(self) -> &'static str {
        match self {
            Self::Equals => "geom_equals",
            Self::Covers => "covers",
            Self::Intersects => "intersects",
            Self::Within => "within",
            Self::Overlaps => "overlaps",
            Self::Crosses => "crosses",
            Self::Disjoint => "disjoint",
            Self::ContainsProperly => "contains_properly",
        }
    }
}

/// Outcome of a predicate that supports all-pairs evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateResult {
    /// One boolean per aligned row pair; absent rows are null.
    Rows(BooleanArray),
    /// Every satisfying `(left position, right position)` combination.
    Pairs(Vec<(usize, usize)>),
}

/// Resolve the kernel for a predicate over a shape pair.
///
/// The seven relate-backed predicates accept any pair of uniform shapes.
/// `ContainsProperly` additionally requires POLYGON on the left. MIXED never
/// resolves; callers must slice to a uniform subset first.
fn kernel_for(predicate: Predicate, left: ColumnShape, right: ColumnShape) -> Result<Kernel> {
    let unsupported = || GeoUnionError::UnsupportedGeometryCombination {
        predicate: predicate.name(),
        left,
        right,
    };

    if left == ColumnShape::Mixed || right == ColumnShape::Mixed {
        return Err(unsupported());
    }

    match predicate {
        Predicate::Equals => Ok(backend::equals),
        Predicate::Covers => Ok(backend::covers),
        Predicate::Intersects => Ok(backend::intersects),
        Predicate::Within => Ok(backend::within),
        Predicate::Overlaps => Ok(backend::overlaps),
        Predicate::Crosses => Ok(backend::crosses),
        Predicate::Disjoint => Ok(backend::disjoint),
        Predicate::ContainsProperly if left == ColumnShape::Polygon => {
            Ok(backend::contains_properly)
        }
        Predicate::ContainsProperly => Err(unsupported()),
    }
}

impl GeoSeries {
    fn relate_predicate(
        &self,
        other: &Self,
        align: bool,
        predicate: Predicate,
    ) -> Result<BooleanArray> {
        // Dispatch resolves on the shapes as called; alignment only inserts
        // absent rows and cannot widen a uniform shape.
        let kernel = kernel_for(predicate, self.shape(), other.shape())?;

        let (left, right) = if align {
            self.align(other)
        } else {
            (self.clone(), other.clone())
        };

        if left.len() != right.len() {
            return Err(GeoUnionError::IncompatibleConstruction(format!(
                "{} requires equal lengths, got {} and {}",
                predicate.name(),
                left.len(),
                right.len()
            )));
        }

        Ok(backend::relate_rows(&left.to_geo(), &right.to_geo(), kernel))
    }

    /// Whether each aligned pair of features is topologically equal.
    pub fn geom_equals(&self, other: &Self, align: bool) -> Result<BooleanArray> {
        self.relate_predicate(other, align, Predicate::Equals)
    }

    /// Whether each left feature covers its right counterpart: no point of
    /// the right geometry lies in the left exterior.
    pub fn covers(&self, other: &Self, align: bool) -> Result<BooleanArray> {
        self.relate_predicate(other, align, Predicate::Covers)
    }

    /// Whether each aligned pair of features shares at least one point.
    pub fn intersects(&self, other: &Self, align: bool) -> Result<BooleanArray> {
        self.relate_predicate(other, align, Predicate::Intersects)
    }

    /// Whether each left feature lies within its right counterpart.
    pub fn within(&self, other: &Self, align: bool) -> Result<BooleanArray> {
        self.relate_predicate(other, align, Predicate::Within)
    }

    /// Whether each aligned pair overlaps: same dimension, interiors
    /// intersect, neither contains the other.
    pub fn overlaps(&self, other: &Self, align: bool) -> Result<BooleanArray> {
        self.relate_predicate(other, align, Predicate::Overlaps)
    }

    /// Whether each aligned pair crosses: interiors intersect in a lower
    /// dimension than the inputs.
    pub fn crosses(&self, other: &Self, align: bool) -> Result<BooleanArray> {
        self.relate_predicate(other, align, Predicate::Crosses)
    }

    /// Whether each aligned pair shares no point at all.
    pub fn disjoint(&self, other: &Self, align: bool) -> Result<BooleanArray> {
        self.relate_predicate(other, align, Predicate::Disjoint)
    }

    /// Whether each polygon properly contains the paired feature: the right
    /// geometry intersects the interior but not the boundary of the polygon.
    ///
    /// With `allpairs` the row pairing is dropped and every satisfying
    /// `(left position, right position)` combination is returned instead;
    /// the two sides may then differ in length.
    ///
    /// # Errors
    ///
    /// - if the left shape is not POLYGON, or either shape is MIXED
    /// - if `allpairs` is false and the sides differ in length after
    ///   alignment
    pub fn contains_properly(
        &self,
        other: &Self,
        align: bool,
        allpairs: bool,
    ) -> Result<PredicateResult> {
        if !allpairs {
            let rows = self.relate_predicate(other, align, Predicate::ContainsProperly)?;
            return Ok(PredicateResult::Rows(rows));
        }

        let kernel = kernel_for(Predicate::ContainsProperly, self.shape(), other.shape())?;

        let (left, right) = if align {
            self.align(other)
        } else {
            (self.clone(), other.clone())
        };

        Ok(PredicateResult::Pairs(backend::relate_pairs(
            &left.to_geo(),
            &right.to_geo(),
            kernel,
        )))
    }
}

#[cfg(test)]
mod test {
    use arrow_array::Array;

    use super::*;
    use crate::series::GeoSeries;
    use crate::test;

    fn two_squares() -> GeoSeries {
        // Unit square at the origin and a unit square at (10, 10).
        GeoSeries::from_polygons_xy(
            vec![
                0., 0., 1., 0., 1., 1., 0., 1., 0., 0., //
                10., 10., 11., 10., 11., 11., 10., 11., 10., 10.,
            ],
            vec![0, 5, 10],
            vec![0, 1, 2],
            vec![0, 1, 2],
        )
        .unwrap()
    }

    #[test]
    fn contains_properly_allpairs_keeps_strict_interior_only() {
        let polygons = two_squares();
        // Interior of square 0, interior of square 1, on square 0's boundary.
        let points =
            GeoSeries::from_points_xy(vec![0.5, 0.5, 10.5, 10.5, 0.0, 0.5]).unwrap();

        let result = polygons.contains_properly(&points, false, true).unwrap();
        assert_eq!(result, PredicateResult::Pairs(vec![(0, 0), (1, 1)]));
    }

    #[test]
    fn contains_properly_rows_requires_equal_lengths() {
        let polygons = two_squares();
        let points = GeoSeries::from_points_xy(vec![0.5, 0.5]).unwrap();

        let err = polygons.contains_properly(&points, false, false).unwrap_err();
        assert!(matches!(err, GeoUnionError::IncompatibleConstruction(_)));
    }

    #[test]
    fn contains_properly_rejects_non_polygon_left() {
        let polygons = two_squares();
        let points = GeoSeries::from_points_xy(vec![0.5, 0.5, 10.5, 10.5]).unwrap();

        let err = points.contains_properly(&polygons, false, true).unwrap_err();
        assert!(matches!(
            err,
            GeoUnionError::UnsupportedGeometryCombination {
                predicate: "contains_properly",
                ..
            }
        ));
    }

    #[test]
    fn mixed_shape_never_dispatches() {
        let mixed = GeoSeries::new(test::mixed_column());
        let other = mixed.clone();

        let err = mixed.intersects(&other, false).unwrap_err();
        assert!(matches!(
            err,
            GeoUnionError::UnsupportedGeometryCombination { .. }
        ));
    }

    #[test]
    fn geom_equals_after_align_matches_by_label() {
        let left = GeoSeries::from_points_xy(vec![0., 0., 1., 1.]).unwrap();
        // Same geometries per label, stored in reversed row order.
        let right = GeoSeries::try_new(
            GeoSeries::from_points_xy(vec![1., 1., 0., 0.]).unwrap().column().clone(),
            vec![1, 0],
        )
        .unwrap();

        let result = left.geom_equals(&right, true).unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.value(0));
        assert!(result.value(1));
    }

    #[test]
    fn alignment_inserts_null_results_for_absent_rows() {
        let left = GeoSeries::from_points_xy(vec![0., 0., 1., 1.]).unwrap();
        let right = GeoSeries::try_new(
            GeoSeries::from_points_xy(vec![1., 1., 2., 2.]).unwrap().column().clone(),
            vec![1, 2],
        )
        .unwrap();

        let result = left.intersects(&right, true).unwrap();
        assert_eq!(result.len(), 3);
        // Label 0 exists only on the left, label 2 only on the right.
        assert!(result.is_null(0));
        assert!(result.value(1));
        assert!(result.is_null(2));
    }

    #[test]
    fn within_is_the_converse_of_covers() {
        let polygons = two_squares();
        let points = GeoSeries::from_points_xy(vec![0.5, 0.5, 10.5, 10.5]).unwrap();

        let within = points.within(&polygons, false).unwrap();
        let covers = polygons.covers(&points, false).unwrap();
        assert_eq!(within, covers);
        assert!(within.value(0));
        assert!(within.value(1));
    }

    #[test]
    fn disjoint_and_intersects_are_complementary() {
        let left = GeoSeries::from_points_xy(vec![0., 0., 5., 5.]).unwrap();
        let right = GeoSeries::from_points_xy(vec![0., 0., 6., 6.]).unwrap();

        let intersects = left.intersects(&right, false).unwrap();
        let disjoint = left.disjoint(&right, false).unwrap();
        for row in 0..2 {
            assert_ne!(intersects.value(row), disjoint.value(row));
        }
    }

    #[test]
    fn crosses_linestrings_meeting_at_a_point() {
        let left =
            GeoSeries::from_linestrings_xy(vec![0., 0., 2., 2.], vec![0, 2], vec![0, 1]).unwrap();
        let right =
            GeoSeries::from_linestrings_xy(vec![0., 2., 2., 0.], vec![0, 2], vec![0, 1]).unwrap();

        let result = left.crosses(&right, false).unwrap();
        assert!(result.value(0));
    }

    #[test]
    fn overlapping_squares_overlap() {
        let left = two_squares();
        // Shift both squares by half a unit so interiors overlap partially.
        let right = GeoSeries::from_polygons_xy(
            vec![
                0.5, 0.5, 1.5, 0.5, 1.5, 1.5, 0.5, 1.5, 0.5, 0.5, //
                10.5, 10.5, 11.5, 10.5, 11.5, 11.5, 10.5, 11.5, 10.5, 10.5,
            ],
            vec![0, 5, 10],
            vec![0, 1, 2],
            vec![0, 1, 2],
        )
        .unwrap();

        let result = left.overlaps(&right, false).unwrap();
        assert!(result.value(0));
        assert!(result.value(1));
    }
}

//! DE-9IM kernels over decoded geometry pairs, backed by [`geo::Relate`].

use arrow_array::BooleanArray;
use geo::coordinate_position::CoordPos;
use geo::dimensions::Dimensions;
use geo::relate::IntersectionMatrix;
use geo::Relate;

/// A predicate over a computed intersection matrix.
pub(crate) type Kernel = fn(IntersectionMatrix) -> bool;

pub(crate) fn equals(matrix: IntersectionMatrix) -> bool {
    matrix.is_equal_topo()
}

pub(crate) fn covers(matrix: IntersectionMatrix) -> bool {
    matrix.is_covers()
}

pub(crate) fn intersects(matrix: IntersectionMatrix) -> bool {
    matrix.is_intersects()
}

pub(crate) fn within(matrix: IntersectionMatrix) -> bool {
    matrix.is_within()
}

pub(crate) fn overlaps(matrix: IntersectionMatrix) -> bool {
    matrix.is_overlaps()
}

pub(crate) fn crosses(matrix: IntersectionMatrix) -> bool {
    matrix.is_crosses()
}

pub(crate) fn disjoint(matrix: IntersectionMatrix) -> bool {
    matrix.is_disjoint()
}

/// `T**FF*FF*`: the right geometry intersects the left interior and touches
/// neither the left boundary nor the left exterior.
pub(crate) fn contains_properly(matrix: IntersectionMatrix) -> bool {
    matrix.get(CoordPos::Inside, CoordPos::Inside) != Dimensions::Empty
        && matrix.get(CoordPos::OnBoundary, CoordPos::Inside) == Dimensions::Empty
        && matrix.get(CoordPos::OnBoundary, CoordPos::OnBoundary) == Dimensions::Empty
        && matrix.get(CoordPos::Outside, CoordPos::Inside) == Dimensions::Empty
        && matrix.get(CoordPos::Outside, CoordPos::OnBoundary) == Dimensions::Empty
}

/// Evaluate a kernel row by row over two decoded sides of equal length.
///
/// If either row is absent, the result is null.
pub(crate) fn relate_rows(
    left: &[Option<geo::Geometry>],
    right: &[Option<geo::Geometry>],
    kernel: Kernel,
) -> BooleanArray {
    let mut builder = BooleanArray::builder(left.len());

    for (maybe_left, maybe_right) in left.iter().zip(right) {
        match (maybe_left, maybe_right) {
            (Some(left_geom), Some(right_geom)) => {
                builder.append_value(kernel(left_geom.relate(right_geom)));
            }
            _ => {
                builder.append_null();
            }
        }
    }

    builder.finish()
}

/// Evaluate a kernel over the full cross product, collecting the satisfying
/// position pairs. Absent rows on either side never produce a pair.
pub(crate) fn relate_pairs(
    left: &[Option<geo::Geometry>],
    right: &[Option<geo::Geometry>],
    kernel: Kernel,
) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();

    for (left_pos, maybe_left) in left.iter().enumerate() {
        let Some(left_geom) = maybe_left else {
            continue;
        };
        for (right_pos, maybe_right) in right.iter().enumerate() {
            if let Some(right_geom) = maybe_right {
                if kernel(left_geom.relate(right_geom)) {
                    pairs.push((left_pos, right_pos));
                }
            }
        }
    }

    pairs
}

#[cfg(test)]
mod test {
    use arrow_array::Array;
    use geo::{point, polygon, Geometry};

    use super::*;

    fn unit_square() -> Geometry {
        polygon![(x: 0., y: 0.), (x: 1., y: 0.), (x: 1., y: 1.), (x: 0., y: 1.)].into()
    }

    #[test]
    fn contains_properly_excludes_boundary() {
        let square = unit_square();
        let interior: Geometry = point!(x: 0.5, y: 0.5).into();
        let boundary: Geometry = point!(x: 0.0, y: 0.5).into();

        assert!(contains_properly(square.relate(&interior)));
        assert!(!contains_properly(square.relate(&boundary)));
        // covers accepts the boundary point where contains_properly rejects it
        assert!(covers(square.relate(&boundary)));
    }

    #[test]
    fn relate_rows_is_null_where_a_side_is_absent() {
        let left = vec![Some(unit_square()), None];
        let right = vec![Some(point!(x: 0.5, y: 0.5).into()), Some(unit_square())];

        let result = relate_rows(&left, &right, intersects);
        assert!(result.value(0));
        assert!(result.is_null(1));
    }

    #[test]
    fn relate_pairs_skips_absent_rows() {
        let left = vec![Some(unit_square()), None];
        let right = vec![
            Some(point!(x: 0.5, y: 0.5).into()),
            Some(point!(x: 9.0, y: 9.0).into()),
        ];

        let pairs = relate_pairs(&left, &right, contains_properly);
        assert_eq!(pairs, vec![(0, 0)]);
    }
}

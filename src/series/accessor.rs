//! Typed accessors: per-family views that re-derive the subset of a typed
//! store actually referenced by the surviving rows of a series.
//!
//! A prior slice or alignment may have dropped or reordered rows, so each
//! accessor gathers the store elements whose row tag matches, in row order.
//! The gathered store's offsets are rebased: offset 0 means the first
//! surviving row of this type.

use crate::array::{LineStringArray, MultiPointArray, PointArray, PolygonArray};
use crate::meta::FeatureTag;
use crate::series::GeoSeries;

fn repeat_labels(labels: &[i64], counts: &[usize]) -> Vec<i64> {
    let mut out = Vec::with_capacity(counts.iter().sum());
    for (&label, &count) in labels.iter().zip(counts) {
        out.extend(std::iter::repeat(label).take(count));
    }
    out
}

fn split_interleaved(xy: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let x = xy.iter().step_by(2).copied().collect();
    let y = xy.iter().skip(1).step_by(2).copied().collect();
    (x, y)
}

macro_rules! common_accessor_methods {
    () => {
        /// The flat interleaved xy coordinates of the surviving rows.
        pub fn xy(&self) -> &[f64] {
            self.store.coords().values()
        }

        /// The x coordinates: every other element of the interleaved buffer.
        pub fn x(&self) -> Vec<f64> {
            split_interleaved(self.xy()).0
        }

        /// The y coordinates.
        pub fn y(&self) -> Vec<f64> {
            split_interleaved(self.xy()).1
        }

        /// For every leaf coordinate pair, the label of the owning row.
        ///
        /// The run lengths are derived from the family's innermost offset
        /// level; their sum always equals the number of leaf pairs.
        pub fn point_indices(&self) -> Vec<i64> {
            repeat_labels(&self.labels, &self.store.leaf_counts())
        }
    };
}

/// View over the rows of a series tagged POINT.
#[derive(Debug, Clone)]
pub struct PointsAccessor {
    store: PointArray,
    labels: Vec<i64>,
}

impl PointsAccessor {
    pub(crate) fn new(series: &GeoSeries) -> Self {
        let (store_indices, labels) = series.rows_with_tag(FeatureTag::Point);
        Self {
            store: series.column().points().take(&store_indices),
            labels,
        }
    }

    /// The re-derived store: one coordinate pair per surviving row.
    pub fn store(&self) -> &PointArray {
        &self.store
    }

    common_accessor_methods!();
}

/// View over the rows of a series tagged MULTIPOINT.
#[derive(Debug, Clone)]
pub struct MultiPointsAccessor {
    store: MultiPointArray,
    labels: Vec<i64>,
}

impl MultiPointsAccessor {
    pub(crate) fn new(series: &GeoSeries) -> Self {
        let (store_indices, labels) = series.rows_with_tag(FeatureTag::MultiPoint);
        Self {
            store: series.column().multipoints().take(&store_indices),
            labels,
        }
    }

    /// The re-derived store for the surviving rows.
    pub fn store(&self) -> &MultiPointArray {
        &self.store
    }

    /// Rebased geometry offsets: geometry → coordinate pair.
    pub fn geometry_offsets(&self) -> &[i32] {
        self.store.geom_offsets().as_ref()
    }

    common_accessor_methods!();
}

/// View over the rows of a series tagged LINESTRING.
#[derive(Debug, Clone)]
pub struct LineStringsAccessor {
    store: LineStringArray,
    labels: Vec<i64>,
}

impl LineStringsAccessor {
    pub(crate) fn new(series: &GeoSeries) -> Self {
        let (store_indices, labels) = series.rows_with_tag(FeatureTag::LineString);
        Self {
            store: series.column().linestrings().take(&store_indices),
            labels,
        }
    }

    /// The re-derived store for the surviving rows.
    pub fn store(&self) -> &LineStringArray {
        &self.store
    }

    /// Rebased geometry offsets: geometry → part.
    pub fn geometry_offsets(&self) -> &[i32] {
        self.store.geom_offsets().as_ref()
    }

    /// Rebased part offsets: part → coordinate pair.
    pub fn part_offsets(&self) -> &[i32] {
        self.store.part_offsets().as_ref()
    }

    common_accessor_methods!();
}

/// View over the rows of a series tagged POLYGON.
#[derive(Debug, Clone)]
pub struct PolygonsAccessor {
    store: PolygonArray,
    labels: Vec<i64>,
}

impl PolygonsAccessor {
    pub(crate) fn new(series: &GeoSeries) -> Self {
        let (store_indices, labels) = series.rows_with_tag(FeatureTag::Polygon);
        Self {
            store: series.column().polygons().take(&store_indices),
            labels,
        }
    }

    /// The re-derived store for the surviving rows.
    pub fn store(&self) -> &PolygonArray {
        &self.store
    }

    /// Rebased geometry offsets: geometry → part.
    pub fn geometry_offsets(&self) -> &[i32] {
        self.store.geom_offsets().as_ref()
    }

    /// Rebased part offsets: part → ring.
    pub fn part_offsets(&self) -> &[i32] {
        self.store.part_offsets().as_ref()
    }

    /// Rebased ring offsets: ring → coordinate pair.
    pub fn ring_offsets(&self) -> &[i32] {
        self.store.ring_offsets().as_ref()
    }

    common_accessor_methods!();
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::series::GeoSeries;
    use crate::test;

    #[test]
    fn xy_split() {
        let series = GeoSeries::from_points_xy(vec![-1., 0., 2., 3.]).unwrap();
        let points = series.points();
        assert_eq!(points.x(), vec![-1., 2.]);
        assert_eq!(points.y(), vec![0., 3.]);
        assert_relative_eq!(points.xy()[3], 3.0);
    }

    #[test]
    fn point_indices_identity_for_points() {
        let series = GeoSeries::from_points_xy(vec![0., 0., 1., 1., 2., 2.]).unwrap();
        assert_eq!(series.points().point_indices(), vec![0, 1, 2]);
    }

    #[test]
    fn multipoint_indices_repeat_by_run_length() {
        let series =
            GeoSeries::from_multipoints_xy(vec![0., 0., 1., 1., 2., 2., 3., 3.], vec![0, 3, 4])
                .unwrap();
        let mpoints = series.multipoints();
        assert_eq!(mpoints.geometry_offsets(), &[0, 3, 4]);
        assert_eq!(mpoints.point_indices(), vec![0, 0, 0, 1]);
    }

    #[test]
    fn linestring_indices_walk_parts() {
        // Row 0: one part of 3 points; row 1: two parts of 1 and 2 points.
        let series = GeoSeries::from_linestrings_xy(
            vec![0., 0., 1., 1., 2., 2., 3., 3., 4., 4., 5., 5.],
            vec![0, 3, 4, 6],
            vec![0, 1, 3],
        )
        .unwrap();
        let lines = series.linestrings();
        assert_eq!(lines.point_indices(), vec![0, 0, 0, 1, 1, 1]);
        let total: usize = lines.store().leaf_counts().iter().sum();
        assert_eq!(total, lines.xy().len() / 2);
    }

    #[test]
    fn polygon_indices_compose_three_levels() {
        let series = GeoSeries::new(test::square_polygons());
        let polygons = series.polygons();
        let counts = polygons.store().leaf_counts();
        let total: usize = counts.iter().sum();
        assert_eq!(total, polygons.xy().len() / 2);
        assert_eq!(polygons.point_indices().len(), total);
    }

    #[test]
    fn accessor_rederives_after_slice() {
        let series = GeoSeries::from_points_xy(vec![0., 0., 1., 1., 2., 2.]).unwrap();
        let sliced = series.slice(1, 2);
        let points = sliced.points();
        // Offset 0 now means the first surviving row of this type.
        assert_eq!(points.x(), vec![1., 2.]);
        assert_eq!(points.point_indices(), vec![1, 2]);
    }

    #[test]
    fn accessor_on_mixed_series_filters_by_tag() {
        let series = GeoSeries::new(test::mixed_column());
        let points = series.points();
        assert_eq!(points.store().len(), 2);
        let polygons = series.polygons();
        assert_eq!(polygons.store().len(), series.column().polygons().len());
    }
}
